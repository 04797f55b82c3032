//! Analysis pipeline for one job application.
//!
//! Flow: fetch application + job_feed + profile snapshot → compute
//! MatchScore → generate pros/cons, cover letter, CV suggestions → write
//! ai_analysis back → return the terminal event for the supervisor to
//! publish.
//!
//! Generation failures degrade individual fields (empty lists, absent cover
//! letter); only fetch and persist failures abort the run.

pub mod match_score;
pub mod prompts;

use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::Row;
use tracing::info;

use crate::broker::commands::AnalyzeJobCommand;
use crate::broker::events::Event;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
struct ProsCons {
    #[serde(default)]
    pros: Vec<String>,
    #[serde(default)]
    cons: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CvSuggestions {
    #[serde(default)]
    suggestions: Vec<String>,
}

/// Read-only snapshot of everything one analysis run needs, fetched fresh in
/// a single joined query.
struct Snapshot {
    raw_data: Value,
    full_name: String,
    skills: Vec<Value>,
    experience: Vec<Value>,
}

pub async fn analyze(state: &AppState, cmd: &AnalyzeJobCommand) -> Result<Event, AppError> {
    let snapshot = fetch_snapshot(state, cmd).await?;

    let job_title = text_field(&snapshot.raw_data, "title", "Unknown position");
    let company = text_field(&snapshot.raw_data, "company", "Unknown company");
    let description = text_field(&snapshot.raw_data, "description", "");
    let skills_flat = flatten_skills(&snapshot.skills);

    info!(
        "Analyzing application {} — '{job_title}' at '{company}'",
        cmd.application_id
    );

    // Deterministic scorer first; it cannot fail.
    let score = match_score::compute(&snapshot.skills, &snapshot.experience, &snapshot.raw_data);
    info!("MatchScore = {score}/100");

    // Generation calls degrade independently: a None leaves its field empty.
    let (sys_pc, usr_pc) = prompts::pros_cons_prompt(
        &job_title,
        &description,
        &company,
        &skills_flat,
        &snapshot.experience,
        score,
    );
    let pros_cons: ProsCons = state
        .llm
        .chat_json(&sys_pc, &usr_pc, 0.3)
        .await
        .unwrap_or_default();

    let (sys_cl, usr_cl) = prompts::cover_letter_prompt(
        &job_title,
        &company,
        &description,
        &snapshot.full_name,
        &skills_flat,
        &snapshot.experience,
    );
    let cover_letter = state.llm.chat_text(&sys_cl, &usr_cl, 0.7).await;

    let (sys_cv, usr_cv) = prompts::cv_suggestions_prompt(&job_title, &description, &skills_flat);
    let cv_suggestions: CvSuggestions = state
        .llm
        .chat_json(&sys_cv, &usr_cv, 0.3)
        .await
        .unwrap_or_default();

    let analyzed_at = Utc::now();
    let ai_analysis = json!({
        "score": score,
        "pros": pros_cons.pros,
        "cons": pros_cons.cons,
        "suggested_cv_content": bulletize(&cv_suggestions.suggestions),
        "analyzed_at": analyzed_at.to_rfc3339(),
    });

    // Last write wins: a concurrent run for the same application simply
    // overwrites this result.
    sqlx::query(
        r#"
        UPDATE applications
        SET ai_analysis = $1, generated_cover_letter = $2, updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(&ai_analysis)
    .bind(cover_letter.as_deref())
    .bind(cmd.application_id)
    .execute(&state.db)
    .await?;

    info!("Analysis written for application {}", cmd.application_id);

    Ok(Event::AnalysisDone {
        application_id: cmd.application_id,
        user_id: cmd.user_id,
        match_score: Some(score),
        has_cover_letter: cover_letter.is_some(),
        analyzed_at: Some(analyzed_at),
        status: None,
        error: None,
    })
}

async fn fetch_snapshot(state: &AppState, cmd: &AnalyzeJobCommand) -> Result<Snapshot, AppError> {
    let row = sqlx::query(
        r#"
        SELECT
            jf.raw_data       AS job_raw_data,
            p.full_name,
            p.skills_json     AS skills,
            p.experience_json AS experience
        FROM applications a
        JOIN job_feed jf ON jf.id = a.job_feed_id
        JOIN profiles p  ON p.user_id = a.user_id
        WHERE a.id = $1 AND a.user_id = $2
        "#,
    )
    .bind(cmd.application_id)
    .bind(cmd.user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "application {} for user {}",
            cmd.application_id, cmd.user_id
        ))
    })?;

    Ok(Snapshot {
        raw_data: row
            .try_get::<Option<Value>, _>("job_raw_data")?
            .unwrap_or_else(|| json!({})),
        full_name: row
            .try_get::<Option<String>, _>("full_name")?
            .unwrap_or_default(),
        skills: as_list(row.try_get::<Option<Value>, _>("skills")?),
        experience: as_list(row.try_get::<Option<Value>, _>("experience")?),
    })
}

/// jsonb profile columns are loosely shaped: accept an array, wrap a lone
/// object, drop anything else.
fn as_list(value: Option<Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items,
        Some(obj @ Value::Object(_)) => vec![obj],
        _ => Vec::new(),
    }
}

fn text_field(raw: &Value, field: &str, default: &str) -> String {
    raw.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Normalise skills to a flat list of names for prompt building.
fn flatten_skills(skills: &[Value]) -> Vec<String> {
    skills
        .iter()
        .filter_map(|s| match s {
            Value::String(name) => Some(name.clone()),
            Value::Object(map) => map
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .map(String::from),
            _ => None,
        })
        .collect()
}

fn bulletize(suggestions: &[String]) -> String {
    suggestions
        .iter()
        .map(|s| format!("• {s}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_list_accepts_array_and_wraps_object() {
        assert_eq!(as_list(Some(json!(["a", "b"]))).len(), 2);
        assert_eq!(as_list(Some(json!({"name": "Rust"}))).len(), 1);
        assert!(as_list(Some(json!("oops"))).is_empty());
        assert!(as_list(None).is_empty());
    }

    #[test]
    fn test_flatten_skills_mixed_shapes() {
        let skills = vec![
            json!("Python"),
            json!({"name": "Docker", "level": "expert"}),
            json!({"level": "expert"}),
            json!(42),
        ];
        assert_eq!(flatten_skills(&skills), vec!["Python", "Docker"]);
    }

    #[test]
    fn test_text_field_falls_back_on_missing_or_empty() {
        let raw = json!({"title": "", "company": "Acme"});
        assert_eq!(text_field(&raw, "title", "Unknown position"), "Unknown position");
        assert_eq!(text_field(&raw, "company", "?"), "Acme");
        assert_eq!(text_field(&raw, "missing", "fallback"), "fallback");
    }

    #[test]
    fn test_bulletize_joins_with_newlines() {
        let out = bulletize(&["add keywords".to_string(), "quantify impact".to_string()]);
        assert_eq!(out, "• add keywords\n• quantify impact");
        assert_eq!(bulletize(&[]), "");
    }
}
