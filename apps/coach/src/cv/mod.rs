//! CV-extraction pipeline.
//!
//! Flow: resolve the uploaded PDF path → extract raw text → LLM structured
//! extraction → merge into the profile row → return the terminal event.
//!
//! Unlike analysis, every stage failure here is terminal for the run: no
//! partial persistence, one failure event with a distinct reason.

pub mod prompts;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::broker::commands::ParseCvCommand;
use crate::broker::events::{Event, FieldCounts};
use crate::errors::AppError;
use crate::state::AppState;

/// Cap on extracted text passed to the LLM.
const MAX_CV_TEXT_CHARS: usize = 8000;

/// Structured fields the extractor may populate. Fields default to empty so
/// a sparse but valid response still parses.
#[derive(Debug, Deserialize)]
struct ExtractedProfile {
    #[serde(default)]
    skills: Vec<Value>,
    #[serde(default)]
    experience: Vec<Value>,
    #[serde(default)]
    education: Vec<Value>,
    #[serde(default)]
    certifications: Vec<Value>,
    #[serde(default)]
    projects: Vec<Value>,
}

impl ExtractedProfile {
    /// A response with no content in any section is a failed extraction,
    /// even when it is syntactically valid JSON.
    fn is_empty(&self) -> bool {
        self.skills.is_empty()
            && self.experience.is_empty()
            && self.education.is_empty()
            && self.certifications.is_empty()
            && self.projects.is_empty()
    }
}

pub async fn parse(state: &AppState, cmd: &ParseCvCommand) -> Result<Event, AppError> {
    let path = resolve_upload_path(&state.config.upload_dir, &cmd.cv_url)
        .ok_or_else(|| AppError::Content("CV file not found on disk".to_string()))?;

    if !path.exists() {
        return Err(AppError::Content("CV file not found on disk".to_string()));
    }

    let text = extract_pdf_text(path).await?;
    let text = truncate_chars(&text, MAX_CV_TEXT_CHARS);
    info!(
        "Extracted {} chars from CV for user {}",
        text.len(),
        cmd.user_id
    );

    let (system, user) = prompts::cv_extract_prompt(text);
    let extracted: ExtractedProfile = state
        .llm
        .chat_json(&system, &user, 0.1)
        .await
        .ok_or_else(|| AppError::Upstream("LLM failed to parse CV".to_string()))?;
    if extracted.is_empty() {
        return Err(AppError::Upstream("LLM failed to parse CV".to_string()));
    }

    let counts = FieldCounts {
        skills: extracted.skills.len(),
        experience: extracted.experience.len(),
        education: extracted.education.len(),
        certifications: extracted.certifications.len(),
        projects: extracted.projects.len(),
    };

    // Field-level merge: an empty extracted array never erases an existing
    // value.
    sqlx::query(
        r#"
        UPDATE profiles SET
            skills_json         = CASE WHEN $1::jsonb != '[]'::jsonb
                                       THEN $1::jsonb ELSE skills_json END,
            experience_json     = CASE WHEN $2::jsonb != '[]'::jsonb
                                       THEN $2::jsonb ELSE experience_json END,
            education_json      = CASE WHEN $3::jsonb != '[]'::jsonb
                                       THEN $3::jsonb ELSE education_json END,
            certifications_json = CASE WHEN $4::jsonb != '[]'::jsonb
                                       THEN $4::jsonb ELSE certifications_json END,
            projects_json       = CASE WHEN $5::jsonb != '[]'::jsonb
                                       THEN $5::jsonb ELSE projects_json END,
            updated_at          = NOW()
        WHERE user_id = $6
        "#,
    )
    .bind(Value::Array(extracted.skills))
    .bind(Value::Array(extracted.experience))
    .bind(Value::Array(extracted.education))
    .bind(Value::Array(extracted.certifications))
    .bind(Value::Array(extracted.projects))
    .bind(cmd.user_id)
    .execute(&state.db)
    .await?;

    info!("Profile enriched from CV for user {}", cmd.user_id);

    Ok(Event::CvParsed {
        user_id: cmd.user_id,
        fields_updated: Some(counts),
        error: None,
    })
}

/// `cv_url` is stored as a relative path like `/uploads/<filename>`. Only the
/// basename is trusted; it is joined onto the configured upload directory so
/// a crafted path cannot escape it.
fn resolve_upload_path(upload_dir: &str, cv_url: &str) -> Option<PathBuf> {
    let filename = Path::new(cv_url).file_name()?;
    Some(Path::new(upload_dir).join(filename))
}

async fn extract_pdf_text(path: PathBuf) -> Result<String, AppError> {
    // pdf-extract is CPU-bound and synchronous; keep it off the runtime
    // worker threads.
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task panicked: {e}")))?
        .map_err(|e| AppError::Content(format!("PDF extraction failed: {e}")))?;

    if text.trim().is_empty() {
        return Err(AppError::Content(
            "No readable text found in PDF".to_string(),
        ));
    }
    Ok(text)
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
