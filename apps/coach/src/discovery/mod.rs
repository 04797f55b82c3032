//! Discovery pipeline — finds new job postings for active search configs
//! (scan mode) and ingests single postings added by URL or by hand.
//!
//! Both modes share the same tail: red-flag filter → idempotent ingest →
//! notify only for newly created rows.

pub mod ingest;
pub mod red_flag;
pub mod scheduler;
pub mod source;
pub mod url_extract;

use serde_json::{json, Value};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use crate::broker::events::{self, Event};
use crate::discovery::ingest::ingest_job;
use crate::discovery::red_flag::has_red_flag;
use crate::discovery::source::fetch_all;
use crate::errors::AppError;
use crate::state::AppState;

/// One discovered job posting, normalised from whatever backend produced it.
#[derive(Debug, Clone)]
pub struct JobPosting {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub location: String,
    pub salary_min: i64,
    pub salary_max: i64,
    pub source_url: String,
    pub raw_data: Value,
}

/// Owner-scoped search config consumed by the scan.
#[derive(Debug, Clone)]
pub struct ActiveSearchConfig {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_titles: Vec<String>,
    pub locations: Vec<String>,
}

/// Scheduled or triggered scan over every active search config.
pub async fn run_all(state: &AppState) -> Result<(), AppError> {
    let configs = fetch_active_configs(state, None).await?;
    info!("Scan starting: {} active configs", configs.len());
    for config in &configs {
        run_for_config(state, config).await?;
    }
    Ok(())
}

/// Scan limited to one user's active configs (RPC-triggered).
pub async fn run_for_user(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    let configs = fetch_active_configs(state, Some(user_id)).await?;
    for config in &configs {
        run_for_config(state, config).await?;
    }
    Ok(())
}

/// Scan one config: cartesian product of titles × locations, paginated
/// fetch, red-flag filter, idempotent ingest, notify on creation only.
/// Returns the number of newly inserted jobs.
pub async fn run_for_config(
    state: &AppState,
    config: &ActiveSearchConfig,
) -> Result<u32, AppError> {
    let mut inserted = 0;

    for title in &config.job_titles {
        for location in &config.locations {
            let postings = fetch_all(state.source.as_ref(), title, location).await;
            for posting in postings {
                let combined = format!("{} {}", posting.title, posting.description);
                if has_red_flag(&combined, &state.config.red_flag_keywords) {
                    debug!("Red flag filtered: {}", posting.title);
                    continue;
                }
                if posting.source_url.is_empty() {
                    debug!("Skipping posting without source url: {}", posting.title);
                    continue;
                }

                let outcome =
                    ingest_job(&state.db, config.user_id, Some(config.id), &posting, false)
                        .await?;
                if outcome.created {
                    inserted += 1;
                    notify_discovered(state, outcome.id, config.user_id, Some(config.id)).await;
                }
            }
        }
    }

    info!("Scan done config={} inserted={inserted}", config.id);
    Ok(inserted)
}

/// Add-by-URL: fetch and extract one posting. A red flag rejects the request
/// outright, unlike scan mode which just skips the item.
pub async fn add_job_by_url(
    state: &AppState,
    user_id: Uuid,
    url: &str,
    search_config_id: Option<Uuid>,
) -> Result<Uuid, AppError> {
    if let Some(config_id) = search_config_id {
        verify_config_ownership(state, config_id, user_id).await?;
    }

    let posting = url_extract::extract_job_from_url(url).await;

    let combined = format!("{} {}", posting.title, posting.description);
    if has_red_flag(&combined, &state.config.red_flag_keywords) {
        return Err(AppError::PolicyRejection(
            "job contains red-flag content".to_string(),
        ));
    }

    let outcome = ingest_job(&state.db, user_id, search_config_id, &posting, true).await?;
    if outcome.created {
        notify_discovered(state, outcome.id, user_id, search_config_id).await;
    }
    Ok(outcome.id)
}

/// Manually entered job. Identity is a synthetic `manual://` locator so the
/// same manual entry is not duplicated for one user.
pub async fn add_job_manually(
    state: &AppState,
    user_id: Uuid,
    details: ManualJob,
    search_config_id: Option<Uuid>,
) -> Result<Uuid, AppError> {
    if let Some(config_id) = search_config_id {
        verify_config_ownership(state, config_id, user_id).await?;
    }

    let posting = details.into_posting(user_id);

    let outcome = ingest_job(&state.db, user_id, search_config_id, &posting, true).await?;
    if outcome.created {
        notify_discovered(state, outcome.id, user_id, search_config_id).await;
    }
    Ok(outcome.id)
}

/// Fields accepted for a manually added job.
#[derive(Debug, Clone)]
pub struct ManualJob {
    pub company_name: String,
    pub company_description: Option<String>,
    pub location: Option<String>,
    pub profile_wanted: Option<String>,
    pub start_date: Option<String>,
    pub duration: Option<String>,
    pub why_us: Option<String>,
}

impl ManualJob {
    fn into_posting(self, user_id: Uuid) -> JobPosting {
        let raw_data = json!({
            "company_name": self.company_name,
            "company_description": self.company_description,
            "location": self.location,
            "profile_wanted": self.profile_wanted,
            "start_date": self.start_date,
            "duration": self.duration,
            "why_us": self.why_us,
        });

        JobPosting {
            external_id: String::new(),
            source_url: format!("manual://{user_id}/{}", self.company_name),
            title: self.company_name.clone(),
            description: self.profile_wanted.unwrap_or_default(),
            company_name: self.company_name,
            location: self.location.unwrap_or_default(),
            salary_min: 0,
            salary_max: 0,
            raw_data,
        }
    }
}

async fn notify_discovered(
    state: &AppState,
    job_feed_id: Uuid,
    user_id: Uuid,
    search_config_id: Option<Uuid>,
) {
    let mut publisher = state.publisher.clone();
    let event = Event::JobDiscovered {
        job_feed_id,
        user_id,
        search_config_id: search_config_id.map(|id| id.to_string()).unwrap_or_default(),
    };
    events::publish(&mut publisher, &event).await;
}

async fn fetch_active_configs(
    state: &AppState,
    user_filter: Option<Uuid>,
) -> Result<Vec<ActiveSearchConfig>, AppError> {
    let rows = sqlx::query(
        r#"
        SELECT sc.id, sc.user_id, sc.job_titles, sc.locations
        FROM search_configs sc
        WHERE sc.is_active = TRUE
          AND ($1::uuid IS NULL OR sc.user_id = $1)
        "#,
    )
    .bind(user_filter)
    .fetch_all(&state.db)
    .await?;

    let mut configs = Vec::with_capacity(rows.len());
    for row in rows {
        configs.push(ActiveSearchConfig {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            job_titles: row
                .try_get::<Option<Vec<String>>, _>("job_titles")?
                .unwrap_or_default(),
            locations: row
                .try_get::<Option<Vec<String>>, _>("locations")?
                .unwrap_or_default(),
        });
    }
    Ok(configs)
}

async fn verify_config_ownership(
    state: &AppState,
    search_config_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    let row = sqlx::query("SELECT id FROM search_configs WHERE id = $1 AND user_id = $2")
        .bind(search_config_id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;

    match row {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound("search config not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_job_builds_synthetic_identity() {
        let user_id = Uuid::new_v4();
        let posting = ManualJob {
            company_name: "Acme".to_string(),
            company_description: None,
            location: Some("Paris".to_string()),
            profile_wanted: Some("Rust backend dev".to_string()),
            start_date: None,
            duration: None,
            why_us: None,
        }
        .into_posting(user_id);

        assert_eq!(posting.source_url, format!("manual://{user_id}/Acme"));
        assert_eq!(posting.title, "Acme");
        assert_eq!(posting.description, "Rust backend dev");
        assert_eq!(posting.location, "Paris");
        assert_eq!(posting.raw_data["company_name"], "Acme");
    }

    /// Scan-mode filter decision: flagged postings never reach ingestion.
    #[test]
    fn test_red_flag_decision_matches_scan_semantics() {
        let keywords = vec!["pyramid".to_string()];
        let flagged = "Great job pyramid scheme opportunity";
        let clean = "Senior Rust engineer";
        assert!(has_red_flag(flagged, &keywords));
        assert!(!has_red_flag(clean, &keywords));
    }
}
