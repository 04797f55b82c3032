//! Discovery trigger endpoints. The gateway forwards the caller's identity
//! in the `x-user-id` header.

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::discovery::{self, ManualJob};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddByUrlRequest {
    pub url: String,
    #[serde(default)]
    pub search_config_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct AddManuallyRequest {
    pub company_name: String,
    #[serde(default)]
    pub company_description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_wanted: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub why_us: Option<String>,
    #[serde(default)]
    pub search_config_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TriggerScanRequest {
    /// Restrict the scan to one user's configs; omitted means all.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct JobAddedResponse {
    pub job_feed_id: Uuid,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

pub async fn handle_add_by_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddByUrlRequest>,
) -> Result<Json<JobAddedResponse>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    if request.url.trim().is_empty() {
        return Err(AppError::Validation("url is required".to_string()));
    }

    let job_feed_id =
        discovery::add_job_by_url(&state, user_id, &request.url, request.search_config_id).await?;

    Ok(Json(JobAddedResponse {
        job_feed_id,
        message: "Job added to your inbox",
    }))
}

pub async fn handle_add_manually(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AddManuallyRequest>,
) -> Result<Json<JobAddedResponse>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    if request.company_name.trim().is_empty() {
        return Err(AppError::Validation("company_name is required".to_string()));
    }

    let details = ManualJob {
        company_name: request.company_name,
        company_description: request.company_description,
        location: request.location,
        profile_wanted: request.profile_wanted,
        start_date: request.start_date,
        duration: request.duration,
        why_us: request.why_us,
    };

    let job_feed_id =
        discovery::add_job_manually(&state, user_id, details, request.search_config_id).await?;

    Ok(Json(JobAddedResponse {
        job_feed_id,
        message: "Manual job added to your inbox",
    }))
}

/// Runs the scan in the background and responds immediately.
pub async fn handle_trigger_scan(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TriggerScanRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    user_id_from_headers(&headers)?;

    tokio::spawn(async move {
        let result = match request.user_id {
            Some(user_id) => discovery::run_for_user(&state, user_id).await,
            None => discovery::run_all(&state).await,
        };
        if let Err(e) = result {
            error!("Triggered scan error: {e}");
        }
    });

    Ok(Json(MessageResponse {
        message: "Scan triggered",
    }))
}

pub(crate) fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, AppError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_header_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-user-id",
            "7c9e6679-7425-40de-944b-e07fc1f90ae7".parse().unwrap(),
        );
        assert!(user_id_from_headers(&headers).is_ok());
    }

    #[test]
    fn test_missing_or_invalid_user_id_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            user_id_from_headers(&headers),
            Err(AppError::Unauthorized)
        ));

        let mut bad = HeaderMap::new();
        bad.insert("x-user-id", "not-a-uuid".parse().unwrap());
        assert!(user_id_from_headers(&bad).is_err());
    }
}
