//! Profile trigger: enqueue a CV parse for the calling user by publishing
//! the command the dispatcher consumes. The upload itself is handled by the
//! profile service; both share the uploads volume.

use axum::{extract::State, http::HeaderMap, Json};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::broker::commands::CMD_PARSE_CV;
use crate::errors::AppError;
use crate::routes::discovery::user_id_from_headers;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnqueueCvParseRequest {
    pub cv_url: String,
}

#[derive(Debug, Serialize)]
pub struct EnqueueCvParseResponse {
    pub message: &'static str,
}

pub async fn handle_enqueue_cv_parse(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<EnqueueCvParseRequest>,
) -> Result<Json<EnqueueCvParseResponse>, AppError> {
    let user_id = user_id_from_headers(&headers)?;
    if request.cv_url.trim().is_empty() {
        return Err(AppError::Validation("cv_url is required".to_string()));
    }

    let payload = json!({
        "userId": user_id,
        "cvUrl": request.cv_url,
    })
    .to_string();

    let mut publisher = state.publisher.clone();
    publisher
        .publish::<_, _, ()>(CMD_PARSE_CV, &payload)
        .await?;
    info!("CV parse enqueued for user {user_id}");

    Ok(Json(EnqueueCvParseResponse {
        message: "CV parse enqueued",
    }))
}
