//! Axum route handlers for the Feedback API.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::feedback::log::DEFAULT_LIST_LIMIT;
use crate::feedback::types::{FeedbackRequest, Rating};
use crate::state::AppState;

/// POST /api/feedback
///
/// Validates the submission and appends it to the JSONL log.
pub async fn handle_submit_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<Value>, AppError> {
    request.validate().map_err(AppError::Validation)?;

    let user_agent = header_str(&headers, "user-agent").unwrap_or_default();
    let ip = header_str(&headers, "x-forwarded-for")
        .or_else(|| header_str(&headers, "x-real-ip"))
        .unwrap_or_else(|| "unknown".to_string());

    let record = state
        .feedback
        .append(request, user_agent, ip)
        .await
        .map_err(|e| AppError::FeedbackLog(e.to_string()))?;

    info!(
        "Feedback stored: {:?} - {}",
        record.submission.rating, record.feedback_id
    );

    Ok(Json(json!({
        "ok": true,
        "data": {
            "feedbackId": record.feedback_id,
            "message": "피드백이 성공적으로 저장되었습니다."
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub key: Option<String>,
}

/// GET /api/feedback?limit&rating&key
///
/// Admin-only review endpoint. `key` must equal the configured admin secret
/// exactly; there is no other authentication.
pub async fn handle_list_feedback(
    State(state): State<AppState>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<Value>, AppError> {
    if query.key.as_deref() != Some(state.config.admin_key.as_str()) {
        return Err(AppError::Forbidden("접근 권한이 없습니다.".to_string()));
    }

    let listing = state
        .feedback
        .list(query.rating, query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
        .await
        .map_err(|e| AppError::FeedbackLog(e.to_string()))?;

    Ok(Json(json!({
        "ok": true,
        "data": {
            "feedbacks": listing.feedbacks,
            "total": listing.total,
            "stats": listing.stats
        }
    })))
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
