//! Axum route handlers for the Transform API.

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::state::AppState;
use crate::transform::pipeline::run_transform;
use crate::transform::types::TransformRequest;

/// POST /api/transform
///
/// Runs the full pipeline and wraps the outcome in the `{ok, data}` envelope.
/// A low-confidence analysis is a success response with
/// `needsConfirmation: true`, not an error.
pub async fn handle_transform(
    State(state): State<AppState>,
    Json(request): Json<TransformRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = run_transform(
        state.generator.as_ref(),
        &state.gate,
        &state.config,
        request,
    )
    .await?;

    Ok(Json(json!({
        "ok": true,
        "data": outcome.into_result()
    })))
}
