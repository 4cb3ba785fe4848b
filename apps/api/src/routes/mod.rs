pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::feedback::handlers as feedback_handlers;
use crate::state::AppState;
use crate::transform::handlers as transform_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/transform",
            post(transform_handlers::handle_transform),
        )
        .route(
            "/api/feedback",
            post(feedback_handlers::handle_submit_feedback)
                .get(feedback_handlers::handle_list_feedback),
        )
        .with_state(state)
}
