use std::sync::Arc;

use crate::config::Config;
use crate::feedback::log::FeedbackLog;
use crate::llm_client::TextGenerator;
use crate::usage::UsageGate;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generation-service seam. Production: `OpenAiClient`; tests: mocks.
    pub generator: Arc<dyn TextGenerator>,
    /// Usage/tier gate over the injected counter store.
    pub gate: UsageGate,
    pub feedback: Arc<FeedbackLog>,
    pub config: Config,
}
