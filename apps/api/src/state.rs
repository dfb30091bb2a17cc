use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Read-only; nothing carries over between analyses.
#[derive(Clone)]
pub struct AppState {
    /// Hosted model backend. `GeminiClient` in production, a stub in tests.
    pub llm: Arc<dyn TextGenerator>,
    pub config: Config,
}
