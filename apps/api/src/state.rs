use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::controller::Pipeline;
use crate::render::Renderer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The analyze → optimize → download orchestrator. Owns the case store
    /// and the AI collaborators behind trait objects.
    pub pipeline: Arc<Pipeline>,
    /// Final-document renderer. Pluggable so tests can render plain text.
    pub renderer: Arc<dyn Renderer>,
    pub config: Config,
}
