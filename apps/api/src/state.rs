use std::sync::Arc;

use crate::config::Config;
use crate::explain::ExplainPipeline;
use crate::matching::engine::MatchEngine;
use crate::resume::ResumeParser;

/// Shared application state injected into all route handlers via Axum
/// extractors. Everything here is immutable after startup, so concurrent
/// requests share it without locking.
#[derive(Clone)]
pub struct AppState {
    /// Index + catalog + embedder. Built once from the persisted artifacts.
    pub engine: Arc<MatchEngine>,
    /// Bounded-concurrency explanation enrichment.
    pub explainer: Arc<ExplainPipeline>,
    /// Document extraction + best-effort structuring.
    pub resume_parser: Arc<ResumeParser>,
    pub config: Config,
}
