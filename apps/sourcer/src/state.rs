use std::sync::Arc;

use crate::admission::RateLimiter;
use crate::outreach::{Debouncer, OutreachGuard};
use crate::scoring::ScoringEngine;
use crate::store::parser::JobTextParser;
use crate::store::JobStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<JobStore>,
    pub parser: Arc<JobTextParser>,
    pub scoring: Arc<ScoringEngine>,
    pub limiter: Arc<RateLimiter>,
    pub outreach: Arc<OutreachGuard>,
    /// Shared trigger debouncer for outreach requests.
    pub debouncer: Arc<Debouncer>,
    /// Default AI preference for requests that don't specify one.
    pub default_use_ai: bool,
}
