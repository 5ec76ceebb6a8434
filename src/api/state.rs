//! Application state for the API server

use crate::{Config, MediaFetcher};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clones); holds the fetcher and the
/// read-only configuration.
#[derive(Clone)]
pub struct AppState {
    /// The media fetcher instance
    pub fetcher: Arc<MediaFetcher>,

    /// Configuration (read access only; nothing is mutated per request)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(fetcher: Arc<MediaFetcher>, config: Arc<Config>) -> Self {
        Self { fetcher, config }
    }
}
