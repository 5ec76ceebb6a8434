//! # mediafetch
//!
//! Embeddable backend library for media fetch services: it triggers an
//! external download tool (yt-dlp) against a user-supplied URL, streams the
//! tool's progress back to the caller over Server-Sent Events in real time,
//! and on completion resolves the produced file to a downloadable link —
//! without ever linking a path outside the configured output directory.
//!
//! ## Design Philosophy
//!
//! mediafetch is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Event-driven** - One SSE channel per job, no polling required
//! - **Contained** - Only files under the output directory are ever served
//!
//! ## Quick Start
//!
//! ```no_run
//! use mediafetch::{Config, MediaFetcher, run_with_shutdown};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(Config::from_env()?);
//!     let fetcher = Arc::new(MediaFetcher::new((*config).clone())?);
//!
//!     // Serve the API with automatic signal handling
//!     run_with_shutdown(fetcher, config).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Destination-path extraction from tool log output
pub mod extract;
/// Core fetch orchestration
pub mod fetcher;
/// Job template and argument construction
pub mod job;
/// Path-to-URL resolution and containment checking
pub mod resolve;
/// External tool process execution
pub mod runner;
/// Request input sanitization
pub mod sanitize;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{ApiConfig, BasicAuthConfig, CollisionPolicy, Config, FetchConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use fetcher::MediaFetcher;
pub use runner::{CliToolRunner, RunningTool, SpawnOptions, ToolRunner};
pub use types::{ExitOutcome, FetchRequest, Job, JobEvent, JobId, Mode};

use std::sync::Arc;

/// Run the API server until a termination signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// In-flight jobs are not awaited on shutdown; their processes are reaped
/// by the OS when the server process exits.
///
/// # Example
///
/// ```no_run
/// use mediafetch::{Config, MediaFetcher, run_with_shutdown};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(Config::default());
///     let fetcher = Arc::new(MediaFetcher::new((*config).clone())?);
///
///     run_with_shutdown(fetcher, config).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(fetcher: Arc<MediaFetcher>, config: Arc<Config>) -> Result<()> {
    tokio::select! {
        result = api::start_api_server(fetcher, config) => result,
        _ = wait_for_signal() => {
            tracing::info!("Shutting down");
            Ok(())
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
