//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`fetch`] — Job triggering and event streaming
//! - [`system`] — Health and OpenAPI

mod fetch;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use fetch::*;
pub use system::*;
