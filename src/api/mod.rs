//! REST API server module
//!
//! Exposes the fetch trigger endpoint (with its SSE event stream), static
//! serving of the output directory, a health check and OpenAPI docs.

use crate::resolve::DOWNLOADS_ROUTE;
use crate::{Config, MediaFetcher, Result};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Fetch
/// - `POST /api/fetch` - Trigger a fetch job (JSON body), SSE response
/// - `GET /api/fetch` - Trigger a fetch job (query params), SSE response
///
/// ## Downloads
/// - `GET /downloads/*` - Static files from the output directory
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(fetcher: Arc<MediaFetcher>, config: Arc<Config>) -> Router {
    let state = AppState::new(fetcher, config.clone());

    let router = Router::new()
        // Fetch
        .route("/api/fetch", post(routes::fetch))
        .route("/api/fetch", get(routes::fetch_query))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        // Static serving of produced files; only resolver-approved paths
        // are ever linked, so nothing outside the directory is reachable
        .nest_service(DOWNLOADS_ROUTE, ServeDir::new(&config.fetch.output_dir));

    // Merge Swagger UI routes if enabled in config (before applying state)
    let router = if config.api.swagger_ui {
        // Point the UI at the spec route above instead of registering the
        // spec route again via `.url()`, which would panic on overlap
        router.merge(
            SwaggerUi::new("/swagger-ui")
                .config(utoipa_swagger_ui::Config::new(["/openapi.json"])),
        )
    } else {
        router
    };

    let router = router.with_state(state);

    // Middleware layer ordering: in Axum's onion model, the LAST layer
    // applied is the OUTERMOST (runs first on requests). Auth goes
    // innermost, CORS outermost, tracing around everything.

    let router = if config.api.basic_auth.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.api.basic_auth.clone(),
            auth::require_basic_auth,
        ))
    } else {
        router
    };

    let router = if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    };

    router.layer(TraceLayer::new_for_http())
}

/// Build a CORS layer based on configured origins
///
/// Allows the specified origins ("*" means any), all methods and all
/// headers for cross-origin requests.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Binds a TCP listener and serves the router until shutdown or error.
///
/// # Example
///
/// ```no_run
/// use mediafetch::{Config, MediaFetcher};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::from_env()?);
/// let fetcher = Arc::new(MediaFetcher::new((*config).clone())?);
///
/// // Start API server (blocks until shutdown)
/// mediafetch::api::start_api_server(fetcher, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(fetcher: Arc<MediaFetcher>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(
        address = %bind_address,
        "Starting API server"
    );

    let app = create_router(fetcher, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %bind_address,
        "API server listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
