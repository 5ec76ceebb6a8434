//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the mediafetch REST API using
//! utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the mediafetch REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediafetch REST API",
        version = "0.1.0",
        description = "REST API for triggering media fetch jobs and streaming their progress over Server-Sent Events",
        contact(
            name = "mediafetch",
            url = "https://github.com/mediafetch/mediafetch"
        ),
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8090", description = "Local development server")
    ),
    paths(
        // Fetch
        crate::api::routes::fetch,
        crate::api::routes::fetch_query,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(
        schemas(
            crate::types::FetchRequest,
            crate::types::Mode,
            crate::types::JobId,
            crate::types::JobEvent,
            crate::error::ApiError,
            crate::error::ErrorDetail,
            crate::config::Config,
            crate::config::FetchConfig,
            crate::config::ApiConfig,
            crate::config::BasicAuthConfig,
            crate::config::CollisionPolicy,
        )
    ),
    tags(
        (name = "fetch", description = "Trigger fetch jobs and stream their lifecycle"),
        (name = "system", description = "Health and API metadata")
    )
)]
pub struct ApiDoc;
