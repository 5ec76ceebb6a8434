//! Authentication middleware for the REST API
//!
//! Provides optional HTTP Basic Auth. When credentials are configured, all
//! requests must carry a matching `Authorization: Basic ...` header or they
//! receive a 401 with a browser challenge (`WWW-Authenticate`).

use crate::config::BasicAuthConfig;
use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::Engine as _;
use serde_json::json;

/// Realm announced in the 401 challenge
const REALM: &str = "MediaFetch";

/// Middleware enforcing HTTP Basic Auth when credentials are configured
///
/// With no credentials configured, all requests pass through. Credential
/// comparison is constant-time to avoid timing side channels.
pub async fn require_basic_auth(
    State(expected): State<Option<BasicAuthConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(decode_basic_credentials);

    match provided {
        Some((username, password))
            if constant_time_eq(username.as_bytes(), expected.username.as_bytes())
                & constant_time_eq(password.as_bytes(), expected.password.as_bytes()) =>
        {
            next.run(request).await
        }
        Some(_) => challenge_response("Invalid credentials"),
        None => challenge_response("Authentication required"),
    }
}

/// Decode the username/password pair from a `Basic` authorization header value
fn decode_basic_credentials(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Constant-time byte comparison to prevent timing side-channel attacks.
/// Always compares all bytes regardless of where the first mismatch occurs.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// 401 response carrying a browser auth challenge and a JSON error body
fn challenge_response(message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "code": "unauthorized",
            "message": message
        }
    }));

    (
        StatusCode::UNAUTHORIZED,
        [(
            header::WWW_AUTHENTICATE,
            format!(r#"Basic realm="{REALM}", charset="UTF-8""#),
        )],
        body,
    )
        .into_response()
}
