//! Fetch endpoint: triggers a job and streams its lifecycle over SSE.

use crate::api::AppState;
use crate::resolve::infer_base_url;
use crate::types::{FetchRequest, JobEvent};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

/// Capacity of the per-request event channel feeding the SSE body
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// POST /api/fetch - Trigger a fetch job (JSON body)
///
/// On invalid input, responds synchronously with 400 and a JSON error body
/// before any stream is opened. Otherwise the response is a long-lived
/// `text/event-stream` carrying `start`, `log` and `done` events; the HTTP
/// status is fixed at 200 once the stream begins, so later failures are
/// reported only through the `done` event.
#[utoipa::path(
    post,
    path = "/api/fetch",
    tag = "fetch",
    request_body = FetchRequest,
    responses(
        (status = 200, description = "Job event stream (start, log, done)", content_type = "text/event-stream"),
        (status = 400, description = "Invalid target URL", body = crate::error::ApiError)
    )
)]
pub async fn fetch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<FetchRequest>,
) -> Response {
    start_fetch_stream(state, headers, request)
}

/// GET /api/fetch - Trigger a fetch job (query parameters)
///
/// Same contract as the POST variant; exists so EventSource clients, which
/// cannot send bodies, can open the stream directly.
#[utoipa::path(
    get,
    path = "/api/fetch",
    tag = "fetch",
    params(
        ("url" = String, Query, description = "Target media URL (http or https)"),
        ("mode" = Option<crate::types::Mode>, Query, description = "audio or video (default video)"),
        ("filename" = Option<String>, Query, description = "Optional output filename hint")
    ),
    responses(
        (status = 200, description = "Job event stream (start, log, done)", content_type = "text/event-stream"),
        (status = 400, description = "Invalid target URL", body = crate::error::ApiError)
    )
)]
pub async fn fetch_query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(request): Query<FetchRequest>,
) -> Response {
    start_fetch_stream(state, headers, request)
}

/// Validate the request and, if acceptable, spawn the job and open the
/// event stream.
///
/// The stream owns a drop guard on the job's cancellation token: a client
/// disconnect drops the response body and fires the token, which kills the
/// tool process only when `kill_on_disconnect` is configured.
fn start_fetch_stream(state: AppState, headers: HeaderMap, request: FetchRequest) -> Response {
    let url = match state.fetcher.validate(&request) {
        Ok(url) => url,
        Err(e) => return e.into_response(),
    };

    // Explicit configuration wins; otherwise fall back to request metadata
    let base_url = state
        .config
        .fetch
        .public_base_url
        .clone()
        .or_else(|| infer_base_url(&headers));

    let (events_tx, events_rx) = mpsc::channel::<JobEvent>(EVENT_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let fetcher = state.fetcher.clone();
    tokio::spawn(async move {
        fetcher
            .run_job(url, &request, base_url, events_tx, cancel)
            .await;
    });

    let sse_stream = ReceiverStream::new(events_rx).filter_map(move |event| {
        // Keep the drop guard alive for the lifetime of the stream
        let _held = &guard;

        match serde_json::to_string(&event) {
            Ok(json_data) => Some(Ok::<_, Infallible>(
                SseEvent::default().event(event.name()).data(json_data),
            )),
            Err(e) => {
                tracing::warn!("Failed to serialize event to JSON: {}", e);
                None
            }
        }
    });

    (
        [(header::CACHE_CONTROL, "no-cache")],
        Sse::new(sse_stream).keep_alive(KeepAlive::default()),
    )
        .into_response()
}
