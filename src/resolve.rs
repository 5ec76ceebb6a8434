//! Mapping resolved output paths to public download URLs
//!
//! This is a security boundary: a candidate path extracted from tool output
//! is only ever turned into a link if its canonical form (symlinks and `..`
//! resolved) lives under the canonical output directory. A path that escapes
//! the directory is never surfaced, regardless of tool exit status, so the
//! static download route can never expose arbitrary filesystem content.

use axum::http::HeaderMap;
use std::path::Path;

/// URL prefix under which the output directory is served as static content
pub const DOWNLOADS_ROUTE: &str = "/downloads";

/// Map a candidate output path to a public download URL
///
/// Both the candidate and the output root are canonicalized; the candidate
/// is accepted only if its canonical form equals the root or is lexically
/// prefixed by root plus a separator. On acceptance the relative remainder
/// is percent-encoded per segment and appended to
/// `<base>/downloads/`.
///
/// Returns `None` when the candidate does not exist, escapes the root, or
/// cannot be represented as UTF-8 — in every case, no link is produced.
pub fn resolve_download_url(candidate: &Path, output_dir: &Path, base_url: &str) -> Option<String> {
    let canonical_root = output_dir.canonicalize().ok()?;
    let canonical_candidate = candidate.canonicalize().ok()?;

    let relative = match canonical_candidate.strip_prefix(&canonical_root) {
        Ok(relative) => relative,
        Err(_) => {
            tracing::warn!(
                candidate = %canonical_candidate.display(),
                root = %canonical_root.display(),
                "resolved path escapes output directory, refusing to link"
            );
            return None;
        }
    };

    let mut url = format!("{base_url}{DOWNLOADS_ROUTE}");
    for segment in relative.components() {
        let segment = segment.as_os_str().to_str()?;
        url.push('/');
        url.push_str(&urlencoding::encode(segment));
    }

    Some(url)
}

/// Infer a public base URL from request metadata
///
/// Honors reverse-proxy forwarding headers first (`x-forwarded-proto`,
/// `x-forwarded-host`), then the plain `Host` header with an `http` scheme.
/// Returns `None` when no host is determinable; callers then produce no
/// link even for successful jobs.
pub fn infer_base_url(headers: &HeaderMap) -> Option<String> {
    let host = headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(axum::http::header::HOST))
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())?;

    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .filter(|proto| matches!(*proto, "http" | "https"))
        .unwrap_or("http");

    Some(format!("{proto}://{host}"))
}
