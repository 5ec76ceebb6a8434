//! Request input sanitization
//!
//! Pure validation helpers applied before any job is created: target URLs
//! are restricted to http/https, and filename hints are reduced to a safe
//! character set so they can be embedded in an output-path template.

use url::Url;

/// Maximum length of a sanitized filename hint
const MAX_HINT_LEN: usize = 80;

/// Validate and normalize a target URL
///
/// Accepts only absolute `http` or `https` URLs. The returned URL is the
/// normalized form produced by the url crate (lowercased host, default port
/// elided, etc.). Any other scheme, or unparsable input, yields `None`.
pub fn safe_url(input: &str) -> Option<Url> {
    let url = Url::parse(input.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

/// Sanitize an output filename hint
///
/// Keeps letters, digits, `.`, `_` and `-`; every run of other characters
/// collapses into a single `_`. The result is truncated to 80 characters
/// and stripped of leading/trailing underscores. Returns an empty string
/// when nothing usable survives, in which case callers fall back to the
/// default title-based naming policy.
pub fn sanitize_filename_hint(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_HINT_LEN));
    let mut last_was_sub = false;

    for c in input.trim().chars() {
        if out.len() >= MAX_HINT_LEN {
            break;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
            last_was_sub = false;
        } else if !last_was_sub {
            out.push('_');
            last_was_sub = true;
        }
    }

    out.trim_matches('_').to_string()
}
