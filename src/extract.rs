//! Destination-path extraction from tool log output
//!
//! The external tool announces output files only through human-readable log
//! lines; there is no structured protocol. Two literal markers matter:
//!
//! - `Destination:` — a fresh file was opened for writing
//! - `Merging formats into` — multiple streams were merged into a final file
//!
//! This is a brittle textual contract (a wording change in the tool silently
//! disables resolution), so the grammar is isolated here and independently
//! testable, and "no match observed" is an expected first-class outcome, not
//! an error.

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Grammar for the two destination markers: the trailing quoted-or-bare path
/// segment at end of line.
const DESTINATION_PATTERN: &str = r#"(?:Destination:|Merging formats into)\s+"?([^"]+?)"?\s*$"#;

fn destination_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The pattern is a compile-time constant, checked by tests below
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(DESTINATION_PATTERN).expect("destination pattern is valid"))
}

/// Extract the destination path from a single log line, if it carries one
///
/// The raw text is passed through verbatim — no normalization of relative
/// or symlinked segments happens here (that is the resolver's concern).
pub fn parse_destination_line(line: &str) -> Option<&str> {
    destination_regex()
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim())
        .filter(|path| !path.is_empty())
}

/// Stateful tracker accumulating the candidate output path across a job's
/// log lines
///
/// Last match wins: for video mode the tool writes per-stream `Destination:`
/// lines first and the `Merging formats into` line last, so the final merge
/// destination must supersede earlier per-stream paths.
#[derive(Debug, Default)]
pub struct DestinationTracker {
    candidate: Option<PathBuf>,
}

impl DestinationTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one log line; overwrites the candidate on a marker match
    pub fn observe(&mut self, line: &str) {
        if let Some(path) = parse_destination_line(line) {
            tracing::debug!(path = %path, "observed destination line");
            self.candidate = Some(PathBuf::from(path));
        }
    }

    /// The last path observed, if any marker line was seen
    pub fn candidate(&self) -> Option<&PathBuf> {
        self.candidate.as_ref()
    }

    /// Consume the tracker, yielding the final candidate path
    pub fn into_candidate(self) -> Option<PathBuf> {
        self.candidate
    }
}
