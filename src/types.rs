//! Core types and events for mediafetch

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;
use utoipa::ToSchema;

/// Unique identifier for a fetch job
///
/// Generated from random entropy plus a nanosecond timestamp. Ids are not
/// globally sequenced; a collision between two concurrent jobs is a
/// tolerable (and overwhelmingly improbable) risk, not an invariant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a fresh job id from 8 random bytes and the current time
    pub fn generate() -> Self {
        let mut bytes = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);

        let mut id = String::with_capacity(32);
        for byte in bytes {
            let _ = write!(id, "{byte:02x}");
        }

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let _ = write!(id, "{nanos:x}");

        Self(id)
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fetch mode selecting the external tool's argument profile
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Extract best audio, transcoded to mp3 at a fixed bitrate
    Audio,
    /// Best video plus best audio, merged into an mp4 container
    #[default]
    Video,
}

/// An ephemeral fetch job, alive only for the duration of one request
///
/// Never persisted; the id is used for output filename templating and for
/// correlation in the `start` event.
#[derive(Clone, Debug)]
pub struct Job {
    /// Opaque unique token generated at job start
    pub id: JobId,
    /// Selected argument profile
    pub mode: Mode,
    /// Absolute output-path template handed to the external tool; contains
    /// placeholders (title, id, extension) resolved by the tool itself
    pub output_template: PathBuf,
}

/// Terminal outcome of a tool process that was successfully spawned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitOutcome {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Numeric exit code, if the process exited normally
    pub code: Option<i32>,
}

/// Event emitted over a job's SSE channel
///
/// Per job, the stream is exactly one `Start`, zero or more `Log` in strict
/// arrival order, then exactly one `Done`. The SSE event name is carried
/// out-of-band (see [`JobEvent::name`]); the serialized payload matches the
/// wire contract of the fetch endpoint (camelCase keys).
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum JobEvent {
    /// Job accepted, process about to spawn
    #[serde(rename_all = "camelCase")]
    Start {
        /// Correlation id for this job
        job_id: JobId,
    },

    /// One line of tool output (stdout and stderr interleaved)
    Log {
        /// Raw output line, verbatim
        line: String,
    },

    /// Terminal event; the channel closes after this
    #[serde(rename_all = "camelCase")]
    Done {
        /// Whether the tool reported success (exit status zero)
        ok: bool,
        /// Numeric exit code; absent when the tool never started
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<i32>,
        /// Public download link; explicitly null when the job succeeded but
        /// no contained output path could be resolved
        #[serde(skip_serializing_if = "Option::is_none")]
        download_url: Option<Option<String>>,
        /// Failure description when the tool could not be spawned
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl JobEvent {
    /// SSE event name for this event
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::Start { .. } => "start",
            JobEvent::Log { .. } => "log",
            JobEvent::Done { .. } => "done",
        }
    }

    /// Terminal event for a process that exited (successfully or not)
    ///
    /// `download_url` is serialized even when `None` so callers can
    /// distinguish "no link" from a missing field. The exit code is passed
    /// through unchanged; it is absent only when the process died to a
    /// signal.
    pub fn done_exited(outcome: ExitOutcome, download_url: Option<String>) -> Self {
        JobEvent::Done {
            ok: outcome.success,
            code: outcome.code,
            download_url: Some(download_url),
            error: None,
        }
    }

    /// Terminal event for a process that could not be spawned
    pub fn done_spawn_failed(message: impl Into<String>) -> Self {
        JobEvent::Done {
            ok: false,
            code: None,
            download_url: None,
            error: Some(message.into()),
        }
    }
}

/// Parameters of a fetch request, accepted as a JSON body or query string
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct FetchRequest {
    /// Target media URL (http or https)
    pub url: String,

    /// Argument profile to use (default: video)
    #[serde(default)]
    pub mode: Mode,

    /// Optional output filename hint; sanitized before use
    #[serde(default)]
    pub filename: Option<String>,
}
