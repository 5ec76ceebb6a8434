//! Job template and argument construction
//!
//! Builds the output-path template and the fixed argument profile handed to
//! the external download tool. The template contains `%(...)s` placeholders
//! that the tool itself resolves (title, id, extension); nothing here touches
//! the filesystem.

use crate::config::CollisionPolicy;
use crate::sanitize::sanitize_filename_hint;
use crate::types::{Job, JobId, Mode};
use std::path::Path;

/// Template used when no usable filename hint is supplied
const DEFAULT_TEMPLATE: &str = "%(title).200B [%(id)s].%(ext)s";

/// Build a [`Job`] for a fetch request
///
/// Generates a fresh job id and derives the output template rooted at
/// `output_dir`:
/// - with a usable hint: `<dir>/<hint>.%(ext)s`, or
///   `<dir>/<hint>-<jobId>.%(ext)s` under [`CollisionPolicy::AlwaysSuffix`];
/// - otherwise: `<dir>/%(title).200B [%(id)s].%(ext)s`.
pub fn build_job(
    output_dir: &Path,
    mode: Mode,
    filename_hint: Option<&str>,
    collision_policy: CollisionPolicy,
) -> Job {
    let id = JobId::generate();

    let hint = filename_hint
        .map(sanitize_filename_hint)
        .filter(|h| !h.is_empty());

    let file_template = match (hint, collision_policy) {
        (Some(hint), CollisionPolicy::AlwaysSuffix) => format!("{hint}-{id}.%(ext)s"),
        (Some(hint), CollisionPolicy::BestEffort) => format!("{hint}.%(ext)s"),
        (None, _) => DEFAULT_TEMPLATE.to_string(),
    };

    Job {
        id,
        mode,
        output_template: output_dir.join(file_template),
    }
}

/// Build the tool's argument list for a job
///
/// The base profile always disables warnings, playlist expansion and partial
/// files, forces line-buffered progress and restricted filenames, and sets
/// the output template. The mode then selects either audio extraction
/// (best audio transcoded to mp3 at 192K) or best-video-plus-audio merged
/// into mp4. The target URL always comes last.
pub fn build_args(job: &Job, url: &str) -> Vec<String> {
    let mut args = vec![
        "--no-warnings".to_string(),
        "--newline".to_string(),
        "--restrict-filenames".to_string(),
        "--no-playlist".to_string(),
        "--no-part".to_string(),
        "-o".to_string(),
        job.output_template.to_string_lossy().into_owned(),
    ];

    match job.mode {
        Mode::Audio => {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                "mp3".to_string(),
                "--audio-quality".to_string(),
                "192K".to_string(),
            ]);
        }
        Mode::Video => {
            args.extend([
                "-f".to_string(),
                "bv*+ba/b".to_string(),
                "--merge-output-format".to_string(),
                "mp4".to_string(),
            ]);
        }
    }

    args.push(url.to_string());
    args
}
