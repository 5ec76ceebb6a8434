//! Core fetch orchestration
//!
//! [`MediaFetcher`] ties the pipeline together: sanitized request → job
//! template → spawned tool process → log lines through the destination
//! tracker and out as `log` events → exit status → resolved download link
//! in the terminal `done` event.
//!
//! Each request gets its own job, its own process and its own event
//! channel; jobs share nothing but the read-only configuration. All
//! failures after the stream opens are terminal for the job only and travel
//! through the event channel; nothing escalates to a process-level error.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::DestinationTracker;
use crate::job::{build_args, build_job};
use crate::resolve::resolve_download_url;
use crate::runner::{CliToolRunner, RunningTool, SpawnOptions, TOOL_BINARY, ToolRunner};
use crate::sanitize::safe_url;
use crate::types::{ExitOutcome, FetchRequest, JobEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Media fetch service: validates requests, runs tool jobs, emits events
///
/// Construct once at startup and share behind an `Arc`; it holds only the
/// configuration and the tool runner, both read-only.
pub struct MediaFetcher {
    /// Service configuration
    pub config: Arc<Config>,
    runner: Arc<dyn ToolRunner>,
}

impl MediaFetcher {
    /// Create a fetcher with the real CLI tool runner
    ///
    /// Creates the output directory if absent. The tool binary comes from
    /// `config.fetch.tool_path` when set, otherwise from PATH discovery,
    /// falling back to the bare tool name (so a later spawn reports a
    /// proper spawn failure instead of startup refusing to boot without
    /// the tool installed).
    pub fn new(config: Config) -> Result<Self> {
        let runner: Arc<dyn ToolRunner> = match &config.fetch.tool_path {
            Some(path) => Arc::new(CliToolRunner::new(path.clone())),
            None => Arc::new(
                CliToolRunner::from_path()
                    .unwrap_or_else(|| CliToolRunner::new(PathBuf::from(TOOL_BINARY))),
            ),
        };
        Self::with_runner(config, runner)
    }

    /// Create a fetcher with a custom tool runner (used by tests)
    pub fn with_runner(config: Config, runner: Arc<dyn ToolRunner>) -> Result<Self> {
        std::fs::create_dir_all(&config.fetch.output_dir).map_err(|e| Error::Config {
            message: format!(
                "cannot create output directory {}: {e}",
                config.fetch.output_dir.display()
            ),
            key: Some("output_dir".to_string()),
        })?;

        tracing::info!(
            output_dir = %config.fetch.output_dir.display(),
            runner = runner.name(),
            "media fetcher ready"
        );

        Ok(Self {
            config: Arc::new(config),
            runner,
        })
    }

    /// Pre-flight request validation
    ///
    /// Returns the normalized target URL, or [`Error::InvalidInput`] when
    /// the URL is unparsable or its scheme is not http(s). Callers reject
    /// such requests with a synchronous 400 before any stream is opened and
    /// no process is spawned.
    pub fn validate(&self, request: &FetchRequest) -> Result<Url> {
        safe_url(&request.url)
            .ok_or_else(|| Error::InvalidInput("URL must be absolute http or https".to_string()))
    }

    /// Run one fetch job to completion, emitting events on `events`
    ///
    /// Emits exactly one `start`, then one `log` per tool output line in
    /// arrival order, then exactly one `done`. A closed `events` channel
    /// (client gone) stops emission but not the job: lines keep draining so
    /// the bounded pipeline never stalls the tool, and the process runs to
    /// completion unless `kill_on_disconnect` is set and `cancel` fires.
    ///
    /// `base_url` is the already-determined public base for download links;
    /// `None` means no link can be produced even on success.
    pub async fn run_job(
        &self,
        url: Url,
        request: &FetchRequest,
        base_url: Option<String>,
        events: mpsc::Sender<JobEvent>,
        cancel: CancellationToken,
    ) {
        let job = build_job(
            &self.config.fetch.output_dir,
            request.mode,
            request.filename.as_deref(),
            self.config.fetch.collision_policy,
        );
        let args = build_args(&job, url.as_str());

        tracing::info!(
            job_id = %job.id,
            mode = ?job.mode,
            url = %url,
            "starting fetch job"
        );

        let mut observing = true;
        send_event(
            &events,
            &mut observing,
            JobEvent::Start {
                job_id: job.id.clone(),
            },
        )
        .await;

        let options = SpawnOptions {
            line_capacity: self.config.fetch.line_buffer_capacity,
            cancel,
            kill_on_cancel: self.config.fetch.kill_on_disconnect,
        };

        let tool = match self.runner.spawn(&args, options).await {
            Ok(tool) => tool,
            Err(e) => {
                tracing::error!(job_id = %job.id, error = %e, "tool spawn failed");
                send_event(&events, &mut observing, JobEvent::done_spawn_failed(e.to_string()))
                    .await;
                return;
            }
        };

        let RunningTool { mut lines, exit } = tool;
        let mut tracker = DestinationTracker::new();

        while let Some(line) = lines.recv().await {
            tracker.observe(&line);
            send_event(&events, &mut observing, JobEvent::Log { line }).await;
        }

        let outcome = exit.await.unwrap_or(ExitOutcome {
            success: false,
            code: None,
        });

        let download_url = if outcome.success {
            match (tracker.into_candidate(), base_url) {
                (Some(candidate), Some(base)) => {
                    resolve_download_url(&candidate, &self.config.fetch.output_dir, &base)
                }
                (None, _) => {
                    tracing::warn!(job_id = %job.id, "tool succeeded but no destination line observed");
                    None
                }
                (_, None) => {
                    tracing::warn!(job_id = %job.id, "no public base URL determinable, not linking");
                    None
                }
            }
        } else {
            None
        };

        tracing::info!(
            job_id = %job.id,
            success = outcome.success,
            code = ?outcome.code,
            linked = download_url.is_some(),
            "fetch job finished"
        );

        send_event(
            &events,
            &mut observing,
            JobEvent::done_exited(outcome, download_url),
        )
        .await;
    }
}

/// Forward an event unless the client already went away
async fn send_event(events: &mpsc::Sender<JobEvent>, observing: &mut bool, event: JobEvent) {
    if *observing && events.send(event).await.is_err() {
        tracing::debug!("event channel closed, job continues unobserved");
        *observing = false;
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingRunner, exit_failed, exit_ok, scripted_fetcher};

    fn request(url: &str) -> FetchRequest {
        FetchRequest {
            url: url.to_string(),
            mode: crate::types::Mode::Video,
            filename: None,
        }
    }

    async fn collect_events(
        fetcher: &MediaFetcher,
        req: &FetchRequest,
        base_url: Option<String>,
    ) -> Vec<JobEvent> {
        let url = fetcher.validate(req).unwrap();
        let (tx, mut rx) = mpsc::channel(64);

        fetcher
            .run_job(url, req, base_url, tx, CancellationToken::new())
            .await;

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn validate_rejects_bad_schemes() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = scripted_fetcher(
            dir.path(),
            vec![],
            exit_ok(),
        );

        assert!(matches!(
            fetcher.validate(&request("ftp://x")),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            fetcher.validate(&request("not a url")),
            Err(Error::InvalidInput(_))
        ));
        assert!(fetcher.validate(&request("https://example.com/v")).is_ok());
    }

    #[tokio::test]
    async fn successful_job_emits_start_logs_done_with_link() {
        let dir = tempfile::tempdir().unwrap();
        let produced = dir.path().join("clip123.mp4");
        std::fs::write(&produced, b"video").unwrap();

        let fetcher = scripted_fetcher(
            dir.path(),
            vec![
                "[youtube] dQw4: Downloading webpage".to_string(),
                format!("[Merger] Merging formats into \"{}\"", produced.display()),
            ],
            exit_ok(),
        );

        let events = collect_events(
            &fetcher,
            &request("https://example.com/video"),
            Some("https://dl.example.com".to_string()),
        )
        .await;

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], JobEvent::Start { .. }));
        assert!(matches!(events[1], JobEvent::Log { .. }));
        assert!(matches!(events[2], JobEvent::Log { .. }));
        match &events[3] {
            JobEvent::Done {
                ok,
                code,
                download_url,
                error,
            } => {
                assert!(*ok);
                assert_eq!(*code, Some(0));
                assert_eq!(
                    download_url.clone().flatten().as_deref(),
                    Some("https://dl.example.com/downloads/clip123.mp4")
                );
                assert!(error.is_none());
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_passes_code_and_no_link() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = scripted_fetcher(
            dir.path(),
            vec!["ERROR: unable to download video data".to_string()],
            exit_failed(1),
        );

        let events = collect_events(
            &fetcher,
            &request("https://example.com/video"),
            Some("https://dl.example.com".to_string()),
        )
        .await;

        match events.last().unwrap() {
            JobEvent::Done {
                ok,
                code,
                download_url,
                ..
            } => {
                assert!(!*ok);
                assert_eq!(*code, Some(1));
                assert_eq!(download_url.clone().flatten(), None);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_destination_line_is_degraded_success() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = scripted_fetcher(
            dir.path(),
            vec!["[download] 100% of 10MiB".to_string()],
            exit_ok(),
        );

        let events = collect_events(
            &fetcher,
            &request("https://example.com/video"),
            Some("https://dl.example.com".to_string()),
        )
        .await;

        match events.last().unwrap() {
            JobEvent::Done {
                ok, download_url, ..
            } => {
                assert!(*ok);
                assert_eq!(download_url.clone().flatten(), None);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn escaping_destination_is_never_linked() {
        let dir = tempfile::tempdir().unwrap();
        let outside = tempfile::NamedTempFile::new().unwrap();

        let fetcher = scripted_fetcher(
            dir.path(),
            vec![format!("Destination: {}", outside.path().display())],
            exit_ok(),
        );

        let events = collect_events(
            &fetcher,
            &request("https://example.com/video"),
            Some("https://dl.example.com".to_string()),
        )
        .await;

        match events.last().unwrap() {
            JobEvent::Done {
                ok, download_url, ..
            } => {
                assert!(*ok);
                assert_eq!(download_url.clone().flatten(), None);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_base_url_means_no_link_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let produced = dir.path().join("clip.mp4");
        std::fs::write(&produced, b"video").unwrap();

        let fetcher = scripted_fetcher(
            dir.path(),
            vec![format!("Destination: {}", produced.display())],
            exit_ok(),
        );

        let events = collect_events(&fetcher, &request("https://example.com/video"), None).await;

        match events.last().unwrap() {
            JobEvent::Done {
                ok, download_url, ..
            } => {
                assert!(*ok);
                assert_eq!(download_url.clone().flatten(), None);
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn spawn_failure_emits_done_with_error_and_no_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.fetch.output_dir = dir.path().to_path_buf();
        let fetcher = MediaFetcher::with_runner(config, Arc::new(FailingRunner)).unwrap();

        let events = collect_events(&fetcher, &request("https://example.com/video"), None).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], JobEvent::Start { .. }));
        match &events[1] {
            JobEvent::Done {
                ok, code, error, ..
            } => {
                assert!(!*ok);
                assert!(code.is_none());
                assert!(error.as_deref().unwrap().contains("No such file"));
            }
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_jobs_have_independent_ordered_streams() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(scripted_fetcher(
            dir.path(),
            vec!["line-a".to_string(), "line-b".to_string()],
            exit_ok(),
        ));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let fetcher = fetcher.clone();
            handles.push(tokio::spawn(async move {
                let req = request("https://example.com/video");
                collect_events(&fetcher, &req, None).await
            }));
        }

        for handle in handles {
            let events = handle.await.unwrap();
            assert!(matches!(events.first().unwrap(), JobEvent::Start { .. }));
            assert!(matches!(events.last().unwrap(), JobEvent::Done { .. }));
            let logs: Vec<_> = events
                .iter()
                .filter_map(|e| match e {
                    JobEvent::Log { line } => Some(line.clone()),
                    _ => None,
                })
                .collect();
            assert_eq!(logs, vec!["line-a".to_string(), "line-b".to_string()]);
        }
    }
}
