//! Shared test helpers for driving the fetch pipeline without a real tool.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::MediaFetcher;
use crate::runner::{RunningTool, SpawnOptions, ToolRunner};
use crate::types::ExitOutcome;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Runner that replays a scripted line sequence and exit outcome
pub(crate) struct ScriptedRunner {
    pub lines: Vec<String>,
    pub outcome: ExitOutcome,
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn spawn(&self, _args: &[String], options: SpawnOptions) -> Result<RunningTool> {
        let (line_tx, line_rx) = mpsc::channel(options.line_capacity);
        let (exit_tx, exit_rx) = oneshot::channel();

        let lines = self.lines.clone();
        let outcome = self.outcome;
        tokio::spawn(async move {
            for line in lines {
                if line_tx.send(line).await.is_err() {
                    return;
                }
            }
            drop(line_tx);
            let _ = exit_tx.send(outcome);
        });

        Ok(RunningTool {
            lines: line_rx,
            exit: exit_rx,
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Runner whose spawn always fails, as if the binary were missing
pub(crate) struct FailingRunner;

#[async_trait]
impl ToolRunner for FailingRunner {
    async fn spawn(&self, _args: &[String], _options: SpawnOptions) -> Result<RunningTool> {
        Err(Error::ToolSpawn("No such file or directory".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Build a fetcher over `dir` backed by a [`ScriptedRunner`]
pub(crate) fn scripted_fetcher(
    dir: &Path,
    lines: Vec<String>,
    outcome: ExitOutcome,
) -> MediaFetcher {
    let mut config = Config::default();
    config.fetch.output_dir = dir.to_path_buf();
    MediaFetcher::with_runner(config, Arc::new(ScriptedRunner { lines, outcome })).unwrap()
}

/// Exit outcome for a clean, successful run
pub(crate) fn exit_ok() -> ExitOutcome {
    ExitOutcome {
        success: true,
        code: Some(0),
    }
}

/// Exit outcome for a tool-reported failure with the given code
pub(crate) fn exit_failed(code: i32) -> ExitOutcome {
    ExitOutcome {
        success: false,
        code: Some(code),
    }
}
