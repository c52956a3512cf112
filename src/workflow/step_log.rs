//! Per-step invocation records.
//!
//! Every step invocation yields one entry, successful or not. The CLI appends
//! them to `step_log.jsonl` in the run directory:
//!
//! ```jsonl
//! {"schema_version":1,"ts":1707900000000,"iteration":2,"phase":"research","provider":"command","attempts":1,"duration_ms":4200,"outcome":"success",...}
//! ```

use crate::persist::RunPaths;
use crate::state::Phase;
use crate::util::{now_epoch_ms, truncate_string};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::time::Instant;

/// Current schema version for step_log.jsonl entries.
pub const STEP_LOG_SCHEMA_VERSION: u32 = 1;

const PROMPT_PREVIEW_BYTES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// The fragment was applied.
    Success,
    /// The phase's fields were left untouched.
    Failed,
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A single step invocation log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepLogEntry {
    /// Schema version for forwards compatibility.
    pub schema_version: u32,

    /// Unix timestamp in milliseconds when the entry was finished.
    pub ts: u64,

    /// Executor iteration that ran the step (1-indexed).
    pub iteration: u32,

    pub phase: Phase,

    /// Provider label, or `renderer` for the report step.
    pub provider: String,

    /// Collaborator calls made, including retries.
    pub attempts: u32,

    pub duration_ms: u64,

    pub outcome: StepOutcome,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// First ~500 bytes of the task sent on the last attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_preview: Option<String>,
}

/// Builder for constructing step log entries with timing.
pub struct StepLogBuilder {
    start: Instant,
    iteration: u32,
    phase: Phase,
    provider: String,
    attempts: u32,
    prompt_preview: Option<String>,
}

impl StepLogBuilder {
    pub fn new(iteration: u32, phase: Phase, provider: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            iteration,
            phase,
            provider: provider.into(),
            attempts: 0,
            prompt_preview: None,
        }
    }

    /// Count one collaborator call.
    pub fn attempt(&mut self) {
        self.attempts += 1;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Set a preview of the prompt (truncated to 500 bytes).
    pub fn set_prompt_preview(&mut self, prompt: &str) {
        let preview = truncate_string(prompt, PROMPT_PREVIEW_BYTES);
        self.prompt_preview = Some(if preview.len() < prompt.len() {
            format!("{preview}...")
        } else {
            preview
        });
    }

    pub fn success(self, summary: impl Into<String>) -> StepLogEntry {
        self.build(StepOutcome::Success, Some(summary.into()), None)
    }

    pub fn failed(self, error: impl Into<String>) -> StepLogEntry {
        self.build(StepOutcome::Failed, None, Some(error.into()))
    }

    fn build(
        self,
        outcome: StepOutcome,
        summary: Option<String>,
        error: Option<String>,
    ) -> StepLogEntry {
        StepLogEntry {
            schema_version: STEP_LOG_SCHEMA_VERSION,
            ts: now_epoch_ms(),
            iteration: self.iteration,
            phase: self.phase,
            provider: self.provider,
            attempts: self.attempts,
            duration_ms: self.start.elapsed().as_millis() as u64,
            outcome,
            summary,
            error,
            prompt_preview: self.prompt_preview,
        }
    }
}

/// Append step log entries to the run's log file.
pub fn append_step_log(paths: &RunPaths, entries: &[StepLogEntry]) -> Result<()> {
    let log_path = paths.step_log_path();

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("create run directory for step_log")?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open step_log for append: {}", log_path.display()))?;

    for entry in entries {
        let line = serde_json::to_string(entry).context("serialize step_log entry")?;
        writeln!(file, "{line}").context("write step_log entry")?;
    }

    Ok(())
}
