//! Run directory layout and artifact persistence.
//!
//! A run directory holds the latest state snapshot, the rendered report, and
//! two append-only JSONL logs:
//!
//! ```text
//! <run>/state.json       latest AssessmentState (atomic replace)
//! <run>/report.md        rendered Markdown report
//! <run>/history.jsonl    one line per run invocation
//! <run>/step_log.jsonl   one line per step invocation
//! ```
use crate::state::{AssessmentState, Phase};
use crate::util::{now_epoch_ms, sha256_hex};
use crate::workflow::RunOutcome;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const HISTORY_SCHEMA_VERSION: u32 = 1;

/// Typed paths into a run directory.
#[derive(Debug, Clone)]
pub struct RunPaths {
    root: PathBuf,
}

impl RunPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the `state.json` snapshot path.
    pub fn state_path(&self) -> PathBuf {
        self.root.join("state.json")
    }

    /// Return the `report.md` path.
    pub fn report_path(&self) -> PathBuf {
        self.root.join("report.md")
    }

    pub fn history_path(&self) -> PathBuf {
        self.root.join("history.jsonl")
    }

    pub fn step_log_path(&self) -> PathBuf {
        self.root.join("step_log.jsonl")
    }
}

/// Fresh run directory under the platform's local data dir.
pub fn default_runs_dir() -> Result<PathBuf> {
    let base =
        dirs::data_local_dir().ok_or_else(|| anyhow!("no local data directory; pass --out"))?;
    Ok(base
        .join("euc-assess")
        .join("runs")
        .join(now_epoch_ms().to_string()))
}

/// Serialize `state` and atomically replace `state.json`.
///
/// Returns the written bytes so callers can hash exactly what landed on disk.
pub fn write_snapshot(paths: &RunPaths, state: &AssessmentState) -> Result<Vec<u8>> {
    let mut text = serde_json::to_vec_pretty(state).context("serialize assessment state")?;
    text.push(b'\n');
    write_atomic(&paths.state_path(), &text)?;
    Ok(text)
}

/// Load a snapshot and re-check every invariant before handing it out.
pub fn load_snapshot(path: &Path) -> Result<AssessmentState> {
    let bytes = fs::read(path).with_context(|| format!("read state {}", path.display()))?;
    let state: AssessmentState =
        serde_json::from_slice(&bytes).with_context(|| format!("parse state {}", path.display()))?;
    state
        .validate()
        .with_context(|| format!("invalid state {}", path.display()))?;
    Ok(state)
}

pub fn write_report(paths: &RunPaths, report: &str) -> Result<()> {
    write_atomic(&paths.report_path(), report.as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(bytes)
        .with_context(|| format!("write {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("publish {}", path.display()))?;
    Ok(())
}

/// One line of `history.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub schema_version: u32,
    pub ts: u64,
    pub outcome: RunOutcome,
    pub phase: Phase,
    pub completed: Vec<Phase>,
    pub errors: usize,
    pub iterations: u32,
    /// SHA-256 of the `state.json` bytes written for this run.
    pub state_sha256: String,
}

impl HistoryEntry {
    pub fn new(
        state: &AssessmentState,
        outcome: RunOutcome,
        iterations: u32,
        snapshot: &[u8],
    ) -> Self {
        HistoryEntry {
            schema_version: HISTORY_SCHEMA_VERSION,
            ts: now_epoch_ms(),
            outcome,
            phase: state.current_phase(),
            completed: state.completed_phases().to_vec(),
            errors: state.errors().len(),
            iterations,
            state_sha256: sha256_hex(snapshot),
        }
    }
}

/// Append a history entry as JSONL.
pub fn append_history(paths: &RunPaths, entry: &HistoryEntry) -> Result<()> {
    let path = paths.history_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create run dir")?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    let line = serde_json::to_string(entry).context("serialize history entry")?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{new_state, state_at};

    #[test]
    fn snapshot_round_trips_through_validation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = RunPaths::new(dir.path().join("run"));
        let state = state_at(Phase::Licensing);

        write_snapshot(&paths, &state).expect("write snapshot");
        let loaded = load_snapshot(&paths.state_path()).expect("load snapshot");
        assert_eq!(loaded, state);
    }

    #[test]
    fn snapshot_replaces_previous_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = RunPaths::new(dir.path());
        write_snapshot(&paths, &state_at(Phase::Cost)).expect("first write");
        write_snapshot(&paths, &new_state()).expect("second write");

        let loaded = load_snapshot(&paths.state_path()).expect("load");
        assert_eq!(loaded.current_phase(), Phase::Init);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() != "state.json")
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind");
    }

    #[test]
    fn load_rejects_inconsistent_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = RunPaths::new(dir.path());
        let mut value = serde_json::to_value(state_at(Phase::Architecture)).expect("to value");
        // Claims research is done while the research fields are missing.
        value["research_findings"] = serde_json::json!([]);
        fs::write(paths.state_path(), value.to_string()).expect("write");

        let err = load_snapshot(&paths.state_path()).expect_err("inconsistent");
        assert!(format!("{err:#}").contains("invalid state"));
    }

    #[test]
    fn load_rejects_future_schema_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = RunPaths::new(dir.path());
        let mut value = serde_json::to_value(new_state()).expect("to value");
        value["version"] = serde_json::json!(99);
        fs::write(paths.state_path(), value.to_string()).expect("write");

        assert!(load_snapshot(&paths.state_path()).is_err());
    }

    #[test]
    fn history_lines_hash_the_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = RunPaths::new(dir.path());
        let state = state_at(Phase::Research);
        let bytes = write_snapshot(&paths, &state).expect("write snapshot");
        let entry = HistoryEntry::new(
            &state,
            RunOutcome::Stalled {
                phase: Phase::Research,
                iterations: 4,
            },
            4,
            &bytes,
        );
        append_history(&paths, &entry).expect("append");
        append_history(&paths, &entry).expect("append again");

        let text = fs::read_to_string(paths.history_path()).expect("read history");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: HistoryEntry = serde_json::from_str(lines[0]).expect("parse line");
        assert_eq!(parsed.phase, Phase::Research);
        assert_eq!(parsed.completed, vec![Phase::ContextRequirements]);
        let on_disk = fs::read(paths.state_path()).expect("read snapshot");
        assert_eq!(parsed.state_sha256, sha256_hex(&on_disk));
    }
}
