//! End-to-end runs of the `euca` binary against recorded collaborator answers.

mod common;

use common::{copy_responses_without, euca, onedrive_responses, stderr, stdout, ONEDRIVE_REQUEST};
use euc_assess::persist::{load_snapshot, HistoryEntry};
use euc_assess::state::Phase;
use euc_assess::workflow::{RunOutcome, StepLogEntry, StepOutcome};
use std::fs;
use tempfile::TempDir;

fn path_arg(path: &std::path::Path) -> String {
    path.display().to_string()
}

#[test]
fn replayed_run_writes_complete_artifacts() {
    let temp = TempDir::new().expect("tempdir");
    let out = temp.path().join("run");
    let responses = path_arg(&onedrive_responses());
    let out_arg = path_arg(&out);

    let output = euca(
        &[
            "run",
            "--request",
            ONEDRIVE_REQUEST,
            "--client",
            "Contoso",
            "--project",
            "File share retirement",
            "--responses",
            &responses,
            "--out",
            &out_arg,
        ],
        temp.path(),
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("status: complete"));

    let state = load_snapshot(&out.join("state.json")).expect("valid snapshot");
    assert!(state.is_complete());
    assert_eq!(state.completed_phases(), &Phase::WORK);
    assert_eq!(state.total_cost_estimate(), Some(53_000.0));

    let report = fs::read_to_string(out.join("report.md")).expect("report.md");
    assert!(report.starts_with("# File share retirement (Contoso)"));
    assert!(report.contains("Microsoft 365 E3"));

    let steps: Vec<StepLogEntry> = fs::read_to_string(out.join("step_log.jsonl"))
        .expect("step log")
        .lines()
        .map(|line| serde_json::from_str(line).expect("step entry"))
        .collect();
    assert_eq!(steps.len(), 10);
    let all_succeeded = steps.iter().all(|entry| entry.outcome == StepOutcome::Success);
    assert!(all_succeeded);
    assert_eq!(steps[0].provider, "replay");
    assert_eq!(steps[9].provider, "renderer");

    let history = fs::read_to_string(out.join("history.jsonl")).expect("history");
    let entry: HistoryEntry =
        serde_json::from_str(history.lines().next().expect("one line")).expect("history entry");
    assert_eq!(entry.outcome, RunOutcome::Complete);
    assert_eq!(entry.iterations, 11);
}

#[test]
fn missing_answer_stalls_and_exits_nonzero() {
    let temp = TempDir::new().expect("tempdir");
    let responses = copy_responses_without(&temp.path().join("responses"), &["security"]);
    let out = temp.path().join("run");
    let responses_arg = path_arg(&responses);
    let out_arg = path_arg(&out);

    let output = euca(
        &[
            "run",
            "--request",
            ONEDRIVE_REQUEST,
            "--responses",
            &responses_arg,
            "--out",
            &out_arg,
            "--max-iterations",
            "10",
            "--json",
        ],
        temp.path(),
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("stalled at security after 10 iterations"));

    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json summary");
    assert_eq!(summary["outcome"]["status"], "stalled");
    assert_eq!(summary["outcome"]["phase"], "security");
    assert!(summary["report_path"].is_null());

    let state = load_snapshot(&out.join("state.json")).expect("stalled snapshot is valid");
    assert_eq!(state.current_phase(), Phase::Security);
    assert_eq!(
        state.completed_phases(),
        &[
            Phase::ContextRequirements,
            Phase::Research,
            Phase::Architecture
        ]
    );
    assert!(!out.join("report.md").exists());

    // Status on the stalled snapshot points back at the same phase.
    let state_arg = path_arg(&out.join("state.json"));
    let status = euca(&["status", "--state", &state_arg, "--json"], temp.path());
    assert!(status.status.success(), "stderr: {}", stderr(&status));
    let status: serde_json::Value = serde_json::from_str(&stdout(&status)).expect("status json");
    assert_eq!(status["current_phase"], "security");
    assert_eq!(status["next_phase"], "security");
    assert_eq!(status["complete"], false);
    assert_eq!(
        status["errors"].as_array().expect("errors").last().expect("stall")["kind"],
        "stall"
    );

    // An intermediate snapshot still renders what it has.
    let report_path = temp.path().join("partial.md");
    let report_arg = path_arg(&report_path);
    let report = euca(
        &["report", "--state", &state_arg, "--out", &report_arg],
        temp.path(),
    );
    assert!(report.status.success(), "stderr: {}", stderr(&report));
    let text = fs::read_to_string(&report_path).expect("partial report");
    assert!(text.contains("## Architecture"));
    assert!(!text.contains("## Cost and ROI"));
}

#[test]
fn status_text_reports_next_phase_for_completed_run() {
    let temp = TempDir::new().expect("tempdir");
    let out = temp.path().join("run");
    let responses = path_arg(&onedrive_responses());
    let out_arg = path_arg(&out);
    let run = euca(
        &[
            "run",
            "--request",
            ONEDRIVE_REQUEST,
            "--responses",
            &responses,
            "--out",
            &out_arg,
        ],
        temp.path(),
    );
    assert!(run.status.success(), "stderr: {}", stderr(&run));

    let state_arg = path_arg(&out.join("state.json"));
    let status = euca(&["status", "--state", &state_arg], temp.path());
    assert!(status.status.success());
    let text = stdout(&status);
    assert!(text.contains("current phase: complete"));
    assert!(text.contains("next phase: complete"));
}

#[test]
fn request_file_and_blank_request() {
    let temp = TempDir::new().expect("tempdir");
    let request_path = temp.path().join("request.txt");
    fs::write(&request_path, "   \n").expect("write request");
    let responses = path_arg(&onedrive_responses());
    let request_arg = path_arg(&request_path);
    let out_arg = path_arg(&temp.path().join("run"));

    let output = euca(
        &[
            "run",
            "--request-file",
            &request_arg,
            "--responses",
            &responses,
            "--out",
            &out_arg,
        ],
        temp.path(),
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid assessment request"));
    assert!(!temp.path().join("run/state.json").exists());
}

#[test]
fn corrupt_snapshot_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let state_path = temp.path().join("state.json");
    fs::write(&state_path, "{\"assessment_request\": \"x\"}").expect("write");
    let state_arg = path_arg(&state_path);

    let output = euca(&["status", "--state", &state_arg], temp.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("parse state"));
}
