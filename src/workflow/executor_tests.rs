use super::*;
use crate::inference::InferenceFailure;
use crate::report::MarkdownReport;
use crate::state::ValidationError;
use crate::testing::{
    fixture_value, new_state, state_at, FixtureInference, ScriptedInference, ONEDRIVE_REQUEST,
};
use crate::workflow::step_log::StepOutcome;

fn options(max_iterations: u32) -> ExecutorOptions {
    ExecutorOptions {
        max_iterations,
        max_retries: DEFAULT_MAX_RETRIES,
    }
}

#[test]
fn full_run_reaches_complete() {
    let inference = FixtureInference::new();
    let executor = Executor::new(&inference, &MarkdownReport, ExecutorOptions::default());
    let result = run_assessment(
        &executor,
        ONEDRIVE_REQUEST,
        Some("Contoso".to_string()),
        Some("File share retirement".to_string()),
    )
    .expect("valid request");

    assert_eq!(result.outcome, RunOutcome::Complete);
    assert!(result.state.is_complete());
    assert_eq!(result.state.completed_phases(), &Phase::WORK);
    assert!(result.state.errors().is_empty());
    assert_eq!(result.iterations, 11);
    assert_eq!(result.steps.len(), 10);
    assert!(result
        .steps
        .iter()
        .all(|entry| entry.outcome == StepOutcome::Success));
    let report = result.state.final_report().expect("final report");
    assert!(report.starts_with("# File share retirement (Contoso)"));
    assert!(result.state.validate().is_ok());
    // Each inference phase was asked exactly once.
    assert_eq!(inference.calls.borrow().len(), 9);
}

#[test]
fn stall_at_security_stops_at_the_cap() {
    let inference = FixtureInference::without(&[Phase::Security]);
    let executor = Executor::new(&inference, &MarkdownReport, ExecutorOptions::default());
    let result = executor.run(new_state());

    assert_eq!(
        result.outcome,
        RunOutcome::Stalled {
            phase: Phase::Security,
            iterations: DEFAULT_MAX_ITERATIONS,
        }
    );
    assert_eq!(result.iterations, DEFAULT_MAX_ITERATIONS);
    assert_eq!(result.state.current_phase(), Phase::Security);
    assert!(result.state.security_summary().is_none());
    assert!(!result.state.is_complete());
    assert_eq!(
        result.state.completed_phases(),
        &[
            Phase::ContextRequirements,
            Phase::Research,
            Phase::Architecture
        ]
    );

    let last = result.state.errors().last().expect("stall error");
    assert_eq!(last.kind, ErrorKind::Stall);
    assert_eq!(last.phase, Phase::Security);
    // Three successful phases, then security retried every remaining iteration.
    let security_failures = result
        .state
        .errors()
        .iter()
        .filter(|error| error.kind == ErrorKind::Inference)
        .count();
    assert_eq!(security_failures, 97);
    assert_eq!(result.steps.len(), 100);
}

#[test]
fn step_succeeding_on_rerun_resumes_progress() {
    let inference = ScriptedInference::new(vec![
        Err(InferenceFailure::Transport("connection reset".to_string())),
        Ok(fixture_value(Phase::Cost)),
    ]);
    let executor = Executor::new(&inference, &MarkdownReport, ExecutorOptions::default());
    let result = executor.run(state_at(Phase::Cost));

    assert_eq!(result.outcome, RunOutcome::Complete);
    assert_eq!(result.state.errors().len(), 1);
    assert_eq!(result.state.errors()[0].kind, ErrorKind::Inference);
    assert_eq!(result.steps[0].outcome, StepOutcome::Failed);
    assert_eq!(result.steps[1].outcome, StepOutcome::Success);
    assert_eq!(result.state.total_cost_estimate(), Some(53_000.0));
}

#[test]
fn small_cap_reports_stall_at_current_phase() {
    let inference = FixtureInference::new();
    let executor = Executor::new(&inference, &MarkdownReport, options(3));
    let result = executor.run(new_state());
    assert_eq!(
        result.outcome,
        RunOutcome::Stalled {
            phase: Phase::Architecture,
            iterations: 3,
        }
    );
    // Architecture's fragment is in place but the router never got to advance.
    assert!(result.state.architecture_solution().is_some());
    assert!(result.state.is_phase_completed(Phase::Architecture));
}

#[test]
fn completed_state_terminates_immediately() {
    let inference = ScriptedInference::new(Vec::new());
    let executor = Executor::new(&inference, &MarkdownReport, ExecutorOptions::default());
    let first = executor.run(state_at(Phase::Report));
    assert!(first.outcome.is_complete());

    let again = executor.run(first.state.clone());
    assert!(again.outcome.is_complete());
    assert_eq!(again.iterations, 1);
    assert!(again.steps.is_empty());
    assert_eq!(
        again.state.completed_phases(),
        first.state.completed_phases()
    );
}

#[test]
fn run_assessment_rejects_blank_request() {
    let inference = ScriptedInference::new(Vec::new());
    let executor = Executor::new(&inference, &MarkdownReport, ExecutorOptions::default());
    let err = run_assessment(&executor, "", None, None).expect_err("blank request");
    assert_eq!(err, ValidationError::empty("assessment request"));
    assert!(inference.requests.borrow().is_empty());
}

#[test]
fn outcome_serializes_with_status_tag() {
    let stalled = RunOutcome::Stalled {
        phase: Phase::Security,
        iterations: 100,
    };
    assert_eq!(
        serde_json::to_value(stalled).expect("serialize"),
        serde_json::json!({ "status": "stalled", "phase": "security", "iterations": 100 })
    );
}
