//! The control loop.
//!
//! Each iteration asks the router for a decision and, unless the state is
//! terminal, runs the step for the resulting phase. The loop is bounded by
//! `max_iterations`; running out is a reported stall, never a hang.
use super::router;
use super::step_log::StepLogEntry;
use super::steps::{self, StepContext};
use crate::inference::Inference;
use crate::report::ReportRenderer;
use crate::state::{AssessmentState, ErrorKind, Phase, ValidationError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ITERATIONS: u32 = 100;
pub const DEFAULT_MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorOptions {
    /// Router/step cycles before the run is declared stalled.
    pub max_iterations: u32,
    /// Re-prompts per step invocation after a rejected answer.
    pub max_retries: u32,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        ExecutorOptions {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Complete,
    /// The iteration cap was reached with the state still at `phase`.
    Stalled { phase: Phase, iterations: u32 },
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete)
    }
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub state: AssessmentState,
    pub outcome: RunOutcome,
    /// Loop iterations used.
    pub iterations: u32,
    /// One entry per step invocation, in order.
    pub steps: Vec<StepLogEntry>,
}

/// Drives one assessment from its current phase to `complete` or a stall.
///
/// Collaborators are borrowed; the executor owns no process-wide state.
pub struct Executor<'a> {
    inference: &'a dyn Inference,
    renderer: &'a dyn ReportRenderer,
    options: ExecutorOptions,
}

impl<'a> Executor<'a> {
    pub fn new(
        inference: &'a dyn Inference,
        renderer: &'a dyn ReportRenderer,
        options: ExecutorOptions,
    ) -> Self {
        Executor {
            inference,
            renderer,
            options,
        }
    }

    pub fn options(&self) -> ExecutorOptions {
        self.options
    }

    /// Run `state` until it completes or the iteration cap is reached.
    pub fn run(&self, mut state: AssessmentState) -> RunResult {
        let mut steps = Vec::new();
        let mut iterations = 0;

        while iterations < self.options.max_iterations {
            iterations += 1;
            router::route(&mut state);
            if state.is_complete() {
                tracing::info!(iterations, "assessment complete");
                return RunResult {
                    state,
                    outcome: RunOutcome::Complete,
                    iterations,
                    steps,
                };
            }
            let ctx = StepContext {
                inference: self.inference,
                renderer: self.renderer,
                max_retries: self.options.max_retries,
                iteration: iterations,
            };
            if let Some(entry) = steps::dispatch(&mut state, &ctx) {
                steps.push(entry);
            }
        }

        let phase = state.current_phase();
        tracing::error!(
            phase = %phase,
            iterations,
            "iteration cap reached; assessment stalled"
        );
        state.record_error(
            phase,
            ErrorKind::Stall,
            format!("stalled at {phase} after {iterations} iterations"),
        );
        RunResult {
            state,
            outcome: RunOutcome::Stalled { phase, iterations },
            iterations,
            steps,
        }
    }
}

/// Create a state for `assessment_request` and run it to the end.
///
/// Fails only when the request or labels are invalid; collaborator trouble
/// shows up in the returned state's errors and outcome.
pub fn run_assessment(
    executor: &Executor<'_>,
    assessment_request: &str,
    client_name: Option<String>,
    project_name: Option<String>,
) -> Result<RunResult, ValidationError> {
    let state = AssessmentState::new(assessment_request, client_name, project_name)?;
    tracing::info!(
        provider = executor.inference.name(),
        max_iterations = executor.options.max_iterations,
        "starting assessment"
    );
    Ok(executor.run(state))
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
