//! Step contract and dispatch.
//!
//! Each work phase has one step. The nine inference steps share a runner:
//! build the request from a read-only view of the state, ask the collaborator,
//! parse the answer strictly into the phase's fragment, and apply it. The
//! report step renders locally instead.
//!
//! A step never fails past its boundary. Collaborator failures and rejected
//! answers are recorded on the state and in the returned log entry, and the
//! phase is left unsatisfied for the router to re-select.

mod architecture;
mod context;
mod cost;
mod implementation;
mod licensing;
mod report;
mod research;
mod security;
mod support;
mod user_experience;

pub use architecture::ArchitectureStep;
pub use context::ContextStep;
pub use cost::CostStep;
pub use implementation::ImplementationPlanStep;
pub use licensing::LicensingStep;
pub use report::run_report_step;
pub use research::ResearchStep;
pub use security::SecurityStep;
pub use support::SupportStep;
pub use user_experience::UserExperienceStep;

use super::step_log::{StepLogBuilder, StepLogEntry};
use crate::inference::{prompt, Feedback, Inference, InferenceFailure, InferenceRequest};
use crate::report::ReportRenderer;
use crate::state::{AssessmentState, ErrorKind, Fragment, Phase};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

/// Contract for a step that delegates its content to the collaborator.
pub trait InferenceStep {
    fn phase(&self) -> Phase;

    /// Natural-language task for the collaborator.
    fn task(&self) -> &'static str;

    /// JSON schema of the expected answer.
    fn output_schema(&self) -> Value;

    /// Read-only projection of the fields this step may consume.
    ///
    /// Only the request, labels, and fields of earlier phases belong here.
    fn view(&self, state: &AssessmentState) -> Value;

    /// Strictly parse an answer into this phase's fragment.
    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error>;

    /// One-line description of what was applied, for logs.
    fn summary(&self, _state: &AssessmentState) -> String {
        format!("{} complete", self.phase())
    }
}

/// Everything a step needs besides the state.
pub struct StepContext<'a> {
    pub inference: &'a dyn Inference,
    pub renderer: &'a dyn ReportRenderer,
    pub max_retries: u32,
    /// Executor iteration, for the log entry.
    pub iteration: u32,
}

/// The inference step owning `phase`, if it has one.
pub fn inference_step(phase: Phase) -> Option<&'static dyn InferenceStep> {
    let step: &'static dyn InferenceStep = match phase {
        Phase::ContextRequirements => &ContextStep,
        Phase::Research => &ResearchStep,
        Phase::Architecture => &ArchitectureStep,
        Phase::Security => &SecurityStep,
        Phase::Licensing => &LicensingStep,
        Phase::Implementation => &ImplementationPlanStep,
        Phase::Support => &SupportStep,
        Phase::UserExperience => &UserExperienceStep,
        Phase::Cost => &CostStep,
        Phase::Init | Phase::Report | Phase::Complete => return None,
    };
    Some(step)
}

/// Run the step for the state's current phase.
///
/// Returns `None` for `init` and `complete`, which have no step.
pub fn dispatch(state: &mut AssessmentState, ctx: &StepContext<'_>) -> Option<StepLogEntry> {
    let phase = state.current_phase();
    if phase == Phase::Report {
        return Some(run_report_step(state, ctx.renderer, ctx.iteration));
    }
    let step = inference_step(phase)?;
    Some(run_inference_step(step, state, ctx))
}

/// Why one attempt did not produce an applied fragment.
struct AttemptFailure {
    kind: ErrorKind,
    message: String,
    response: Option<String>,
    retryable: bool,
}

impl AttemptFailure {
    fn inference(failure: InferenceFailure) -> Self {
        AttemptFailure {
            kind: ErrorKind::Inference,
            message: failure.to_string(),
            response: failure.response_text().map(str::to_string),
            retryable: failure.is_retryable(),
        }
    }

    fn rejected(message: String, answer: &Value) -> Self {
        AttemptFailure {
            kind: ErrorKind::Validation,
            message,
            response: serde_json::to_string_pretty(answer).ok(),
            retryable: true,
        }
    }
}

/// Shared runner: request, parse, apply, with retry-with-feedback.
///
/// Malformed answers and fragments that fail validation are re-prompted up to
/// `max_retries` times with the error attached. Other collaborator failures
/// end the invocation at once.
pub fn run_inference_step(
    step: &dyn InferenceStep,
    state: &mut AssessmentState,
    ctx: &StepContext<'_>,
) -> StepLogEntry {
    let phase = step.phase();
    let mut log = StepLogBuilder::new(ctx.iteration, phase, ctx.inference.name());
    let mut request = InferenceRequest {
        phase,
        task: step.task().to_string(),
        schema: step.output_schema(),
        context: step.view(state),
        feedback: None,
    };

    let mut attempt: u32 = 0;
    loop {
        log.attempt();
        log.set_prompt_preview(&prompt::render(&request));
        let failure = match ctx.inference.infer(&request) {
            Ok(answer) => match step.parse_fragment(answer.clone()) {
                Ok(fragment) => match state.apply_fragment(fragment) {
                    Ok(()) => {
                        let summary = step.summary(state);
                        tracing::info!(
                            phase = %phase,
                            attempts = log.attempts(),
                            %summary,
                            "step applied"
                        );
                        return log.success(summary);
                    }
                    Err(err) => AttemptFailure::rejected(
                        format!("{phase} answer failed validation: {err}"),
                        &answer,
                    ),
                },
                Err(err) => AttemptFailure::rejected(
                    format!("{phase} answer does not match the output schema: {err}"),
                    &answer,
                ),
            },
            Err(failure) => AttemptFailure::inference(failure),
        };

        if failure.retryable && attempt < ctx.max_retries {
            attempt += 1;
            tracing::warn!(
                phase = %phase,
                retry = attempt,
                max_retries = ctx.max_retries,
                error = %failure.message,
                "retrying step with error feedback"
            );
            request.feedback = Some(Feedback {
                error: failure.message,
                previous_response: failure.response,
            });
            continue;
        }

        tracing::warn!(
            phase = %phase,
            attempts = log.attempts(),
            kind = %failure.kind,
            error = %failure.message,
            "step degraded; phase left unsatisfied"
        );
        state.record_error(phase, failure.kind, failure.message.clone());
        return log.failed(failure.message);
    }
}

/// Strict typed parse of a collaborator answer.
pub(crate) fn parse_answer<T: DeserializeOwned>(answer: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(answer)
}

/// Request text, labels, and organization context: every step may read these.
pub(crate) fn base_view(state: &AssessmentState) -> Map<String, Value> {
    let mut view = Map::new();
    view.insert(
        "assessment_request".to_string(),
        json!(state.assessment_request()),
    );
    if let Some(client) = state.client_name() {
        view.insert("client_name".to_string(), json!(client));
    }
    if let Some(project) = state.project_name() {
        view.insert("project_name".to_string(), json!(project));
    }
    if let Some(context) = state.organization_context() {
        view.insert("organization_context".to_string(), json!(context));
    }
    view
}

// Schema building blocks shared by the step definitions.

pub(crate) fn object_schema(required: &[&str], properties: Value) -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": required,
        "properties": properties,
    })
}

pub(crate) fn string_schema() -> Value {
    json!({ "type": "string", "minLength": 1 })
}

pub(crate) fn string_list_schema() -> Value {
    json!({ "type": "array", "items": { "type": "string" } })
}

pub(crate) fn severity_schema() -> Value {
    json!({ "type": "string", "enum": ["high", "medium", "low"] })
}

pub(crate) fn array_schema(items: Value) -> Value {
    json!({ "type": "array", "items": items })
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
