//! Shared fixtures for unit tests.
use crate::inference::{Inference, InferenceFailure, InferenceRequest};
use crate::state::{
    ArchitectureFragment, AssessmentState, ContextFragment, CostFragment, Fragment,
    ImplementationFragment, LicensingFragment, Phase, ReportFragment, ResearchFragment,
    SecurityFragment, SupportFragment, UserExperienceFragment,
};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;

pub(crate) const ONEDRIVE_REQUEST: &str = "Migrate file shares to OneDrive";

macro_rules! fixture {
    ($name:literal) => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/onedrive/",
            $name,
            ".json"
        ))
    };
}

/// Raw recorded answer for an inference phase.
pub(crate) fn fixture_text(phase: Phase) -> &'static str {
    match phase {
        Phase::ContextRequirements => fixture!("context_requirements"),
        Phase::Research => fixture!("research"),
        Phase::Architecture => fixture!("architecture"),
        Phase::Security => fixture!("security"),
        Phase::Licensing => fixture!("licensing"),
        Phase::Implementation => fixture!("implementation"),
        Phase::Support => fixture!("support"),
        Phase::UserExperience => fixture!("user_experience"),
        Phase::Cost => fixture!("cost"),
        Phase::Init | Phase::Report | Phase::Complete => panic!("no recorded answer for {phase}"),
    }
}

pub(crate) fn fixture_value(phase: Phase) -> Value {
    serde_json::from_str(fixture_text(phase)).expect("parse fixture")
}

/// A valid fragment for any work phase.
pub(crate) fn fixture_fragment(phase: Phase) -> Fragment {
    if phase == Phase::Report {
        return Fragment::Report(ReportFragment {
            final_report: "# Assessment\n".to_string(),
            final_report_data: serde_json::json!({}),
        });
    }
    let value = fixture_value(phase);
    match phase {
        Phase::ContextRequirements => Fragment::Context(parse::<ContextFragment>(value)),
        Phase::Research => Fragment::Research(parse::<ResearchFragment>(value)),
        Phase::Architecture => Fragment::Architecture(parse::<ArchitectureFragment>(value)),
        Phase::Security => Fragment::Security(parse::<SecurityFragment>(value)),
        Phase::Licensing => Fragment::Licensing(parse::<LicensingFragment>(value)),
        Phase::Implementation => Fragment::Implementation(parse::<ImplementationFragment>(value)),
        Phase::Support => Fragment::Support(parse::<SupportFragment>(value)),
        Phase::UserExperience => Fragment::UserExperience(parse::<UserExperienceFragment>(value)),
        Phase::Cost => Fragment::Cost(parse::<CostFragment>(value)),
        Phase::Init | Phase::Report | Phase::Complete => unreachable!(),
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("fixture matches fragment shape")
}

pub(crate) fn new_state() -> AssessmentState {
    AssessmentState::new(ONEDRIVE_REQUEST, Some("Contoso".to_string()), None)
        .expect("valid request")
}

/// A state sitting at `phase` with every earlier work phase applied and completed.
pub(crate) fn state_at(phase: Phase) -> AssessmentState {
    let mut state = new_state();
    for work in Phase::WORK.into_iter().filter(|work| *work < phase) {
        state.set_phase(work);
        state
            .apply_fragment(fixture_fragment(work))
            .expect("apply fixture fragment");
    }
    state.set_phase(phase);
    state
}

/// Answers every phase from the recorded fixtures, except the listed ones.
pub(crate) struct FixtureInference {
    missing: Vec<Phase>,
    pub(crate) calls: RefCell<Vec<Phase>>,
}

impl FixtureInference {
    pub(crate) fn new() -> Self {
        Self::without(&[])
    }

    pub(crate) fn without(missing: &[Phase]) -> Self {
        FixtureInference {
            missing: missing.to_vec(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl Inference for FixtureInference {
    fn name(&self) -> &str {
        "fixture"
    }

    fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceFailure> {
        self.calls.borrow_mut().push(request.phase);
        if self.missing.contains(&request.phase) {
            return Err(InferenceFailure::Unavailable(format!(
                "no answer for {}",
                request.phase
            )));
        }
        Ok(fixture_value(request.phase))
    }
}

/// Plays back a fixed queue of answers and keeps every request it saw.
pub(crate) struct ScriptedInference {
    answers: RefCell<VecDeque<Result<Value, InferenceFailure>>>,
    pub(crate) requests: RefCell<Vec<InferenceRequest>>,
}

impl ScriptedInference {
    pub(crate) fn new(answers: Vec<Result<Value, InferenceFailure>>) -> Self {
        ScriptedInference {
            answers: RefCell::new(answers.into()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Inference for ScriptedInference {
    fn name(&self) -> &str {
        "scripted"
    }

    fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceFailure> {
        self.requests.borrow_mut().push(request.clone());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(InferenceFailure::Empty))
    }
}
