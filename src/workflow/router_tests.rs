use super::*;
use crate::state::{Fragment, Phase, ReportFragment};
use crate::testing::{fixture_fragment, new_state, state_at};

#[test]
fn transition_table_covers_every_phase() {
    for phase in Phase::ALL {
        let unsatisfied = transition(phase, false);
        let satisfied = transition(phase, true);
        match phase {
            Phase::Init => {
                assert_eq!(unsatisfied, Phase::ContextRequirements);
                assert_eq!(satisfied, Phase::ContextRequirements);
            }
            Phase::Complete => {
                assert_eq!(unsatisfied, Phase::Complete);
                assert_eq!(satisfied, Phase::Complete);
            }
            _ => {
                assert_eq!(unsatisfied, phase);
                assert_eq!(satisfied, phase.successor());
            }
        }
    }
}

#[test]
fn init_always_enters_context_requirements() {
    let mut state = new_state();
    assert_eq!(next_phase(&state), Phase::ContextRequirements);
    assert_eq!(
        route(&mut state),
        Transition::Enter(Phase::ContextRequirements)
    );
    assert_eq!(state.current_phase(), Phase::ContextRequirements);
    assert!(state.completed_phases().is_empty());
}

#[test]
fn init_ignores_prepopulated_fields() {
    // A state carrying context fields while still at init must not skip
    // context gathering.
    let mut value = serde_json::to_value(state_at(Phase::Research)).expect("serialize");
    value["current_phase"] = serde_json::json!("init");
    value["completed_phases"] = serde_json::json!([]);
    let mut state: AssessmentState = serde_json::from_value(value).expect("parse");
    assert!(state.is_satisfied(Phase::ContextRequirements));
    assert_eq!(
        route(&mut state),
        Transition::Enter(Phase::ContextRequirements)
    );
    assert_eq!(state.current_phase(), Phase::ContextRequirements);
    assert!(state.completed_phases().is_empty());
}

#[test]
fn unsatisfied_phase_reruns() {
    let mut state = state_at(Phase::Security);
    let before = state.completed_phases().to_vec();
    assert_eq!(route(&mut state), Transition::Rerun(Phase::Security));
    assert_eq!(state.current_phase(), Phase::Security);
    assert_eq!(state.completed_phases(), before.as_slice());
}

#[test]
fn research_advances_to_architecture_exactly_once() {
    let mut state = new_state();
    route(&mut state);
    state
        .apply_fragment(fixture_fragment(Phase::ContextRequirements))
        .expect("context");
    assert!(!state.requirements().is_empty());
    route(&mut state);
    assert_eq!(state.current_phase(), Phase::Research);
    state
        .apply_fragment(fixture_fragment(Phase::Research))
        .expect("research");

    assert_eq!(
        route(&mut state),
        Transition::Advance {
            from: Phase::Research,
            to: Phase::Architecture,
        }
    );
    assert_eq!(state.current_phase(), Phase::Architecture);
    // Routing again at architecture must not re-add research.
    route(&mut state);
    let research_marks = state
        .completed_phases()
        .iter()
        .filter(|phase| **phase == Phase::Research)
        .count();
    assert_eq!(research_marks, 1);
    assert_eq!(
        state.completed_phases(),
        &[Phase::ContextRequirements, Phase::Research]
    );
}

#[test]
fn completed_phases_only_grow() {
    let mut state = new_state();
    let mut previous = 0;
    for _ in 0..40 {
        let current = state.current_phase();
        if current.is_work() && !state.is_satisfied(current) {
            state
                .apply_fragment(fixture_fragment(current))
                .expect("apply fixture");
        }
        route(&mut state);
        let completed = state.completed_phases();
        assert!(completed.len() >= previous);
        let mut sorted = completed.to_vec();
        sorted.dedup();
        assert_eq!(sorted.len(), completed.len());
        previous = completed.len();
    }
    assert!(state.is_complete());
    assert_eq!(state.completed_phases(), &Phase::WORK);
}

#[test]
fn report_with_final_report_reaches_complete() {
    let mut state = state_at(Phase::Report);
    state
        .apply_fragment(Fragment::Report(ReportFragment {
            final_report: "# Assessment".to_string(),
            final_report_data: serde_json::json!({}),
        }))
        .expect("report");
    assert_eq!(
        route(&mut state),
        Transition::Advance {
            from: Phase::Report,
            to: Phase::Complete,
        }
    );
    assert!(state.is_complete());
    assert_eq!(state.completed_phases().last(), Some(&Phase::Report));
    assert_eq!(route(&mut state), Transition::Terminal);
    assert!(state.validate().is_ok());
}

#[test]
fn decide_does_not_mutate() {
    let state = state_at(Phase::Licensing);
    let before = state.clone();
    assert_eq!(decide(&state), Transition::Rerun(Phase::Licensing));
    assert_eq!(state, before);
}
