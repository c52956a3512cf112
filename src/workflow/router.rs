//! Phase routing.
//!
//! The transition table is keyed by `(current phase, satisfied?)`. `init`
//! always enters `context_requirements`; a satisfied work phase advances to its
//! successor; an unsatisfied one stays put so its step runs again; `complete`
//! is absorbing.
use crate::state::{AssessmentState, Phase};

/// What the router decided for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Leave `init` for the first work phase, ignoring field content.
    Enter(Phase),
    /// The phase's fields are present; mark it complete and move on.
    Advance { from: Phase, to: Phase },
    /// The phase is still unsatisfied; run its step (again).
    Rerun(Phase),
    /// Nothing left to do.
    Terminal,
}

impl Transition {
    /// The phase the state is at after this transition is applied.
    pub fn target(self) -> Phase {
        match self {
            Transition::Enter(phase) | Transition::Rerun(phase) => phase,
            Transition::Advance { to, .. } => to,
            Transition::Terminal => Phase::Complete,
        }
    }
}

/// The transition table.
pub fn transition(phase: Phase, satisfied: bool) -> Phase {
    match (phase, satisfied) {
        (Phase::Init, _) => Phase::ContextRequirements,
        (Phase::Complete, _) => Phase::Complete,
        (phase, true) => phase.successor(),
        (phase, false) => phase,
    }
}

/// Classify the state without changing it.
pub fn decide(state: &AssessmentState) -> Transition {
    let current = state.current_phase();
    match current {
        Phase::Init => Transition::Enter(transition(current, false)),
        Phase::Complete => Transition::Terminal,
        _ => {
            let satisfied = state.is_satisfied(current);
            let next = transition(current, satisfied);
            if next == current {
                Transition::Rerun(current)
            } else {
                Transition::Advance {
                    from: current,
                    to: next,
                }
            }
        }
    }
}

/// The phase the router would move the state to.
pub fn next_phase(state: &AssessmentState) -> Phase {
    decide(state).target()
}

/// Apply one routing decision: at most one phase change per call.
pub fn route(state: &mut AssessmentState) -> Transition {
    let decision = decide(state);
    match decision {
        Transition::Enter(to) => {
            tracing::info!(to = %to, "entering first phase");
            state.set_phase(to);
        }
        Transition::Advance { from, to } => {
            state.mark_phase_complete(from);
            state.set_phase(to);
            tracing::info!(from = %from, to = %to, "phase complete");
        }
        Transition::Rerun(_) | Transition::Terminal => {}
    }
    decision
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
