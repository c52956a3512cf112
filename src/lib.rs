//! Phase-driven feasibility assessments for end user computing decisions.
//!
//! An [`state::AssessmentState`] moves through a fixed sequence of phases.
//! The [`workflow`] router picks the next phase, an inference step asks the
//! configured collaborator for that phase's fragment, and the validated
//! fragment is merged into the state. The final phase renders a report.
pub mod cli;
pub mod config;
pub mod inference;
pub mod persist;
pub mod report;
pub mod state;
pub mod util;
pub mod workflow;

#[cfg(test)]
mod testing;
