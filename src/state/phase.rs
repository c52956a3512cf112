//! Phase identifiers for the fixed assessment sequence.
use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A named stage of the assessment.
///
/// The declaration order is the execution order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    ContextRequirements,
    Research,
    Architecture,
    Security,
    Licensing,
    Implementation,
    Support,
    UserExperience,
    Cost,
    Report,
    Complete,
}

impl Phase {
    /// Every phase, in execution order.
    pub const ALL: [Phase; 12] = [
        Phase::Init,
        Phase::ContextRequirements,
        Phase::Research,
        Phase::Architecture,
        Phase::Security,
        Phase::Licensing,
        Phase::Implementation,
        Phase::Support,
        Phase::UserExperience,
        Phase::Cost,
        Phase::Report,
        Phase::Complete,
    ];

    /// Phases that run a step and can be marked complete.
    pub const WORK: [Phase; 10] = [
        Phase::ContextRequirements,
        Phase::Research,
        Phase::Architecture,
        Phase::Security,
        Phase::Licensing,
        Phase::Implementation,
        Phase::Support,
        Phase::UserExperience,
        Phase::Cost,
        Phase::Report,
    ];

    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::ContextRequirements => "context_requirements",
            Phase::Research => "research",
            Phase::Architecture => "architecture",
            Phase::Security => "security",
            Phase::Licensing => "licensing",
            Phase::Implementation => "implementation",
            Phase::Support => "support",
            Phase::UserExperience => "user_experience",
            Phase::Cost => "cost",
            Phase::Report => "report",
            Phase::Complete => "complete",
        }
    }

    /// The phase that follows this one; `Complete` is absorbing.
    pub fn successor(self) -> Phase {
        match self {
            Phase::Init => Phase::ContextRequirements,
            Phase::ContextRequirements => Phase::Research,
            Phase::Research => Phase::Architecture,
            Phase::Architecture => Phase::Security,
            Phase::Security => Phase::Licensing,
            Phase::Licensing => Phase::Implementation,
            Phase::Implementation => Phase::Support,
            Phase::Support => Phase::UserExperience,
            Phase::UserExperience => Phase::Cost,
            Phase::Cost => Phase::Report,
            Phase::Report => Phase::Complete,
            Phase::Complete => Phase::Complete,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Complete
    }

    /// True for phases that own a fragment and run a step.
    pub fn is_work(self) -> bool {
        !matches!(self, Phase::Init | Phase::Complete)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Phase::ALL
            .into_iter()
            .find(|phase| phase.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownPhase(raw.to_string()))
    }
}
