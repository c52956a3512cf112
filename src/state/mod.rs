//! The assessment state: the single aggregate threaded through a run.
//!
//! Fields are private. Steps contribute through [`AssessmentState::apply_fragment`],
//! which validates a whole [`Fragment`] before assigning any of it, and the
//! router moves the phase through crate-internal setters.
mod error;
mod fragment;
mod phase;
mod records;

pub use error::ValidationError;
pub use fragment::{
    ArchitectureFragment, ContextFragment, CostFragment, Fragment, ImplementationFragment,
    LicensingFragment, ReportFragment, ResearchFragment, SecurityFragment, SupportFragment,
    UserExperienceFragment,
};
pub use phase::Phase;
pub use records::{
    AdoptionPhase, AdoptionPlan, ArchitectureComponent, ArchitectureSolution, ChangeImpact,
    CostEstimate, ImplementationPlan, ImplementationStep, LicensingInfo, LicensingOption,
    MaintenanceTask, OperationalImpact, OrganizationContext, Requirement, RequirementPriority,
    ResearchFinding, SecurityConcern, Severity, SupportRequirement, TrainingNeed, UserImpact,
};

use crate::util::now_epoch_ms;
use error::{optional_text, require_text};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Category of a recorded run error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The collaborator failed or answered with something unparsable.
    Inference,
    /// The answer parsed but broke a fragment invariant.
    Validation,
    /// The executor hit its iteration cap.
    Stall,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Inference => "inference",
            ErrorKind::Validation => "validation",
            ErrorKind::Stall => "stall",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub phase: Phase,
    pub kind: ErrorKind,
    pub message: String,
    pub at_epoch_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentState {
    assessment_request: String,
    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    project_name: Option<String>,

    #[serde(default)]
    requirements: Vec<Requirement>,
    #[serde(default)]
    organization_context: Option<OrganizationContext>,
    #[serde(default)]
    follow_up_questions: Vec<String>,

    #[serde(default)]
    research_findings: Vec<ResearchFinding>,
    #[serde(default)]
    research_summary: Option<String>,

    #[serde(default)]
    architecture_solution: Option<ArchitectureSolution>,

    #[serde(default)]
    security_concerns: Vec<SecurityConcern>,
    #[serde(default)]
    security_summary: Option<String>,

    #[serde(default)]
    licensing_info: Option<LicensingInfo>,
    #[serde(default)]
    licensing_options: Vec<LicensingOption>,
    #[serde(default)]
    recommended_licensing: Option<String>,

    #[serde(default)]
    implementation_plan: Option<ImplementationPlan>,

    #[serde(default)]
    support_requirements: Vec<SupportRequirement>,
    #[serde(default)]
    operational_impacts: Vec<OperationalImpact>,
    #[serde(default)]
    maintenance_tasks: Vec<MaintenanceTask>,
    #[serde(default)]
    support_summary: Option<String>,

    #[serde(default)]
    user_impacts: Vec<UserImpact>,
    #[serde(default)]
    training_needs: Vec<TrainingNeed>,
    #[serde(default)]
    adoption_plan: Option<AdoptionPlan>,
    #[serde(default)]
    change_impacts: Vec<ChangeImpact>,
    #[serde(default)]
    user_experience_summary: Option<String>,

    #[serde(default)]
    cost_estimates: Vec<CostEstimate>,
    #[serde(default)]
    total_cost_estimate: Option<f64>,
    #[serde(default)]
    roi_analysis: Option<String>,

    #[serde(default)]
    final_report: Option<String>,
    #[serde(default)]
    final_report_data: Option<Value>,

    current_phase: Phase,
    #[serde(default)]
    completed_phases: Vec<Phase>,
    #[serde(default)]
    errors: Vec<ErrorRecord>,
    created_at: u64,
    updated_at: u64,
    version: u32,
}

impl AssessmentState {
    /// Create a fresh state at `init` holding only the request and labels.
    pub fn new(
        assessment_request: impl Into<String>,
        client_name: Option<String>,
        project_name: Option<String>,
    ) -> Result<Self, ValidationError> {
        let assessment_request = assessment_request.into();
        require_text(&assessment_request, "assessment request")?;
        optional_text(client_name.as_deref(), "client name")?;
        optional_text(project_name.as_deref(), "project name")?;
        let now = now_epoch_ms();
        Ok(AssessmentState {
            assessment_request,
            client_name,
            project_name,
            requirements: Vec::new(),
            organization_context: None,
            follow_up_questions: Vec::new(),
            research_findings: Vec::new(),
            research_summary: None,
            architecture_solution: None,
            security_concerns: Vec::new(),
            security_summary: None,
            licensing_info: None,
            licensing_options: Vec::new(),
            recommended_licensing: None,
            implementation_plan: None,
            support_requirements: Vec::new(),
            operational_impacts: Vec::new(),
            maintenance_tasks: Vec::new(),
            support_summary: None,
            user_impacts: Vec::new(),
            training_needs: Vec::new(),
            adoption_plan: None,
            change_impacts: Vec::new(),
            user_experience_summary: None,
            cost_estimates: Vec::new(),
            total_cost_estimate: None,
            roi_analysis: None,
            final_report: None,
            final_report_data: None,
            current_phase: Phase::Init,
            completed_phases: Vec::new(),
            errors: Vec::new(),
            created_at: now,
            updated_at: now,
            version: STATE_SCHEMA_VERSION,
        })
    }

    /// Validate `fragment` and assign every field it owns, replacing prior values.
    ///
    /// Nothing is assigned when validation fails. The fragment's phase must be
    /// the current phase; on success that phase is marked complete.
    pub fn apply_fragment(&mut self, fragment: Fragment) -> Result<(), ValidationError> {
        fragment.validate()?;
        let phase = fragment.phase();
        if phase != self.current_phase {
            return Err(ValidationError::PhaseMismatch {
                fragment: phase,
                current: self.current_phase,
            });
        }

        match fragment {
            Fragment::Context(fragment) => {
                self.requirements = fragment.requirements;
                self.organization_context = fragment.organization_context;
                self.follow_up_questions = fragment.follow_up_questions;
            }
            Fragment::Research(fragment) => {
                self.research_findings = fragment.research_findings;
                self.research_summary = Some(fragment.research_summary);
            }
            Fragment::Architecture(fragment) => {
                self.architecture_solution = Some(fragment.architecture_solution);
            }
            Fragment::Security(fragment) => {
                self.security_concerns = fragment.security_concerns;
                self.security_summary = Some(fragment.security_summary);
            }
            Fragment::Licensing(fragment) => {
                self.licensing_info = Some(fragment.licensing_info);
                self.licensing_options = fragment.licensing_options;
                self.recommended_licensing = fragment.recommended_licensing;
            }
            Fragment::Implementation(fragment) => {
                self.implementation_plan = Some(fragment.implementation_plan);
            }
            Fragment::Support(fragment) => {
                self.support_requirements = fragment.support_requirements;
                self.operational_impacts = fragment.operational_impacts;
                self.maintenance_tasks = fragment.maintenance_tasks;
                self.support_summary = Some(fragment.support_summary);
            }
            Fragment::UserExperience(fragment) => {
                self.user_impacts = fragment.user_impacts;
                self.training_needs = fragment.training_needs;
                self.adoption_plan = Some(fragment.adoption_plan);
                self.change_impacts = fragment.change_impacts;
                self.user_experience_summary = Some(fragment.user_experience_summary);
            }
            Fragment::Cost(fragment) => {
                self.total_cost_estimate = Some(fragment.resolved_total());
                self.cost_estimates = fragment.cost_estimates;
                self.roi_analysis = Some(fragment.roi_analysis);
            }
            Fragment::Report(fragment) => {
                self.final_report = Some(fragment.final_report);
                self.final_report_data = Some(fragment.final_report_data);
            }
        }
        self.mark_phase_complete(phase);
        self.touch();
        Ok(())
    }

    /// Append `phase` to the completed list unless it is already there.
    ///
    /// Returns whether the list changed. Sentinel phases are never recorded.
    pub fn mark_phase_complete(&mut self, phase: Phase) -> bool {
        if !phase.is_work() || self.completed_phases.contains(&phase) {
            return false;
        }
        self.completed_phases.push(phase);
        self.touch();
        true
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        if self.current_phase != phase {
            self.current_phase = phase;
            self.touch();
        }
    }

    pub fn record_error(&mut self, phase: Phase, kind: ErrorKind, message: impl Into<String>) {
        let at_epoch_ms = now_epoch_ms();
        self.errors.push(ErrorRecord {
            phase,
            kind,
            message: message.into(),
            at_epoch_ms,
        });
        self.touch();
    }

    /// Refresh `updated_at`; it never moves backwards.
    pub fn touch(&mut self) {
        self.updated_at = self.updated_at.max(now_epoch_ms());
    }

    /// Whether the fields `phase` is responsible for are present.
    ///
    /// `init` and `complete` own nothing and are always satisfied.
    pub fn is_satisfied(&self, phase: Phase) -> bool {
        match phase {
            Phase::Init | Phase::Complete => true,
            Phase::ContextRequirements => !self.requirements.is_empty(),
            Phase::Research => {
                !self.research_findings.is_empty() && self.research_summary.is_some()
            }
            Phase::Architecture => self.architecture_solution.is_some(),
            Phase::Security => self.security_summary.is_some(),
            Phase::Licensing => self.licensing_info.is_some(),
            Phase::Implementation => self.implementation_plan.is_some(),
            Phase::Support => self.support_summary.is_some(),
            Phase::UserExperience => self.user_experience_summary.is_some(),
            Phase::Cost => self.roi_analysis.is_some(),
            Phase::Report => self.final_report.is_some(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.current_phase.is_terminal()
    }

    pub fn is_phase_completed(&self, phase: Phase) -> bool {
        self.completed_phases.contains(&phase)
    }

    /// Re-check every invariant of a state that did not come from [`AssessmentState::new`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version != STATE_SCHEMA_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.version,
                expected: STATE_SCHEMA_VERSION,
            });
        }
        require_text(&self.assessment_request, "assessment request")?;
        optional_text(self.client_name.as_deref(), "client name")?;
        optional_text(self.project_name.as_deref(), "project name")?;
        self.validate_fields()?;
        self.validate_completed_phases()
    }

    fn validate_fields(&self) -> Result<(), ValidationError> {
        for requirement in &self.requirements {
            requirement.validate()?;
        }
        if let Some(context) = &self.organization_context {
            context.validate()?;
        }
        for finding in &self.research_findings {
            finding.validate()?;
        }
        if let Some(solution) = &self.architecture_solution {
            solution.validate()?;
        }
        for concern in &self.security_concerns {
            concern.validate()?;
        }
        if let Some(info) = &self.licensing_info {
            info.validate()?;
        }
        for option in &self.licensing_options {
            option.validate()?;
        }
        if let Some(plan) = &self.implementation_plan {
            plan.validate()?;
        }
        for requirement in &self.support_requirements {
            requirement.validate()?;
        }
        for impact in &self.operational_impacts {
            impact.validate()?;
        }
        for task in &self.maintenance_tasks {
            task.validate()?;
        }
        for impact in &self.user_impacts {
            impact.validate()?;
        }
        for need in &self.training_needs {
            need.validate()?;
        }
        if let Some(plan) = &self.adoption_plan {
            plan.validate()?;
        }
        for impact in &self.change_impacts {
            impact.validate()?;
        }
        for estimate in &self.cost_estimates {
            estimate.validate()?;
        }
        if let Some(total) = self.total_cost_estimate {
            records::validate_amount(total, "total cost estimate")?;
        }
        Ok(())
    }

    /// Completed phases form the in-order prefix of work phases up to the
    /// current phase, and each one's fields are present.
    fn validate_completed_phases(&self) -> Result<(), ValidationError> {
        let mut previous: Option<Phase> = None;
        for phase in &self.completed_phases {
            if !phase.is_work() {
                return Err(ValidationError::InconsistentPhases(format!(
                    "{phase} cannot be completed"
                )));
            }
            if previous.is_some_and(|prev| prev >= *phase) {
                return Err(ValidationError::InconsistentPhases(format!(
                    "{phase} is duplicated or out of order"
                )));
            }
            if *phase > self.current_phase {
                return Err(ValidationError::InconsistentPhases(format!(
                    "{phase} is completed but the assessment is at {}",
                    self.current_phase
                )));
            }
            if !self.is_satisfied(*phase) {
                return Err(ValidationError::InconsistentPhases(format!(
                    "{phase} is completed but its fields are missing"
                )));
            }
            previous = Some(*phase);
        }
        if let Some(missing) = Phase::WORK
            .into_iter()
            .filter(|phase| *phase < self.current_phase)
            .find(|phase| !self.completed_phases.contains(phase))
        {
            return Err(ValidationError::InconsistentPhases(format!(
                "{missing} was passed without being completed"
            )));
        }
        Ok(())
    }

    pub fn assessment_request(&self) -> &str {
        &self.assessment_request
    }

    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn organization_context(&self) -> Option<&OrganizationContext> {
        self.organization_context.as_ref()
    }

    pub fn follow_up_questions(&self) -> &[String] {
        &self.follow_up_questions
    }

    pub fn research_findings(&self) -> &[ResearchFinding] {
        &self.research_findings
    }

    pub fn research_summary(&self) -> Option<&str> {
        self.research_summary.as_deref()
    }

    pub fn architecture_solution(&self) -> Option<&ArchitectureSolution> {
        self.architecture_solution.as_ref()
    }

    pub fn security_concerns(&self) -> &[SecurityConcern] {
        &self.security_concerns
    }

    pub fn security_summary(&self) -> Option<&str> {
        self.security_summary.as_deref()
    }

    pub fn licensing_info(&self) -> Option<&LicensingInfo> {
        self.licensing_info.as_ref()
    }

    pub fn licensing_options(&self) -> &[LicensingOption] {
        &self.licensing_options
    }

    pub fn recommended_licensing(&self) -> Option<&str> {
        self.recommended_licensing.as_deref()
    }

    pub fn implementation_plan(&self) -> Option<&ImplementationPlan> {
        self.implementation_plan.as_ref()
    }

    pub fn support_requirements(&self) -> &[SupportRequirement] {
        &self.support_requirements
    }

    pub fn operational_impacts(&self) -> &[OperationalImpact] {
        &self.operational_impacts
    }

    pub fn maintenance_tasks(&self) -> &[MaintenanceTask] {
        &self.maintenance_tasks
    }

    pub fn support_summary(&self) -> Option<&str> {
        self.support_summary.as_deref()
    }

    pub fn user_impacts(&self) -> &[UserImpact] {
        &self.user_impacts
    }

    pub fn training_needs(&self) -> &[TrainingNeed] {
        &self.training_needs
    }

    pub fn adoption_plan(&self) -> Option<&AdoptionPlan> {
        self.adoption_plan.as_ref()
    }

    pub fn change_impacts(&self) -> &[ChangeImpact] {
        &self.change_impacts
    }

    pub fn user_experience_summary(&self) -> Option<&str> {
        self.user_experience_summary.as_deref()
    }

    pub fn cost_estimates(&self) -> &[CostEstimate] {
        &self.cost_estimates
    }

    pub fn total_cost_estimate(&self) -> Option<f64> {
        self.total_cost_estimate
    }

    pub fn roi_analysis(&self) -> Option<&str> {
        self.roi_analysis.as_deref()
    }

    pub fn final_report(&self) -> Option<&str> {
        self.final_report.as_deref()
    }

    pub fn final_report_data(&self) -> Option<&Value> {
        self.final_report_data.as_ref()
    }

    pub fn current_phase(&self) -> Phase {
        self.current_phase
    }

    pub fn completed_phases(&self) -> &[Phase] {
        &self.completed_phases
    }

    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn updated_at(&self) -> u64 {
        self.updated_at
    }

    pub fn version(&self) -> u32 {
        self.version
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
