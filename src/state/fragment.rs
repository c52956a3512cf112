//! Per-phase fragments: the unit a step hands back to the state.
//!
//! Field names match the state fields each phase owns, so a collaborator
//! answer shaped like the output schema deserializes directly.
use super::error::{optional_text, require_items, require_text};
use super::records::{
    validate_amount, AdoptionPlan, ArchitectureSolution, ChangeImpact, CostEstimate,
    ImplementationPlan, LicensingInfo, LicensingOption, MaintenanceTask, OperationalImpact,
    OrganizationContext, Requirement, ResearchFinding, SecurityConcern, SupportRequirement,
    TrainingNeed, UserImpact,
};
use super::{Phase, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextFragment {
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub organization_context: Option<OrganizationContext>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

impl ContextFragment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_items(&self.requirements, "requirements")?;
        for requirement in &self.requirements {
            requirement.validate()?;
        }
        if let Some(context) = &self.organization_context {
            context.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResearchFragment {
    pub research_findings: Vec<ResearchFinding>,
    pub research_summary: String,
}

impl ResearchFragment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_items(&self.research_findings, "research findings")?;
        for finding in &self.research_findings {
            finding.validate()?;
        }
        require_text(&self.research_summary, "research summary")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchitectureFragment {
    pub architecture_solution: ArchitectureSolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityFragment {
    #[serde(default)]
    pub security_concerns: Vec<SecurityConcern>,
    pub security_summary: String,
}

impl SecurityFragment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for concern in &self.security_concerns {
            concern.validate()?;
        }
        require_text(&self.security_summary, "security summary")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LicensingFragment {
    pub licensing_info: LicensingInfo,
    #[serde(default)]
    pub licensing_options: Vec<LicensingOption>,
    #[serde(default)]
    pub recommended_licensing: Option<String>,
}

impl LicensingFragment {
    /// When options are listed, the recommendation must name one of them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.licensing_info.validate()?;
        for option in &self.licensing_options {
            option.validate()?;
        }
        optional_text(
            self.recommended_licensing.as_deref(),
            "recommended licensing",
        )?;
        if let Some(recommended) = &self.recommended_licensing {
            let listed = self
                .licensing_options
                .iter()
                .any(|option| option.name == *recommended);
            if !self.licensing_options.is_empty() && !listed {
                return Err(ValidationError::UnknownLicensingOption(recommended.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImplementationFragment {
    pub implementation_plan: ImplementationPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupportFragment {
    #[serde(default)]
    pub support_requirements: Vec<SupportRequirement>,
    #[serde(default)]
    pub operational_impacts: Vec<OperationalImpact>,
    #[serde(default)]
    pub maintenance_tasks: Vec<MaintenanceTask>,
    pub support_summary: String,
}

impl SupportFragment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for requirement in &self.support_requirements {
            requirement.validate()?;
        }
        for impact in &self.operational_impacts {
            impact.validate()?;
        }
        for task in &self.maintenance_tasks {
            task.validate()?;
        }
        require_text(&self.support_summary, "support summary")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserExperienceFragment {
    #[serde(default)]
    pub user_impacts: Vec<UserImpact>,
    #[serde(default)]
    pub training_needs: Vec<TrainingNeed>,
    pub adoption_plan: AdoptionPlan,
    #[serde(default)]
    pub change_impacts: Vec<ChangeImpact>,
    pub user_experience_summary: String,
}

impl UserExperienceFragment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for impact in &self.user_impacts {
            impact.validate()?;
        }
        for need in &self.training_needs {
            need.validate()?;
        }
        self.adoption_plan.validate()?;
        for impact in &self.change_impacts {
            impact.validate()?;
        }
        require_text(&self.user_experience_summary, "user experience summary")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CostFragment {
    #[serde(default)]
    pub cost_estimates: Vec<CostEstimate>,
    #[serde(default)]
    pub total_cost_estimate: Option<f64>,
    pub roi_analysis: String,
}

impl CostFragment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for estimate in &self.cost_estimates {
            estimate.validate()?;
        }
        validate_amount(self.resolved_total(), "total cost estimate")?;
        require_text(&self.roi_analysis, "ROI analysis")
    }

    /// The stated total, or the sum of the itemized amounts when none is given.
    pub fn resolved_total(&self) -> f64 {
        self.total_cost_estimate.unwrap_or_else(|| {
            self.cost_estimates
                .iter()
                .filter_map(|estimate| estimate.amount)
                .sum()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportFragment {
    pub final_report: String,
    #[serde(default)]
    pub final_report_data: Value,
}

impl ReportFragment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.final_report, "final report")
    }
}

/// A validated-on-apply bundle of every field one phase owns.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Context(ContextFragment),
    Research(ResearchFragment),
    Architecture(ArchitectureFragment),
    Security(SecurityFragment),
    Licensing(LicensingFragment),
    Implementation(ImplementationFragment),
    Support(SupportFragment),
    UserExperience(UserExperienceFragment),
    Cost(CostFragment),
    Report(ReportFragment),
}

impl Fragment {
    /// The phase that owns this fragment's fields.
    pub fn phase(&self) -> Phase {
        match self {
            Fragment::Context(_) => Phase::ContextRequirements,
            Fragment::Research(_) => Phase::Research,
            Fragment::Architecture(_) => Phase::Architecture,
            Fragment::Security(_) => Phase::Security,
            Fragment::Licensing(_) => Phase::Licensing,
            Fragment::Implementation(_) => Phase::Implementation,
            Fragment::Support(_) => Phase::Support,
            Fragment::UserExperience(_) => Phase::UserExperience,
            Fragment::Cost(_) => Phase::Cost,
            Fragment::Report(_) => Phase::Report,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Fragment::Context(fragment) => fragment.validate(),
            Fragment::Research(fragment) => fragment.validate(),
            Fragment::Architecture(fragment) => fragment.architecture_solution.validate(),
            Fragment::Security(fragment) => fragment.validate(),
            Fragment::Licensing(fragment) => fragment.validate(),
            Fragment::Implementation(fragment) => fragment.implementation_plan.validate(),
            Fragment::Support(fragment) => fragment.validate(),
            Fragment::UserExperience(fragment) => fragment.validate(),
            Fragment::Cost(fragment) => fragment.validate(),
            Fragment::Report(fragment) => fragment.validate(),
        }
    }
}
