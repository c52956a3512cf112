//! Leaf records contributed by the assessment steps.
//!
//! Every record derives serde so collaborator answers parse straight into it,
//! and exposes `validate` for the field-level invariants serde cannot express.
//! Constructors run the same checks, so a record built through `new` is valid.
use super::error::{optional_text, require_items, require_text};
use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Severity of a concern or impact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            _ => Err(ValidationError::InvalidSeverity(raw.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

/// Priority of a gathered requirement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum RequirementPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl RequirementPriority {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequirementPriority::High => "high",
            RequirementPriority::Medium => "medium",
            RequirementPriority::Low => "low",
        }
    }
}

impl fmt::Display for RequirementPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequirementPriority {
    type Err = ValidationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(RequirementPriority::High),
            "medium" => Ok(RequirementPriority::Medium),
            "low" => Ok(RequirementPriority::Low),
            _ => Err(ValidationError::InvalidPriority(raw.to_string())),
        }
    }
}

impl TryFrom<String> for RequirementPriority {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

// ---------------------------------------------------------------------------
// Context & requirements
// ---------------------------------------------------------------------------

/// A specific requirement extracted from the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub description: String,
    #[serde(default)]
    pub priority: RequirementPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Requirement {
    pub fn new(
        description: impl Into<String>,
        priority: &str,
        notes: Option<String>,
    ) -> Result<Self, ValidationError> {
        let requirement = Requirement {
            description: description.into(),
            priority: priority.parse()?,
            notes,
        };
        requirement.validate()?;
        Ok(requirement)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.description, "requirement description")
    }
}

/// Organization-specific context for the assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganizationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub current_tech_stack: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compliance_requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl OrganizationContext {
    pub fn validate(&self) -> Result<(), ValidationError> {
        optional_text(self.industry.as_deref(), "industry")
    }

    pub fn is_empty(&self) -> bool {
        self == &OrganizationContext::default()
    }
}

// ---------------------------------------------------------------------------
// Research
// ---------------------------------------------------------------------------

/// A research finding for one investigated topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchFinding {
    pub topic: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<String>,
}

impl ResearchFinding {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.topic, "research finding topic")?;
        require_text(&self.content, "research finding content")
    }
}

// ---------------------------------------------------------------------------
// Architecture
// ---------------------------------------------------------------------------

/// A component of the proposed solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureComponent {
    pub name: String,
    pub description: String,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl ArchitectureComponent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, "component name")
    }
}

/// The complete architecture proposed for the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSolution {
    pub overview: String,
    #[serde(default)]
    pub components: Vec<ArchitectureComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub considerations: Option<String>,
}

impl ArchitectureSolution {
    pub fn new(
        overview: impl Into<String>,
        components: Vec<ArchitectureComponent>,
    ) -> Result<Self, ValidationError> {
        let solution = ArchitectureSolution {
            overview: overview.into(),
            components,
            diagram_description: None,
            considerations: None,
        };
        solution.validate()?;
        Ok(solution)
    }

    /// Component names must be non-empty and unique within the solution.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.overview, "architecture overview")?;
        let mut seen = BTreeSet::new();
        for component in &self.components {
            component.validate()?;
            if !seen.insert(component.name.as_str()) {
                return Err(ValidationError::DuplicateComponent(component.name.clone()));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Security
// ---------------------------------------------------------------------------

/// A security concern raised against the proposed architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConcern {
    pub description: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation: Option<String>,
}

impl SecurityConcern {
    /// Build a concern; severity is matched case-insensitively and stored lowercase.
    pub fn new(
        description: impl Into<String>,
        severity: &str,
        mitigation: Option<String>,
    ) -> Result<Self, ValidationError> {
        let concern = SecurityConcern {
            description: description.into(),
            severity: severity.parse()?,
            mitigation,
        };
        concern.validate()?;
        Ok(concern)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.description, "security concern description")
    }
}

// ---------------------------------------------------------------------------
// Licensing
// ---------------------------------------------------------------------------

/// Licensing model and its implications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicensingInfo {
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub costs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
}

impl LicensingInfo {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.model, "licensing model")
    }
}

/// One licensing option considered by the licensing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicensingOption {
    pub name: String,
    pub description: String,
    pub cost_estimate: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pros: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cons: Vec<String>,
}

impl LicensingOption {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, "licensing option name")
    }
}

// ---------------------------------------------------------------------------
// Implementation
// ---------------------------------------------------------------------------

/// A single step of the implementation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationStep {
    pub order: i64,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_effort: Option<String>,
    /// Orders of the steps this one depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risk_factors: Vec<String>,
}

impl ImplementationStep {
    pub fn new(
        order: i64,
        title: impl Into<String>,
        description: impl Into<String>,
        dependencies: Vec<i64>,
    ) -> Result<Self, ValidationError> {
        let step = ImplementationStep {
            order,
            title: title.into(),
            description: description.into(),
            estimated_effort: None,
            dependencies,
            resources_required: Vec::new(),
            risk_factors: Vec::new(),
        };
        step.validate()?;
        Ok(step)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order <= 0 {
            return Err(ValidationError::NonPositiveOrder(self.order));
        }
        if self.dependencies.contains(&self.order) {
            return Err(ValidationError::SelfDependency(self.order));
        }
        require_text(&self.title, "implementation step title")
    }
}

/// The implementation plan with its critical path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplementationPlan {
    pub summary: String,
    pub steps: Vec<ImplementationStep>,
    pub timeline_estimate: String,
    /// Titles of steps on the critical path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub critical_path: Vec<String>,
}

impl ImplementationPlan {
    pub fn new(
        summary: impl Into<String>,
        steps: Vec<ImplementationStep>,
        timeline_estimate: impl Into<String>,
        critical_path: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let plan = ImplementationPlan {
            summary: summary.into(),
            steps,
            timeline_estimate: timeline_estimate.into(),
            critical_path,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Steps must be valid and every critical-path entry must name one of them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.summary, "implementation summary")?;
        require_items(&self.steps, "implementation steps")?;
        for step in &self.steps {
            step.validate()?;
        }
        let titles: BTreeSet<&str> = self.steps.iter().map(|step| step.title.as_str()).collect();
        if let Some(missing) = self
            .critical_path
            .iter()
            .find(|item| !titles.contains(item.as_str()))
        {
            return Err(ValidationError::UnknownCriticalPathItem(missing.clone()));
        }
        Ok(())
    }

    /// Steps sorted by their declared order.
    pub fn ordered_steps(&self) -> Vec<&ImplementationStep> {
        let mut steps: Vec<&ImplementationStep> = self.steps.iter().collect();
        steps.sort_by_key(|step| step.order);
        steps
    }
}

// ---------------------------------------------------------------------------
// Support & operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources_needed: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub training_requirements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ongoing_effort: Option<String>,
}

impl SupportRequirement {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.description, "support requirement description")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalImpact {
    pub area: String,
    pub description: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mitigation_strategy: Option<String>,
}

impl OperationalImpact {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.area, "operational impact area")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub task: String,
    pub frequency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_effort: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources_required: Vec<String>,
}

impl MaintenanceTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.task, "maintenance task")?;
        require_text(&self.frequency, "maintenance task frequency")
    }
}

// ---------------------------------------------------------------------------
// User experience & enablement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserImpact {
    pub user_group: String,
    pub impact_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_needs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_management: Option<String>,
}

impl UserImpact {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.user_group, "user group")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingNeed {
    pub topic: String,
    pub description: String,
    pub target_audience: Vec<String>,
    pub delivery_method: String,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
}

impl TrainingNeed {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.topic, "training topic")?;
        require_items(&self.target_audience, "training target audience")
    }
}

/// One phase of the adoption plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionPhase {
    pub phase: String,
    pub description: String,
    pub timeline: String,
    pub activities: Vec<String>,
    pub success_metrics: Vec<String>,
}

impl AdoptionPhase {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.phase, "adoption phase name")?;
        require_items(&self.activities, "adoption phase activities")?;
        require_items(&self.success_metrics, "adoption phase success metrics")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionPlan {
    pub phases: Vec<AdoptionPhase>,
    pub communication_strategy: String,
    pub feedback_mechanisms: Vec<String>,
}

impl AdoptionPlan {
    pub fn new(
        phases: Vec<AdoptionPhase>,
        communication_strategy: impl Into<String>,
        feedback_mechanisms: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let plan = AdoptionPlan {
            phases,
            communication_strategy: communication_strategy.into(),
            feedback_mechanisms,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_items(&self.phases, "adoption plan phases")?;
        require_items(
            &self.feedback_mechanisms,
            "adoption plan feedback mechanisms",
        )?;
        for phase in &self.phases {
            phase.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeImpact {
    pub area: String,
    pub description: String,
    pub severity: Severity,
    pub mitigation_strategy: String,
}

impl ChangeImpact {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.area, "change impact area")
    }
}

// ---------------------------------------------------------------------------
// Cost & value
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
}

impl CostEstimate {
    pub fn new(
        category: impl Into<String>,
        amount: Option<f64>,
        description: impl Into<String>,
        timeframe: Option<String>,
    ) -> Result<Self, ValidationError> {
        let estimate = CostEstimate {
            category: category.into(),
            amount,
            description: description.into(),
            timeframe,
        };
        estimate.validate()?;
        Ok(estimate)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.category, "cost category")?;
        if let Some(amount) = self.amount {
            validate_amount(amount, "cost amount")?;
        }
        Ok(())
    }
}

/// Amounts must be finite and non-negative.
pub(crate) fn validate_amount(amount: f64, field: &'static str) -> Result<(), ValidationError> {
    if !amount.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
