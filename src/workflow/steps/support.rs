use super::{
    array_schema, base_view, object_schema, parse_answer, severity_schema, string_list_schema,
    string_schema, InferenceStep,
};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Assesses support and operational impact.
pub struct SupportStep;

impl InferenceStep for SupportStep {
    fn phase(&self) -> Phase {
        Phase::Support
    }

    fn task(&self) -> &'static str {
        "Assess what it takes to support and operate the solution once implemented: \
         support requirements for the service desk and operations teams, operational \
         impacts with severity and mitigation, recurring maintenance tasks with their \
         frequency, and a support summary."
    }

    fn output_schema(&self) -> Value {
        let requirement = object_schema(
            &["description"],
            json!({
                "category": { "type": "string" },
                "description": string_schema(),
                "priority": { "type": "string" },
                "resources_needed": string_list_schema(),
                "training_requirements": string_list_schema(),
                "ongoing_effort": { "type": "string" },
            }),
        );
        let impact = object_schema(
            &["area", "description", "severity"],
            json!({
                "area": string_schema(),
                "description": { "type": "string" },
                "severity": severity_schema(),
                "mitigation_strategy": { "type": "string" },
            }),
        );
        let task = object_schema(
            &["task", "frequency"],
            json!({
                "task": string_schema(),
                "frequency": string_schema(),
                "complexity": { "type": "string" },
                "estimated_effort": { "type": "string" },
                "required_skills": string_list_schema(),
                "resources_required": string_list_schema(),
            }),
        );
        object_schema(
            &["support_summary"],
            json!({
                "support_requirements": array_schema(requirement),
                "operational_impacts": array_schema(impact),
                "maintenance_tasks": array_schema(task),
                "support_summary": string_schema(),
            }),
        )
    }

    fn view(&self, state: &AssessmentState) -> Value {
        let mut view = base_view(state);
        view.insert(
            "architecture_solution".to_string(),
            json!(state.architecture_solution()),
        );
        view.insert(
            "implementation_plan".to_string(),
            json!(state.implementation_plan()),
        );
        Value::Object(view)
    }

    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error> {
        parse_answer(answer).map(Fragment::Support)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        format!(
            "{} support requirements, {} maintenance tasks",
            state.support_requirements().len(),
            state.maintenance_tasks().len()
        )
    }
}
