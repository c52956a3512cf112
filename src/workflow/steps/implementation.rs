use super::{
    base_view, object_schema, parse_answer, string_list_schema, string_schema, InferenceStep,
};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Plans the implementation.
pub struct ImplementationPlanStep;

impl InferenceStep for ImplementationPlanStep {
    fn phase(&self) -> Phase {
        Phase::Implementation
    }

    fn task(&self) -> &'static str {
        "Create an implementation plan for the architecture that addresses the security \
         concerns. Number the steps from 1; each step lists the orders of the steps it \
         depends on (never its own). Estimate the overall timeline and give the critical \
         path as the exact titles of steps in the plan."
    }

    fn output_schema(&self) -> Value {
        let step = object_schema(
            &["order", "title", "description"],
            json!({
                "order": { "type": "integer", "minimum": 1 },
                "title": string_schema(),
                "description": { "type": "string" },
                "estimated_effort": { "type": "string" },
                "dependencies": { "type": "array", "items": { "type": "integer", "minimum": 1 } },
                "resources_required": string_list_schema(),
                "risk_factors": string_list_schema(),
            }),
        );
        let plan = object_schema(
            &["summary", "steps", "timeline_estimate"],
            json!({
                "summary": string_schema(),
                "steps": { "type": "array", "minItems": 1, "items": step },
                "timeline_estimate": { "type": "string" },
                "critical_path": string_list_schema(),
            }),
        );
        object_schema(
            &["implementation_plan"],
            json!({ "implementation_plan": plan }),
        )
    }

    fn view(&self, state: &AssessmentState) -> Value {
        let mut view = base_view(state);
        view.insert("requirements".to_string(), json!(state.requirements()));
        view.insert(
            "architecture_solution".to_string(),
            json!(state.architecture_solution()),
        );
        view.insert(
            "security_concerns".to_string(),
            json!(state.security_concerns()),
        );
        view.insert("licensing_info".to_string(), json!(state.licensing_info()));
        Value::Object(view)
    }

    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error> {
        parse_answer(answer).map(Fragment::Implementation)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        match state.implementation_plan() {
            Some(plan) => format!("{} steps, {}", plan.steps.len(), plan.timeline_estimate),
            None => "no plan".to_string(),
        }
    }
}
