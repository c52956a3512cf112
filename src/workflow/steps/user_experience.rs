use super::{
    array_schema, base_view, object_schema, parse_answer, severity_schema, string_list_schema,
    string_schema, InferenceStep,
};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Plans for the people affected: impact, training, and adoption.
pub struct UserExperienceStep;

impl InferenceStep for UserExperienceStep {
    fn phase(&self) -> Phase {
        Phase::UserExperience
    }

    fn task(&self) -> &'static str {
        "Evaluate how the change affects end users. Describe the impact on each user \
         group, the training they need (with a target audience for every item), and \
         the change impacts with severity and mitigation. Propose an adoption plan \
         with at least one phase, each phase listing activities and success metrics, \
         plus a communication strategy and at least one feedback mechanism."
    }

    fn output_schema(&self) -> Value {
        let user_impact = object_schema(
            &["user_group", "impact_description"],
            json!({
                "user_group": string_schema(),
                "impact_description": { "type": "string" },
                "training_needs": { "type": "string" },
                "change_management": { "type": "string" },
            }),
        );
        let training = object_schema(
            &[
                "topic",
                "description",
                "target_audience",
                "delivery_method",
                "duration",
            ],
            json!({
                "topic": string_schema(),
                "description": { "type": "string" },
                "target_audience": { "type": "array", "minItems": 1, "items": { "type": "string" } },
                "delivery_method": { "type": "string" },
                "duration": { "type": "string" },
                "prerequisites": string_list_schema(),
            }),
        );
        let adoption_phase = object_schema(
            &[
                "phase",
                "description",
                "timeline",
                "activities",
                "success_metrics",
            ],
            json!({
                "phase": string_schema(),
                "description": { "type": "string" },
                "timeline": { "type": "string" },
                "activities": { "type": "array", "minItems": 1, "items": { "type": "string" } },
                "success_metrics": { "type": "array", "minItems": 1, "items": { "type": "string" } },
            }),
        );
        let adoption_plan = object_schema(
            &["phases", "communication_strategy", "feedback_mechanisms"],
            json!({
                "phases": { "type": "array", "minItems": 1, "items": adoption_phase },
                "communication_strategy": { "type": "string" },
                "feedback_mechanisms": { "type": "array", "minItems": 1, "items": { "type": "string" } },
            }),
        );
        let change_impact = object_schema(
            &["area", "description", "severity", "mitigation_strategy"],
            json!({
                "area": string_schema(),
                "description": { "type": "string" },
                "severity": severity_schema(),
                "mitigation_strategy": { "type": "string" },
            }),
        );
        object_schema(
            &["adoption_plan", "user_experience_summary"],
            json!({
                "user_impacts": array_schema(user_impact),
                "training_needs": array_schema(training),
                "adoption_plan": adoption_plan,
                "change_impacts": array_schema(change_impact),
                "user_experience_summary": string_schema(),
            }),
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
            "implementation_plan".to_string(),
            json!(state.implementation_plan()),
        );
        view.insert(
            "support_summary".to_string(),
            json!(state.support_summary()),
        );
        Value::Object(view)
    }

    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error> {
        parse_answer(answer).map(Fragment::UserExperience)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        let phases = state
            .adoption_plan()
            .map(|plan| plan.phases.len())
            .unwrap_or(0);
        format!(
            "{} user groups, {phases} adoption phases",
            state.user_impacts().len()
        )
    }
}
