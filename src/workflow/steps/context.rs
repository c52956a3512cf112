use super::{
    base_view, object_schema, parse_answer, string_list_schema, string_schema, InferenceStep,
};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Gathers requirements and organizational context from the request.
pub struct ContextStep;

impl InferenceStep for ContextStep {
    fn phase(&self) -> Phase {
        Phase::ContextRequirements
    }

    fn task(&self) -> &'static str {
        "Analyze the assessment request and extract the concrete requirements it implies, \
         each with a priority (high, medium, or low). Capture whatever organizational \
         context the request reveals (company size, industry, current technology, \
         compliance obligations) and list follow-up questions for anything that is \
         unclear. Extract at least one requirement."
    }

    fn output_schema(&self) -> Value {
        let requirement = object_schema(
            &["description"],
            json!({
                "description": string_schema(),
                "priority": { "type": "string", "enum": ["high", "medium", "low"] },
                "notes": { "type": "string" },
            }),
        );
        let organization = object_schema(
            &[],
            json!({
                "company_size": { "type": "string" },
                "industry": string_schema(),
                "current_tech_stack": string_list_schema(),
                "compliance_requirements": string_list_schema(),
                "additional_context": { "type": "string" },
            }),
        );
        object_schema(
            &["requirements"],
            json!({
                "requirements": { "type": "array", "minItems": 1, "items": requirement },
                "organization_context": organization,
                "follow_up_questions": string_list_schema(),
            }),
        )
    }

    fn view(&self, state: &AssessmentState) -> Value {
        Value::Object(base_view(state))
    }

    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error> {
        parse_answer(answer).map(Fragment::Context)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        format!("{} requirements", state.requirements().len())
    }
}
