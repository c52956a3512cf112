use super::{
    array_schema, base_view, object_schema, parse_answer, severity_schema, string_schema,
    InferenceStep,
};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Reviews the architecture for security implications.
pub struct SecurityStep;

impl InferenceStep for SecurityStep {
    fn phase(&self) -> Phase {
        Phase::Security
    }

    fn task(&self) -> &'static str {
        "Analyze the security implications of the proposed architecture: data \
         protection, identity and access, endpoint and network security, and the \
         organization's compliance obligations. List each concern with a severity \
         and a mitigation, then give an overall security summary."
    }

    fn output_schema(&self) -> Value {
        let concern = object_schema(
            &["description", "severity"],
            json!({
                "description": string_schema(),
                "severity": severity_schema(),
                "mitigation": { "type": "string" },
            }),
        );
        object_schema(
            &["security_summary"],
            json!({
                "security_concerns": array_schema(concern),
                "security_summary": string_schema(),
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
        Value::Object(view)
    }

    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error> {
        parse_answer(answer).map(Fragment::Security)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        format!("{} concerns", state.security_concerns().len())
    }
}
