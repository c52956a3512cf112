use super::{
    array_schema, base_view, object_schema, parse_answer, string_list_schema, string_schema,
    InferenceStep,
};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Works out the licensing model, options, and a recommendation.
pub struct LicensingStep;

impl InferenceStep for LicensingStep {
    fn phase(&self) -> Phase {
        Phase::Licensing
    }

    fn task(&self) -> &'static str {
        "Determine the licensing model the architecture requires, its costs and \
         constraints, and recommendations. Compare the realistic licensing options \
         with pros and cons. If you recommend one, name it exactly as it appears in \
         the options."
    }

    fn output_schema(&self) -> Value {
        let info = object_schema(
            &["model"],
            json!({
                "model": string_schema(),
                "costs": { "type": "string" },
                "constraints": { "type": "string" },
                "recommendations": { "type": "string" },
            }),
        );
        let option = object_schema(
            &["name", "description", "cost_estimate"],
            json!({
                "name": string_schema(),
                "description": { "type": "string" },
                "cost_estimate": { "type": "string" },
                "pros": string_list_schema(),
                "cons": string_list_schema(),
            }),
        );
        object_schema(
            &["licensing_info"],
            json!({
                "licensing_info": info,
                "licensing_options": array_schema(option),
                "recommended_licensing": string_schema(),
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
        parse_answer(answer).map(Fragment::Licensing)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        match state.recommended_licensing() {
            Some(recommended) => format!(
                "{} options, recommended {recommended}",
                state.licensing_options().len()
            ),
            None => format!("{} options", state.licensing_options().len()),
        }
    }
}
