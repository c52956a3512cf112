use super::{
    array_schema, base_view, object_schema, parse_answer, string_list_schema, string_schema,
    InferenceStep,
};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Designs the solution architecture.
pub struct ArchitectureStep;

impl InferenceStep for ArchitectureStep {
    fn phase(&self) -> Phase {
        Phase::Architecture
    }

    fn task(&self) -> &'static str {
        "Design a solution architecture that meets the requirements, informed by the \
         research. Give an overview, the components (each with a unique name, a \
         description, its purpose, and the names of components it depends on), a short \
         description of how they connect, and key design considerations."
    }

    fn output_schema(&self) -> Value {
        let component = object_schema(
            &["name", "description", "purpose"],
            json!({
                "name": string_schema(),
                "description": { "type": "string" },
                "purpose": { "type": "string" },
                "dependencies": string_list_schema(),
            }),
        );
        let solution = object_schema(
            &["overview"],
            json!({
                "overview": string_schema(),
                "components": array_schema(component),
                "diagram_description": { "type": "string" },
                "considerations": { "type": "string" },
            }),
        );
        object_schema(
            &["architecture_solution"],
            json!({ "architecture_solution": solution }),
        )
    }

    fn view(&self, state: &AssessmentState) -> Value {
        let mut view = base_view(state);
        view.insert("requirements".to_string(), json!(state.requirements()));
        view.insert(
            "research_findings".to_string(),
            json!(state.research_findings()),
        );
        view.insert(
            "research_summary".to_string(),
            json!(state.research_summary()),
        );
        Value::Object(view)
    }

    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error> {
        parse_answer(answer).map(Fragment::Architecture)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        let components = state
            .architecture_solution()
            .map(|solution| solution.components.len())
            .unwrap_or(0);
        format!("{components} components")
    }
}
