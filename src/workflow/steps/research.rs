use super::{
    array_schema, base_view, object_schema, parse_answer, string_list_schema, string_schema,
    InferenceStep,
};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Researches the technologies and practices relevant to the request.
pub struct ResearchStep;

impl InferenceStep for ResearchStep {
    fn phase(&self) -> Phase {
        Phase::Research
    }

    fn task(&self) -> &'static str {
        "Research the technologies, vendor guidance, and industry practices relevant to \
         the request and its requirements. Report each finding under a topic with its \
         content, any sources, and why it matters here, then summarize what the research \
         means for the decision."
    }

    fn output_schema(&self) -> Value {
        let finding = object_schema(
            &["topic", "content"],
            json!({
                "topic": string_schema(),
                "content": string_schema(),
                "sources": string_list_schema(),
                "relevance": { "type": "string" },
            }),
        );
        let mut findings = array_schema(finding);
        findings["minItems"] = json!(1);
        object_schema(
            &["research_findings", "research_summary"],
            json!({
                "research_findings": findings,
                "research_summary": string_schema(),
            }),
        )
    }

    fn view(&self, state: &AssessmentState) -> Value {
        let mut view = base_view(state);
        view.insert("requirements".to_string(), json!(state.requirements()));
        Value::Object(view)
    }

    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error> {
        parse_answer(answer).map(Fragment::Research)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        format!("{} findings", state.research_findings().len())
    }
}
