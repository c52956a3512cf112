use super::{array_schema, base_view, object_schema, parse_answer, string_schema, InferenceStep};
use crate::state::{AssessmentState, Fragment, Phase};
use serde_json::{json, Value};

/// Estimates costs and analyzes return on investment.
///
/// The collaborator supplies itemized estimates and the ROI narrative. When it
/// omits a total, the state records the sum of the itemized amounts.
pub struct CostStep;

impl InferenceStep for CostStep {
    fn phase(&self) -> Phase {
        Phase::Cost
    }

    fn task(&self) -> &'static str {
        "Estimate the costs of the solution by category (licensing, implementation, \
         training, support, infrastructure) using the licensing, implementation, \
         support, and training findings. Give amounts as plain non-negative numbers \
         with a timeframe (one-time, monthly, annual). Then analyze the expected \
         return on investment and payback."
    }

    fn output_schema(&self) -> Value {
        let estimate = object_schema(
            &["category", "description"],
            json!({
                "category": string_schema(),
                "amount": { "type": "number", "minimum": 0 },
                "description": { "type": "string" },
                "timeframe": { "type": "string" },
            }),
        );
        object_schema(
            &["roi_analysis"],
            json!({
                "cost_estimates": array_schema(estimate),
                "total_cost_estimate": { "type": "number", "minimum": 0 },
                "roi_analysis": string_schema(),
            }),
        )
    }

    fn view(&self, state: &AssessmentState) -> Value {
        let mut view = base_view(state);
        view.insert(
            "architecture_solution".to_string(),
            json!(state.architecture_solution()),
        );
        view.insert("licensing_info".to_string(), json!(state.licensing_info()));
        view.insert(
            "licensing_options".to_string(),
            json!(state.licensing_options()),
        );
        view.insert(
            "implementation_plan".to_string(),
            json!(state.implementation_plan()),
        );
        view.insert(
            "support_requirements".to_string(),
            json!(state.support_requirements()),
        );
        view.insert("training_needs".to_string(), json!(state.training_needs()));
        Value::Object(view)
    }

    fn parse_fragment(&self, answer: Value) -> Result<Fragment, serde_json::Error> {
        parse_answer(answer).map(Fragment::Cost)
    }

    fn summary(&self, state: &AssessmentState) -> String {
        format!(
            "{} estimates, total {:.2}",
            state.cost_estimates().len(),
            state.total_cost_estimate().unwrap_or(0.0)
        )
    }
}
