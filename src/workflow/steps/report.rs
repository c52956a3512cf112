use crate::report::{report_data, ReportRenderer};
use crate::state::{AssessmentState, ErrorKind, Fragment, Phase, ReportFragment};
use crate::workflow::step_log::{StepLogBuilder, StepLogEntry};

/// Render the final report locally and apply it as the report fragment.
pub fn run_report_step(
    state: &mut AssessmentState,
    renderer: &dyn ReportRenderer,
    iteration: u32,
) -> StepLogEntry {
    let mut log = StepLogBuilder::new(iteration, Phase::Report, "renderer");
    log.attempt();

    let applied = renderer
        .render(state)
        .map_err(|err| format!("render report: {err}"))
        .and_then(|final_report| {
            let final_report_data = report_data(state);
            state
                .apply_fragment(Fragment::Report(ReportFragment {
                    final_report,
                    final_report_data,
                }))
                .map_err(|err| format!("report failed validation: {err}"))
        });

    match applied {
        Ok(()) => {
            let bytes = state.final_report().map(str::len).unwrap_or(0);
            tracing::info!(report_bytes = bytes, "report rendered");
            log.success(format!("{bytes} bytes"))
        }
        Err(message) => {
            tracing::warn!(error = %message, "report step degraded");
            state.record_error(Phase::Report, ErrorKind::Validation, message.clone());
            log.failed(message)
        }
    }
}
