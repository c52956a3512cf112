//! Assessment orchestration.
//!
//! The router picks the phase, a step fills it in, and the executor repeats
//! that until the state completes or the iteration cap is spent.
pub mod executor;
pub mod router;
pub mod step_log;
pub mod steps;

pub use executor::{
    run_assessment, Executor, ExecutorOptions, RunOutcome, RunResult, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MAX_RETRIES,
};
pub use router::{decide, next_phase, route, transition, Transition};
pub use step_log::{append_step_log, StepLogEntry, StepOutcome};
