use anyhow::{anyhow, Context, Result};
use clap::Parser;
use euc_assess::cli::{Command, ReportArgs, RootArgs, RunArgs, StatusArgs};
use euc_assess::config::{
    build_inference, resolve_config, user_config_path, ConfigSources, LM_COMMAND_ENV,
};
use euc_assess::persist::{
    append_history, default_runs_dir, load_snapshot, write_report, write_snapshot, HistoryEntry,
    RunPaths,
};
use euc_assess::report::{MarkdownReport, ReportRenderer};
use euc_assess::state::{AssessmentState, Phase};
use euc_assess::workflow::{
    append_step_log, next_phase, run_assessment, Executor, RunOutcome, RunResult,
};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info";

fn main() -> Result<()> {
    let args = RootArgs::parse();
    match args.command {
        Command::Run(run) => run_command(run, args.verbose),
        Command::Status(status) => {
            init_tracing(args.verbose, None);
            status_command(status)
        }
        Command::Report(report) => {
            init_tracing(args.verbose, None);
            report_command(report)
        }
    }
}

/// RUST_LOG wins, then --verbose, then the config file's filter.
fn init_tracing(verbose: bool, config_filter: Option<&str>) {
    let fallback = if verbose {
        "debug"
    } else {
        config_filter.unwrap_or(DEFAULT_LOG_FILTER)
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run_command(args: RunArgs, verbose: bool) -> Result<()> {
    let request = match (&args.request.request, &args.request.request_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => {
            fs::read_to_string(path).with_context(|| format!("read request {}", path.display()))?
        }
        (None, None) => return Err(anyhow!("pass --request or --request-file")),
    };

    let resolved = resolve_config(&ConfigSources {
        config_path: args.config.clone(),
        user_config_path: user_config_path(),
        env_lm_command: std::env::var(LM_COMMAND_ENV).ok(),
        lm: args.lm.clone(),
        responses: args.responses.clone(),
        max_iterations: args.max_iterations,
    })?;
    init_tracing(verbose, resolved.log_filter.as_deref());
    if let Some(source) = &resolved.source {
        tracing::debug!(config = %source.display(), "loaded config");
    }

    let inference = build_inference(&resolved.provider)?;
    let executor = Executor::new(inference.as_ref(), &MarkdownReport, resolved.options);
    let result = run_assessment(&executor, request.trim(), args.client, args.project)
        .context("invalid assessment request")?;

    let out_dir = match args.out {
        Some(dir) => dir,
        None => default_runs_dir()?,
    };
    let paths = RunPaths::new(out_dir);
    persist_run(&paths, &result)?;

    if args.json {
        let payload = json!({
            "outcome": result.outcome,
            "iterations": result.iterations,
            "run_dir": paths.root(),
            "state_path": paths.state_path(),
            "report_path": result.state.final_report().map(|_| paths.report_path()),
            "errors": result.state.errors(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("serialize run summary")?
        );
    } else {
        print_run_summary(&paths, &result);
    }

    match result.outcome {
        RunOutcome::Complete => Ok(()),
        RunOutcome::Stalled { phase, iterations } => Err(anyhow!(
            "assessment stalled at {phase} after {iterations} iterations (state saved to {})",
            paths.state_path().display()
        )),
    }
}

/// Write every run artifact; a stalled run is persisted the same way.
fn persist_run(paths: &RunPaths, result: &RunResult) -> Result<()> {
    let snapshot = write_snapshot(paths, &result.state)?;
    if let Some(report) = result.state.final_report() {
        write_report(paths, report)?;
    }
    append_step_log(paths, &result.steps)?;
    append_history(
        paths,
        &HistoryEntry::new(&result.state, result.outcome, result.iterations, &snapshot),
    )?;
    Ok(())
}

fn print_run_summary(paths: &RunPaths, result: &RunResult) {
    let state = &result.state;
    match result.outcome {
        RunOutcome::Complete => println!("status: complete"),
        RunOutcome::Stalled { phase, .. } => println!("status: stalled at {phase}"),
    }
    println!("iterations: {}", result.iterations);
    println!(
        "completed: {}/{}",
        state.completed_phases().len(),
        Phase::WORK.len()
    );
    if !state.errors().is_empty() {
        println!("errors: {}", state.errors().len());
    }
    println!("state: {}", paths.state_path().display());
    if state.final_report().is_some() {
        println!("report: {}", paths.report_path().display());
    }
}

fn status_command(args: StatusArgs) -> Result<()> {
    let state = load_snapshot(&args.state)?;
    let next = next_phase(&state);
    if args.json {
        let payload = json!({
            "current_phase": state.current_phase(),
            "completed_phases": state.completed_phases(),
            "next_phase": next,
            "complete": state.is_complete(),
            "errors": state.errors(),
            "updated_at": state.updated_at(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("serialize status")?
        );
        return Ok(());
    }
    print_status(&state, next);
    Ok(())
}

fn print_status(state: &AssessmentState, next: Phase) {
    println!("request: {}", state.assessment_request());
    println!("current phase: {}", state.current_phase());
    let completed: Vec<&str> = state
        .completed_phases()
        .iter()
        .map(|phase| phase.as_str())
        .collect();
    if completed.is_empty() {
        println!("completed: none");
    } else {
        println!("completed: {}", completed.join(", "));
    }
    println!("next phase: {next}");
    for error in state.errors() {
        println!("error [{}] {}: {}", error.kind, error.phase, error.message);
    }
}

fn report_command(args: ReportArgs) -> Result<()> {
    let state = load_snapshot(&args.state)?;
    let report = MarkdownReport
        .render(&state)
        .map_err(|err| anyhow!("render report: {err}"))?;
    match args.out.as_deref() {
        Some(path) => write_text(path, &report),
        None => {
            print!("{report}");
            Ok(())
        }
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))
}
