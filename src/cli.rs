//! CLI argument parsing for the assessment workflow.
//!
//! The CLI only gathers inputs; config resolution and the executor live in
//! the library so tests can drive them directly.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "euca",
    version,
    about = "LM-driven feasibility assessments for end user computing decisions",
    after_help = "Examples:\n  euca run --request \"Migrate file shares to OneDrive\" --client Contoso\n  euca run --request-file ask.txt --responses tests/fixtures/onedrive --out /tmp/run\n  euca status --state /tmp/run/state.json --json\n  euca report --state /tmp/run/state.json --out /tmp/run/report.md",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log at debug level unless RUST_LOG is set
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Status(StatusArgs),
    Report(ReportArgs),
}

/// Run command inputs.
#[derive(Parser, Debug)]
#[command(about = "Run an assessment to completion and write its artifacts")]
pub struct RunArgs {
    #[command(flatten)]
    pub request: RequestSource,

    /// Client organization name
    #[arg(long, value_name = "NAME")]
    pub client: Option<String>,

    /// Project name shown in the report title
    #[arg(long, value_name = "NAME")]
    pub project: Option<String>,

    /// Run directory for state.json, report.md, and logs
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Config file (defaults to <config_dir>/euc-assess/config.json when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// LM command; the prompt is written to its stdin
    #[arg(long, value_name = "CMD", conflicts_with = "responses")]
    pub lm: Option<String>,

    /// Directory of recorded <phase>.json answers to replay
    #[arg(long, value_name = "DIR")]
    pub responses: Option<PathBuf>,

    /// Router/step cycles before the run is declared stalled
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<u32>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Exactly one way of supplying the assessment request.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct RequestSource {
    /// Assessment request text
    #[arg(long, value_name = "TEXT")]
    pub request: Option<String>,

    /// File containing the assessment request
    #[arg(long, value_name = "PATH")]
    pub request_file: Option<PathBuf>,
}

/// Status command inputs for a saved snapshot.
#[derive(Parser, Debug)]
#[command(about = "Summarize a saved assessment and its next phase")]
pub struct StatusArgs {
    /// Path to a state.json snapshot
    #[arg(long, value_name = "PATH")]
    pub state: PathBuf,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Report command inputs.
#[derive(Parser, Debug)]
#[command(about = "Render the Markdown report for a saved assessment")]
pub struct ReportArgs {
    /// Path to a state.json snapshot
    #[arg(long, value_name = "PATH")]
    pub state: PathBuf,

    /// Write the report here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        RootArgs::command().debug_assert();
    }

    #[test]
    fn run_requires_exactly_one_request_source() {
        assert!(RootArgs::try_parse_from(["euca", "run"]).is_err());
        assert!(RootArgs::try_parse_from([
            "euca",
            "run",
            "--request",
            "a",
            "--request-file",
            "b.txt"
        ])
        .is_err());

        let args = RootArgs::try_parse_from([
            "euca",
            "run",
            "--request",
            "Migrate file shares to OneDrive",
            "--max-iterations",
            "12",
            "--verbose",
        ])
        .expect("parse");
        assert!(args.verbose);
        match args.command {
            Command::Run(run) => {
                assert_eq!(
                    run.request.request.as_deref(),
                    Some("Migrate file shares to OneDrive")
                );
                assert_eq!(run.max_iterations, Some(12));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn lm_and_responses_conflict() {
        assert!(RootArgs::try_parse_from([
            "euca",
            "run",
            "--request",
            "a",
            "--lm",
            "claude -p",
            "--responses",
            "dir"
        ])
        .is_err());
    }
}
