//! Local LM command provider.
//!
//! The command is parsed with shell-words and receives the rendered prompt on
//! stdin. An argument that is exactly `{schema}` is replaced with the compact
//! output schema, for CLIs that accept one (`claude --json-schema {schema}`).
use super::{prompt, response, Inference, InferenceFailure, InferenceRequest};
use crate::util::truncate_bytes;
use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Used when neither flags, config, nor `EUCA_LM_COMMAND` name a command.
pub const DEFAULT_LM_COMMAND: &str = "claude -p --model haiku";

const SCHEMA_PLACEHOLDER: &str = "{schema}";
const STDERR_LIMIT: usize = 2000;

#[derive(Debug, Clone)]
pub struct CommandInference {
    command: String,
    argv: Vec<String>,
}

impl CommandInference {
    /// Parse `command`; fails on unbalanced quotes or an empty command.
    pub fn new(command: &str) -> Result<Self> {
        let argv =
            shell_words::split(command).with_context(|| format!("parse LM command: {command}"))?;
        if argv.is_empty() {
            return Err(anyhow!("LM command is empty"));
        }
        Ok(CommandInference {
            command: command.to_string(),
            argv,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Check that the program resolves on PATH (or exists, for explicit paths).
    pub fn ensure_available(&self) -> Result<(), InferenceFailure> {
        which::which(&self.argv[0])
            .map(|_| ())
            .map_err(|err| InferenceFailure::Unavailable(format!("{}: {err}", self.argv[0])))
    }

    fn run(&self, prompt: &str, schema: &Value) -> Result<String, InferenceFailure> {
        let schema_text = schema.to_string();
        let args: Vec<&str> = self.argv[1..]
            .iter()
            .map(|arg| {
                if arg == SCHEMA_PLACEHOLDER {
                    schema_text.as_str()
                } else {
                    arg.as_str()
                }
            })
            .collect();

        let start = Instant::now();
        let mut child = Command::new(&self.argv[0])
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                InferenceFailure::Unavailable(format!("spawn LM command {}: {err}", self.argv[0]))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(prompt.as_bytes()) {
                drop(stdin);
                // Reap the child so a failed write never leaves it running.
                let _ = child.kill();
                let _ = child.wait();
                return Err(InferenceFailure::Transport(format!(
                    "write prompt to LM stdin: {err}"
                )));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|err| InferenceFailure::Transport(format!("wait for LM command: {err}")))?;
        let elapsed_ms = start.elapsed().as_millis();

        tracing::info!(
            elapsed_ms,
            prompt_bytes = prompt.len(),
            response_bytes = output.stdout.len(),
            "lm invoke complete"
        );

        if !output.status.success() {
            return Err(InferenceFailure::CommandFailed {
                status: output.status.to_string(),
                stderr: truncate_bytes(&output.stderr, STDERR_LIMIT).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|err| InferenceFailure::Malformed {
            detail: format!("LM stdout is not UTF-8: {err}"),
            response: String::new(),
        })
    }
}

impl Inference for CommandInference {
    fn name(&self) -> &str {
        "command"
    }

    fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceFailure> {
        self.ensure_available()?;
        let prompt = prompt::render(request);
        let text = self.run(&prompt, &request.schema)?;
        response::parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Phase;
    use serde_json::json;

    fn request() -> InferenceRequest {
        InferenceRequest {
            phase: Phase::Cost,
            task: "Estimate costs.".to_string(),
            schema: json!({ "type": "object" }),
            context: json!({}),
            feedback: None,
        }
    }

    #[test]
    fn new_rejects_empty_and_unbalanced_commands() {
        assert!(CommandInference::new("   ").is_err());
        assert!(CommandInference::new("llm 'unterminated").is_err());
        let parsed = CommandInference::new("llm -m 'gpt 4o'").expect("parse command");
        assert_eq!(parsed.argv, vec!["llm", "-m", "gpt 4o"]);
    }

    #[test]
    fn missing_program_is_unavailable() {
        let inference =
            CommandInference::new("euca-test-no-such-program --flag").expect("parse command");
        assert!(matches!(
            inference.infer(&request()),
            Err(InferenceFailure::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn runs_command_with_prompt_on_stdin() {
        // `sh -c` ignores stdin and prints a fixed answer.
        let command = r#"sh -c 'cat >/dev/null; echo "{\"roi_analysis\": \"ok\"}"'"#;
        let inference = CommandInference::new(command).expect("parse command");
        let value = inference.infer(&request()).expect("infer");
        assert_eq!(value, json!({ "roi_analysis": "ok" }));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_command_failure() {
        let inference =
            CommandInference::new("sh -c 'cat >/dev/null; echo boom >&2; exit 3'").expect("parse");
        match inference.infer(&request()) {
            Err(InferenceFailure::CommandFailed { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected command failure, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failed_prompt_write_stops_the_command() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join("still-running");
        // Closes stdin right away, then would leave a marker if left alive.
        let command = format!("sh -c 'exec 0<&-; sleep 1; touch {}'", marker.display());
        let inference = CommandInference::new(&command).expect("parse command");
        let prompt = "x".repeat(1 << 20);

        match inference.run(&prompt, &json!({})) {
            Err(InferenceFailure::Transport(message)) => {
                assert!(message.contains("write prompt"), "{message}")
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
        std::thread::sleep(std::time::Duration::from_millis(1500));
        assert!(
            !marker.exists(),
            "LM command kept running after write failure"
        );
    }
}
