//! The inference collaborator seam.
//!
//! Steps describe a task and an output schema; an [`Inference`] implementation
//! turns that into a JSON value or an [`InferenceFailure`]. Three providers
//! ship with the crate:
//!
//! - [`CommandInference`]: a local LM command with the prompt on stdin
//!   (`claude -p`, `llm`, `ollama run`, wrapper scripts)
//! - [`HttpInference`]: an OpenAI-compatible chat-completions endpoint
//! - [`ReplayInference`]: recorded answers read from `<phase>.json` files
//!
//! None of them assume the answer matches the schema. Strict parsing happens
//! in the step that asked.

mod command;
mod http;
pub(crate) mod prompt;
pub(crate) mod response;
mod replay;

pub use command::{CommandInference, DEFAULT_LM_COMMAND};
pub use http::HttpInference;
pub use replay::ReplayInference;

use crate::state::Phase;
use serde_json::Value;
use thiserror::Error;

/// One request to the collaborator.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub phase: Phase,
    /// Natural-language description of what to produce.
    pub task: String,
    /// JSON schema the answer must satisfy.
    pub schema: Value,
    /// Read-only projection of the state fields the step may consume.
    pub context: Value,
    /// Error context from the previous attempt, set on retries.
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone)]
pub struct Feedback {
    pub error: String,
    pub previous_response: Option<String>,
}

/// Ways the collaborator can fail to produce a usable answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceFailure {
    #[error("inference provider unavailable: {0}")]
    Unavailable(String),

    #[error("LM command failed with status {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("empty response")]
    Empty,

    #[error("malformed response: {detail}")]
    Malformed { detail: String, response: String },

    #[error("request refused: {0}")]
    Refused(String),
}

impl InferenceFailure {
    /// Failures where re-prompting with feedback can help.
    ///
    /// Transport, command, and provider failures are configuration problems
    /// and are not retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InferenceFailure::Empty | InferenceFailure::Malformed { .. }
        )
    }

    /// The raw answer that failed, when there was one.
    pub fn response_text(&self) -> Option<&str> {
        match self {
            InferenceFailure::Malformed { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// A reasoning service that answers structured requests.
pub trait Inference {
    /// Short provider label for logs.
    fn name(&self) -> &str;

    fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceFailure>;
}
