//! Prompt assembly for text-based providers.
use super::InferenceRequest;
use crate::util::truncate_string;
use serde_json::Value;

// Prompt templates loaded at compile time
const STEP_PROMPT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/step.md"));
const RETRY_SECTION: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/prompts/retry.md"));

const PREVIOUS_RESPONSE_LIMIT: usize = 1000;

/// System message for providers that take one.
pub(crate) const SYSTEM_PROMPT: &str = "Return a single JSON object only. No prose or code fences.";

/// Render the full prompt for `request`, including retry feedback.
pub(crate) fn render(request: &InferenceRequest) -> String {
    let feedback_section = match &request.feedback {
        Some(feedback) => {
            let previous = match feedback.previous_response.as_deref() {
                Some(text) => {
                    let snippet = truncate_string(text, PREVIOUS_RESPONSE_LIMIT);
                    let marker = if snippet.len() < text.len() {
                        "...(truncated)"
                    } else {
                        ""
                    };
                    format!("**Your previous response:**\n```\n{snippet}{marker}\n```\n")
                }
                None => String::new(),
            };
            RETRY_SECTION
                .replace("{error}", &feedback.error)
                .replace("{previous_response}", &previous)
        }
        None => String::new(),
    };

    STEP_PROMPT
        .replace("{phase}", request.phase.as_str())
        .replace("{task}", &request.task)
        .replace("{context}", &pretty(&request.context))
        .replace("{schema}", &pretty(&request.schema))
        .replace("{feedback_section}", &feedback_section)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::Feedback;
    use crate::state::Phase;
    use serde_json::json;

    fn request() -> InferenceRequest {
        InferenceRequest {
            phase: Phase::Security,
            task: "Identify security concerns.".to_string(),
            schema: json!({ "type": "object", "required": ["security_summary"] }),
            context: json!({ "assessment_request": "Migrate file shares to OneDrive" }),
            feedback: None,
        }
    }

    #[test]
    fn render_fills_every_placeholder() {
        let prompt = render(&request());
        assert!(prompt.contains("# Phase\n\nsecurity"));
        assert!(prompt.contains("Identify security concerns."));
        assert!(prompt.contains("\"security_summary\""));
        assert!(prompt.contains("Migrate file shares to OneDrive"));
        assert!(!prompt.contains("{feedback_section}"));
        assert!(!prompt.contains("Previous Response Error"));
    }

    #[test]
    fn render_includes_truncated_feedback_on_retry() {
        let mut request = request();
        request.feedback = Some(Feedback {
            error: "security summary cannot be empty".to_string(),
            previous_response: Some("x".repeat(PREVIOUS_RESPONSE_LIMIT + 50)),
        });
        let prompt = render(&request);
        assert!(prompt.contains("Previous Response Error"));
        assert!(prompt.contains("**Error:** security summary cannot be empty"));
        assert!(prompt.contains("...(truncated)"));
    }
}
