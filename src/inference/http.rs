//! OpenAI-compatible chat-completions provider.
use super::{prompt, response, Inference, InferenceFailure, InferenceRequest};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use ureq::Agent;

pub struct HttpInference {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    temperature: f64,
    agent: Agent,
}

impl HttpInference {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        temperature: f64,
        timeout: Duration,
    ) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        HttpInference {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key,
            temperature,
            agent,
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": prompt::SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        })
    }

    fn post(&self, body: &Value) -> Result<Value, InferenceFailure> {
        let mut request = self
            .agent
            .post(&self.endpoint)
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let mut response = request.send_json(body).map_err(transport_failure)?;
        response
            .body_mut()
            .read_json::<Value>()
            .map_err(|err| InferenceFailure::Transport(format!("decode response body: {err}")))
    }
}

fn transport_failure(err: ureq::Error) -> InferenceFailure {
    match err {
        ureq::Error::StatusCode(status) => {
            InferenceFailure::Transport(format!("endpoint returned HTTP {status}"))
        }
        other => InferenceFailure::Transport(other.to_string()),
    }
}

/// Pull the assistant message text out of a chat-completions body.
fn completion_text(body: &Value) -> Result<&str, InferenceFailure> {
    let choice = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .ok_or_else(|| InferenceFailure::Malformed {
            detail: "response has no choices".to_string(),
            response: body.to_string(),
        })?;
    let message = choice.get("message");
    if let Some(refusal) = message
        .and_then(|message| message.get("refusal"))
        .and_then(Value::as_str)
    {
        return Err(InferenceFailure::Refused(refusal.to_string()));
    }
    if choice.get("finish_reason").and_then(Value::as_str) == Some("content_filter") {
        return Err(InferenceFailure::Refused("content filtered".to_string()));
    }
    message
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or(InferenceFailure::Empty)
}

impl Inference for HttpInference {
    fn name(&self) -> &str {
        "http"
    }

    fn infer(&self, request: &InferenceRequest) -> Result<Value, InferenceFailure> {
        let prompt = prompt::render(request);
        let body = self.request_body(&prompt);
        let start = Instant::now();
        let reply = self.post(&body)?;
        let text = completion_text(&reply)?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            prompt_bytes = prompt.len(),
            response_bytes = text.len(),
            model = %self.model,
            "lm invoke complete"
        );
        response::parse_response(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_text_reads_first_choice() {
        let body = json!({
            "choices": [
                { "message": { "role": "assistant", "content": "{\"a\": 1}" }, "finish_reason": "stop" }
            ]
        });
        assert_eq!(completion_text(&body), Ok("{\"a\": 1}"));
    }

    #[test]
    fn completion_text_reports_refusals() {
        let refused = json!({
            "choices": [{ "message": { "content": null, "refusal": "cannot help" } }]
        });
        assert_eq!(
            completion_text(&refused),
            Err(InferenceFailure::Refused("cannot help".to_string()))
        );
        let filtered = json!({
            "choices": [{ "message": { "content": "" }, "finish_reason": "content_filter" }]
        });
        assert!(matches!(
            completion_text(&filtered),
            Err(InferenceFailure::Refused(_))
        ));
    }

    #[test]
    fn completion_text_without_choices_is_malformed() {
        assert!(matches!(
            completion_text(&json!({ "error": "bad" })),
            Err(InferenceFailure::Malformed { .. })
        ));
        assert_eq!(
            completion_text(&json!({ "choices": [{ "message": {} }] })),
            Err(InferenceFailure::Empty)
        );
    }

    #[test]
    fn request_body_carries_model_and_prompt() {
        let inference = HttpInference::new(
            "http://127.0.0.1:9/v1/chat/completions",
            "gpt-4o-mini",
            None,
            0.2,
            Duration::from_secs(5),
        );
        let body = inference.request_body("hello");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][1]["content"], "hello");
        assert_eq!(body["response_format"]["type"], "json_object");
    }
}
