//! Turning raw collaborator text into a JSON object.
//!
//! LMs wrap answers in CLI envelopes, code fences, or prose, and sometimes
//! leave trailing commas. This module peels those layers off. It does not
//! check the answer against any schema.
use super::InferenceFailure;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

/// Extract the JSON object answer from raw response text.
pub(crate) fn parse_response(text: &str) -> Result<Value, InferenceFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InferenceFailure::Empty);
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => unwrap_envelope(value, text)?,
        Err(err) => recover_json(trimmed).ok_or_else(|| malformed(&err.to_string(), text))?,
    };

    if !value.is_object() {
        return Err(malformed("answer is not a JSON object", text));
    }
    Ok(value)
}

/// Unwrap `claude --output-format json` style envelopes.
fn unwrap_envelope(value: Value, text: &str) -> Result<Value, InferenceFailure> {
    if let Some(structured) = value.get("structured_output") {
        return Ok(structured.clone());
    }
    if value.get("type").and_then(Value::as_str) == Some("result") {
        if value.get("is_error").and_then(Value::as_bool) == Some(true) {
            let detail = value
                .get("result")
                .and_then(Value::as_str)
                .unwrap_or("LM reported an error");
            return Err(InferenceFailure::Refused(detail.to_string()));
        }
        if let Some(result) = value.get("result").and_then(Value::as_str) {
            let inner = result.trim();
            if inner.is_empty() {
                return Err(InferenceFailure::Empty);
            }
            return serde_json::from_str(inner)
                .ok()
                .or_else(|| recover_json(inner))
                .ok_or_else(|| malformed("result text is not JSON", text));
        }
    }
    Ok(value)
}

fn recover_json(raw: &str) -> Option<Value> {
    let cleaned = remove_trailing_commas(&strip_code_fences(raw));
    serde_json::from_str(&cleaned)
        .ok()
        .or_else(|| extract_json_from_text(&cleaned))
}

fn malformed(detail: &str, text: &str) -> InferenceFailure {
    InferenceFailure::Malformed {
        detail: detail.to_string(),
        response: text.to_string(),
    }
}

fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let mut lines: Vec<&str> = trimmed.lines().collect();
    if let Some(first) = lines.first() {
        if first.trim_start().starts_with("```") {
            lines.remove(0);
        }
    }
    if let Some(last) = lines.last() {
        if last.trim_start().starts_with("```") {
            lines.pop();
        }
    }
    lines.join("\n").trim().to_string()
}

/// Find the first `{` that starts a complete JSON value.
fn extract_json_from_text(raw: &str) -> Option<Value> {
    for (idx, ch) in raw.char_indices() {
        if ch != '{' {
            continue;
        }
        let slice = &raw[idx..];
        let mut deserializer = serde_json::Deserializer::from_str(slice);
        if let Ok(value) = Value::deserialize(&mut deserializer) {
            return Some(value);
        }
    }
    None
}

fn trailing_comma_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r",(\s*[}\]])").ok())
        .as_ref()
}

/// Drop commas directly before a closing brace or bracket.
fn remove_trailing_commas(json: &str) -> String {
    match trailing_comma_pattern() {
        Some(pattern) => pattern.replace_all(json, "$1").into_owned(),
        None => json.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_object() {
        let value = parse_response(r#"{"security_summary": "ok"}"#).expect("parse");
        assert_eq!(value, json!({ "security_summary": "ok" }));
    }

    #[test]
    fn test_parse_markdown_fence() {
        let text = "```json\n{\"research_summary\": \"fine\"}\n```";
        let value = parse_response(text).expect("parse");
        assert_eq!(value["research_summary"], "fine");
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let text = "Here is the assessment:\n{\"roi_analysis\": \"pays back\"}\nLet me know!";
        let value = parse_response(text).expect("parse");
        assert_eq!(value["roi_analysis"], "pays back");
    }

    #[test]
    fn test_parse_trailing_commas() {
        let text = "{\"items\": [1, 2,], \"name\": \"x\",}";
        let value = parse_response(text).expect("parse");
        assert_eq!(value, json!({ "items": [1, 2], "name": "x" }));
    }

    #[test]
    fn test_parse_claude_result_envelope() {
        let envelope = json!({
            "type": "result",
            "is_error": false,
            "result": "```json\n{\"support_summary\": \"steady\"}\n```"
        });
        let value = parse_response(&envelope.to_string()).expect("parse");
        assert_eq!(value, json!({ "support_summary": "steady" }));
    }

    #[test]
    fn test_parse_structured_output_envelope() {
        let envelope = json!({ "structured_output": { "final": true }, "result": "" });
        let value = parse_response(&envelope.to_string()).expect("parse");
        assert_eq!(value, json!({ "final": true }));
    }

    #[test]
    fn test_error_envelope_is_refusal() {
        let envelope = json!({ "type": "result", "is_error": true, "result": "rate limited" });
        assert_eq!(
            parse_response(&envelope.to_string()),
            Err(InferenceFailure::Refused("rate limited".to_string()))
        );
    }

    #[test]
    fn test_empty_and_non_object_answers() {
        assert_eq!(parse_response("  \n"), Err(InferenceFailure::Empty));
        let err = parse_response("[1, 2, 3]").expect_err("array is not an object");
        assert!(err.is_retryable());
        assert_eq!(err.response_text(), Some("[1, 2, 3]"));
        assert!(matches!(
            parse_response("no json here"),
            Err(InferenceFailure::Malformed { .. })
        ));
    }
}
