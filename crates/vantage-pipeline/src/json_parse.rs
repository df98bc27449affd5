//! Schema-validated JSON parsing with one relaxed-parse retry (§4.4 SPEC_FULL.md),
//! grounded on `src/agents/providers/claude.py::_extract_json` (strip code fences,
//! else locate the first balanced `{...}` substring).

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Strips a ```json fenced block if present, otherwise locates the first balanced
/// `{...}` object in the text. Falls back to the trimmed input verbatim.
pub fn extract_json_object(text: &str) -> String {
    if let Some(fenced) = extract_fenced(text) {
        return fenced;
    }
    if let Some(object) = extract_balanced_object(text) {
        return object;
    }
    text.trim().to_string()
}

fn extract_fenced(text: &str) -> Option<String> {
    let re = Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok()?;
    re.captures(text).map(|c| c[1].trim().to_string())
}

/// Scans for the first `{` and walks forward tracking brace depth (ignoring braces
/// inside string literals) until it closes, rather than a greedy regex — handles
/// nested objects correctly.
fn extract_balanced_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        let ch = byte as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses `raw` into `T`, schema-validating first where `schema` is provided.
/// On direct-parse failure, retries once via `extract_json_object` on the raw
/// text — never a third attempt (§4.4 error policy: "retry once with a relaxed parse").
pub fn parse_with_retry<T: DeserializeOwned>(raw: &str, schema: Option<&Value>) -> anyhow::Result<T> {
    if let Ok(parsed) = serde_json::from_str::<T>(raw) {
        if schema.is_none() || validates(raw, schema.unwrap()) {
            return Ok(parsed);
        }
    }

    tracing::debug!("direct JSON parse failed or schema mismatch, attempting relaxed parse");
    let relaxed = extract_json_object(raw);
    let value: Value = serde_json::from_str(&relaxed)?;
    if let Some(schema) = schema {
        if !validates_value(&value, schema) {
            anyhow::bail!("relaxed-parsed JSON still does not match the expected schema");
        }
    }
    Ok(serde_json::from_value(value)?)
}

/// Minimal structural check: every schema-declared required key must be present.
/// Full JSON-Schema validation is out of scope — this exists only to catch the
/// common failure mode of a model omitting a required field.
fn validates(raw: &str, schema: &Value) -> bool {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => validates_value(&value, schema),
        Err(_) => false,
    }
}

fn validates_value(value: &Value, schema: &Value) -> bool {
    let Some(required) = schema.get("required").and_then(Value::as_array) else {
        return true;
    };
    let Some(object) = value.as_object() else {
        return false;
    };
    required.iter().filter_map(Value::as_str).all(|key| object.contains_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        ticker: String,
        score: f64,
    }

    #[test]
    fn extracts_from_fenced_code_block() {
        let text = "here you go:\n```json\n{\"ticker\":\"AMD\",\"score\":0.5}\n```\nthanks";
        let extracted = extract_json_object(text);
        assert_eq!(extracted, r#"{"ticker":"AMD","score":0.5}"#);
    }

    #[test]
    fn extracts_balanced_object_with_nested_braces() {
        let text = r#"preamble {"ticker":"AMD","meta":{"a":1}} trailing"#;
        let extracted = extract_json_object(text);
        let value: Value = serde_json::from_str(&extracted).unwrap();
        assert_eq!(value["meta"]["a"], 1);
    }

    #[test]
    fn direct_parse_succeeds_without_needing_retry() {
        let parsed: Sample = parse_with_retry(r#"{"ticker":"AMD","score":1.0}"#, None).unwrap();
        assert_eq!(parsed, Sample { ticker: "AMD".into(), score: 1.0 });
    }

    #[test]
    fn retries_once_when_wrapped_in_prose() {
        let raw = "Sure! Here is the analysis: {\"ticker\":\"AMD\",\"score\":0.9} Hope that helps.";
        let parsed: Sample = parse_with_retry(raw, None).unwrap();
        assert_eq!(parsed.ticker, "AMD");
    }

    #[test]
    fn missing_required_field_fails_schema_check() {
        let schema = serde_json::json!({ "required": ["ticker", "score"] });
        let result = parse_with_retry::<Sample>(r#"{"ticker":"AMD"}"#, Some(&schema));
        assert!(result.is_err());
    }
}
