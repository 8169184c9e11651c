//! Decode a generation model's free-form assistant content into structured
//! moments (S5) or a single refined boundary pair (S8).
//!
//! Grounded on `spec.md` §4.6 S5 steps 1-4: strip `<think>` blocks, strip a
//! wrapping code fence, parse as JSON (array or object-wrapping known keys),
//! and fall back to regex recovery of well-formed objects on malformed JSON.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::warn;

use clipflow_models::{AiResponse, RawMoment};

use crate::error::{InferenceError, InferenceResult};

const WRAPPING_KEYS: &[&str] = &["moments", "output", "final_output"];

fn think_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<think>.*?</think>").unwrap())
}

fn fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").unwrap())
}

fn recovery_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"\{\s*"start_time"\s*:\s*(-?[0-9.]+)\s*,\s*"end_time"\s*:\s*(-?[0-9.]+)\s*(?:,\s*"title"\s*:\s*"([^"]*)")?\s*\}"#,
        )
        .unwrap()
    })
}

/// Strip `<think>...</think>` blocks, then an optional wrapping code fence.
pub fn strip_think_and_fence(content: &str) -> String {
    let without_think = think_tag_re().replace_all(content, "");
    let trimmed = without_think.trim();
    if let Some(caps) = fence_re().captures(trimmed) {
        caps[1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Decode a generation model's assistant content (S5 JSON-array contract).
pub fn decode_moments(model_key: &str, content: &str) -> InferenceResult<AiResponse> {
    let cleaned = strip_think_and_fence(content);

    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(items)) => {
            let moments = items
                .into_iter()
                .filter_map(|v| serde_json::from_value::<RawMoment>(v).ok())
                .collect();
            Ok(AiResponse::Array(moments))
        }
        Ok(Value::Object(map)) => {
            for key in WRAPPING_KEYS {
                if let Some(Value::Array(items)) = map.get(*key) {
                    let moments = items
                        .iter()
                        .cloned()
                        .filter_map(|v| serde_json::from_value::<RawMoment>(v).ok())
                        .collect();
                    return Ok(AiResponse::ObjectWrapping(moments));
                }
            }
            for value in map.values() {
                if let Value::Array(items) = value {
                    if items.first().and_then(|v| v.get("start_time")).is_some() {
                        let moments = items
                            .iter()
                            .cloned()
                            .filter_map(|v| serde_json::from_value::<RawMoment>(v).ok())
                            .collect();
                        return Ok(AiResponse::ObjectWrapping(moments));
                    }
                }
            }
            Ok(recover_with_regex(model_key, &cleaned))
        }
        Err(_) => Ok(recover_with_regex(model_key, &cleaned)),
    }
}

fn recover_with_regex(model_key: &str, text: &str) -> AiResponse {
    let recovered: Vec<RawMoment> = recovery_object_re()
        .captures_iter(text)
        .filter_map(|caps| {
            let start_time = caps[1].parse::<f64>().ok()?;
            let end_time = caps[2].parse::<f64>().ok()?;
            let title = caps.get(3).map(|m| m.as_str().to_string()).unwrap_or_default();
            Some(RawMoment {
                start_time,
                end_time,
                title,
            })
        })
        .collect();
    if recovered.is_empty() {
        warn!(model_key, "response was malformed JSON and regex recovery found nothing");
    } else {
        warn!(model_key, count = recovered.len(), "recovered moments from malformed JSON via regex fallback");
    }
    AiResponse::Malformed { recovered }
}

/// A single refined `{start_time, end_time}` pair, in the clip's normalized
/// (window-relative) coordinates (S8).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinedBounds {
    pub start_time: f64,
    pub end_time: f64,
}

/// Decode a refinement model's assistant content: strip `<think>`/fences,
/// locate the first balanced JSON object, parse, and validate.
pub fn decode_refinement(model_key: &str, content: &str) -> InferenceResult<RefinedBounds> {
    let cleaned = strip_think_and_fence(content);
    let object_text = first_balanced_object(&cleaned).ok_or_else(|| InferenceError::ParseError {
        model_key: model_key.to_string(),
        message: "no JSON object found in refinement response".to_string(),
    })?;

    let value: Value = serde_json::from_str(&object_text).map_err(|e| InferenceError::ParseError {
        model_key: model_key.to_string(),
        message: format!("invalid JSON object: {e}"),
    })?;

    let start_time = value
        .get("start_time")
        .and_then(Value::as_f64)
        .ok_or_else(|| InferenceError::ParseError {
            model_key: model_key.to_string(),
            message: "missing start_time".to_string(),
        })?;
    let end_time = value
        .get("end_time")
        .and_then(Value::as_f64)
        .ok_or_else(|| InferenceError::ParseError {
            model_key: model_key.to_string(),
            message: "missing end_time".to_string(),
        })?;

    if end_time <= start_time {
        return Err(InferenceError::ParseError {
            model_key: model_key.to_string(),
            message: format!("end_time {end_time} <= start_time {start_time}"),
        });
    }

    Ok(RefinedBounds { start_time, end_time })
}

/// Scan `text` for the first `{ ... }` span with balanced braces, respecting
/// quoted strings.
fn first_balanced_object(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        let c = b as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..=i].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_think_blocks_and_fence() {
        let content = "<think>reasoning here</think>```json\n[{\"start_time\":1.0,\"end_time\":2.0}]\n```";
        let cleaned = strip_think_and_fence(content);
        assert_eq!(cleaned, r#"[{"start_time":1.0,"end_time":2.0}]"#);
    }

    #[test]
    fn decodes_bare_array() {
        let content = r#"[{"start_time":1.0,"end_time":2.0,"title":"a"}]"#;
        let result = decode_moments("m", content).unwrap();
        assert_eq!(result.moments().len(), 1);
        assert!(matches!(result, AiResponse::Array(_)));
    }

    #[test]
    fn decodes_object_wrapping_known_key() {
        let content = r#"{"moments": [{"start_time":1.0,"end_time":2.0}]}"#;
        let result = decode_moments("m", content).unwrap();
        assert_eq!(result.moments().len(), 1);
        assert!(matches!(result, AiResponse::ObjectWrapping(_)));
    }

    #[test]
    fn recovers_from_malformed_json_via_regex() {
        let content = r#"garbage {"start_time": 1.0, "end_time": 2.0, "title": "x"} trailing junk"#;
        let result = decode_moments("m", content).unwrap();
        assert_eq!(result.moments().len(), 1);
        assert!(matches!(result, AiResponse::Malformed { .. }));
    }

    #[test]
    fn refinement_decodes_first_balanced_object() {
        let content = "<think>ignore {this}</think>prefix {\"start_time\": 0.0, \"end_time\": 30.0} suffix";
        let bounds = decode_refinement("m", content).unwrap();
        assert_eq!(bounds, RefinedBounds { start_time: 0.0, end_time: 30.0 });
    }

    #[test]
    fn refinement_rejects_non_positive_duration() {
        let content = r#"{"start_time": 10.0, "end_time": 10.0}"#;
        assert!(decode_refinement("m", content).is_err());
    }
}
