//! Lenient JSON recovery for model text

use serde_json::Value;
use tracing::debug;

/// Parse JSON out of a model reply, repairing what can be repaired
///
/// Markdown code fences are stripped first; without a fence, prose around
/// the outermost brackets is dropped. Strict JSON is tried before a JSON5
/// parse, which accepts trailing commas, unquoted keys and single quotes. Returns `None` when neither succeeds (for example on truncated
/// output).
///
/// # Examples
///
/// ```
/// use graphweaver_extractor::parser::repair_json;
///
/// let value = repair_json("```json\n[{head: 'Adam',},]\n```").unwrap();
/// assert_eq!(value[0]["head"], "Adam");
/// assert!(repair_json(r#"[{"head": "Ad"#).is_none());
/// ```
pub fn repair_json(response: &str) -> Option<Value> {
    let body = extract_json(response);
    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => Some(value),
        Err(strict) => match json5::from_str::<Value>(body) {
            Ok(value) => {
                debug!("Recovered reply with lenient JSON parse ({})", strict);
                Some(value)
            }
            Err(lenient) => {
                debug!("Reply is not JSON: {}; {}", strict, lenient);
                None
            }
        },
    }
}

/// Extract the JSON body from a reply, handling markdown code blocks
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    let Some(open) = trimmed.find("```") else {
        return json_span(trimmed);
    };

    // Skip the fence and its language tag
    let after_fence = &trimmed[open + 3..];
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];

    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Slice from the first `[` or `{` to the last matching closer
///
/// Text without an opening bracket is returned unchanged. An unclosed body
/// runs to the end so truncated output still fails to parse.
fn json_span(text: &str) -> &str {
    let Some(start) = text.find(['[', '{']) else {
        return text;
    };
    let close = if text[start..].starts_with('[') { ']' } else { '}' };
    match text.rfind(close) {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_json() {
        let value = repair_json(r#"[{"head": "Adam", "relation": "WORKS_FOR"}]"#).unwrap();
        assert_eq!(value, json!([{"head": "Adam", "relation": "WORKS_FOR"}]));
    }

    #[test]
    fn test_extract_json_from_plain_json() {
        let json = r#"{"key": "value"}"#;
        assert_eq!(extract_json(json), json);
    }

    #[test]
    fn test_extract_json_from_markdown() {
        let response = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json(response), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_json_from_markdown_without_language() {
        let response = "```\n{\"key\": \"value\"}\n```";
        assert!(extract_json(response).contains("key"));
    }

    #[test]
    fn test_extract_json_with_surrounding_prose() {
        let response = "Here is the graph:\n```json\n[1, 2]\n```\nHope this helps.";
        assert_eq!(extract_json(response), "[1, 2]");
    }

    #[test]
    fn test_extract_json_after_unfenced_preamble() {
        let response = "Here is the extracted graph: [{\"head\": \"Adam\"}] Let me know!";
        assert_eq!(extract_json(response), r#"[{"head": "Adam"}]"#);

        let value = repair_json("Sure! {'head': 'Adam',}").unwrap();
        assert_eq!(value["head"], "Adam");
    }

    #[test]
    fn test_truncated_json_after_preamble_is_rejected() {
        assert!(repair_json(r#"Result: [{"head": "Adam", "tail": "Micro"#).is_none());
    }

    #[test]
    fn test_lenient_repairs() {
        let value = repair_json("[{head: 'Adam', tail: 'Microsoft',},]").unwrap();
        assert_eq!(value[0]["tail"], "Microsoft");
    }

    #[test]
    fn test_truncated_json_is_rejected() {
        assert!(repair_json(r#"[{"head": "Adam", "relation": "WORKS_FOR", "tail": "Micro"#).is_none());
    }

    #[test]
    fn test_non_json_is_rejected() {
        assert!(repair_json("This is not JSON").is_none());
        assert!(repair_json("   ").is_none());
    }
}
