//! Tolerant JSON location and parsing for free-form text

use serde_json::Value;

/// Locate the first balanced `{...}` block in `input`
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count toward the balance. Returns `None` when the first opening brace is
/// never closed.
pub fn extract_balanced_object(input: &str) -> Option<&str> {
    let mut start: Option<usize> = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in input.char_indices() {
        if start.is_none() {
            if ch == '{' {
                start = Some(idx);
                depth = 1;
            }
            continue;
        }

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
                    let s = start?;
                    return Some(&input[s..=idx]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse `text` as JSON, falling back to its first embedded object
pub fn parse_lenient(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let snippet = extract_balanced_object(text)?;
    match serde_json::from_str::<Value>(snippet) {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("Embedded JSON object did not parse: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_embedded_object() {
        let text = r#"garbage {"id_session":"zz999999yy"} more garbage"#;
        assert_eq!(extract_balanced_object(text), Some(r#"{"id_session":"zz999999yy"}"#));
    }

    #[test]
    fn test_nested_and_quoted_braces() {
        let text = r#"prefix {"a":{"b":"}{"},"c":"\"{"} suffix }"#;
        assert_eq!(
            extract_balanced_object(text),
            Some(r#"{"a":{"b":"}{"},"c":"\"{"}"#)
        );
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(extract_balanced_object("no braces here"), None);
        assert_eq!(extract_balanced_object(r#"{"open": true"#), None);
    }

    #[test]
    fn test_first_block_only() {
        let text = r#"{"first":1} and {"second":2}"#;
        assert_eq!(extract_balanced_object(text), Some(r#"{"first":1}"#));
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(parse_lenient("[1,2]"), Some(serde_json::json!([1, 2])));
        assert_eq!(
            parse_lenient("Result:\n```json\n{\"ok\": true}\n```"),
            Some(serde_json::json!({"ok": true}))
        );
        assert_eq!(parse_lenient("<html>{not json}</html>"), None);
        assert_eq!(parse_lenient(""), None);
    }
}
