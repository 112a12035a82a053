//! Defensive JSON extraction.
//!
//! Completion endpoints are asked for bare JSON but routinely wrap it in
//! prose or markdown fences. These helpers slice out the first balanced
//! array or object so the caller can hand it straight to serde.

/// First balanced `[...]` in the text, fences and prose ignored.
pub fn extract_json_array(raw: &str) -> Option<&str> {
    extract_delimited(raw, '[', ']')
}

/// First balanced `{...}` in the text.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    extract_delimited(raw, '{', '}')
}

fn extract_delimited(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in raw[start..].char_indices() {
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

        if ch == '"' {
            in_string = true;
        } else if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                return Some(&raw[start..start + i + ch.len_utf8()]);
            }
        }
    }

    None
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bare_array() {
        assert_eq!(extract_json_array(r#"[1, 2, 3]"#), Some("[1, 2, 3]"));
    }

    #[test]
    fn test_array_in_prose() {
        let raw = "Sure! Here are the scores:\n```json\n[{\"index\": 0}]\n```\nLet me know.";
        assert_eq!(extract_json_array(raw), Some(r#"[{"index": 0}]"#));
    }

    #[test]
    fn test_nested_brackets_and_strings() {
        let raw = r#"note [a] -> [{"text": "odd ] bracket", "tags": ["x"]}] end"#;
        assert_eq!(extract_json_array(raw), Some("[a]"));

        let obj = r#"prefix {"text": "braces } inside", "n": {"m": 1}} suffix"#;
        assert_eq!(
            extract_json_object(obj),
            Some(r#"{"text": "braces } inside", "n": {"m": 1}}"#)
        );
    }

    #[test]
    fn test_unbalanced_returns_none() {
        assert_eq!(extract_json_array("no brackets here"), None);
        assert_eq!(extract_json_array("[1, 2"), None);
    }
}
