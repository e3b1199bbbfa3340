//! Recovery of JSON from raw model output.

use serde_json::{json, Value};

/// Build the sentinel payload an adapter returns instead of failing.
pub fn error_payload(description: &str) -> String {
    json!({ "error": description }).to_string()
}

/// Fields whose presence marks an object as an enrichment attempt rather than
/// a bare error report.
const RECORD_FIELDS: &[&str] = &[
    "title",
    "generated_summary",
    "ingredients",
    "instructions",
    "healthiness_score",
    "ease_of_cooking_score",
    "indian_ingredient_availability_score",
    "prep_time_minutes",
    "total_cooking_time_minutes",
    "protein_level",
    "meal_type_suitability",
    "dietary_restrictions",
    "categories",
];

/// If `text` is a sentinel error payload, return its description.
///
/// Any object carrying an `error` key and none of the record fields counts,
/// so vendor extras such as a status code don't hide the failure.
pub fn sentinel_error(text: &str) -> Option<String> {
    if !text.trim_start().starts_with('{') {
        return None;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map))
            if !RECORD_FIELDS.iter().any(|field| map.contains_key(*field)) =>
        {
            match map.get("error")? {
                Value::String(description) => Some(description.clone()),
                other => Some(other.to_string()),
            }
        }
        _ => None,
    }
}

/// Strip a markdown code fence (```` ```json ... ``` ````) around the body.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut body = raw.trim();

    if let Some(rest) = body.strip_prefix("```") {
        body = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }

    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

/// Return the fenced-or-bare JSON body if it parses, else a sentinel payload.
pub fn recover_json(raw: &str) -> String {
    let body = strip_code_fences(raw);

    if body.is_empty() {
        return error_payload("Empty response from model");
    }

    match parse_lenient(body) {
        Ok(_) => body.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Model returned invalid JSON");
            error_payload(&format!("Invalid JSON in model response: {}", e))
        }
    }
}

/// Parse JSON, tolerating raw control characters inside string literals.
pub fn parse_lenient(text: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) => serde_json::from_str(&escape_control_chars(text)),
    }
}

/// Escape control characters that appear inside JSON string literals.
fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            } else if c.is_control() && (c as u32) < 0x20 {
                match c {
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    other => out.push_str(&format!("\\u{:04x}", other as u32)),
                }
                continue;
            }
        } else if c == '"' {
            in_string = true;
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
        assert_eq!(strip_code_fences("{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_recover_valid_fenced_json() {
        assert_eq!(recover_json("```json\n{\"title\": \"Upma\"}\n```"), "{\"title\": \"Upma\"}");
    }

    #[test]
    fn test_recover_invalid_json_gives_sentinel() {
        let recovered = recover_json("Sure! Here is the recipe analysis you asked for.");
        let description = sentinel_error(&recovered).unwrap();
        assert!(description.starts_with("Invalid JSON"));
    }

    #[test]
    fn test_recover_empty_gives_sentinel() {
        let recovered = recover_json("```json\n```");
        assert_eq!(sentinel_error(&recovered).unwrap(), "Empty response from model");
    }

    #[test]
    fn test_sentinel_detection() {
        assert_eq!(sentinel_error(r#"{"error": "blocked"}"#).unwrap(), "blocked");
        assert!(sentinel_error(r#"{"error": "x", "title": "Dal"}"#).is_none());
        assert!(sentinel_error(r#"{"title": "Dal"}"#).is_none());
        assert!(sentinel_error(r#"{}"#).is_none());
    }

    #[test]
    fn test_sentinel_with_extra_keys() {
        let text = r#"{"error": "model refused", "code": 500, "type": "server_error"}"#;
        assert_eq!(sentinel_error(text).unwrap(), "model refused");

        let nested = r#"{"error": {"message": "quota"}, "status": 429}"#;
        assert_eq!(sentinel_error(nested).unwrap(), r#"{"message":"quota"}"#);
        assert!(sentinel_error("not json").is_none());
    }

    #[test]
    fn test_lenient_parse_tolerates_control_chars() {
        let raw = "{\"prep_notes\": \"Soak overnight.\nDrain well.\tRinse\"}";
        assert!(serde_json::from_str::<Value>(raw).is_err());

        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["prep_notes"], "Soak overnight.\nDrain well.\tRinse");
    }

    #[test]
    fn test_lenient_parse_keeps_escaped_quotes() {
        let raw = "{\"note\": \"say \\\"hi\\\"\u{0001}\"}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value["note"], "say \"hi\"\u{0001}");
    }
}
