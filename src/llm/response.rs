//! Dialect-specific response parsing.
//!
//! Parsing never fails: when the body is not JSON or none of the
//! expected fields are present, the raw body comes back unchanged and
//! the caller treats it as a degraded-but-usable result.

use serde_json::Value;

use super::Dialect;

/// Field names probed by the generic scan, in order.
const COMMON_FIELDS: &[&str] = &["response", "text", "content", "output", "result"];

/// Extract the generated text from a raw response body.
pub fn parse_response(dialect: Dialect, body: &str) -> String {
    match dialect {
        Dialect::LocalInference => scan_fields(body, &["response"]),
        Dialect::OpenAiCompatible => parse_openai(body),
        Dialect::Generic => scan_fields(body, COMMON_FIELDS),
    }
}

/// `choices[0].message.content`, then `choices[0].text`; when the
/// choices array is absent entirely, the common-field scan.
fn parse_openai(body: &str) -> String {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => return body.to_string(),
    };

    match json.get("choices").and_then(Value::as_array) {
        Some(choices) => {
            if let Some(choice) = choices.first() {
                if let Some(content) = choice.pointer("/message/content").and_then(Value::as_str) {
                    return content.to_string();
                }
                if let Some(text) = choice.get("text").and_then(Value::as_str) {
                    return text.to_string();
                }
            }
            body.to_string()
        }
        None => scan_value(&json).unwrap_or_else(|| body.to_string()),
    }
}

fn scan_fields(body: &str, fields: &[&str]) -> String {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => return body.to_string(),
    };

    for field in fields {
        if let Some(value) = json.get(field) {
            return field_text(value);
        }
    }
    body.to_string()
}

fn scan_value(json: &Value) -> Option<String> {
    COMMON_FIELDS
        .iter()
        .find_map(|field| json.get(field).map(field_text))
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_inference_reads_response_field() {
        let parsed = parse_response(Dialect::LocalInference, r#"{"response":"Y"}"#);
        assert_eq!(parsed, "Y");
    }

    #[test]
    fn test_openai_reads_message_content() {
        let body = r#"{"choices":[{"message":{"content":"X"}}]}"#;
        assert_eq!(parse_response(Dialect::OpenAiCompatible, body), "X");
    }

    #[test]
    fn test_openai_falls_back_to_choice_text() {
        let body = r#"{"choices":[{"text":"completion text"}]}"#;
        assert_eq!(parse_response(Dialect::OpenAiCompatible, body), "completion text");
    }

    #[test]
    fn test_openai_without_choices_scans_common_fields() {
        let body = r#"{"output":"from a proxy"}"#;
        assert_eq!(parse_response(Dialect::OpenAiCompatible, body), "from a proxy");
    }

    #[test]
    fn test_generic_scan_order() {
        // "response" wins over later fields when both are present.
        let body = r#"{"text":"second","response":"first"}"#;
        assert_eq!(parse_response(Dialect::Generic, body), "first");
    }

    #[test]
    fn test_malformed_json_returns_raw_body() {
        let body = "not json at all {";
        assert_eq!(parse_response(Dialect::LocalInference, body), body);
        assert_eq!(parse_response(Dialect::OpenAiCompatible, body), body);
        assert_eq!(parse_response(Dialect::Generic, body), body);
    }

    #[test]
    fn test_unrecognized_shape_returns_raw_body() {
        let body = r#"{"unexpected":"shape"}"#;
        assert_eq!(parse_response(Dialect::Generic, body), body);
        assert_eq!(parse_response(Dialect::LocalInference, body), body);
    }

    #[test]
    fn test_non_string_field_stringified() {
        assert_eq!(parse_response(Dialect::Generic, r#"{"result":42}"#), "42");
    }
}
