//! Dialect-specific request bodies.

use serde_json::{json, Value};

use super::{Dialect, ModelConfig};

/// Sampling temperature for chat-completions backends.
const OPENAI_TEMPERATURE: f64 = 0.7;
/// Sampling temperature for generic backends.
const GENERIC_TEMPERATURE: f64 = 0.5;

/// Build the JSON request body for a prompt in the model's dialect.
pub fn build_request_body(model: &ModelConfig, prompt: &str) -> Value {
    match model.dialect() {
        Dialect::LocalInference => json!({
            "model": model.name,
            "prompt": prompt,
            "stream": false,
            "max_tokens": model.max_tokens,
        }),
        Dialect::OpenAiCompatible => json!({
            "model": model.name,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": model.max_tokens,
            "temperature": OPENAI_TEMPERATURE,
            "timeout": model.timeout_seconds,
        }),
        Dialect::Generic => json!({
            "prompt": prompt,
            "max_tokens": model.max_tokens,
            "temperature": GENERIC_TEMPERATURE,
            "timeout": model.timeout_seconds,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_inference_body() {
        let model = ModelConfig::new("llama3", "ollama", "http://localhost:11434");
        let body = build_request_body(&model, "hello");

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 4096);
        assert!(body.get("messages").is_none());
    }

    #[test]
    fn test_openai_body_has_single_user_message() {
        let model = ModelConfig::new("gpt-4", "openai", "https://api.openai.com");
        let body = build_request_body(&model, "explain this");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "explain this");
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["model"], "gpt-4");
    }

    #[test]
    fn test_generic_body_has_no_model_field() {
        let model = ModelConfig::new("m", "custom", "http://host:9000/infer");
        let body = build_request_body(&model, "p");

        assert!(body.get("model").is_none());
        assert_eq!(body["prompt"], "p");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(body["timeout"], 30);
    }
}
