//! HTTP client for LLM backends.
//!
//! One failed call must not abort a batch: [`LlmClient::generate`]
//! degrades transport failures and timeouts to a synthetic error string
//! embedding the model name, and batch generation bounds its
//! concurrency with `buffer_unordered`.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use log::warn;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

use super::{request, response, Dialect, ModelConfig};

/// Errors from one LLM transport attempt.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
}

pub struct LlmClient {
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("docweaver/0.1.0")
            .build()
            .expect("failed to create HTTP client");
        Self { http }
    }

    /// Generate text for a prompt. Never fails: transport errors yield
    /// an error string embedding the model name.
    pub async fn generate(&self, model: &ModelConfig, prompt: &str) -> String {
        match self.try_generate(model, prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("LLM call failed for model {}: {}", model.name, e);
                format!("Error generating content with {}", model.name)
            }
        }
    }

    async fn try_generate(&self, model: &ModelConfig, prompt: &str) -> Result<String, LlmError> {
        let body = request::build_request_body(model, prompt);

        let mut req = self
            .http
            .post(model.endpoint())
            .header(CONTENT_TYPE, "application/json")
            .timeout(Duration::from_secs(model.timeout_seconds))
            .json(&body);

        // Local inference servers take no auth header.
        if model.dialect() != Dialect::LocalInference {
            if let Some(key) = &model.api_key {
                req = req.bearer_auth(key);
            }
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout
            } else {
                LlmError::Network(e)
            }
        })?;

        let text = resp.text().await.map_err(LlmError::Network)?;
        Ok(response::parse_response(model.dialect(), &text))
    }

    /// Generate text for many prompts with at most `max_workers`
    /// in-flight calls. Returns (key, generated text) pairs; completion
    /// order is not the submission order.
    pub async fn generate_batch(
        &self,
        model: &ModelConfig,
        prompts: Vec<(String, String)>,
        max_workers: usize,
    ) -> Vec<(String, String)> {
        stream::iter(prompts)
            .map(|(key, prompt)| async move {
                let text = self.generate(model, &prompt).await;
                (key, text)
            })
            .buffer_unordered(max_workers.max(1))
            .collect()
            .await
    }
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_string_embeds_model_name() {
        // Unroutable address: the call degrades instead of erroring.
        let model = ModelConfig::new("testmodel", "custom", "http://127.0.0.1:1/infer");
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let client = LlmClient::new();

        let result = runtime.block_on(client.generate(&model, "prompt"));
        assert_eq!(result, "Error generating content with testmodel");
    }

    #[test]
    fn test_batch_preserves_keys() {
        let model = ModelConfig::new("m", "custom", "http://127.0.0.1:1/infer");
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let client = LlmClient::new();

        let prompts = vec![
            ("a".to_string(), "p1".to_string()),
            ("b".to_string(), "p2".to_string()),
        ];
        let mut results = runtime.block_on(client.generate_batch(&model, prompts, 4));
        results.sort();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "a");
        assert_eq!(results[1].0, "b");
    }
}
