//! LLM provider abstraction.
//!
//! A [`ModelConfig`] describes one backend. Its request/response
//! [`Dialect`] is resolved once at construction by inspecting the base
//! URL, provider id and model name; request building, response parsing
//! and the HTTP client all dispatch on the resolved tag instead of
//! re-deriving it per call.

pub mod client;
pub mod mock;
pub mod prompts;
pub mod request;
pub mod response;

use serde::Deserialize;

pub use client::{LlmClient, LlmError};
pub use mock::{mock_provider_for, MockProvider, MockProviderRegistry};

/// Defaults applied when a config omits a field.
pub const DEFAULT_MODEL_NAME: &str = "default";
pub const DEFAULT_PROVIDER: &str = "generic-local";
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Request/response shape spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Ollama-style local inference servers.
    LocalInference,
    /// Chat-completions APIs compatible with OpenAI's.
    OpenAiCompatible,
    /// Anything else: bare prompt in, loosely-shaped JSON out.
    Generic,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::LocalInference => "local-inference",
            Dialect::OpenAiCompatible => "openai-compatible",
            Dialect::Generic => "generic",
        }
    }

    /// Detect the dialect from config fields. Local-inference markers
    /// are checked first, then OpenAI markers; everything else is
    /// generic.
    fn detect(name: &str, provider: &str, base_url: &str) -> Self {
        if base_url.contains("ollama")
            || base_url.contains("11434")
            || provider == "ollama"
            || name.starts_with("llama")
            || name.starts_with("mistral")
            || name.starts_with("codellama")
        {
            return Dialect::LocalInference;
        }

        if base_url.contains("openai") || provider == "openai" || name.starts_with("gpt-") {
            return Dialect::OpenAiCompatible;
        }

        Dialect::Generic
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw model entry as it appears in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfigFile {
    pub name: Option<String>,
    pub provider: Option<String>,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// One LLM backend, with defaults applied and the dialect resolved.
///
/// Immutable after construction; safe to share across concurrent
/// callers without synchronization.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub name: String,
    pub provider: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    dialect: Dialect,
}

impl ModelConfig {
    pub fn from_file_entry(raw: ModelConfigFile) -> Self {
        let name = raw
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
        let provider = raw
            .provider
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let base_url = raw
            .base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let dialect = Dialect::detect(&name, &provider, &base_url);

        Self {
            name,
            provider,
            base_url,
            api_key: raw.api_key.filter(|k| !k.is_empty()),
            max_tokens: raw.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout_seconds: raw.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            dialect,
        }
    }

    /// Convenience constructor for programmatic use.
    pub fn new(name: &str, provider: &str, base_url: &str) -> Self {
        Self::from_file_entry(ModelConfigFile {
            name: Some(name.to_string()),
            provider: Some(provider.to_string()),
            base_url: Some(base_url.to_string()),
            ..Default::default()
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Full request URL for this backend's dialect.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        match self.dialect {
            Dialect::LocalInference => format!("{}/api/generate", base),
            Dialect::OpenAiCompatible => format!("{}/v1/chat/completions", base),
            Dialect::Generic => self.base_url.clone(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::from_file_entry(ModelConfigFile::default())
    }
}
