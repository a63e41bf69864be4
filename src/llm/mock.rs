//! Deterministic mock providers for offline and test runs.
//!
//! Each mock reproduces one dialect's observable text conventions
//! without a network call, with a fixed marker string identifying the
//! provider and model. A keyed registry hands out at most one instance
//! per (provider, model) pair until explicitly cleared.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;

/// Offline stand-in for one LLM backend.
pub trait MockProvider: Send + Sync {
    /// Provider id (e.g., "ollama", "openai", "generic").
    fn provider_name(&self) -> &'static str;

    /// Model this instance was created for.
    fn model(&self) -> &str;

    /// Deterministic completion for a prompt.
    fn complete(&self, prompt: &str) -> String;
}

/// Local-inference mock: mirrors an Ollama-style server's plain text.
pub struct MockOllamaProvider {
    model: String,
}

impl MockProvider for MockOllamaProvider {
    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> String {
        mock_completion("mock ollama", &self.model, prompt)
    }
}

/// Chat-completions mock: mirrors an OpenAI-compatible assistant turn.
pub struct MockOpenAiProvider {
    model: String,
}

impl MockProvider for MockOpenAiProvider {
    fn provider_name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> String {
        mock_completion("mock openai", &self.model, prompt)
    }
}

/// Generic mock for backends with no recognized dialect.
pub struct MockGenericProvider {
    model: String,
}

impl MockProvider for MockGenericProvider {
    fn provider_name(&self) -> &'static str {
        "generic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> String {
        mock_completion("mock generic", &self.model, prompt)
    }
}

/// Completion text keyed off prompt intent, prefixed with the fixed
/// `[marker - model]` tag.
fn mock_completion(marker: &str, model: &str, prompt: &str) -> String {
    if prompt.trim().is_empty() {
        return format!("[{} - {}] Empty prompt provided", marker, model);
    }

    let lower = prompt.to_lowercase();
    let body = if lower.contains("document") {
        "Generated documentation: describes the element's purpose, parameters and return value."
    } else if lower.contains("example") {
        "Generated usage examples: demonstrates typical calls with sample inputs and outputs."
    } else if lower.contains("test") {
        "Generated unit tests: covers normal cases, edge cases and error handling."
    } else {
        "Generated response for the supplied prompt."
    };

    format!("[{} - {}] {}", marker, model, body)
}

/// Keyed registry with single-flight construction per (provider, model).
///
/// The map is consulted and populated under one lock, so concurrent
/// `get_or_create` calls for the same key observe exactly one instance.
pub struct MockProviderRegistry {
    providers: Mutex<HashMap<String, Arc<dyn MockProvider>>>,
}

impl MockProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Mutex::new(HashMap::new()),
        }
    }

    fn key(provider: &str, model: &str) -> String {
        format!("{}:{}", provider, model)
    }

    /// Get the cached instance for a key, creating it on first use.
    pub fn get_or_create(&self, provider: &str, model: &str) -> Arc<dyn MockProvider> {
        let mut map = match self.providers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(Self::key(provider, model))
            .or_insert_with(|| create_provider(provider, model))
            .clone()
    }

    /// Drop all cached instances.
    pub fn clear(&self) {
        if let Ok(mut map) = self.providers.lock() {
            map.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.providers.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MockProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn create_provider(provider: &str, model: &str) -> Arc<dyn MockProvider> {
    let model = model.to_string();
    match provider {
        "ollama" => Arc::new(MockOllamaProvider { model }),
        "openai" => Arc::new(MockOpenAiProvider { model }),
        _ => Arc::new(MockGenericProvider { model }),
    }
}

static REGISTRY: Lazy<MockProviderRegistry> = Lazy::new(MockProviderRegistry::new);

/// Process-wide registry lookup used by offline generation.
pub fn mock_provider_for(provider: &str, model: &str) -> Arc<dyn MockProvider> {
    REGISTRY.get_or_create(provider, model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_marker_identifies_provider_and_model() {
        let registry = MockProviderRegistry::new();
        let provider = registry.get_or_create("ollama", "llama3");
        let response = provider.complete("Analyze and document this method");

        assert!(response.starts_with("[mock ollama - llama3]"));
        assert!(response.contains("documentation"));
    }

    #[test]
    fn test_completion_is_deterministic() {
        let registry = MockProviderRegistry::new();
        let provider = registry.get_or_create("openai", "gpt-4");
        assert_eq!(provider.complete("same prompt"), provider.complete("same prompt"));
    }

    #[test]
    fn test_empty_prompt_convention() {
        let registry = MockProviderRegistry::new();
        let provider = registry.get_or_create("generic", "m");
        assert_eq!(provider.complete("  "), "[mock generic - m] Empty prompt provided");
    }

    #[test]
    fn test_registry_returns_same_instance_per_key() {
        let registry = MockProviderRegistry::new();
        let a = registry.get_or_create("ollama", "llama3");
        let b = registry.get_or_create("ollama", "llama3");
        assert!(Arc::ptr_eq(&a, &b));

        let other_model = registry.get_or_create("ollama", "mistral");
        assert!(!Arc::ptr_eq(&a, &other_model));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_clear_forgets_instances() {
        let registry = MockProviderRegistry::new();
        let before = registry.get_or_create("openai", "gpt-4");
        registry.clear();
        assert!(registry.is_empty());

        let after = registry.get_or_create("openai", "gpt-4");
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_concurrent_get_or_create_single_instance() {
        let registry = Arc::new(MockProviderRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get_or_create("ollama", "llama3"))
            })
            .collect();

        let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for instance in &instances[1..] {
            assert!(Arc::ptr_eq(&instances[0], instance));
        }
        assert_eq!(registry.len(), 1);
    }
}
