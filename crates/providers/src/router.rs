//! Provider router: selects the correct LLM provider based on config.

use std::collections::HashMap;
use std::sync::Arc;
use frontsmith_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
///
/// Every `[providers.<name>]` table becomes an OpenAI-compatible client. The
/// default provider is always registered, even without its own table.
pub fn build_from_config(config: &frontsmith_config::AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| config.api_key.clone())
            .unwrap_or_default();

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.clone(),
            Arc::new(OpenAiCompatProvider::new(&config.default_provider, &base_url, &api_key)),
        );
    }

    router
}

/// The model to request from `provider_name`: its table's `default_model`,
/// else the global default.
pub fn model_for(config: &frontsmith_config::AppConfig, provider_name: &str) -> String {
    config
        .providers
        .get(provider_name)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone())
}

/// Result of [`check_reachability`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reachability {
    /// The endpoint answered. `model_listed` is `None` when it publishes no
    /// model list.
    Reachable { model_listed: Option<bool> },
    /// The endpoint answered with an error status (bad key, wrong URL).
    Rejected,
    Unreachable(String),
}

/// Ask `provider` whether it is up and whether it serves `model`.
pub async fn check_reachability(provider: &dyn Provider, model: &str) -> Reachability {
    match provider.health_check().await {
        Ok(true) => {}
        Ok(false) => return Reachability::Rejected,
        Err(e) => return Reachability::Unreachable(e.to_string()),
    }
    let model_listed = match provider.list_models().await {
        Ok(models) if !models.is_empty() => Some(models.iter().any(|m| m == model)),
        _ => None,
    };
    Reachability::Reachable { model_listed }
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "dashscope" | "qwen" => "https://dashscope.aliyuncs.com/compatible-mode/v1".into(),
        "dashscope-intl" => "https://dashscope-intl.aliyuncs.com/compatible-mode/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}
