//! OpenAI-compatible provider implementation.
//!
//! Works with DashScope's compatible mode, OpenAI, DeepSeek, Ollama, vLLM and
//! any endpoint exposing `/chat/completions`. Only non-streaming completions
//! are used: the interaction loop needs the whole reply before parsing it.

use async_trait::async_trait;
use frontsmith_core::error::ProviderError;
use frontsmith_core::message::{Message, Role};
use frontsmith_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider with a 120s request timeout.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: build_client(Duration::from_secs(120)),
        }
    }

    /// Replace the HTTP client with one using `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// DashScope (Qwen) in OpenAI-compatible mode.
    pub fn dashscope(api_key: impl Into<String>) -> Self {
        Self::new("dashscope", "https://dashscope.aliyuncs.com/compatible-mode/v1", api_key)
    }

    /// Create an OpenAI provider (convenience constructor).
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                },
                content: m.content.clone(),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.stop.is_empty() {
            body["stop"] = serde_json::json!(request.stop);
        }

        body
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Map a non-200 status to the matching [`ProviderError`].
fn status_error(status: u16, model: &str, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited { retry_after_secs: 5 },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        404 => ProviderError::ModelNotFound(model.to_string()),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

/// Turn a chat-completions body into a [`ProviderResponse`].
fn parse_completion(body: &str) -> std::result::Result<ProviderResponse, ProviderError> {
    let api_response: ApiResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".into()))?;

    let usage = api_response.usage.map(|u| Usage {
        prompt_tokens: u.prompt_tokens,
        completion_tokens: u.completion_tokens,
        total_tokens: u.total_tokens,
    });

    Ok(ProviderResponse {
        message: Message::assistant(choice.message.content.unwrap_or_default()),
        usage,
        model: api_response.model,
    })
}

#[async_trait]
impl frontsmith_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "No API key configured for provider '{}'",
                self.name
            )));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = %self.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(transport_error)?;

        if status != 200 {
            warn!(status, body = %text, "Provider returned error");
            return Err(status_error(status, &request.model, text));
        }

        parse_completion(&text)
    }

    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: serde_json::Value = response.json().await.map_err(transport_error)?;

        let models = body["data"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API wire types ---

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: String,
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontsmith_core::Provider;

    #[test]
    fn dashscope_constructor() {
        let p = OpenAiCompatProvider::dashscope("sk-test");
        assert_eq!(p.name(), "dashscope");
        assert!(p.base_url().contains("compatible-mode"));
    }

    #[test]
    fn trailing_slash_trimmed() {
        let p = OpenAiCompatProvider::new("vllm", "http://localhost:8000/v1/", "x");
        assert_eq!(p.base_url(), "http://localhost:8000/v1");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![
            Message::system("protocol"),
            Message::user("Add a footer"),
            Message::assistant("Action: analyze_project()"),
        ];
        let api = OpenAiCompatProvider::to_api_messages(&messages);
        let roles: Vec<&str> = api.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(api[1].content, "Add a footer");
    }

    #[test]
    fn request_body_includes_optional_fields() {
        let mut request = ProviderRequest::new("qwen3-coder-plus", vec![Message::user("hi")]);
        request.max_tokens = Some(512);
        let body = OpenAiCompatProvider::request_body(&request);
        assert_eq!(body["model"], "qwen3-coder-plus");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["stream"], false);
        assert!(body.get("stop").is_none());
    }

    #[test]
    fn parse_completion_body() {
        let body = r#"{
            "model": "qwen3-coder-plus",
            "choices": [{"message": {"role": "assistant", "content": "Final Answer: ok"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
        }"#;
        let response = parse_completion(body).unwrap();
        assert_eq!(response.message.content, "Final Answer: ok");
        assert_eq!(response.message.role, Role::Assistant);
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(13));
    }

    #[test]
    fn empty_choices_is_invalid() {
        let err = parse_completion(r#"{"model":"m","choices":[]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(status_error(429, "m", String::new()), ProviderError::RateLimited { .. }));
        assert!(!status_error(401, "m", String::new()).is_transient());
        assert!(matches!(status_error(404, "qwen", String::new()), ProviderError::ModelNotFound(m) if m == "qwen"));
        assert!(status_error(503, "m", "busy".into()).is_transient());
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let p = OpenAiCompatProvider::new("dashscope", "http://127.0.0.1:9", "");
        let err = p
            .complete(ProviderRequest::new("m", vec![Message::user("hi")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    /// Serve one canned HTTP response on a local port and return its base URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/v1")
    }

    #[tokio::test]
    async fn models_endpoint_lists_ids_and_passes_health_check() {
        let base = serve_once("200 OK", r#"{"data":[{"id":"qwen3-coder-plus"},{"id":"qwen-turbo"}]}"#).await;
        let p = OpenAiCompatProvider::new("vllm", &base, "sk-test");

        assert!(p.health_check().await.unwrap());
        assert_eq!(p.list_models().await.unwrap(), vec!["qwen3-coder-plus", "qwen-turbo"]);
    }

    #[tokio::test]
    async fn rejected_key_fails_health_check() {
        let base = serve_once("401 Unauthorized", r#"{"error":"bad key"}"#).await;
        let p = OpenAiCompatProvider::new("vllm", &base, "sk-wrong");

        assert!(!p.health_check().await.unwrap());
        assert!(p.list_models().await.unwrap().is_empty());
    }
}
