//! Generation gateway: interchangeable text-completion backends.
//!
//! Every provider is reached through the same OpenAI-compatible chat protocol
//! (`{model, messages, temperature, max_tokens}` → `choices[0].message.content`),
//! so swapping providers never touches the router. Sampling stays low and
//! short (temperature 0.3, 300 tokens) for short factual answers. Backend
//! errors and malformed responses propagate as [`RagError::Generation`]; the
//! gateway never fabricates an answer.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::ProviderCredentials;
use crate::types::RagError;

/// Fixed sampling temperature for all completions.
pub const TEMPERATURE: f64 = 0.3;
/// Output-length cap for all completions.
pub const MAX_TOKENS: u32 = 300;

/// The supported completion providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Groq,
    LmStudio,
    Gemini,
}

impl ProviderKind {
    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::Groq => "groq",
            ProviderKind::LmStudio => "lm_studio",
            ProviderKind::Gemini => "gemini",
        }
    }
}

/// Session-scoped choice of provider and model, passed in with every query.
#[derive(Clone, Debug)]
pub struct ProviderSelection {
    pub provider: ProviderKind,
    pub model: String,
}

impl ProviderSelection {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

/// Sends one prompt to the selected backend and returns the completion text.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        selection: &ProviderSelection,
        prompt: &str,
    ) -> Result<String, RagError>;
}

/// How to attach credentials to requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// No authentication (local servers).
    None,
}

/// Static endpoint definition for one provider.
struct EndpointDef {
    base_url: &'static str,
    auth_style: AuthStyle,
}

fn endpoint_for(kind: ProviderKind) -> EndpointDef {
    match kind {
        ProviderKind::Groq => EndpointDef {
            base_url: "https://api.groq.com/openai/v1",
            auth_style: AuthStyle::Bearer,
        },
        ProviderKind::LmStudio => EndpointDef {
            base_url: "http://127.0.0.1:1234/v1",
            auth_style: AuthStyle::None,
        },
        // Google's OpenAI-compatible surface keeps the wire protocol uniform.
        ProviderKind::Gemini => EndpointDef {
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
            auth_style: AuthStyle::Bearer,
        },
    }
}

/// One OpenAI-compatible chat-completion backend.
///
/// Providers differ only in base URL and auth; the request and response
/// handling is identical for all of them.
#[derive(Clone, Debug)]
pub struct OpenAiCompatibleClient {
    name: &'static str,
    base_url: String,
    api_key: String,
    auth_style: AuthStyle,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    fn new(kind: ProviderKind, base_url: String, api_key: String) -> Self {
        Self {
            name: kind.name(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            auth_style: endpoint_for(kind).auth_style,
            client: reqwest::Client::new(),
        }
    }

    /// Client for an arbitrary OpenAI-compatible endpoint (used in tests).
    pub fn for_endpoint(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            name: "custom",
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_style: if api_key.is_empty() {
                AuthStyle::None
            } else {
                AuthStyle::Bearer
            },
            api_key,
            client: reqwest::Client::new(),
        }
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                request.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => request,
        }
    }

    /// Sends one flattened single-string prompt and returns the completion.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String, RagError> {
        if self.auth_style == AuthStyle::Bearer && self.api_key.is_empty() {
            return Err(RagError::Generation(format!(
                "{}: missing API key",
                self.name
            )));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let response = self
            .apply_auth(self.client.post(&url).json(&body))
            .send()
            .await
            .map_err(|err| {
                RagError::Generation(format!("{}: connection failed ({url}): {err}", self.name))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(RagError::Generation(format!(
                "{}: API error {status}: {text}",
                self.name
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|err| RagError::Generation(format!("{}: invalid JSON: {err}", self.name)))?;
        parsed["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                RagError::Generation(format!("{}: no choices in response", self.name))
            })
    }
}

/// Dispatches completions to the configured backend for each provider.
pub struct ProviderSet {
    groq: OpenAiCompatibleClient,
    lm_studio: OpenAiCompatibleClient,
    gemini: OpenAiCompatibleClient,
}

impl ProviderSet {
    pub fn from_credentials(credentials: &ProviderCredentials) -> Self {
        let lm_studio_url = credentials
            .lmstudio_base_url
            .clone()
            .unwrap_or_else(|| endpoint_for(ProviderKind::LmStudio).base_url.to_string());
        Self {
            groq: OpenAiCompatibleClient::new(
                ProviderKind::Groq,
                endpoint_for(ProviderKind::Groq).base_url.to_string(),
                credentials.groq_api_key.clone(),
            ),
            lm_studio: OpenAiCompatibleClient::new(
                ProviderKind::LmStudio,
                lm_studio_url,
                String::new(),
            ),
            gemini: OpenAiCompatibleClient::new(
                ProviderKind::Gemini,
                endpoint_for(ProviderKind::Gemini).base_url.to_string(),
                credentials.google_api_key.clone(),
            ),
        }
    }

    fn backend(&self, kind: ProviderKind) -> &OpenAiCompatibleClient {
        match kind {
            ProviderKind::Groq => &self.groq,
            ProviderKind::LmStudio => &self.lm_studio,
            ProviderKind::Gemini => &self.gemini,
        }
    }
}

#[async_trait]
impl CompletionGateway for ProviderSet {
    async fn complete(
        &self,
        selection: &ProviderSelection,
        prompt: &str,
    ) -> Result<String, RagError> {
        tracing::debug!(
            provider = selection.provider.name(),
            model = %selection.model,
            "dispatching completion"
        );
        self.backend(selection.provider)
            .complete(&selection.model, prompt)
            .await
    }
}

/// Canned-response gateway that counts invocations, for router tests.
pub struct MockCompletionGateway {
    reply: String,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockCompletionGateway {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of `complete` calls observed so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionGateway for MockCompletionGateway {
    async fn complete(
        &self,
        _selection: &ProviderSelection,
        _prompt: &str,
    ) -> Result<String, RagError> {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_providers_require_a_key() {
        let set = ProviderSet::from_credentials(&ProviderCredentials::default());
        let groq = set.backend(ProviderKind::Groq);
        assert_eq!(groq.auth_style, AuthStyle::Bearer);
        assert!(groq.api_key.is_empty());

        let local = set.backend(ProviderKind::LmStudio);
        assert_eq!(local.auth_style, AuthStyle::None);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let set = ProviderSet::from_credentials(&ProviderCredentials::default());
        let selection = ProviderSelection::new(ProviderKind::Groq, "llama-3.3-70b-versatile");
        let err = set.complete(&selection, "hi").await.unwrap_err();
        assert!(matches!(err, RagError::Generation(_)));
    }
}
