//! Breed recommendations from a hosted language model.
//!
//! `scout ask` retrieves the top-K breed documents for a question, renders
//! them into a prompt with [`build_prompt`], and sends it to a
//! [`CompletionProvider`].
//!
//! # Providers
//!
//! | Provider | Behavior |
//! |----------|----------|
//! | `"disabled"` | [`DisabledProvider`]: every call fails with [`AssistantError::Disabled`] |
//! | `"openai"` | [`OpenAiProvider`]: `POST {base_url}/chat/completions` |
//!
//! # Retry
//!
//! The OpenAI provider retries HTTP 429 (except quota exhaustion), 5xx, and
//! network errors with exponential backoff (1s, 2s, 4s, ... capped at 32s)
//! up to `assistant.max_retries` times. Other 4xx responses fail at once.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{AssistantConfig, Config};
use crate::fallback;
use crate::search::{Retriever, ScoredDocument};

/// Environment variable holding the OpenAI API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Placeholder value shipped in sample env files; treated as unset.
const PLACEHOLDER_KEY: &str = "your-key";

#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("assistant is disabled (set assistant.provider = \"openai\")")]
    Disabled,
    #[error("OPENAI_API_KEY is not set to a valid key")]
    MissingCredential,
    #[error("API quota exceeded; check billing for this key")]
    Quota,
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A language-model backend that turns a prompt into text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError>;
}

pub struct DisabledProvider;

#[async_trait]
impl CompletionProvider for DisabledProvider {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String, AssistantError> {
        Err(AssistantError::Disabled)
    }
}

/// Chat-completions client for the OpenAI API (or a compatible server).
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_retries: u32,
    backoff_base: Duration,
}

impl OpenAiProvider {
    /// Build a provider with an explicit key.
    ///
    /// Rejects a missing, blank, or placeholder key before any request.
    pub fn new(config: &AssistantConfig, api_key: Option<String>) -> Result<Self, AssistantError> {
        let api_key = match api_key {
            Some(k) if !k.trim().is_empty() && k.trim() != PLACEHOLDER_KEY => k.trim().to_string(),
            _ => return Err(AssistantError::MissingCredential),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(AssistantError::Network)?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            max_retries: config.max_retries,
            backoff_base: Duration::from_secs(1),
        })
    }

    /// Build a provider reading the key from `OPENAI_API_KEY`.
    pub fn from_env(config: &AssistantConfig) -> Result<Self, AssistantError> {
        Self::new(config, std::env::var(API_KEY_ENV).ok())
    }

    /// Override the first backoff step (later steps double it).
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, AssistantError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff_base * (1u32 << (attempt - 1).min(5));
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying completion");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| AssistantError::InvalidResponse(e.to_string()))?;
                        return parse_completion(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();

                    if status.as_u16() == 429 && body_text.contains("insufficient_quota") {
                        return Err(AssistantError::Quota);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        tracing::warn!(status = status.as_u16(), attempt, "completion request failed");
                        last_err = Some(AssistantError::Api {
                            status: status.as_u16(),
                            body: body_text,
                        });
                        continue;
                    }

                    return Err(AssistantError::Api {
                        status: status.as_u16(),
                        body: body_text,
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "completion request failed");
                    last_err = Some(AssistantError::Network(e));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            AssistantError::InvalidResponse("no attempt was made".to_string())
        }))
    }
}

/// Extract `choices[0].message.content`.
fn parse_completion(json: &serde_json::Value) -> Result<String, AssistantError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| AssistantError::InvalidResponse("missing choices[0].message.content".into()))
}

/// Create the provider named by `assistant.provider`.
pub fn create_provider(config: &AssistantConfig) -> Result<Box<dyn CompletionProvider>, AssistantError> {
    if !config.is_enabled() {
        return Ok(Box::new(DisabledProvider));
    }
    Ok(Box::new(OpenAiProvider::from_env(config)?))
}

/// Render the recommendation prompt for `question` over `docs`.
pub fn build_prompt(question: &str, docs: &[ScoredDocument]) -> String {
    let mut prompt = String::from(
        "You are a warm, friendly assistant that recommends dog breeds based on a user's lifestyle.\n\
         \n\
         TASK: Based on the breed information provided, answer the user's question.\n\
         \n\
         INSTRUCTIONS:\n\
         - Provide 1-3 breed recommendations with brief explanations\n\
         - Each recommendation should list 2-4 key reasons why it's suitable\n\
         - Consider the user's lifestyle, space, energy level, and preferences\n\
         - If information doesn't directly address the question, make reasonable inferences\n\
         - Be personable and encouraging\n\
         \n\
         BREED INFORMATION:\n",
    );

    for scored in docs {
        prompt.push_str(&format!(
            "- {}: {}\n",
            scored.document.title, scored.document.content
        ));
    }

    prompt.push_str(&format!("\nUSER QUESTION: {}\n\nRESPONSE:", question.trim()));
    prompt
}

/// Outcome of one question: the context is always returned.
pub struct Recommendation {
    pub documents: Vec<ScoredDocument>,
    pub answer: Result<String, AssistantError>,
}

pub async fn recommend(
    retriever: &Retriever,
    provider: &dyn CompletionProvider,
    question: &str,
    k: usize,
) -> Recommendation {
    let documents = retriever.top_k(question, k);
    let prompt = build_prompt(question, &documents);
    tracing::debug!(provider = provider.name(), docs = documents.len(), "requesting completion");
    let answer = provider.complete(&prompt).await;
    Recommendation { documents, answer }
}

/// Entry point for `scout ask`.
pub async fn run_ask(
    config: &Config,
    question: &str,
    limit: Option<usize>,
    data: Option<PathBuf>,
) -> Result<()> {
    let path = data.unwrap_or_else(|| config.store.path.clone());
    let retriever = Retriever::load(&path, fallback::BUILTIN_BREEDS);
    let k = limit.unwrap_or(config.retrieval.top_k);

    let provider: Box<dyn CompletionProvider> = match create_provider(&config.assistant) {
        Ok(p) => p,
        Err(e) => {
            // Still show what would have been sent.
            let docs = retriever.top_k(question, k);
            print_context(&docs);
            anyhow::bail!("assistant unavailable: {}", e);
        }
    };

    let rec = recommend(&retriever, provider.as_ref(), question, k).await;
    print_context(&rec.documents);

    match rec.answer {
        Ok(text) => {
            println!("{}", text);
            Ok(())
        }
        Err(e) => anyhow::bail!("assistant failed: {}", e),
    }
}

fn print_context(docs: &[ScoredDocument]) {
    if docs.is_empty() {
        println!("No matching breeds.");
        return;
    }
    println!("Matching breeds:");
    for (i, d) in docs.iter().enumerate() {
        println!("  {}. [{:.2}] {}", i + 1, d.normalized, d.document.title);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::BUILTIN_BREEDS;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, max_retries: u32) -> AssistantConfig {
        AssistantConfig {
            base_url: format!("{}/v1", server.uri()),
            max_retries,
            ..AssistantConfig::default()
        }
    }

    fn fallback_docs(question: &str) -> Vec<ScoredDocument> {
        Retriever::from_documents(fallback::to_documents(BUILTIN_BREEDS)).top_k(question, 3)
    }

    #[test]
    fn prompt_lists_breeds_and_question() {
        let docs = fallback_docs("good with kids");
        let prompt = build_prompt("  Which dog is good with kids?  ", &docs);

        assert!(prompt.starts_with(
            "You are a warm, friendly assistant that recommends dog breeds based on a user's lifestyle.\n\nTASK: "
        ));
        assert!(prompt.contains("\nINSTRUCTIONS:\n- Provide 1-3 breed recommendations"));
        assert!(prompt.contains("list 2-4 key reasons"));
        assert!(prompt.contains("BREED INFORMATION:\n- "));
        assert!(prompt.contains("\n- Golden Retriever: Affectionate"));
        assert!(prompt.contains("USER QUESTION: Which dog is good with kids?\n"));
        assert!(prompt.ends_with("RESPONSE:"));
        assert_eq!(prompt.matches("\n- ").count() - 5, docs.len());
    }

    #[test]
    fn rejects_missing_blank_and_placeholder_keys() {
        let config = AssistantConfig::default();
        for key in [None, Some(""), Some("   "), Some("your-key")] {
            let result = OpenAiProvider::new(&config, key.map(String::from));
            assert!(matches!(result, Err(AssistantError::MissingCredential)));
        }
        assert!(OpenAiProvider::new(&config, Some("sk-test".into())).is_ok());
    }

    #[tokio::test]
    async fn disabled_provider_always_fails() {
        let err = DisabledProvider.complete("hi").await.unwrap_err();
        assert!(matches!(err, AssistantError::Disabled));
    }

    #[tokio::test]
    async fn successful_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": " Try a Poodle. " } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server, 0), Some("sk-test".into())).unwrap();
        assert_eq!(provider.complete("prompt").await.unwrap(), "Try a Poodle.");
    }

    #[tokio::test]
    async fn quota_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "type": "insufficient_quota", "message": "You exceeded your quota" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server, 3), Some("sk-test".into()))
            .unwrap()
            .with_backoff(Duration::from_millis(1));
        assert!(matches!(provider.complete("p").await, Err(AssistantError::Quota)));
    }

    #[tokio::test]
    async fn client_error_fails_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server, 3), Some("sk-test".into()))
            .unwrap()
            .with_backoff(Duration::from_millis(1));
        match provider.complete("p").await {
            Err(AssistantError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server, 2), Some("sk-test".into()))
            .unwrap()
            .with_backoff(Duration::from_millis(1));
        assert!(matches!(
            provider.complete("p").await,
            Err(AssistantError::Api { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(&config_for(&server, 0), Some("sk-test".into())).unwrap();
        assert!(matches!(
            provider.complete("p").await,
            Err(AssistantError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn recommend_returns_context_on_failure() {
        let retriever = Retriever::from_documents(fallback::to_documents(BUILTIN_BREEDS));
        let rec = recommend(&retriever, &DisabledProvider, "low shedding", 2).await;
        assert_eq!(rec.documents.len(), 2);
        assert_eq!(rec.documents[0].document.title, "Poodle (Standard)");
        assert!(rec.answer.is_err());
    }
}
