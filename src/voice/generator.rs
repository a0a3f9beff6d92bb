//! Phrase generation via a chat-completion service

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::{Error, Result};

/// A chat-completion service
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Complete `prompt` under the `system` instruction, returning the raw text
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// `OpenAI` chat completions
pub struct OpenAiCompletions {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompletions {
    /// Create a new `OpenAI` completion client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing or the HTTP client cannot be built
    pub fn new(api_key: SecretString, config: &GenerationConfig) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for generation".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionProvider for OpenAiCompletions {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("OpenAI API error {status}: {body}")));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("failed to parse OpenAI response: {e}")))?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Generation("response contained no text".to_string()))
    }
}

/// Outcome of one generation attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// The service produced a phrase
    Spoken(String),
    /// The service failed and a pre-written phrase was substituted
    Fallback {
        text: String,
        reason: String,
    },
    /// The service failed and no fallback is configured
    Failed(String),
}

impl Generation {
    /// Text to speak, if any
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Spoken(text) | Self::Fallback { text, .. } => Some(text),
            Self::Failed(_) => None,
        }
    }
}

/// Strip whitespace, then surrounding quote characters
#[must_use]
pub fn clean_utterance(raw: &str) -> String {
    raw.trim().trim_matches(['"', '\'']).to_string()
}

/// Produces the elf's utterance for a composed prompt
pub struct PhraseGenerator {
    provider: Box<dyn CompletionProvider>,
    system_prompt: String,
    fallback_phrases: Vec<String>,
}

impl PhraseGenerator {
    /// Create a generator; an empty `fallback_phrases` makes failures abort the cycle
    #[must_use]
    pub fn new(
        provider: Box<dyn CompletionProvider>,
        system_prompt: String,
        fallback_phrases: Vec<String>,
    ) -> Self {
        Self {
            provider,
            system_prompt,
            fallback_phrases,
        }
    }

    /// Generate an utterance for the rendered prompt
    pub async fn generate<R: Rng + Send + ?Sized>(&self, prompt: &str, rng: &mut R) -> Generation {
        tracing::info!(provider = self.provider.name(), "generating phrase");

        let reason = match self.provider.complete(&self.system_prompt, prompt).await {
            Ok(raw) => {
                let text = clean_utterance(&raw);
                if text.is_empty() {
                    "empty response".to_string()
                } else {
                    tracing::info!(text = %text, "nisse says");
                    return Generation::Spoken(text);
                }
            }
            Err(Error::Http(e)) if e.is_timeout() => format!("request timed out: {e}"),
            Err(e) => e.to_string(),
        };

        tracing::error!(reason = %reason, "generation failed");

        match self.fallback_phrases.choose(rng) {
            Some(text) => {
                tracing::warn!(text = %text, "using fallback phrase");
                Generation::Fallback {
                    text: text.clone(),
                    reason,
                }
            }
            None => Generation::Failed(reason),
        }
    }
}
