//! Core `WordSource` trait and `ApiWordSource` implementation.
//!
//! `ApiWordSource` asks any OpenAI-compatible `/v1/chat/completions`
//! endpoint for a practice word built only from letters the user has
//! already learned.  All connection details come from [`ContentConfig`].

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ContentConfig;

use super::progress::Level;

// ---------------------------------------------------------------------------
// GeneratorError
// ---------------------------------------------------------------------------

/// Errors that can occur while generating exercise content.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("word generation request timed out")]
    Timeout,

    /// The HTTP response could not be parsed as expected JSON.
    #[error("failed to parse generator response: {0}")]
    Parse(String),

    /// The response contained no usable word.
    #[error("generator returned no usable word")]
    NoWord,
}

impl From<reqwest::Error> for GeneratorError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GeneratorError::Timeout
        } else {
            GeneratorError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// WordRequest / WordSource
// ---------------------------------------------------------------------------

/// What the generator knows about the learner when asking for a word.
#[derive(Debug, Clone, PartialEq)]
pub struct WordRequest {
    pub level: Level,
    pub completed: usize,
    /// Sorted, distinct, upper-case.
    pub learned: Vec<char>,
}

impl WordRequest {
    /// A word is usable when it has at least three letters and every letter
    /// has been learned.
    pub fn accepts(&self, word: &str) -> bool {
        word.chars().count() >= 3 && word.chars().all(|c| self.learned.contains(&c))
    }
}

/// Async source of practice words.
///
/// Implementors must be `Send + Sync` so they can be shared across request
/// handlers behind an `Arc<dyn WordSource>`.
#[async_trait]
pub trait WordSource: Send + Sync {
    /// Suggest an upper-case word.  Callers still validate the result with
    /// [`WordRequest::accepts`].
    async fn suggest_word(&self, request: &WordRequest) -> Result<String, GeneratorError>;
}

// ---------------------------------------------------------------------------
// ApiWordSource
// ---------------------------------------------------------------------------

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct ApiWordSource {
    client: reqwest::Client,
    config: ContentConfig,
}

impl ApiWordSource {
    /// Build from config.  The HTTP client carries the per-request timeout
    /// from `config.timeout_secs`.
    pub fn from_config(config: &ContentConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn prompt(request: &WordRequest) -> String {
        let letters: Vec<String> = request.learned.iter().map(char::to_string).collect();
        format!(
            "Generate a simple word building exercise for sign language learning.\n\
             User level: {level:?}\n\
             Previously completed exercises: {completed}\n\
             Letters the user has learned: {letters}\n\n\
             Pick a simple, common English word of 3-5 letters that uses ONLY these letters.\n\
             Return only the word, nothing else.",
            level = request.level,
            completed = request.completed,
            letters = letters.join(", "),
        )
    }
}

/// First alphabetic run of a model reply, upper-cased.
pub(crate) fn extract_word(reply: &str) -> Option<String> {
    let word: String = reply
        .trim()
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_ascii_alphabetic())
        .to_ascii_uppercase();
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    Some(word)
}

#[async_trait]
impl WordSource for ApiWordSource {
    /// The `Authorization: Bearer …` header is attached only when
    /// `config.api_key` is a non-empty string.
    async fn suggest_word(&self, request: &WordRequest) -> Result<String, GeneratorError> {
        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model":       self.config.model,
            "messages": [
                { "role": "system", "content": "You write short finger-spelling practice words." },
                { "role": "user",   "content": Self::prompt(request) }
            ],
            "stream":      false,
            "temperature": self.config.temperature,
            "max_tokens":  16
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req.send().await?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeneratorError::Parse(e.to_string()))?;

        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or(GeneratorError::NoWord)?;

        extract_word(reply).ok_or(GeneratorError::NoWord)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
