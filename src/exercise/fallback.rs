//! Offline word table and the fallback wrapper around any [`WordSource`].
//!
//! When the wrapped source fails for any reason (`Request`, `Timeout`,
//! `Parse`, `NoWord`) or proposes a word the learner cannot spell yet,
//! [`FallbackWordSource`] answers from [`StaticWordSource`] instead.  Word
//! exercises keep working when no content service is running.

use async_trait::async_trait;

use super::source::{GeneratorError, WordRequest, WordSource};

// ---------------------------------------------------------------------------
// StaticWordSource
// ---------------------------------------------------------------------------

/// Built-in practice words, tried in order.
pub const STATIC_WORDS: &[&str] = &[
    "CAT", "DOG", "HAT", "SUN", "BIG", "RED", "BLUE", "GREEN", "BOOK", "TREE",
];

/// Picks the first word of a fixed table that the learner can spell.
#[derive(Debug, Clone)]
pub struct StaticWordSource {
    words: Vec<String>,
}

impl StaticWordSource {
    pub fn new() -> Self {
        Self::with_words(STATIC_WORDS.iter().copied())
    }

    pub fn with_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_ascii_uppercase())
                .collect(),
        }
    }

    /// The first usable word, if any.
    pub fn pick(&self, request: &WordRequest) -> Option<&str> {
        self.words
            .iter()
            .map(String::as_str)
            .find(|w| request.accepts(w))
    }
}

impl Default for StaticWordSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WordSource for StaticWordSource {
    async fn suggest_word(&self, request: &WordRequest) -> Result<String, GeneratorError> {
        self.pick(request)
            .map(str::to_string)
            .ok_or(GeneratorError::NoWord)
    }
}

// ---------------------------------------------------------------------------
// FallbackWordSource
// ---------------------------------------------------------------------------

/// Wraps any [`WordSource`] and falls back to a [`StaticWordSource`].
///
/// Returns `Err(NoWord)` only when the static table has nothing usable
/// either.
///
/// # Example
/// ```rust
/// use fingerspell::config::ContentConfig;
/// use fingerspell::exercise::{ApiWordSource, FallbackWordSource};
///
/// let inner = ApiWordSource::from_config(&ContentConfig::default());
/// let words = FallbackWordSource::new(inner);
/// // `words` implements WordSource and works without a content service.
/// ```
pub struct FallbackWordSource<S: WordSource> {
    inner: S,
    fallback: StaticWordSource,
}

impl<S: WordSource> FallbackWordSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fallback: StaticWordSource::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: WordSource> WordSource for FallbackWordSource<S> {
    async fn suggest_word(&self, request: &WordRequest) -> Result<String, GeneratorError> {
        match self.inner.suggest_word(request).await {
            Ok(word) if request.accepts(&word) => return Ok(word),
            Ok(word) => log::warn!("content: rejected word {word:?}, using built-in table"),
            Err(err) => log::warn!("content: word generation failed ({err}), using built-in table"),
        }
        self.fallback.suggest_word(request).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
