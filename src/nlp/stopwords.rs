//! Stopword filtering
//!
//! Optional removal of function words before n-grams are built. Lists come
//! from the `stop-words` crate, optionally extended with a custom list.
//! Matching is case-insensitive.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use stop_words::{get, LANGUAGE};

use crate::types::Token;

/// Serializable stopword settings.
///
/// ```json
/// { "language": "en", "extra": ["aircraft", "flight"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopwordConfig {
    /// Built-in list to start from. `None` starts from an empty list.
    pub language: Option<String>,
    /// Additional stopwords.
    pub extra: Vec<String>,
}

/// Lowercased stopword set applied to token streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwordFilter {
    words: FxHashSet<String>,
}

impl StopwordFilter {
    /// Built-in list for `language` (ISO code or English name).
    ///
    /// Supported: en, de, fr, es, it, pt, nl, ru, sv, no, da, fi, hu, tr, pl,
    /// ar. Anything else falls back to English with a warning.
    pub fn new(language: &str) -> Self {
        let words = get(language_list(language))
            .iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self { words }
    }

    /// A filter that keeps every token.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_list(words: &[&str]) -> Self {
        let mut filter = Self::empty();
        filter.extend(words.iter().copied());
        filter
    }

    /// Built-in list (if any) plus the extra words.
    pub fn from_config(config: &StopwordConfig) -> Self {
        let mut filter = match &config.language {
            Some(language) => Self::new(language),
            None => Self::empty(),
        };
        filter.extend(config.extra.iter().map(String::as_str));
        filter
    }

    pub fn extend<'w>(&mut self, words: impl IntoIterator<Item = &'w str>) {
        self.words
            .extend(words.into_iter().map(|w| w.trim().to_lowercase()).filter(|w| !w.is_empty()));
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    /// Drop stopwords from `tokens`, keeping the order of the survivors.
    pub fn retain_content(&self, tokens: &mut Vec<Token>) {
        if self.words.is_empty() {
            return;
        }
        tokens.retain(|t| !self.is_stopword(t));
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn language_list(language: &str) -> LANGUAGE {
    match language.trim().to_lowercase().as_str() {
        "en" | "english" => LANGUAGE::English,
        "de" | "german" => LANGUAGE::German,
        "fr" | "french" => LANGUAGE::French,
        "es" | "spanish" => LANGUAGE::Spanish,
        "it" | "italian" => LANGUAGE::Italian,
        "pt" | "portuguese" => LANGUAGE::Portuguese,
        "nl" | "dutch" => LANGUAGE::Dutch,
        "ru" | "russian" => LANGUAGE::Russian,
        "sv" | "swedish" => LANGUAGE::Swedish,
        "no" | "norwegian" => LANGUAGE::Norwegian,
        "da" | "danish" => LANGUAGE::Danish,
        "fi" | "finnish" => LANGUAGE::Finnish,
        "hu" | "hungarian" => LANGUAGE::Hungarian,
        "tr" | "turkish" => LANGUAGE::Turkish,
        "pl" | "polish" => LANGUAGE::Polish,
        "ar" | "arabic" => LANGUAGE::Arabic,
        other => {
            tracing::warn!(language = other, "unknown stopword language, using English");
            LANGUAGE::English
        }
    }
}
