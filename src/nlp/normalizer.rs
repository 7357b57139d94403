//! Narrative normalization and tokenization
//!
//! Turns raw narrative text into the ordered token stream that n-grams are
//! built from. Filtering happens before adjacency is defined: dropping a
//! short token makes its neighbours adjacent.

use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::types::Token;

/// Normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Lowercase the narrative before tokenizing.
    pub lowercase: bool,
    /// Treat every character that is neither alphanumeric nor whitespace as
    /// a token boundary.
    pub strip_punctuation: bool,
    /// Split on runs of any whitespace. When `false`, only the ASCII space
    /// separates tokens and every space is its own boundary.
    pub collapse_whitespace: bool,
    /// Tokens with fewer characters than this are dropped.
    pub min_token_length: usize,
    /// Parse the narrative as an HTML fragment and keep only its text.
    pub strip_markup: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            strip_punctuation: true,
            collapse_whitespace: true,
            min_token_length: 3,
            strip_markup: true,
        }
    }
}

/// Narrative normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize `narrative` into an ordered token sequence.
    ///
    /// An empty result is valid and yields zero n-grams downstream.
    pub fn normalize(&self, narrative: &str) -> Vec<Token> {
        let cfg = &self.config;

        let mut text = if cfg.strip_markup {
            strip_markup(narrative)
        } else {
            narrative.to_string()
        };
        if cfg.lowercase {
            text = text.to_lowercase();
        }

        let keep = |token: &str| {
            !token.is_empty() && token.chars().count() >= cfg.min_token_length
        };

        let mut tokens = Vec::new();
        let mut push_pieces = |raw: &str| {
            if cfg.strip_punctuation {
                tokens.extend(
                    raw.split(|c: char| !c.is_alphanumeric() && !c.is_whitespace())
                        .filter(|&piece| keep(piece))
                        .map(str::to_string),
                );
            } else if keep(raw) {
                tokens.push(raw.to_string());
            }
        };

        if cfg.collapse_whitespace {
            text.split_whitespace().for_each(&mut push_pieces);
        } else {
            text.split(' ').for_each(&mut push_pieces);
        }

        tokens
    }
}

/// Text content of `text` parsed as an HTML fragment. Text nodes are joined
/// with spaces so words on either side of a tag stay apart; entities are
/// decoded exactly once.
fn strip_markup(text: &str) -> String {
    if !text.contains(['<', '&']) {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect::<Vec<_>>().join(" ")
}
