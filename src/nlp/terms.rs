//! Shared term extraction
//!
//! [`TermExtractor`] is the single path from narrative text to n-grams. The
//! corpus indexer and the dictionary scorer both hold one; building n-grams
//! any other way would let generation-time and scoring-time terms drift
//! apart and silently break dictionary matching.

use serde::{Deserialize, Serialize};

use super::ngram::NGramExtractor;
use super::normalizer::{Normalizer, NormalizerConfig};
use super::stopwords::{StopwordConfig, StopwordFilter};
use crate::pipeline::errors::Result;
use crate::types::{NGram, Token};

/// Everything that determines how a narrative becomes n-grams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSettings {
    pub n: usize,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    #[serde(default)]
    pub stopwords: Option<StopwordConfig>,
}

impl TermSettings {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            normalizer: NormalizerConfig::default(),
            stopwords: None,
        }
    }
}

/// Normalizer + optional stopword filter + fixed-length n-gram window.
#[derive(Debug, Clone)]
pub struct TermExtractor {
    normalizer: Normalizer,
    stopwords: Option<StopwordFilter>,
    ngrams: NGramExtractor,
}

impl TermExtractor {
    /// Extractor with the default normalizer and no stopwords.
    pub fn new(n: usize) -> Result<Self> {
        Self::from_settings(&TermSettings::new(n))
    }

    pub fn from_settings(settings: &TermSettings) -> Result<Self> {
        Ok(Self {
            normalizer: Normalizer::new(settings.normalizer.clone()),
            stopwords: settings.stopwords.as_ref().map(StopwordFilter::from_config),
            ngrams: NGramExtractor::new(settings.n)?,
        })
    }

    pub fn with_normalizer(mut self, config: NormalizerConfig) -> Self {
        self.normalizer = Normalizer::new(config);
        self
    }

    pub fn with_stopwords(mut self, filter: StopwordFilter) -> Self {
        self.stopwords = Some(filter);
        self
    }

    pub fn n(&self) -> usize {
        self.ngrams.n()
    }

    /// Normalized tokens after stopword removal.
    pub fn tokens(&self, narrative: &str) -> Vec<Token> {
        let mut tokens = self.normalizer.normalize(narrative);
        if let Some(filter) = &self.stopwords {
            filter.retain_content(&mut tokens);
        }
        tokens
    }

    /// N-grams of the narrative in positional order.
    pub fn ngrams(&self, narrative: &str) -> Vec<NGram> {
        self.ngrams.extract(&self.tokens(narrative))
    }
}
