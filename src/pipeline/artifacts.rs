//! Pipeline outputs.
//!
//! [`GenerationResult`] and [`ScoringResult`] are the public contract of the
//! two pipelines. Both serialize with serde so writers outside the crate can
//! export them as CSV or JSON.

use serde::{Deserialize, Serialize};

use crate::nlp::TermSettings;
use crate::pipeline::errors::Result;
use crate::scoring::Dictionary;
use crate::types::{DictionaryEntry, RowRejection, ScoredRecord};

/// Counters describing one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Rows in the input batch.
    pub records_seen: usize,
    /// Rows that contributed to the contingency counts (N).
    pub records_used: u64,
    pub positive: u64,
    pub negative: u64,
    pub rejected: u64,
    /// Distinct n-grams observed before minimum-support filtering.
    pub distinct_ngrams: usize,
    /// N-grams left after minimum-support filtering.
    pub supported_ngrams: usize,
    pub dictionary_size: usize,
    pub rejections: Vec<RowRejection>,
}

/// The dictionary produced for one target label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub n: usize,
    pub target_label: String,
    /// Ranked entries, best first.
    pub entries: Vec<DictionaryEntry>,
    pub summary: GenerationSummary,
    /// Term extraction the dictionary was built with; scoring must reuse it.
    pub terms: TermSettings,
}

impl GenerationResult {
    /// `(ngram, weight)` rows in rank order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|e| (e.ngram.as_str(), e.weight))
    }

    /// The entries as a validated [`Dictionary`].
    pub fn dictionary(&self) -> Result<Dictionary> {
        Dictionary::from_entries(self.n, &self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters describing one scoring run.
///
/// `records_scored + rejected == records_seen`. Empty narratives are scored
/// (at 0) and counted in `empty_narratives`; `rejections` lists both kinds of
/// row diagnostic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringSummary {
    pub records_seen: usize,
    pub records_scored: usize,
    /// Scored records with at least one dictionary match.
    pub records_matched: usize,
    /// Rows that produced no scored record.
    pub rejected: usize,
    /// Scored rows whose narrative yielded no n-grams.
    #[serde(default)]
    pub empty_narratives: usize,
    pub dictionary_size: usize,
    pub rejections: Vec<RowRejection>,
}

/// Ranked records of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Descending score, ties in input order.
    pub records: Vec<ScoredRecord>,
    pub summary: ScoringSummary,
}

impl ScoringResult {
    pub fn top(&self, k: usize) -> &[ScoredRecord] {
        &self.records[..k.min(self.records.len())]
    }
}
