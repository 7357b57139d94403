//! Core data types shared by the generation and scoring pipelines.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::association::Metric;

/// Separator placed between the tokens of an n-gram.
pub const NGRAM_SEPARATOR: &str = " ";

/// A normalized word unit.
pub type Token = String;

/// One input row.
///
/// `label` is present for generation input and absent for scoring input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl Record {
    /// An unlabeled record, as fed to the scoring pipeline.
    pub fn new(id: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            narrative: Some(narrative.into()),
            label: None,
        }
    }

    /// A labeled record, as fed to the generation pipeline.
    pub fn labeled(
        id: impl Into<String>,
        narrative: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            narrative: Some(narrative.into()),
            label: Some(label.into()),
        }
    }
}

/// A contiguous sequence of `length` tokens joined by [`NGRAM_SEPARATOR`].
///
/// Equality and hashing are textual: `length` is derived from `text`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NGram {
    pub text: String,
    pub length: usize,
}

impl NGram {
    pub fn from_tokens(tokens: &[Token]) -> Self {
        Self {
            text: tokens.join(NGRAM_SEPARATOR),
            length: tokens.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for NGram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Which side of the one-vs-rest split a labeled record falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    Positive,
    Negative,
}

/// Per-n-gram counts stratified by label.
///
/// `df` counts records containing the n-gram at least once, `tf` counts
/// every occurrence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencyEntry {
    pub df_positive: u64,
    pub df_negative: u64,
    pub tf_positive: u64,
    pub tf_negative: u64,
}

impl ContingencyEntry {
    /// Record that one document of `stratum` contains the n-gram
    /// `occurrences` times.
    pub fn observe(&mut self, stratum: Stratum, occurrences: u64) {
        debug_assert!(occurrences > 0);
        match stratum {
            Stratum::Positive => {
                self.df_positive += 1;
                self.tf_positive += occurrences;
            }
            Stratum::Negative => {
                self.df_negative += 1;
                self.tf_negative += occurrences;
            }
        }
    }

    /// Summation merge. Commutative and associative.
    pub fn merge(&mut self, other: &ContingencyEntry) {
        self.df_positive += other.df_positive;
        self.df_negative += other.df_negative;
        self.tf_positive += other.tf_positive;
        self.tf_negative += other.tf_negative;
    }

    pub fn df_total(&self) -> u64 {
        self.df_positive + self.df_negative
    }

    pub fn tf_total(&self) -> u64 {
        self.tf_positive + self.tf_negative
    }
}

/// Corpus-level counts used as contingency-table margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusTotals {
    /// Usable labeled records (N).
    pub records: u64,
    /// Records in the positive stratum.
    pub positive: u64,
    /// Records in the negative stratum.
    pub negative: u64,
    /// Rows excluded from the statistics.
    pub rejected: u64,
}

impl CorpusTotals {
    pub fn merge(&mut self, other: &CorpusTotals) {
        self.records += other.records;
        self.positive += other.positive;
        self.negative += other.negative;
        self.rejected += other.rejected;
    }
}

/// Why a row was left out of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MissingNarrative,
    MissingLabel,
    UnrecognizedLabel,
    EmptyNarrative,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingNarrative => "missing_narrative",
            Self::MissingLabel => "missing_label",
            Self::UnrecognizedLabel => "unrecognized_label",
            Self::EmptyNarrative => "empty_narrative",
        }
    }
}

/// Non-fatal per-row diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowRejection {
    /// Position of the row in the input batch.
    pub row: usize,
    pub record_id: String,
    pub reason: RejectReason,
}

/// One metric value for one n-gram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationScore {
    pub ngram: String,
    pub metric: Metric,
    pub value: f64,
}

/// Every requested metric value for one n-gram, plus the frequencies the
/// ranker needs for tie-breaking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermScores {
    pub ngram: String,
    pub tf_total: u64,
    pub df_total: u64,
    pub values: BTreeMap<Metric, f64>,
}

impl TermScores {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    /// Flatten into one [`AssociationScore`] per metric.
    pub fn scores(&self) -> impl Iterator<Item = AssociationScore> + '_ {
        self.values.iter().map(|(&metric, &value)| AssociationScore {
            ngram: self.ngram.clone(),
            metric,
            value,
        })
    }
}

/// One row of a generated dictionary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub ngram: String,
    pub weight: f64,
    /// Supporting metric values the weight was derived from.
    #[serde(default)]
    pub metrics: BTreeMap<Metric, f64>,
}

/// Contribution of one dictionary term to a record score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedTerm {
    pub ngram: String,
    /// Per-occurrence contribution (the dictionary weight).
    pub weight: f64,
    pub occurrences: u64,
    /// `weight * occurrences`.
    pub contribution: f64,
}

/// A scored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    pub record_id: String,
    /// Position of the record in the input batch.
    pub row: usize,
    pub score: f64,
    pub matched_terms: Vec<MatchedTerm>,
}
