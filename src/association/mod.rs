//! Association scoring
//!
//! [`AssociationScorer`] turns corpus contingency counts into one value per
//! requested [`Metric`] for every n-gram. The arithmetic lives in
//! [`metrics`], one pure function per metric; this module only selects,
//! dispatches and guards against structural problems (empty corpus, n-gram
//! length mismatch). Statistical degeneracy is never an error.

pub mod metrics;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::CorpusIndex;
use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{Result, SmokeError};
use crate::types::{ContingencyEntry, CorpusTotals, TermScores};
use metrics::ContingencyTable;

/// Supported association metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Target-class term frequency × inverse document frequency.
    TfIdf,
    /// Pearson chi-squared of the 2×2 table.
    ChiSquared,
    /// Pointwise mutual information with the positive class.
    Pmi,
    /// Log-likelihood ratio (G²).
    LogLikelihood,
    /// Odds ratio of term presence between classes.
    OddsRatio,
    /// Correlation coefficient (CC).
    CorrelationCoefficient,
    /// Relevance correlation value (RCV).
    RelevanceCorrelation,
    /// Robertson's selection value (RSV).
    RobertsonSelection,
    /// Document and relevance correlation (DRC).
    DocumentRelevanceCorrelation,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::TfIdf,
        Metric::ChiSquared,
        Metric::Pmi,
        Metric::LogLikelihood,
        Metric::OddsRatio,
        Metric::CorrelationCoefficient,
        Metric::RelevanceCorrelation,
        Metric::RobertsonSelection,
        Metric::DocumentRelevanceCorrelation,
    ];

    /// Canonical name used in run specs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TfIdf => "tf_idf",
            Self::ChiSquared => "chi_squared",
            Self::Pmi => "pmi",
            Self::LogLikelihood => "log_likelihood",
            Self::OddsRatio => "odds_ratio",
            Self::CorrelationCoefficient => "correlation_coefficient",
            Self::RelevanceCorrelation => "relevance_correlation",
            Self::RobertsonSelection => "robertson_selection",
            Self::DocumentRelevanceCorrelation => "document_relevance_correlation",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        let metric = match value.trim().to_lowercase().as_str() {
            "tf_idf" | "tfidf" | "tf-idf" => Self::TfIdf,
            "chi_squared" | "chi2" | "chi-squared" | "chisquared" => Self::ChiSquared,
            "pmi" | "pointwise_mutual_information" => Self::Pmi,
            "log_likelihood" | "llr" | "g2" => Self::LogLikelihood,
            "odds_ratio" | "odds" => Self::OddsRatio,
            "correlation_coefficient" | "cc" => Self::CorrelationCoefficient,
            "relevance_correlation" | "rcv" => Self::RelevanceCorrelation,
            "robertson_selection" | "rsv" => Self::RobertsonSelection,
            "document_relevance_correlation" | "drc" => Self::DocumentRelevanceCorrelation,
            _ => return None,
        };
        Some(metric)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = SmokeError;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value).ok_or_else(|| {
            SmokeError::configuration(
                ErrorCode::UnknownMetric,
                format!("unknown metric \"{value}\""),
            )
        })
    }
}

/// Fallback values for degenerate tables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricOptions {
    /// Value of PMI when the n-gram never occurs in the positive class.
    /// Defaults to `ln(f64::MIN_POSITIVE)`, the most negative finite log.
    pub log_floor: f64,
    /// Value of the odds ratio when `b · c = 0`.
    pub odds_ratio_floor: f64,
    /// Added to every cell before computing the odds ratio.
    pub odds_ratio_smoothing: Option<f64>,
}

impl Default for MetricOptions {
    fn default() -> Self {
        Self {
            log_floor: f64::MIN_POSITIVE.ln(),
            odds_ratio_floor: 0.0,
            odds_ratio_smoothing: None,
        }
    }
}

/// Compute one metric for one n-gram.
pub fn metric_value(
    metric: Metric,
    entry: &ContingencyEntry,
    totals: &CorpusTotals,
    options: &MetricOptions,
) -> f64 {
    let table = ContingencyTable::from_counts(entry, totals);
    match metric {
        Metric::TfIdf => metrics::tf_idf(entry.tf_positive, entry.df_total(), totals.records),
        Metric::ChiSquared => metrics::chi_squared(&table),
        Metric::Pmi => metrics::pmi(&table, options.log_floor),
        Metric::LogLikelihood => metrics::log_likelihood(&table),
        Metric::OddsRatio => metrics::odds_ratio(
            &table,
            options.odds_ratio_floor,
            options.odds_ratio_smoothing,
        ),
        Metric::CorrelationCoefficient => metrics::correlation_coefficient(&table),
        Metric::RelevanceCorrelation => metrics::relevance_correlation(&table),
        Metric::RobertsonSelection => metrics::robertson_selection(&table),
        Metric::DocumentRelevanceCorrelation => metrics::document_relevance_correlation(&table),
    }
}

/// Scores every n-gram of a corpus index with a fixed set of metrics.
#[derive(Debug, Clone)]
pub struct AssociationScorer {
    n: usize,
    metrics: Vec<Metric>,
    options: MetricOptions,
}

impl AssociationScorer {
    /// `metrics` is deduplicated, keeping first-seen order.
    pub fn new(n: usize, metrics: &[Metric]) -> Result<Self> {
        crate::nlp::ngram::validate_n(n)?;
        let mut unique: Vec<Metric> = Vec::with_capacity(metrics.len());
        for &metric in metrics {
            if !unique.contains(&metric) {
                unique.push(metric);
            }
        }
        if unique.is_empty() {
            return Err(SmokeError::configuration(
                ErrorCode::MissingMetric,
                "at least one association metric is required",
            ));
        }
        Ok(Self {
            n,
            metrics: unique,
            options: MetricOptions::default(),
        })
    }

    pub fn with_options(mut self, options: MetricOptions) -> Self {
        self.options = options;
        self
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn options(&self) -> &MetricOptions {
        &self.options
    }

    /// Score every n-gram in `index`, sorted by n-gram text.
    pub fn score(&self, index: &CorpusIndex) -> Result<Vec<TermScores>> {
        if index.n() != self.n {
            return Err(SmokeError::configuration(
                ErrorCode::NgramMismatch,
                format!(
                    "corpus index was built with n={} but scores were requested for n={}",
                    index.n(),
                    self.n
                ),
            ));
        }
        self.score_entries(index.iter(), index.totals())
    }

    /// Score raw `(ngram, entry)` pairs against `totals`, sorted by n-gram
    /// text.
    pub fn score_entries<'e, I>(&self, entries: I, totals: &CorpusTotals) -> Result<Vec<TermScores>>
    where
        I: IntoIterator<Item = (&'e str, &'e ContingencyEntry)>,
    {
        if totals.records == 0 {
            return Err(SmokeError::empty_corpus(
                "association scoring needs at least one labeled record",
            ));
        }

        let entries: Vec<(&str, &ContingencyEntry)> = entries.into_iter().collect();
        let mut scored: Vec<TermScores> = entries
            .par_iter()
            .map(|&(ngram, entry)| self.score_entry(ngram, entry, totals))
            .collect();
        scored.sort_by(|a, b| a.ngram.cmp(&b.ngram));
        Ok(scored)
    }

    fn score_entry(&self, ngram: &str, entry: &ContingencyEntry, totals: &CorpusTotals) -> TermScores {
        let values: BTreeMap<Metric, f64> = self
            .metrics
            .iter()
            .map(|&metric| (metric, metric_value(metric, entry, totals, &self.options)))
            .collect();
        TermScores {
            ngram: ngram.to_string(),
            tf_total: entry.tf_total(),
            df_total: entry.df_total(),
            values,
        }
    }
}
