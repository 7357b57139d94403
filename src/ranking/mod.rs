//! Term ranking
//!
//! Collapses per-metric association values into a single weight with a
//! [`CombinationRule`], orders the n-grams deterministically and truncates to
//! the requested dictionary size.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::association::Metric;
use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{Result, SmokeError};
use crate::types::{DictionaryEntry, TermScores};

/// How metric values become a single dictionary weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CombinationRule {
    /// Weight is the value of one metric.
    Primary { metric: Metric },
    /// Weight is `Σ w · minmax(value)` over the listed metrics.
    WeightedSum { weights: BTreeMap<Metric, f64> },
}

impl CombinationRule {
    pub fn primary(metric: Metric) -> Self {
        Self::Primary { metric }
    }

    pub fn weighted_sum<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = (Metric, f64)>,
    {
        Self::WeightedSum {
            weights: weights.into_iter().collect(),
        }
    }

    /// Metrics the rule reads.
    pub fn metrics(&self) -> Vec<Metric> {
        match self {
            Self::Primary { metric } => vec![*metric],
            Self::WeightedSum { weights } => weights.keys().copied().collect(),
        }
    }
}

impl Default for CombinationRule {
    fn default() -> Self {
        Self::primary(Metric::CorrelationCoefficient)
    }
}

/// Min and max of one metric over the scored set.
#[derive(Debug, Clone, Copy)]
struct Span {
    min: f64,
    max: f64,
}

impl Span {
    fn of(scores: &[TermScores], metric: Metric) -> Self {
        let (min, max) = scores
            .iter()
            .filter_map(|s| s.value(metric))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        Self { min, max }
    }

    /// All-equal values normalize to 1.0.
    fn normalize(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range > 0.0 && range.is_finite() {
            (value - self.min) / range
        } else {
            1.0
        }
    }
}

/// Orders scored n-grams into dictionary entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct TermRanker;

impl TermRanker {
    pub fn new() -> Self {
        Self
    }

    /// Combine, sort and truncate.
    ///
    /// Order is descending weight, then descending `tf_total`, then ascending
    /// n-gram text. `top_k = None` keeps every entry.
    pub fn rank(
        &self,
        scores: &[TermScores],
        top_k: Option<usize>,
        rule: &CombinationRule,
    ) -> Result<Vec<DictionaryEntry>> {
        check_rule(scores, rule)?;

        let mut ranked: Vec<(u64, DictionaryEntry)> = match rule {
            CombinationRule::Primary { metric } => scores
                .iter()
                .map(|s| (s.tf_total, entry(s, s.value(*metric).unwrap_or(0.0))))
                .collect(),
            CombinationRule::WeightedSum { weights } => {
                let spans: Vec<(Metric, f64, Span)> = weights
                    .iter()
                    .map(|(&metric, &w)| (metric, w, Span::of(scores, metric)))
                    .collect();
                scores
                    .iter()
                    .map(|s| {
                        let weight = spans
                            .iter()
                            .map(|(metric, w, span)| {
                                w * span.normalize(s.value(*metric).unwrap_or(0.0))
                            })
                            .sum();
                        (s.tf_total, entry(s, weight))
                    })
                    .collect()
            }
        };

        ranked.sort_by(|(tf_a, a), (tf_b, b)| compare(a, *tf_a, b, *tf_b));
        if let Some(k) = top_k {
            ranked.truncate(k);
        }
        Ok(ranked.into_iter().map(|(_, e)| e).collect())
    }
}

fn entry(scores: &TermScores, weight: f64) -> DictionaryEntry {
    DictionaryEntry {
        ngram: scores.ngram.clone(),
        weight,
        metrics: scores.values.clone(),
    }
}

fn compare(a: &DictionaryEntry, tf_a: u64, b: &DictionaryEntry, tf_b: u64) -> Ordering {
    b.weight
        .total_cmp(&a.weight)
        .then_with(|| tf_b.cmp(&tf_a))
        .then_with(|| a.ngram.cmp(&b.ngram))
}

fn check_rule(scores: &[TermScores], rule: &CombinationRule) -> Result<()> {
    if let CombinationRule::WeightedSum { weights } = rule {
        if weights.is_empty() {
            return Err(SmokeError::configuration(
                ErrorCode::InvalidCombination,
                "weighted_sum needs at least one metric weight",
            ));
        }
        if let Some((metric, w)) = weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(SmokeError::configuration(
                ErrorCode::InvalidCombination,
                format!("weight for {metric} is not finite ({w})"),
            ));
        }
    }
    for metric in rule.metrics() {
        if let Some(missing) = scores.iter().find(|s| s.value(metric).is_none()) {
            tracing::warn!(metric = %metric, ngram = %missing.ngram, "combination rule reads an uncomputed metric");
            return Err(SmokeError::configuration(
                ErrorCode::MissingMetric,
                format!("combination rule uses {metric}, which was not computed"),
            ));
        }
    }
    Ok(())
}
