//! Corpus index: contingency counters per n-gram
//!
//! The index only keeps running counters, so records can be streamed through
//! [`CorpusIndexer::observe`] one at a time. For batches already in memory,
//! [`CorpusIndexer::index_parallel`] builds per-worker partial indexes and
//! reduces them with [`CorpusIndex::merge`]; the merge is plain integer
//! summation, so shard order never changes the result.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::labels::LabelPolicy;
use crate::nlp::terms::TermExtractor;
use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{Result, SmokeError};
use crate::types::{ContingencyEntry, CorpusTotals, Record, RejectReason, RowRejection, Stratum};

/// Below this many records, parallel indexing is slower than a single pass.
const PARALLEL_MIN_RECORDS: usize = 256;

/// Contingency counters for every observed n-gram of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusIndex {
    n: usize,
    entries: FxHashMap<String, ContingencyEntry>,
    totals: CorpusTotals,
    rejections: Vec<RowRejection>,
}

impl CorpusIndex {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            entries: FxHashMap::default(),
            totals: CorpusTotals::default(),
            rejections: Vec::new(),
        }
    }

    /// N-gram length the index was built with.
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn totals(&self) -> &CorpusTotals {
        &self.totals
    }

    pub fn rejections(&self) -> &[RowRejection] {
        &self.rejections
    }

    pub fn entry(&self, ngram: &str) -> Option<&ContingencyEntry> {
        self.entries.get(ngram)
    }

    /// Iterate over `(ngram, entry)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContingencyEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of distinct n-grams.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop n-grams seen in fewer than `min_df` records. Returns how many
    /// were dropped.
    pub fn retain_min_support(&mut self, min_df: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.df_total() >= min_df);
        before - self.entries.len()
    }

    /// Fold `other` into `self` by summing every counter.
    pub fn merge(&mut self, other: CorpusIndex) -> Result<()> {
        if other.n != self.n {
            return Err(SmokeError::configuration(
                ErrorCode::NgramMismatch,
                format!(
                    "cannot merge corpus index built with n={} into one built with n={}",
                    other.n, self.n
                ),
            ));
        }
        for (ngram, entry) in other.entries {
            self.entries.entry(ngram).or_default().merge(&entry);
        }
        self.totals.merge(&other.totals);
        self.rejections.extend(other.rejections);
        self.rejections.sort_by_key(|r| r.row);
        Ok(())
    }

    fn reject(&mut self, row: usize, record: &Record, reason: RejectReason) {
        tracing::debug!(row, record_id = %record.id, reason = reason.as_str(), "row rejected");
        self.totals.rejected += 1;
        self.rejections.push(RowRejection {
            row,
            record_id: record.id.clone(),
            reason,
        });
    }
}

/// Feeds labeled records into a [`CorpusIndex`] through the shared
/// [`TermExtractor`].
#[derive(Debug, Clone, Copy)]
pub struct CorpusIndexer<'a> {
    extractor: &'a TermExtractor,
    labels: &'a LabelPolicy,
}

impl<'a> CorpusIndexer<'a> {
    pub fn new(extractor: &'a TermExtractor, labels: &'a LabelPolicy) -> Self {
        Self { extractor, labels }
    }

    pub fn empty_index(&self) -> CorpusIndex {
        CorpusIndex::new(self.extractor.n())
    }

    /// Add one record (at input position `row`) to `index`.
    ///
    /// Returns `false` when the record was rejected.
    pub fn observe(&self, index: &mut CorpusIndex, row: usize, record: &Record) -> bool {
        let narrative = match record.narrative.as_deref() {
            Some(text) => text,
            None => {
                index.reject(row, record, RejectReason::MissingNarrative);
                return false;
            }
        };
        let stratum = match self.labels.classify(record.label.as_deref()) {
            Ok(stratum) => stratum,
            Err(reason) => {
                index.reject(row, record, reason);
                return false;
            }
        };

        let ngrams = self.extractor.ngrams(narrative);
        if ngrams.is_empty() {
            index.reject(row, record, RejectReason::EmptyNarrative);
            return false;
        }

        // Collapse repeats: one document-frequency hit per distinct n-gram,
        // one term-frequency hit per occurrence.
        let mut counts: FxHashMap<String, u64> = FxHashMap::default();
        for ngram in ngrams {
            *counts.entry(ngram.text).or_insert(0) += 1;
        }
        for (ngram, occurrences) in counts {
            index.entries.entry(ngram).or_default().observe(stratum, occurrences);
        }

        index.totals.records += 1;
        match stratum {
            Stratum::Positive => index.totals.positive += 1,
            Stratum::Negative => index.totals.negative += 1,
        }
        true
    }

    /// Single sequential pass over `records`.
    pub fn index(&self, records: &[Record]) -> CorpusIndex {
        let mut index = self.empty_index();
        for (row, record) in records.iter().enumerate() {
            self.observe(&mut index, row, record);
        }
        index
    }

    /// Build partial indexes on the rayon pool and merge them.
    ///
    /// Produces the same index as [`Self::index`].
    pub fn index_parallel(&self, records: &[Record]) -> CorpusIndex {
        if records.len() < PARALLEL_MIN_RECORDS {
            return self.index(records);
        }

        let n = self.extractor.n();
        records
            .par_iter()
            .enumerate()
            .fold(
                || CorpusIndex::new(n),
                |mut partial, (row, record)| {
                    self.observe(&mut partial, row, record);
                    partial
                },
            )
            .reduce(
                || CorpusIndex::new(n),
                |mut left, right| {
                    // Every partial shares `n`, so the merge cannot fail.
                    if let Err(err) = left.merge(right) {
                        tracing::warn!(error = %err, "partial corpus index dropped");
                    }
                    left
                },
            )
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_records() -> impl Strategy<Value = Vec<Record>> {
        let narrative = proptest::collection::vec(
            prop_oneof![
                Just("smoke"),
                Just("cabin"),
                Just("fire"),
                Just("routine"),
                Just("flight"),
                Just("hold"),
            ],
            0..8,
        )
        .prop_map(|words| words.join(" "));
        let label = prop_oneof![Just("hazard"), Just("normal")];
        proptest::collection::vec((narrative, label), 0..40).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (text, label))| Record::labeled(i.to_string(), text, label))
                .collect()
        })
    }

    proptest! {
        /// tf >= df in each stratum, df_total = df_positive + df_negative <= N.
        #[test]
        fn contingency_invariants(records in arb_records(), n in 1usize..3) {
            let extractor = TermExtractor::new(n).unwrap();
            let labels = LabelPolicy::new("hazard");
            let index = CorpusIndexer::new(&extractor, &labels).index(&records);
            let totals = index.totals();
            for (_, entry) in index.iter() {
                prop_assert!(entry.tf_positive >= entry.df_positive);
                prop_assert!(entry.tf_negative >= entry.df_negative);
                prop_assert_eq!(entry.df_total(), entry.df_positive + entry.df_negative);
                prop_assert!(entry.df_positive <= totals.positive);
                prop_assert!(entry.df_negative <= totals.negative);
                prop_assert!(entry.df_total() <= totals.records);
            }
            prop_assert_eq!(totals.records + totals.rejected, records.len() as u64);
        }

        /// Merging shards in either order gives the same index as one pass.
        #[test]
        fn merge_is_order_independent(records in arb_records(), split in 0usize..40) {
            let extractor = TermExtractor::new(1).unwrap();
            let labels = LabelPolicy::new("hazard");
            let indexer = CorpusIndexer::new(&extractor, &labels);
            let split = split.min(records.len());

            let mut left = indexer.empty_index();
            let mut right = indexer.empty_index();
            for (row, record) in records.iter().enumerate() {
                if row < split {
                    indexer.observe(&mut left, row, record);
                } else {
                    indexer.observe(&mut right, row, record);
                }
            }

            let mut forward = left.clone();
            forward.merge(right.clone()).unwrap();
            let mut backward = right;
            backward.merge(left).unwrap();

            prop_assert_eq!(&forward, &backward);
            prop_assert_eq!(&forward, &indexer.index(&records));
        }
    }
}
