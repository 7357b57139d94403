//! Dictionary scoring of narratives.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::dictionary::Dictionary;
use crate::nlp::terms::TermExtractor;
use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{Result, SmokeError};
use crate::types::{MatchedTerm, Record, RejectReason, RowRejection, ScoredRecord, NGRAM_SEPARATOR};

/// Scored records of one batch, in input order, plus row diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoredBatch {
    pub records: Vec<ScoredRecord>,
    pub rejections: Vec<RowRejection>,
}

/// Applies a [`Dictionary`] to narratives through the same
/// [`TermExtractor`] that generated it.
#[derive(Debug, Clone)]
pub struct DictionaryScorer {
    dictionary: Dictionary,
    extractor: TermExtractor,
}

impl DictionaryScorer {
    /// Keys are rewritten through the extractor so they compare equal to
    /// the n-grams it produces from narratives.
    ///
    /// Fails when the extractor's `n` differs from the dictionary's, when a
    /// key does not normalize to exactly `n` tokens, and when two keys
    /// normalize to the same n-gram.
    pub fn new(dictionary: Dictionary, extractor: TermExtractor) -> Result<Self> {
        if extractor.n() != dictionary.n() {
            return Err(mismatch(dictionary.n(), extractor.n()));
        }
        let dictionary = normalize_keys(&dictionary, &extractor)?;
        Ok(Self {
            dictionary,
            extractor,
        })
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn n(&self) -> usize {
        self.dictionary.n()
    }

    /// Score one narrative with `n`-grams.
    ///
    /// The returned record has an empty id and row 0; batch scoring fills
    /// them in.
    pub fn score_record(&self, narrative: &str, n: usize) -> Result<ScoredRecord> {
        if n != self.dictionary.n() {
            return Err(mismatch(self.dictionary.n(), n));
        }
        let (score, matched_terms) = self.matches(narrative);
        Ok(ScoredRecord {
            record_id: String::new(),
            row: 0,
            score,
            matched_terms,
        })
    }

    /// Score every record on the rayon pool, keeping input order.
    ///
    /// Records without a narrative are rejected. Narratives that produce no
    /// n-grams still get a zero-score record and an `empty_narrative`
    /// diagnostic.
    pub fn score_batch(&self, records: &[Record]) -> ScoredBatch {
        let outcomes: Vec<(Option<ScoredRecord>, Option<RowRejection>)> = records
            .par_iter()
            .enumerate()
            .map(|(row, record)| self.score_row(row, record))
            .collect();

        let mut batch = ScoredBatch::default();
        for (scored, rejection) in outcomes {
            if let Some(rejection) = rejection {
                tracing::debug!(
                    row = rejection.row,
                    record_id = %rejection.record_id,
                    reason = rejection.reason.as_str(),
                    "row rejected"
                );
                batch.rejections.push(rejection);
            }
            batch.records.extend(scored);
        }
        batch
    }

    fn score_row(&self, row: usize, record: &Record) -> (Option<ScoredRecord>, Option<RowRejection>) {
        let reject = |reason| RowRejection {
            row,
            record_id: record.id.clone(),
            reason,
        };
        let Some(narrative) = record.narrative.as_deref() else {
            return (None, Some(reject(RejectReason::MissingNarrative)));
        };

        let ngrams = self.extractor.ngrams(narrative);
        let rejection = ngrams.is_empty().then(|| reject(RejectReason::EmptyNarrative));
        let (score, matched_terms) = self.tally(ngrams.iter().map(|g| g.as_str()));
        let scored = ScoredRecord {
            record_id: record.id.clone(),
            row,
            score,
            matched_terms,
        };
        (Some(scored), rejection)
    }

    fn matches(&self, narrative: &str) -> (f64, Vec<MatchedTerm>) {
        let ngrams = self.extractor.ngrams(narrative);
        self.tally(ngrams.iter().map(|g| g.as_str()))
    }

    /// Sum weights over occurrences; matched terms keep first-occurrence
    /// order.
    fn tally<'g>(&self, ngrams: impl Iterator<Item = &'g str>) -> (f64, Vec<MatchedTerm>) {
        let mut position: FxHashMap<&str, usize> = FxHashMap::default();
        let mut matched: Vec<MatchedTerm> = Vec::new();
        for ngram in ngrams {
            let Some(weight) = self.dictionary.weight(ngram) else {
                continue;
            };
            match position.get(ngram) {
                Some(&i) => matched[i].occurrences += 1,
                None => {
                    position.insert(ngram, matched.len());
                    matched.push(MatchedTerm {
                        ngram: ngram.to_string(),
                        weight,
                        occurrences: 1,
                        contribution: 0.0,
                    });
                }
            }
        }

        let mut score = 0.0;
        for term in &mut matched {
            term.contribution = term.weight * term.occurrences as f64;
            score += term.contribution;
        }
        (score, matched)
    }
}

fn normalize_keys(dictionary: &Dictionary, extractor: &TermExtractor) -> Result<Dictionary> {
    let n = dictionary.n();
    let mut keys: Vec<(&str, f64)> = dictionary.iter().collect();
    keys.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut seen: FxHashMap<String, &str> = FxHashMap::default();
    let mut entries = Vec::with_capacity(keys.len());
    for (key, weight) in keys {
        let tokens = extractor.tokens(key);
        if tokens.len() != n {
            return Err(SmokeError::configuration(
                ErrorCode::NgramMismatch,
                format!(
                    "dictionary key \"{key}\" normalizes to {} tokens, expected {n}",
                    tokens.len()
                ),
            ));
        }
        let normalized = tokens.join(NGRAM_SEPARATOR);
        if let Some(first) = seen.insert(normalized.clone(), key) {
            return Err(SmokeError::configuration(
                ErrorCode::DuplicateTerm,
                format!("dictionary keys \"{first}\" and \"{key}\" both normalize to \"{normalized}\""),
            ));
        }
        if normalized != key {
            tracing::debug!(key, normalized = %normalized, "dictionary key normalized");
        }
        entries.push((normalized, weight));
    }
    Dictionary::new(n, entries)
}

fn mismatch(expected: usize, actual: usize) -> SmokeError {
    SmokeError::configuration(
        ErrorCode::NgramMismatch,
        format!("dictionary holds {expected}-grams but scoring was requested with n={actual}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer(n: usize, terms: &[(&str, f64)]) -> DictionaryScorer {
        let dictionary = Dictionary::new(n, terms.iter().copied()).unwrap();
        DictionaryScorer::new(dictionary, TermExtractor::new(n).unwrap()).unwrap()
    }

    #[test]
    fn test_score_record_sums_occurrences() {
        let scorer = scorer(1, &[("smoke", 2.0), ("fire", 0.5)]);
        let scored = scorer
            .score_record("Fire! Smoke near engine, more smoke.", 1)
            .unwrap();
        assert_eq!(scored.score, 4.5);
        let names: Vec<_> = scored.matched_terms.iter().map(|m| m.ngram.as_str()).collect();
        assert_eq!(names, vec!["fire", "smoke"]);
        assert_eq!(scored.matched_terms[1].occurrences, 2);
        assert_eq!(scored.matched_terms[1].weight, 2.0);
        assert_eq!(scored.matched_terms[1].contribution, 4.0);
    }

    #[test]
    fn test_no_match_scores_zero() {
        let scorer = scorer(1, &[("smoke", 2.0)]);
        let scored = scorer.score_record("routine flight", 1).unwrap();
        assert_eq!(scored.score, 0.0);
        assert!(scored.matched_terms.is_empty());
    }

    #[test]
    fn test_bigram_matching() {
        let scorer = scorer(2, &[("cargo hold", 1.5)]);
        let scored = scorer.score_record("smoke in the cargo hold", 2).unwrap();
        assert_eq!(scored.score, 1.5);
    }

    #[test]
    fn test_n_mismatch_on_score() {
        let scorer = scorer(1, &[("smoke", 2.0)]);
        let err = scorer.score_record("smoke", 2).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NgramMismatch));
    }

    #[test]
    fn test_n_mismatch_on_construction() {
        let dictionary = Dictionary::new(2, [("cargo hold", 1.0)]).unwrap();
        let err = DictionaryScorer::new(dictionary, TermExtractor::new(1).unwrap()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NgramMismatch));
    }

    #[test]
    fn test_keys_normalized_like_narratives() {
        let unigrams = scorer(1, &[("Smoke", 2.0), ("FIRE!", 0.5)]);
        assert_eq!(unigrams.dictionary().weight("smoke"), Some(2.0));
        assert_eq!(unigrams.dictionary().weight("fire"), Some(0.5));

        let scored = unigrams.score_record("smoke near engine", 1).unwrap();
        assert_eq!(scored.score, 2.0);
        assert_eq!(scored.matched_terms[0].ngram, "smoke");

        let bigrams = scorer(2, &[("Cargo HOLD", 1.0)]);
        let scored = bigrams.score_record("smoke in the cargo hold", 2).unwrap();
        assert_eq!(scored.score, 1.0);
    }

    #[test]
    fn test_key_with_wrong_normalized_length_rejected() {
        let dictionary = Dictionary::new(1, [("smoke-filled", 1.0)]).unwrap();
        let err = DictionaryScorer::new(dictionary, TermExtractor::new(1).unwrap()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NgramMismatch));

        // "in" is shorter than the default minimum token length.
        let dictionary = Dictionary::new(1, [("in", 1.0)]).unwrap();
        let err = DictionaryScorer::new(dictionary, TermExtractor::new(1).unwrap()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NgramMismatch));
    }

    #[test]
    fn test_keys_collapsing_together_rejected() {
        let dictionary = Dictionary::new(1, [("smoke", 1.0), ("SMOKE", 2.0)]).unwrap();
        let err = DictionaryScorer::new(dictionary, TermExtractor::new(1).unwrap()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::DuplicateTerm));
    }

    #[test]
    fn test_score_batch_keeps_rows_and_diagnostics() {
        let scorer = scorer(1, &[("smoke", 1.0)]);
        let records = vec![
            Record::new("a", "smoke near engine"),
            Record {
                id: "b".to_string(),
                narrative: None,
                label: None,
            },
            Record::new("c", "?!"),
            Record::new("d", "smoke smoke"),
        ];
        let batch = scorer.score_batch(&records);

        let rows: Vec<_> = batch.records.iter().map(|r| (r.record_id.as_str(), r.row)).collect();
        assert_eq!(rows, vec![("a", 0), ("c", 2), ("d", 3)]);
        assert_eq!(batch.records[1].score, 0.0);
        assert_eq!(batch.records[2].score, 2.0);

        let reasons: Vec<_> = batch.rejections.iter().map(|r| (r.row, r.reason)).collect();
        assert_eq!(
            reasons,
            vec![(1, RejectReason::MissingNarrative), (2, RejectReason::EmptyNarrative)]
        );
    }

    #[test]
    fn test_empty_dictionary_scores_everything_zero() {
        let scorer = DictionaryScorer::new(Dictionary::empty(1).unwrap(), TermExtractor::new(1).unwrap())
            .unwrap();
        let records = vec![Record::new("a", "smoke"), Record::new("b", "fire in cabin")];
        let batch = scorer.score_batch(&records);
        assert!(batch
            .records
            .iter()
            .all(|r| r.score == 0.0 && r.matched_terms.is_empty()));
    }
}
