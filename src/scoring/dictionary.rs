//! Validated smoke-term dictionary
//!
//! The weight map handed from generation to scoring. Construction checks
//! every invariant scoring relies on, and deserialization goes through the
//! same checks.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::nlp::ngram::validate_n;
use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{Result, SmokeError};
use crate::types::{DictionaryEntry, NGRAM_SEPARATOR};

/// N-gram → weight, all keys made of exactly `n` tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DictionaryFile", into = "DictionaryFile")]
pub struct Dictionary {
    n: usize,
    weights: FxHashMap<String, f64>,
}

/// Serialized form, with keys in sorted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DictionaryFile {
    n: usize,
    entries: BTreeMap<String, f64>,
}

impl Dictionary {
    /// Build from `(ngram, weight)` pairs.
    ///
    /// Fails on `n < 1`, on a key that is not `n` space-separated tokens, on
    /// a non-finite weight, and on a key that appears twice.
    pub fn new<I, S>(n: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        validate_n(n)?;
        let mut weights = FxHashMap::default();
        for (ngram, weight) in entries {
            let ngram = ngram.into();
            check_key(&ngram, n)?;
            if !weight.is_finite() {
                return Err(SmokeError::configuration(
                    ErrorCode::InvalidValue,
                    format!("weight of \"{ngram}\" is not finite ({weight})"),
                ));
            }
            if weights.contains_key(&ngram) {
                return Err(SmokeError::configuration(
                    ErrorCode::DuplicateTerm,
                    format!("\"{ngram}\" appears more than once"),
                ));
            }
            weights.insert(ngram, weight);
        }
        Ok(Self { n, weights })
    }

    /// Build from generated dictionary entries.
    pub fn from_entries(n: usize, entries: &[DictionaryEntry]) -> Result<Self> {
        Self::new(n, entries.iter().map(|e| (e.ngram.as_str(), e.weight)))
    }

    /// A dictionary with no terms; every record scores 0.
    pub fn empty(n: usize) -> Result<Self> {
        Self::new(n, std::iter::empty::<(String, f64)>())
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn weight(&self, ngram: &str) -> Option<f64> {
        self.weights.get(ngram).copied()
    }

    pub fn contains(&self, ngram: &str) -> bool {
        self.weights.contains_key(ngram)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Terms in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, &w)| (k.as_str(), w))
    }
}

fn check_key(ngram: &str, n: usize) -> Result<()> {
    let tokens: Vec<&str> = ngram.split(NGRAM_SEPARATOR).collect();
    if tokens.iter().any(|t| t.is_empty()) || tokens.len() != n {
        return Err(SmokeError::configuration(
            ErrorCode::NgramMismatch,
            format!("\"{ngram}\" is not a {n}-gram"),
        ));
    }
    Ok(())
}

impl TryFrom<DictionaryFile> for Dictionary {
    type Error = SmokeError;

    fn try_from(file: DictionaryFile) -> Result<Self> {
        Self::new(file.n, file.entries)
    }
}

impl From<Dictionary> for DictionaryFile {
    fn from(dictionary: Dictionary) -> Self {
        Self {
            n: dictionary.n,
            entries: dictionary.weights.into_iter().collect(),
        }
    }
}
