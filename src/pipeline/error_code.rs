//! Stable, machine-readable error codes.
//!
//! Codes serialize as `snake_case` strings and are part of the public
//! contract: callers match on them instead of parsing messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error code attached to configuration errors and spec diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// `n` is smaller than 1.
    InvalidNgramLength,
    /// Two components of one run disagree on `n`.
    NgramMismatch,
    /// A metric name is not recognized.
    UnknownMetric,
    /// No metric was requested, or a rule references a metric that was not
    /// computed.
    MissingMetric,
    /// The combination rule is malformed.
    InvalidCombination,
    /// A numeric setting is out of range.
    InvalidValue,
    /// The run spec version is not supported.
    UnsupportedVersion,
    /// The target label is empty or not in the configured label set.
    InvalidLabel,
    /// A field is not part of the schema.
    UnknownField,
    /// A dictionary contains the same term twice.
    DuplicateTerm,
    /// Generic validation failure (custom rules).
    ValidationFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidNgramLength => "invalid_ngram_length",
            Self::NgramMismatch => "ngram_mismatch",
            Self::UnknownMetric => "unknown_metric",
            Self::MissingMetric => "missing_metric",
            Self::InvalidCombination => "invalid_combination",
            Self::InvalidValue => "invalid_value",
            Self::UnsupportedVersion => "unsupported_version",
            Self::InvalidLabel => "invalid_label",
            Self::UnknownField => "unknown_field",
            Self::DuplicateTerm => "duplicate_term",
            Self::ValidationFailed => "validation_failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
