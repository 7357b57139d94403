//! Error types.
//!
//! [`SmokeError`] is the only error returned by the crate. Structural
//! problems (bad configuration, empty corpus) abort a run; per-row anomalies
//! never surface here, they are reported as
//! [`RowRejection`](crate::types::RowRejection) diagnostics instead.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use super::error_code::ErrorCode;

/// A single spec diagnostic: code, JSON pointer path, message and an
/// optional hint for fixing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecError {
    pub code: ErrorCode,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl SpecError {
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "[{}] {}", self.code, self.message)?;
        } else {
            write!(f, "[{}] {}: {}", self.code, self.path, self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {hint})")?;
        }
        Ok(())
    }
}

/// Errors that abort a generation or scoring run.
#[derive(Error, Debug)]
pub enum SmokeError {
    #[error("configuration error [{code}]: {message}")]
    Configuration { code: ErrorCode, message: String },

    #[error("invalid run spec: {}", summarize(.0))]
    InvalidSpec(Vec<SpecError>),

    #[error("empty corpus: {reason}")]
    EmptyCorpus { reason: String },

    #[error("failed to parse run spec: {0}")]
    Json(#[from] serde_json::Error),
}

impl SmokeError {
    pub fn configuration(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Configuration {
            code,
            message: message.into(),
        }
    }

    pub fn empty_corpus(reason: impl Into<String>) -> Self {
        Self::EmptyCorpus {
            reason: reason.into(),
        }
    }

    /// The error code, when the error carries one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Configuration { code, .. } => Some(*code),
            Self::InvalidSpec(errors) => errors.first().map(|e| e.code),
            Self::EmptyCorpus { .. } | Self::Json(_) => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::InvalidSpec(_))
    }
}

fn summarize(errors: &[SpecError]) -> String {
    match errors {
        [] => "no diagnostics".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

pub type Result<T> = std::result::Result<T, SmokeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_error_display_with_hint() {
        let err = SpecError::new(ErrorCode::InvalidNgramLength, "/n", "n must be at least 1")
            .with_hint("Use 1 for unigrams");
        assert_eq!(
            err.to_string(),
            "[invalid_ngram_length] /n: n must be at least 1 (hint: Use 1 for unigrams)"
        );
    }

    #[test]
    fn test_invalid_spec_summarizes_first_error() {
        let err = SmokeError::InvalidSpec(vec![
            SpecError::new(ErrorCode::UnknownMetric, "/metrics/0", "unknown metric \"foo\""),
            SpecError::new(ErrorCode::InvalidValue, "/top_k", "top_k must be greater than 0"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("unknown metric"));
        assert!(msg.contains("and 1 more"));
        assert_eq!(err.code(), Some(ErrorCode::UnknownMetric));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_empty_corpus_has_no_code() {
        let err = SmokeError::empty_corpus("no labeled records");
        assert_eq!(err.code(), None);
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "empty corpus: no labeled records");
    }
}
