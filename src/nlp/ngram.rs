//! N-gram extraction
//!
//! Slides a window of length `n` over a token sequence. A sequence of `L`
//! tokens yields `max(0, L - n + 1)` overlapping n-grams in positional order.

use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{Result, SmokeError};
use crate::types::{NGram, Token};

/// Fixed-length n-gram extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NGramExtractor {
    n: usize,
}

impl NGramExtractor {
    /// Fails with a configuration error when `n < 1`.
    pub fn new(n: usize) -> Result<Self> {
        validate_n(n)?;
        Ok(Self { n })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn extract(&self, tokens: &[Token]) -> Vec<NGram> {
        if tokens.len() < self.n {
            return Vec::new();
        }
        tokens.windows(self.n).map(NGram::from_tokens).collect()
    }
}

/// Extract every n-gram of length `n` from `tokens`.
pub fn extract(tokens: &[Token], n: usize) -> Result<Vec<NGram>> {
    Ok(NGramExtractor::new(n)?.extract(tokens))
}

pub(crate) fn validate_n(n: usize) -> Result<()> {
    if n < 1 {
        return Err(SmokeError::configuration(
            ErrorCode::InvalidNgramLength,
            format!("n-gram length must be at least 1, got {n}"),
        ));
    }
    Ok(())
}
