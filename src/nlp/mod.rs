//! Natural Language Processing components
//!
//! Normalization, stopword filtering and n-gram extraction, composed into
//! the [`terms::TermExtractor`] shared by both pipelines.

pub mod ngram;
pub mod normalizer;
pub mod stopwords;
pub mod terms;

pub use ngram::NGramExtractor;
pub use normalizer::{Normalizer, NormalizerConfig};
pub use stopwords::{StopwordConfig, StopwordFilter};
pub use terms::{TermExtractor, TermSettings};
