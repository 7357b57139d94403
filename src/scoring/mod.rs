//! Dictionary scoring
//!
//! A generated [`Dictionary`] is applied to unlabeled narratives by the
//! [`DictionaryScorer`]; [`RecordRanker`] orders the results.

pub mod dictionary;
pub mod ranker;
pub mod scorer;

pub use dictionary::Dictionary;
pub use ranker::RecordRanker;
pub use scorer::{DictionaryScorer, ScoredBatch};
