//! Labeled corpus aggregation
//!
//! Turns a labeled record batch into per-n-gram contingency counts for one
//! target label.

pub mod index;
pub mod labels;

pub use index::{CorpusIndex, CorpusIndexer};
pub use labels::{distinct_labels, LabelPolicy};
