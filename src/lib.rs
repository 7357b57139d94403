//! # smoke-terms
//!
//! Mine labeled narratives for "smoke terms", the n-grams statistically
//! associated with a target classification, and score new narratives
//! against the resulting weighted dictionary.
//!
//! ## Modules
//!
//! - [`nlp`]: normalization, stopwords and n-gram extraction behind one
//!   shared [`TermExtractor`]
//! - [`corpus`]: label policy and contingency counting
//! - [`association`]: association metrics (TF-IDF, chi-squared, PMI, G²,
//!   odds ratio, CC, RCV, RSV, DRC)
//! - [`ranking`]: combination rules and term ordering
//! - [`scoring`]: dictionaries, record scoring and record ranking
//! - [`pipeline`]: generation and scoring runners, run spec, validation
//!
//! ## Example
//!
//! ```
//! use smoke_terms::{GenerationConfig, GenerationPipeline, Metric, NoopObserver, Record,
//!     ScoringPipeline};
//!
//! let corpus = vec![
//!     Record::labeled("1", "smoke detected in cabin", "hazard"),
//!     Record::labeled("2", "routine flight", "normal"),
//!     Record::labeled("3", "smoke in cargo hold", "hazard"),
//! ];
//! let config = GenerationConfig::new(1, "hazard").with_metrics(vec![Metric::TfIdf]);
//! let generated = GenerationPipeline::new(config)?.run(&corpus, &mut NoopObserver)?;
//!
//! let scoring = ScoringPipeline::from_generation(&generated)?;
//! let scored = scoring.run(&[Record::new("a", "smoke near engine")], 1, &mut NoopObserver)?;
//! assert!(scored.records[0].score > 0.0);
//! # Ok::<(), smoke_terms::SmokeError>(())
//! ```

pub mod association;
pub mod corpus;
pub mod nlp;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod types;

pub use association::{AssociationScorer, Metric, MetricOptions};
pub use corpus::{CorpusIndex, CorpusIndexer, LabelPolicy};
pub use nlp::{NormalizerConfig, StopwordConfig, TermExtractor, TermSettings};
pub use pipeline::{
    ErrorCode, GenerationConfig, GenerationPipeline, GenerationResult, NoopObserver,
    PipelineObserver, Result, RunSpec, ScoringPipeline, ScoringResult, SmokeError,
};
pub use ranking::{CombinationRule, TermRanker};
pub use scoring::{Dictionary, DictionaryScorer, RecordRanker};
pub use types::{DictionaryEntry, MatchedTerm, Record, ScoredRecord};
