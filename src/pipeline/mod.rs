//! Generation and scoring pipelines
//!
//! Stage orchestration, the JSON run spec and its validation engine,
//! observers, result artifacts and the crate's error types.

pub mod artifacts;
pub mod error_code;
pub mod errors;
pub mod observer;
pub mod runner;
pub mod spec;
pub mod validation;

pub use artifacts::{GenerationResult, GenerationSummary, ScoringResult, ScoringSummary};
pub use error_code::ErrorCode;
pub use errors::{Result, SmokeError, SpecError};
pub use observer::{NoopObserver, PipelineObserver, StageReport, StageTimingObserver};
pub use runner::{GenerationConfig, GenerationPipeline, ScoringPipeline};
pub use spec::{CombinationSpec, RunSpec, SpecSection};
pub use validation::{Severity, ValidationEngine, ValidationReport, ValidationRule};
