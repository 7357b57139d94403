//! Pipeline observer: hooks for logging, profiling and debugging.
//!
//! Observers receive notifications at stage boundaries and see the
//! intermediate artifacts (corpus index, metric scores, dictionary, scored
//! records) without coupling to stage logic. Every hook has a no-op default,
//! so an observer only implements what it cares about.

use std::time::{Duration, Instant};

use crate::corpus::CorpusIndex;
use crate::types::{DictionaryEntry, ScoredRecord, TermScores};

// ─── Stage names ────────────────────────────────────────────────────────────

/// Corpus indexing (generation).
pub const STAGE_INDEX: &str = "index";
/// Minimum-support filtering (generation).
pub const STAGE_SUPPORT: &str = "min_support";
/// Association scoring (generation).
pub const STAGE_ASSOCIATION: &str = "association";
/// Term ranking (generation).
pub const STAGE_RANK_TERMS: &str = "rank_terms";
/// Dictionary scoring (scoring).
pub const STAGE_SCORE: &str = "score";
/// Record ranking (scoring).
pub const STAGE_RANK_RECORDS: &str = "rank_records";

// ─── Timing ─────────────────────────────────────────────────────────────────

/// Wall-clock timer for one stage.
#[derive(Debug, Clone, Copy)]
pub struct StageClock {
    start: Instant,
}

impl StageClock {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// What one stage did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageReport {
    elapsed: Duration,
    items: Option<usize>,
    rejected: Option<usize>,
}

impl StageReport {
    pub fn new(elapsed: Duration) -> Self {
        Self {
            elapsed,
            ..Self::default()
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Items the stage produced (n-grams, entries, records).
    pub fn items(&self) -> Option<usize> {
        self.items
    }

    /// Items the stage dropped (rejected rows, filtered n-grams).
    pub fn rejected(&self) -> Option<usize> {
        self.rejected
    }
}

/// Fluent construction of a [`StageReport`].
#[derive(Debug, Clone)]
pub struct StageReportBuilder {
    report: StageReport,
}

impl StageReportBuilder {
    pub fn new(elapsed: Duration) -> Self {
        Self {
            report: StageReport::new(elapsed),
        }
    }

    pub fn items(mut self, items: usize) -> Self {
        self.report.items = Some(items);
        self
    }

    pub fn rejected(mut self, rejected: usize) -> Self {
        self.report.rejected = Some(rejected);
        self
    }

    pub fn build(self) -> StageReport {
        self.report
    }
}

// ─── Observer trait ─────────────────────────────────────────────────────────

/// Callbacks fired by the generation and scoring pipelines.
pub trait PipelineObserver {
    fn on_stage_start(&mut self, _stage: &'static str) {}

    fn on_stage_end(&mut self, _stage: &'static str, _report: &StageReport) {}

    /// The corpus index right after indexing, before support filtering.
    fn on_index(&mut self, _index: &CorpusIndex) {}

    fn on_scores(&mut self, _scores: &[TermScores]) {}

    fn on_dictionary(&mut self, _entries: &[DictionaryEntry]) {}

    /// Scored records in input order, before ranking.
    fn on_scored(&mut self, _records: &[ScoredRecord]) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Collects one [`StageReport`] per finished stage, in execution order.
#[derive(Debug, Clone, Default)]
pub struct StageTimingObserver {
    reports: Vec<(&'static str, StageReport)>,
}

impl StageTimingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[(&'static str, StageReport)] {
        &self.reports
    }

    pub fn report(&self, stage: &str) -> Option<&StageReport> {
        self.reports
            .iter()
            .find(|(name, _)| *name == stage)
            .map(|(_, report)| report)
    }

    pub fn total_elapsed(&self) -> Duration {
        self.reports.iter().map(|(_, r)| r.elapsed()).sum()
    }
}

impl PipelineObserver for StageTimingObserver {
    fn on_stage_end(&mut self, stage: &'static str, report: &StageReport) {
        self.reports.push((stage, report.clone()));
    }
}
