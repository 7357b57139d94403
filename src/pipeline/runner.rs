//! Pipeline runners: orchestrate stage execution and artifact flow.
//!
//! [`GenerationPipeline`] mines a labeled corpus for a weighted dictionary:
//!
//! 1. Index (contingency counts per n-gram, rejected rows recorded)
//! 2. Minimum support (drop rare n-grams)
//! 3. Association (one value per requested metric)
//! 4. Rank terms (combination rule, ordering, top-k)
//!
//! [`ScoringPipeline`] applies a dictionary to unlabeled narratives:
//!
//! 1. Score (dictionary matches per record, rayon)
//! 2. Rank records (descending score, stable on ties)
//!
//! Both notify a [`PipelineObserver`] at each stage boundary and run every
//! stage inside a `pipeline_stage` tracing span.

use std::collections::BTreeSet;

use crate::association::{AssociationScorer, Metric, MetricOptions};
use crate::corpus::{distinct_labels, CorpusIndexer, LabelPolicy};
use crate::nlp::{NormalizerConfig, StopwordConfig, TermExtractor, TermSettings};
use crate::pipeline::artifacts::{
    GenerationResult, GenerationSummary, ScoringResult, ScoringSummary,
};
use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{Result, SmokeError};
use crate::pipeline::observer::{
    PipelineObserver, StageClock, StageReportBuilder, STAGE_ASSOCIATION, STAGE_INDEX,
    STAGE_RANK_RECORDS, STAGE_RANK_TERMS, STAGE_SCORE, STAGE_SUPPORT,
};
use crate::pipeline::spec::DEFAULT_TOP_K;
use crate::ranking::{CombinationRule, TermRanker};
use crate::scoring::{Dictionary, DictionaryScorer, RecordRanker};
use crate::types::{Record, RejectReason};

/// Enter a tracing span for a pipeline stage. The span closes at the end of
/// the enclosing block.
macro_rules! trace_stage {
    ($name:expr) => {
        let _span = tracing::info_span!("pipeline_stage", stage = $name).entered();
    };
}

// ============================================================================
// GenerationConfig
// ============================================================================

/// Typed configuration of a generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub n: usize,
    pub normalizer: NormalizerConfig,
    pub stopwords: Option<StopwordConfig>,
    pub metrics: Vec<Metric>,
    pub metric_options: MetricOptions,
    pub min_document_frequency: u64,
    /// `None` keeps every n-gram that passed minimum support.
    pub top_k: Option<usize>,
    /// `None` ranks by the first metric.
    pub combination: Option<CombinationRule>,
    pub target_label: String,
    /// Recognized label values; `None` accepts any non-empty label.
    pub labels: Option<Vec<String>>,
    /// Index large batches on the rayon pool.
    pub parallel: bool,
}

impl GenerationConfig {
    pub fn new(n: usize, target_label: impl Into<String>) -> Self {
        Self {
            n,
            normalizer: NormalizerConfig::default(),
            stopwords: None,
            metrics: vec![Metric::CorrelationCoefficient],
            metric_options: MetricOptions::default(),
            min_document_frequency: 1,
            top_k: Some(DEFAULT_TOP_K),
            combination: None,
            target_label: target_label.into(),
            labels: None,
            parallel: true,
        }
    }

    pub fn with_normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_stopwords(mut self, stopwords: StopwordConfig) -> Self {
        self.stopwords = Some(stopwords);
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_metric_options(mut self, options: MetricOptions) -> Self {
        self.metric_options = options;
        self
    }

    pub fn with_min_document_frequency(mut self, min_df: u64) -> Self {
        self.min_document_frequency = min_df;
        self
    }

    pub fn with_top_k(mut self, top_k: Option<usize>) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_combination(mut self, rule: CombinationRule) -> Self {
        self.combination = Some(rule);
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The effective combination rule.
    pub fn rule(&self) -> CombinationRule {
        match (&self.combination, self.metrics.first()) {
            (Some(rule), _) => rule.clone(),
            (None, Some(&metric)) => CombinationRule::primary(metric),
            (None, None) => CombinationRule::default(),
        }
    }

    /// Term extraction settings shared with scoring.
    pub fn term_settings(&self) -> TermSettings {
        TermSettings {
            n: self.n,
            normalizer: self.normalizer.clone(),
            stopwords: self.stopwords.clone(),
        }
    }

    fn label_policy(&self) -> LabelPolicy {
        let policy = LabelPolicy::new(self.target_label.as_str());
        match &self.labels {
            Some(labels) => policy.with_recognized(labels.iter().map(String::as_str)),
            None => policy,
        }
    }

    fn check(&self) -> Result<()> {
        if self.target_label.trim().is_empty() {
            return Err(SmokeError::configuration(
                ErrorCode::InvalidLabel,
                "target label must not be empty",
            ));
        }
        if self.min_document_frequency == 0 {
            return Err(SmokeError::configuration(
                ErrorCode::InvalidValue,
                "min_document_frequency must be at least 1",
            ));
        }
        if self.top_k == Some(0) {
            return Err(SmokeError::configuration(
                ErrorCode::InvalidValue,
                "top_k must be greater than 0",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// GenerationPipeline
// ============================================================================

/// Labeled records in, ranked dictionary out.
#[derive(Debug, Clone)]
pub struct GenerationPipeline {
    config: GenerationConfig,
    extractor: TermExtractor,
    scorer: AssociationScorer,
}

impl GenerationPipeline {
    /// Fails on structural configuration errors (`n < 1`, no metrics, empty
    /// target label, zero limits).
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let extractor = TermExtractor::from_settings(&config.term_settings())?;
        let scorer =
            AssociationScorer::new(config.n, &config.metrics)?.with_options(config.metric_options);
        config.check()?;
        Ok(Self {
            config,
            extractor,
            scorer,
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn extractor(&self) -> &TermExtractor {
        &self.extractor
    }

    /// Generate the dictionary for the configured target label.
    pub fn run(
        &self,
        records: &[Record],
        observer: &mut impl PipelineObserver,
    ) -> Result<GenerationResult> {
        if records.is_empty() {
            tracing::warn!("generation called with an empty batch");
            return Err(SmokeError::empty_corpus("no records were supplied"));
        }
        let labels = self.config.label_policy();
        let indexer = CorpusIndexer::new(&self.extractor, &labels);

        // Stage 1: Index
        let mut index = {
            trace_stage!(STAGE_INDEX);
            observer.on_stage_start(STAGE_INDEX);
            let clock = StageClock::start();
            let index = if self.config.parallel {
                indexer.index_parallel(records)
            } else {
                indexer.index(records)
            };
            let report = StageReportBuilder::new(clock.elapsed())
                .items(index.len())
                .rejected(index.rejections().len())
                .build();
            observer.on_stage_end(STAGE_INDEX, &report);
            observer.on_index(&index);
            index
        };

        let totals = *index.totals();
        if totals.records == 0 {
            tracing::warn!(
                rejected = totals.rejected,
                target = %self.config.target_label,
                "no usable labeled records"
            );
            return Err(SmokeError::empty_corpus(format!(
                "all {} records were rejected",
                records.len()
            )));
        }
        if totals.positive == 0 {
            tracing::warn!(target = %self.config.target_label, "no record carries the target label");
        }
        let distinct_ngrams = index.len();

        // Stage 2: Minimum support
        {
            trace_stage!(STAGE_SUPPORT);
            observer.on_stage_start(STAGE_SUPPORT);
            let clock = StageClock::start();
            let dropped = index.retain_min_support(self.config.min_document_frequency);
            let report = StageReportBuilder::new(clock.elapsed())
                .items(index.len())
                .rejected(dropped)
                .build();
            observer.on_stage_end(STAGE_SUPPORT, &report);
        }
        let supported_ngrams = index.len();

        // Stage 3: Association
        let scores = {
            trace_stage!(STAGE_ASSOCIATION);
            observer.on_stage_start(STAGE_ASSOCIATION);
            let clock = StageClock::start();
            let scores = self.scorer.score(&index)?;
            let report = StageReportBuilder::new(clock.elapsed())
                .items(scores.len())
                .build();
            observer.on_stage_end(STAGE_ASSOCIATION, &report);
            observer.on_scores(&scores);
            scores
        };

        // Stage 4: Rank terms
        let entries = {
            trace_stage!(STAGE_RANK_TERMS);
            observer.on_stage_start(STAGE_RANK_TERMS);
            let clock = StageClock::start();
            let entries = TermRanker::new().rank(&scores, self.config.top_k, &self.config.rule())?;
            let report = StageReportBuilder::new(clock.elapsed())
                .items(entries.len())
                .build();
            observer.on_stage_end(STAGE_RANK_TERMS, &report);
            observer.on_dictionary(&entries);
            entries
        };

        let summary = GenerationSummary {
            records_seen: records.len(),
            records_used: totals.records,
            positive: totals.positive,
            negative: totals.negative,
            rejected: totals.rejected,
            distinct_ngrams,
            supported_ngrams,
            dictionary_size: entries.len(),
            rejections: index.rejections().to_vec(),
        };
        tracing::info!(
            target_label = %self.config.target_label,
            n = self.config.n,
            records = summary.records_used,
            positive = summary.positive,
            negative = summary.negative,
            rejected = summary.rejected,
            ngrams = summary.distinct_ngrams,
            dictionary = summary.dictionary_size,
            "dictionary generated"
        );

        Ok(GenerationResult {
            n: self.config.n,
            target_label: self.config.target_label.trim().to_string(),
            entries,
            summary,
            terms: self.config.term_settings(),
        })
    }

    /// One dictionary per recognized label value, in label order.
    pub fn run_one_vs_rest(
        &self,
        records: &[Record],
        observer: &mut impl PipelineObserver,
    ) -> Result<Vec<GenerationResult>> {
        let recognized: Option<BTreeSet<String>> = self
            .config
            .labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| l.trim().to_string()).collect());
        let targets = distinct_labels(
            records.iter().map(|r| r.label.as_deref()),
            recognized.as_ref(),
        );
        if targets.is_empty() {
            tracing::warn!("one-vs-rest found no usable labels");
            return Err(SmokeError::empty_corpus("no record carries a usable label"));
        }

        targets
            .into_iter()
            .map(|target| {
                let config = GenerationConfig {
                    target_label: target,
                    ..self.config.clone()
                };
                let pipeline = Self {
                    config,
                    extractor: self.extractor.clone(),
                    scorer: self.scorer.clone(),
                };
                pipeline.run(records, &mut *observer)
            })
            .collect()
    }
}

// ============================================================================
// ScoringPipeline
// ============================================================================

/// Unlabeled records in, ranked scored records out.
#[derive(Debug, Clone)]
pub struct ScoringPipeline {
    scorer: DictionaryScorer,
}

impl ScoringPipeline {
    /// `extractor` must use the dictionary's `n`.
    pub fn new(dictionary: Dictionary, extractor: TermExtractor) -> Result<Self> {
        Ok(Self {
            scorer: DictionaryScorer::new(dictionary, extractor)?,
        })
    }

    /// Score with the dictionary and term settings of a generation run.
    pub fn from_generation(result: &GenerationResult) -> Result<Self> {
        Self::new(result.dictionary()?, TermExtractor::from_settings(&result.terms)?)
    }

    pub fn dictionary(&self) -> &Dictionary {
        self.scorer.dictionary()
    }

    /// Score and rank `records` with `n`-grams.
    pub fn run(
        &self,
        records: &[Record],
        n: usize,
        observer: &mut impl PipelineObserver,
    ) -> Result<ScoringResult> {
        if records.is_empty() {
            tracing::warn!("scoring called with an empty batch");
            return Err(SmokeError::empty_corpus("no records to score"));
        }
        if n != self.scorer.n() {
            tracing::warn!(requested = n, dictionary = self.scorer.n(), "n-gram length mismatch");
            return Err(SmokeError::configuration(
                ErrorCode::NgramMismatch,
                format!(
                    "dictionary holds {}-grams but scoring was requested with n={n}",
                    self.scorer.n()
                ),
            ));
        }

        // Stage 1: Score
        let batch = {
            trace_stage!(STAGE_SCORE);
            observer.on_stage_start(STAGE_SCORE);
            let clock = StageClock::start();
            let batch = self.scorer.score_batch(records);
            let report = StageReportBuilder::new(clock.elapsed())
                .items(batch.records.len())
                .rejected(records.len() - batch.records.len())
                .build();
            observer.on_stage_end(STAGE_SCORE, &report);
            observer.on_scored(&batch.records);
            batch
        };

        let summary = ScoringSummary {
            records_seen: records.len(),
            records_scored: batch.records.len(),
            records_matched: batch
                .records
                .iter()
                .filter(|r| !r.matched_terms.is_empty())
                .count(),
            rejected: records.len() - batch.records.len(),
            empty_narratives: batch
                .rejections
                .iter()
                .filter(|r| r.reason == RejectReason::EmptyNarrative)
                .count(),
            dictionary_size: self.scorer.dictionary().len(),
            rejections: batch.rejections,
        };

        // Stage 2: Rank records
        let ranked = {
            trace_stage!(STAGE_RANK_RECORDS);
            observer.on_stage_start(STAGE_RANK_RECORDS);
            let clock = StageClock::start();
            let ranked = RecordRanker::new().rank(batch.records);
            let report = StageReportBuilder::new(clock.elapsed())
                .items(ranked.len())
                .build();
            observer.on_stage_end(STAGE_RANK_RECORDS, &report);
            ranked
        };

        tracing::info!(
            records = summary.records_scored,
            matched = summary.records_matched,
            rejected = summary.rejected,
            empty = summary.empty_narratives,
            dictionary = summary.dictionary_size,
            "records scored"
        );

        Ok(ScoringResult {
            records: ranked,
            summary,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
