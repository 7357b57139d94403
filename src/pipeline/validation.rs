//! Validation engine for run specifications.
//!
//! The engine runs all registered [`ValidationRule`]s against a
//! [`RunSpec`](super::spec::RunSpec) and collects every diagnostic into a
//! [`ValidationReport`]. It never short-circuits on the first error, so users
//! see all problems at once.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use smoke_terms::pipeline::validation::ValidationEngine;
//!
//! let engine = ValidationEngine::with_defaults();
//! let report = engine.validate(&spec);
//! if report.has_errors() {
//!     for err in report.errors() {
//!         eprintln!("{err}");
//!     }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::error_code::ErrorCode;
use super::errors::SpecError;
use super::spec::{RunSpec, SUPPORTED_VERSION};
use crate::association::Metric;

// ─── Severity ───────────────────────────────────────────────────────────────

/// Whether a diagnostic is a hard error or a soft warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// ─── Diagnostic ─────────────────────────────────────────────────────────────

/// A single validation finding: an error or warning attached to a
/// [`SpecError`] that carries the code, path, message and hint.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: SpecError,
}

impl ValidationDiagnostic {
    pub fn error(err: SpecError) -> Self {
        Self {
            severity: Severity::Error,
            error: err,
        }
    }

    pub fn warning(err: SpecError) -> Self {
        Self {
            severity: Severity::Warning,
            error: err,
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Collected diagnostics from running all validation rules.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    /// Iterate over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &SpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    /// Iterate over warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &SpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| &d.error)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns `true` if there are no errors (warnings are acceptable).
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ─── Rule trait ─────────────────────────────────────────────────────────────

/// A single validation rule that inspects a [`RunSpec`] and returns zero or
/// more diagnostics.
///
/// Rules are stateless and must be `Send + Sync` so one engine can be shared
/// across threads.
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier for this rule (e.g., `"metrics"`).
    fn name(&self) -> &str;

    /// Inspect `spec` and return any findings.
    fn validate(&self, spec: &RunSpec) -> Vec<ValidationDiagnostic>;
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Runs a set of [`ValidationRule`]s against a [`RunSpec`] and collects all
/// diagnostics into a [`ValidationReport`].
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Create an empty engine with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create an engine pre-loaded with the default rule set.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(VersionRule));
        engine.add_rule(Box::new(NgramLengthRule));
        engine.add_rule(Box::new(MetricsRule));
        engine.add_rule(Box::new(CombinationRefsRule));
        engine.add_rule(Box::new(LimitsRule));
        engine.add_rule(Box::new(TargetLabelRule));
        engine.add_rule(Box::new(UnknownFieldsRule));
        engine
    }

    /// Register an additional rule.
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run all rules against `spec` and return the collected report.
    pub fn validate(&self, spec: &RunSpec) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(spec));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. Spec version ────────────────────────────────────────────────────────

struct VersionRule;

impl ValidationRule for VersionRule {
    fn name(&self) -> &str {
        "version"
    }

    fn validate(&self, spec: &RunSpec) -> Vec<ValidationDiagnostic> {
        if spec.v == SUPPORTED_VERSION {
            return vec![];
        }
        vec![ValidationDiagnostic::error(
            SpecError::new(
                ErrorCode::UnsupportedVersion,
                "/v",
                format!("spec version {} is not supported", spec.v),
            )
            .with_hint(format!("Set \"v\" to {SUPPORTED_VERSION}")),
        )]
    }
}

// ─── 2. n ≥ 1 ───────────────────────────────────────────────────────────────

struct NgramLengthRule;

impl ValidationRule for NgramLengthRule {
    fn name(&self) -> &str {
        "ngram_length"
    }

    fn validate(&self, spec: &RunSpec) -> Vec<ValidationDiagnostic> {
        if spec.n >= 1 {
            return vec![];
        }
        vec![ValidationDiagnostic::error(
            SpecError::new(ErrorCode::InvalidNgramLength, "/n", "n must be at least 1")
                .with_hint("Use 1 for unigrams, 2 for bigrams"),
        )]
    }
}

// ─── 3. Metric names ────────────────────────────────────────────────────────

struct MetricsRule;

impl ValidationRule for MetricsRule {
    fn name(&self) -> &str {
        "metrics"
    }

    fn validate(&self, spec: &RunSpec) -> Vec<ValidationDiagnostic> {
        if spec.metrics.is_empty() {
            return vec![ValidationDiagnostic::error(
                SpecError::new(
                    ErrorCode::MissingMetric,
                    "/metrics",
                    "at least one metric is required",
                )
                .with_hint("Add \"correlation_coefficient\" or another metric"),
            )];
        }

        spec.metrics
            .iter()
            .enumerate()
            .filter(|(_, name)| name.parse::<Metric>().is_err())
            .map(|(i, name)| {
                ValidationDiagnostic::error(
                    SpecError::new(
                        ErrorCode::UnknownMetric,
                        format!("/metrics/{i}"),
                        format!("unknown metric \"{name}\""),
                    )
                    .with_hint(known_metrics_hint()),
                )
            })
            .collect()
    }
}

fn known_metrics_hint() -> String {
    let names: Vec<&str> = Metric::ALL.iter().map(|m| m.as_str()).collect();
    format!("Known metrics: {}", names.join(", "))
}

// ─── 4. Combination rule references computed metrics ────────────────────────

struct CombinationRefsRule;

impl CombinationRefsRule {
    fn check_metric(
        name: &str,
        path: String,
        computed: &BTreeSet<Metric>,
        out: &mut Vec<ValidationDiagnostic>,
    ) {
        match name.parse::<Metric>() {
            Err(_) => out.push(ValidationDiagnostic::error(
                SpecError::new(
                    ErrorCode::UnknownMetric,
                    path,
                    format!("unknown metric \"{name}\""),
                )
                .with_hint(known_metrics_hint()),
            )),
            Ok(metric) if !computed.contains(&metric) => {
                out.push(ValidationDiagnostic::error(
                    SpecError::new(
                        ErrorCode::MissingMetric,
                        path,
                        format!("combination uses {metric}, which is not in \"metrics\""),
                    )
                    .with_hint(format!("Add \"{metric}\" to \"metrics\"")),
                ))
            }
            Ok(_) => {}
        }
    }
}

impl ValidationRule for CombinationRefsRule {
    fn name(&self) -> &str {
        "combination_refs"
    }

    fn validate(&self, spec: &RunSpec) -> Vec<ValidationDiagnostic> {
        let Some(combination) = &spec.combination else {
            return vec![];
        };
        let computed: BTreeSet<Metric> = spec.parsed_metrics().into_iter().collect();
        let mut out = Vec::new();

        match combination.rule.as_str() {
            "primary" => match &combination.metric {
                Some(name) => Self::check_metric(
                    name,
                    "/combination/metric".to_string(),
                    &computed,
                    &mut out,
                ),
                None => out.push(ValidationDiagnostic::error(
                    SpecError::new(
                        ErrorCode::InvalidCombination,
                        "/combination/metric",
                        "primary rule needs a metric",
                    )
                    .with_hint("Set \"metric\" to one of the computed metrics"),
                )),
            },
            "weighted_sum" => {
                if combination.weights.is_empty() {
                    out.push(ValidationDiagnostic::error(
                        SpecError::new(
                            ErrorCode::InvalidCombination,
                            "/combination/weights",
                            "weighted_sum needs at least one metric weight",
                        ),
                    ));
                }
                let mut weighted: BTreeMap<Metric, &str> = BTreeMap::new();
                for (name, &weight) in &combination.weights {
                    let path = format!("/combination/weights/{name}");
                    Self::check_metric(name, path.clone(), &computed, &mut out);
                    if let Ok(metric) = name.parse::<Metric>() {
                        if let Some(first) = weighted.insert(metric, name) {
                            out.push(ValidationDiagnostic::error(
                                SpecError::new(
                                    ErrorCode::InvalidCombination,
                                    path.clone(),
                                    format!("\"{first}\" and \"{name}\" both name {metric}"),
                                )
                                .with_hint("Give each metric a single weight"),
                            ));
                        }
                    }
                    if !weight.is_finite() {
                        out.push(ValidationDiagnostic::error(SpecError::new(
                            ErrorCode::InvalidCombination,
                            path,
                            format!("weight {weight} is not finite"),
                        )));
                    }
                }
                if !combination.weights.is_empty()
                    && combination.weights.values().all(|&w| w == 0.0)
                {
                    out.push(ValidationDiagnostic::error(
                        SpecError::new(
                            ErrorCode::InvalidCombination,
                            "/combination/weights",
                            "all weights are zero",
                        )
                        .with_hint("Give at least one metric a non-zero weight"),
                    ));
                }
            }
            other => out.push(ValidationDiagnostic::error(
                SpecError::new(
                    ErrorCode::InvalidCombination,
                    "/combination/rule",
                    format!("unknown combination rule \"{other}\""),
                )
                .with_hint("Use \"primary\" or \"weighted_sum\""),
            )),
        }

        out
    }
}

// ─── 5. Numeric limits ──────────────────────────────────────────────────────

struct LimitsRule;

impl ValidationRule for LimitsRule {
    fn name(&self) -> &str {
        "limits"
    }

    fn validate(&self, spec: &RunSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();

        if spec.top_k == Some(0) {
            out.push(ValidationDiagnostic::error(
                SpecError::new(ErrorCode::InvalidValue, "/top_k", "top_k must be greater than 0")
                    .with_hint("Set top_k to null to keep every supported n-gram"),
            ));
        }
        if spec.min_document_frequency == 0 {
            out.push(ValidationDiagnostic::error(
                SpecError::new(
                    ErrorCode::InvalidValue,
                    "/min_document_frequency",
                    "min_document_frequency must be at least 1",
                ),
            ));
        }
        if !spec.options.log_floor.is_finite() {
            out.push(ValidationDiagnostic::error(SpecError::new(
                ErrorCode::InvalidValue,
                "/options/log_floor",
                "log_floor must be finite",
            )));
        }
        if !spec.options.odds_ratio_floor.is_finite() {
            out.push(ValidationDiagnostic::error(SpecError::new(
                ErrorCode::InvalidValue,
                "/options/odds_ratio_floor",
                "odds_ratio_floor must be finite",
            )));
        }
        if let Some(s) = spec.options.odds_ratio_smoothing {
            if !(s.is_finite() && s >= 0.0) {
                out.push(ValidationDiagnostic::error(SpecError::new(
                    ErrorCode::InvalidValue,
                    "/options/odds_ratio_smoothing",
                    "odds_ratio_smoothing must be a non-negative number",
                )));
            }
        }

        out
    }
}

// ─── 6. Target label ────────────────────────────────────────────────────────

struct TargetLabelRule;

impl ValidationRule for TargetLabelRule {
    fn name(&self) -> &str {
        "target_label"
    }

    fn validate(&self, spec: &RunSpec) -> Vec<ValidationDiagnostic> {
        let target = spec.target_label.trim();
        if target.is_empty() {
            return vec![ValidationDiagnostic::error(
                SpecError::new(
                    ErrorCode::InvalidLabel,
                    "/target_label",
                    "target_label must not be empty",
                ),
            )];
        }
        match &spec.labels {
            Some(labels) if !labels.iter().any(|l| l.trim() == target) => {
                vec![ValidationDiagnostic::error(
                    SpecError::new(
                        ErrorCode::InvalidLabel,
                        "/target_label",
                        format!("target label \"{target}\" is not in \"labels\""),
                    )
                    .with_hint("Add it to \"labels\" or remove \"labels\""),
                )]
            }
            _ => vec![],
        }
    }
}

// ─── 7. Unknown fields (strict → error, non-strict → warning) ───────────────

struct UnknownFieldsRule;

impl UnknownFieldsRule {
    /// Collect unknown-field diagnostics at the given JSON pointer `path`
    /// from the extra fields captured by `#[serde(flatten)]`.
    fn check_unknowns(
        path: &str,
        unknowns: &HashMap<String, serde_json::Value>,
        strict: bool,
    ) -> Vec<ValidationDiagnostic> {
        let mut keys: Vec<&String> = unknowns.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| {
                let diag_fn = if strict {
                    ValidationDiagnostic::error
                } else {
                    ValidationDiagnostic::warning
                };
                diag_fn(
                    SpecError::new(
                        ErrorCode::UnknownField,
                        format!("{path}/{key}"),
                        format!("unrecognized field \"{key}\""),
                    )
                    .with_hint("Check spelling or remove this field"),
                )
            })
            .collect()
    }
}

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &str {
        "unknown_fields"
    }

    fn validate(&self, spec: &RunSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Self::check_unknowns("", &spec.unknown_fields, spec.strict);
        if let Some(combination) = &spec.combination {
            out.extend(Self::check_unknowns(
                "/combination",
                &combination.unknown_fields,
                spec.strict,
            ));
        }
        out.extend(Self::check_unknowns(
            "/normalizer",
            &spec.normalizer.unknown_fields,
            spec.strict,
        ));
        if let Some(stopwords) = &spec.stopwords {
            out.extend(Self::check_unknowns(
                "/stopwords",
                &stopwords.unknown_fields,
                spec.strict,
            ));
        }
        out.extend(Self::check_unknowns(
            "/options",
            &spec.options.unknown_fields,
            spec.strict,
        ));
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════
