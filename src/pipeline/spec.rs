//! Run specification types.
//!
//! A [`RunSpec`] is the serialized configuration of a generation run as it
//! arrives from outside the crate. Metric names stay strings here so that
//! the [`super::validation::ValidationEngine`] can report every bad name at
//! once; [`RunSpec::into_config`] turns a valid spec into a typed
//! [`GenerationConfig`].
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "v": 1,
//!   "n": 2,
//!   "target_label": "hazard",
//!   "labels": ["hazard", "normal"],
//!   "metrics": ["tf_idf", "chi_squared"],
//!   "combination": { "rule": "weighted_sum", "weights": { "tf_idf": 0.5, "chi_squared": 0.5 } },
//!   "min_document_frequency": 2,
//!   "top_k": 200,
//!   "normalizer": { "min_token_length": 3 },
//!   "stopwords": { "language": "en", "extra": ["aircraft"] },
//!   "options": { "log_floor": -50.0 },
//!   "strict": false
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::errors::{Result, SmokeError};
use super::runner::GenerationConfig;
use super::validation::{ValidationEngine, ValidationReport};
use crate::association::{Metric, MetricOptions};
use crate::nlp::{NormalizerConfig, StopwordConfig};
use crate::ranking::CombinationRule;

/// Spec versions this crate understands.
pub const SUPPORTED_VERSION: u32 = 1;

/// Dictionary size when a run spec does not set `top_k`.
pub const DEFAULT_TOP_K: usize = 200;

fn default_version() -> u32 {
    SUPPORTED_VERSION
}

fn default_n() -> usize {
    1
}

fn default_metrics() -> Vec<String> {
    vec![Metric::CorrelationCoefficient.as_str().to_string()]
}

fn default_min_df() -> u64 {
    1
}

fn default_top_k() -> Option<usize> {
    Some(DEFAULT_TOP_K)
}

fn default_parallel() -> bool {
    true
}

/// Top-level generation run specification (v1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    /// Spec version (currently `1`).
    #[serde(default = "default_version")]
    pub v: u32,

    /// N-gram length.
    #[serde(default = "default_n")]
    pub n: usize,

    /// Label value treated as the positive class.
    #[serde(default)]
    pub target_label: String,

    /// Recognized label values; when absent any non-empty label counts.
    #[serde(default)]
    pub labels: Option<Vec<String>>,

    /// Metric names to compute.
    #[serde(default = "default_metrics")]
    pub metrics: Vec<String>,

    /// How metric values become one weight. Absent means the first metric.
    #[serde(default)]
    pub combination: Option<CombinationSpec>,

    #[serde(default = "default_min_df")]
    pub min_document_frequency: u64,

    /// Maximum dictionary size; `null` keeps every supported n-gram.
    #[serde(default = "default_top_k")]
    pub top_k: Option<usize>,

    #[serde(default)]
    pub normalizer: SpecSection<NormalizerConfig>,

    #[serde(default)]
    pub stopwords: Option<SpecSection<StopwordConfig>>,

    #[serde(default)]
    pub options: SpecSection<MetricOptions>,

    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// If `true`, unrecognized fields are errors; if `false`, warnings.
    #[serde(default)]
    pub strict: bool,

    /// Captures any fields not recognized by the schema.
    /// Used by the strict-mode validation rule.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// Unvalidated combination rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinationSpec {
    /// `"primary"` or `"weighted_sum"`.
    pub rule: String,

    /// Metric for `primary`.
    #[serde(default)]
    pub metric: Option<String>,

    /// Metric weights for `weighted_sum`.
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,

    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// A nested settings object plus whatever fields it did not recognize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecSection<T> {
    #[serde(flatten)]
    pub value: T,

    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl<T> SpecSection<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            unknown_fields: HashMap::new(),
        }
    }
}

impl<T> Deref for SpecSection<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl RunSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Run the default rule set.
    pub fn validate(&self) -> ValidationReport {
        ValidationEngine::with_defaults().validate(self)
    }

    /// Parsed metric names, skipping the ones that do not parse.
    pub fn parsed_metrics(&self) -> Vec<Metric> {
        self.metrics.iter().filter_map(|m| m.parse().ok()).collect()
    }

    /// Validate and convert. Warnings are logged; any error aborts with
    /// [`SmokeError::InvalidSpec`] carrying every error diagnostic.
    pub fn into_config(self) -> Result<GenerationConfig> {
        let report = self.validate();
        for warning in report.warnings() {
            tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
        }
        if report.has_errors() {
            let errors: Vec<_> = report.errors().cloned().collect();
            tracing::warn!(errors = errors.len(), "run spec rejected");
            return Err(SmokeError::InvalidSpec(errors));
        }

        let metrics = self.parsed_metrics();
        let combination = match &self.combination {
            Some(spec) => Some(spec.to_rule()?),
            None => None,
        };

        let mut config = GenerationConfig::new(self.n, self.target_label)
            .with_metrics(metrics)
            .with_normalizer(self.normalizer.value)
            .with_metric_options(self.options.value)
            .with_min_document_frequency(self.min_document_frequency)
            .with_top_k(self.top_k)
            .with_parallel(self.parallel);
        if let Some(rule) = combination {
            config = config.with_combination(rule);
        }
        if let Some(stopwords) = self.stopwords {
            config = config.with_stopwords(stopwords.value);
        }
        if let Some(labels) = self.labels {
            config = config.with_labels(labels);
        }
        Ok(config)
    }
}

impl CombinationSpec {
    /// Typed rule; fails on names the validation engine would also reject.
    pub fn to_rule(&self) -> Result<CombinationRule> {
        match self.rule.as_str() {
            "primary" => {
                let name = self.metric.as_deref().unwrap_or_default();
                Ok(CombinationRule::primary(name.parse()?))
            }
            "weighted_sum" => {
                let weights = self
                    .weights
                    .iter()
                    .map(|(name, &w)| -> Result<(Metric, f64)> { Ok((name.parse()?, w)) })
                    .collect::<Result<Vec<_>>>()?;
                let distinct: BTreeSet<Metric> = weights.iter().map(|&(m, _)| m).collect();
                if distinct.len() != weights.len() {
                    return Err(SmokeError::configuration(
                        super::error_code::ErrorCode::InvalidCombination,
                        "a metric is weighted more than once under different names",
                    ));
                }
                Ok(CombinationRule::weighted_sum(weights))
            }
            other => Err(SmokeError::configuration(
                super::error_code::ErrorCode::InvalidCombination,
                format!("unknown combination rule \"{other}\""),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_spec() {
        let spec = RunSpec::from_json(r#"{ "v": 1, "target_label": "hazard" }"#).unwrap();
        assert_eq!(spec.v, 1);
        assert_eq!(spec.n, 1);
        assert_eq!(spec.metrics, vec!["correlation_coefficient"]);
        assert_eq!(spec.top_k, Some(DEFAULT_TOP_K));
        assert_eq!(spec.min_document_frequency, 1);
        assert!(spec.combination.is_none());
        assert!(spec.parallel);
        assert!(!spec.strict);
    }

    #[test]
    fn test_deserialize_full_spec() {
        let json = r#"{
            "v": 1,
            "n": 2,
            "target_label": "hazard",
            "labels": ["hazard", "normal"],
            "metrics": ["tf_idf", "chi2"],
            "combination": { "rule": "weighted_sum", "weights": { "tf_idf": 0.5, "chi2": 0.5 } },
            "min_document_frequency": 2,
            "top_k": null,
            "normalizer": { "min_token_length": 2 },
            "stopwords": { "language": "en", "extra": ["aircraft"] },
            "options": { "log_floor": -50.0 },
            "strict": true
        }"#;
        let spec = RunSpec::from_json(json).unwrap();
        assert_eq!(spec.n, 2);
        assert_eq!(spec.parsed_metrics(), vec![Metric::TfIdf, Metric::ChiSquared]);
        assert_eq!(spec.top_k, None);
        assert_eq!(spec.normalizer.min_token_length, 2);
        assert!(spec.normalizer.lowercase);
        assert_eq!(spec.options.log_floor, -50.0);
        assert_eq!(spec.options.odds_ratio_floor, 0.0);
        assert!(spec.strict);

        let rule = spec.combination.as_ref().unwrap().to_rule().unwrap();
        assert_eq!(
            rule,
            CombinationRule::weighted_sum([(Metric::TfIdf, 0.5), (Metric::ChiSquared, 0.5)])
        );
    }

    #[test]
    fn test_unknown_fields_captured() {
        let json = r#"{
            "v": 1,
            "target_label": "hazard",
            "bogus_top_level": 42,
            "combination": { "rule": "primary", "metric": "pmi", "bogus_rule_field": true }
        }"#;
        let spec = RunSpec::from_json(json).unwrap();
        assert!(spec.unknown_fields.contains_key("bogus_top_level"));
        assert!(spec
            .combination
            .unwrap()
            .unknown_fields
            .contains_key("bogus_rule_field"));
    }

    #[test]
    fn test_nested_sections_keep_known_and_unknown_fields() {
        let json = r#"{
            "target_label": "hazard",
            "normalizer": { "min_token_length": 2, "min_token_lenght": 1 },
            "options": { "log_floor": -5.0, "log_flor": -10.0 }
        }"#;
        let spec = RunSpec::from_json(json).unwrap();
        assert_eq!(spec.normalizer.min_token_length, 2);
        assert!(spec.normalizer.unknown_fields.contains_key("min_token_lenght"));
        assert_eq!(spec.options.log_floor, -5.0);
        assert!(spec.options.unknown_fields.contains_key("log_flor"));

        let config = spec.into_config().unwrap();
        assert_eq!(config.normalizer.min_token_length, 2);
    }

    #[test]
    fn test_strict_rejects_nested_typo() {
        let json = r#"{ "target_label": "hazard", "strict": true, "stopwords": { "langauge": "en" } }"#;
        let err = RunSpec::from_json(json).unwrap().into_config().unwrap_err();
        match err {
            SmokeError::InvalidSpec(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "/stopwords/langauge");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_to_rule_rejects_aliased_weights() {
        let combination = CombinationSpec {
            rule: "weighted_sum".to_string(),
            weights: [("chi2".to_string(), 0.3), ("chi_squared".to_string(), 0.7)]
                .into_iter()
                .collect(),
            ..CombinationSpec::default()
        };
        assert!(combination.to_rule().unwrap_err().is_configuration());
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let err = RunSpec::from_json(r#"{ "v": "#).unwrap_err();
        assert!(matches!(err, SmokeError::Json(_)));
    }

    #[test]
    fn test_into_config() {
        let json = r#"{
            "n": 2,
            "target_label": "hazard",
            "metrics": ["pmi", "odds_ratio"],
            "combination": { "rule": "primary", "metric": "odds_ratio" },
            "top_k": 10
        }"#;
        let config = RunSpec::from_json(json).unwrap().into_config().unwrap();
        assert_eq!(config.n, 2);
        assert_eq!(config.target_label, "hazard");
        assert_eq!(config.metrics, vec![Metric::Pmi, Metric::OddsRatio]);
        assert_eq!(config.rule(), CombinationRule::primary(Metric::OddsRatio));
        assert_eq!(config.top_k, Some(10));
    }

    #[test]
    fn test_into_config_collects_all_errors() {
        let json = r#"{ "n": 0, "target_label": "", "metrics": ["bm25"] }"#;
        let err = RunSpec::from_json(json).unwrap().into_config().unwrap_err();
        match err {
            SmokeError::InvalidSpec(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
