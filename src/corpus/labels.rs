//! Label policy: which records are positive, negative or unusable.

use std::collections::BTreeSet;

use crate::types::{RejectReason, Stratum};

/// One-vs-rest split for a single target label.
///
/// A label is recognized when it is non-empty after trimming and, if a
/// recognized set is configured, a member of that set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPolicy {
    target: String,
    recognized: Option<BTreeSet<String>>,
}

impl LabelPolicy {
    /// Any non-empty label is recognized; `target` is the positive class.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into().trim().to_string(),
            recognized: None,
        }
    }

    /// Only labels in `labels` are recognized.
    pub fn with_recognized<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recognized = Some(
            labels
                .into_iter()
                .map(|l| l.into().trim().to_string())
                .collect(),
        );
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn recognized(&self) -> Option<&BTreeSet<String>> {
        self.recognized.as_ref()
    }

    /// Assign `label` to a stratum, or explain why the row is unusable.
    pub fn classify(&self, label: Option<&str>) -> Result<Stratum, RejectReason> {
        let label = match label.map(str::trim) {
            None | Some("") => return Err(RejectReason::MissingLabel),
            Some(label) => label,
        };
        if let Some(recognized) = &self.recognized {
            if !recognized.contains(label) {
                return Err(RejectReason::UnrecognizedLabel);
            }
        }
        if label == self.target {
            Ok(Stratum::Positive)
        } else {
            Ok(Stratum::Negative)
        }
    }
}

/// Distinct usable label values in `labels`, sorted, honouring an optional
/// recognized set. Drives one-vs-rest iteration.
pub fn distinct_labels<'a, I>(labels: I, recognized: Option<&BTreeSet<String>>) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let seen: BTreeSet<String> = labels
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter(|l| recognized.map_or(true, |r| r.contains(*l)))
        .map(str::to_string)
        .collect();
    seen.into_iter().collect()
}
