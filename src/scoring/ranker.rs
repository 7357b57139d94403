//! Record ranking.

use crate::types::ScoredRecord;

/// Orders scored records by descending score.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordRanker;

impl RecordRanker {
    pub fn new() -> Self {
        Self
    }

    /// Descending score; equal scores keep ascending input row.
    pub fn rank(&self, mut scored: Vec<ScoredRecord>) -> Vec<ScoredRecord> {
        scored.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.row.cmp(&b.row)));
        scored
    }
}
