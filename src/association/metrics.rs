//! Association metrics over a 2×2 contingency table
//!
//! One pure function per metric. None of them panics or returns NaN/∞ for
//! degenerate counts; each documents the value it falls back to.
//!
//! Table layout, for one n-gram and one target label:
//!
//! |              | positive | negative |
//! |--------------|----------|----------|
//! | has term     | `a`      | `b`      |
//! | lacks term   | `c`      | `d`      |

use crate::types::{ContingencyEntry, CorpusTotals};

/// Document counts of one n-gram against one target label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContingencyTable {
    /// Positive records containing the n-gram.
    pub a: f64,
    /// Negative records containing the n-gram.
    pub b: f64,
    /// Positive records without the n-gram.
    pub c: f64,
    /// Negative records without the n-gram.
    pub d: f64,
}

impl ContingencyTable {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Build the table from corpus counters. Complements saturate at zero.
    pub fn from_counts(entry: &ContingencyEntry, totals: &CorpusTotals) -> Self {
        Self {
            a: entry.df_positive as f64,
            b: entry.df_negative as f64,
            c: totals.positive.saturating_sub(entry.df_positive) as f64,
            d: totals.negative.saturating_sub(entry.df_negative) as f64,
        }
    }

    pub fn total(&self) -> f64 {
        self.a + self.b + self.c + self.d
    }

    /// Records containing the n-gram (`a + b`).
    pub fn with_term(&self) -> f64 {
        self.a + self.b
    }

    /// Records without the n-gram (`c + d`).
    pub fn without_term(&self) -> f64 {
        self.c + self.d
    }

    /// Positive records (`a + c`).
    pub fn positive(&self) -> f64 {
        self.a + self.c
    }

    /// Negative records (`b + d`).
    pub fn negative(&self) -> f64 {
        self.b + self.d
    }

    /// Expected cell counts under independence, in `[a, b, c, d]` order.
    fn expected(&self) -> [f64; 4] {
        let n = self.total();
        if n <= 0.0 {
            return [0.0; 4];
        }
        [
            self.with_term() * self.positive() / n,
            self.with_term() * self.negative() / n,
            self.without_term() * self.positive() / n,
            self.without_term() * self.negative() / n,
        ]
    }

    fn observed(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    fn smoothed(&self, s: f64) -> Self {
        Self::new(self.a + s, self.b + s, self.c + s, self.d + s)
    }
}

/// Map NaN and ±∞ to `fallback`.
#[inline]
fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

/// `tf × ln(N / df)`.
///
/// `tf` is the n-gram's term frequency in the target class, `df` its
/// document frequency over the whole corpus. `df = 0` or `N = 0` → 0.
/// An n-gram present in every record scores exactly 0.
pub fn tf_idf(tf: u64, df: u64, records: u64) -> f64 {
    if df == 0 || records == 0 {
        return 0.0;
    }
    if df >= records {
        return 0.0;
    }
    finite_or(tf as f64 * (records as f64 / df as f64).ln(), 0.0)
}

/// Pearson chi-squared statistic of the 2×2 table:
/// `N (ad − bc)² / ((a+b)(c+d)(a+c)(b+d))`.
///
/// When any expected cell is zero (a margin is empty) → 0.
pub fn chi_squared(t: &ContingencyTable) -> f64 {
    let denominator = t.with_term() * t.without_term() * t.positive() * t.negative();
    if denominator <= 0.0 {
        return 0.0;
    }
    let cross = t.a * t.d - t.b * t.c;
    finite_or(t.total() * cross * cross / denominator, 0.0)
}

/// Pointwise mutual information between term presence and the positive
/// class: `ln(P(term, pos) / (P(term) P(pos))) = ln(a N / ((a+b)(a+c)))`.
///
/// `a = 0` (including an empty positive class) → `floor`.
pub fn pmi(t: &ContingencyTable, floor: f64) -> f64 {
    if t.a <= 0.0 {
        return floor;
    }
    let denominator = t.with_term() * t.positive();
    if denominator <= 0.0 {
        return floor;
    }
    finite_or((t.a * t.total() / denominator).ln(), floor).max(floor)
}

/// Log-likelihood ratio (G²): `2 Σ O ln(O / E)` over the four cells, with
/// `0 ln 0 = 0`.
///
/// When any expected cell is zero → 0.
pub fn log_likelihood(t: &ContingencyTable) -> f64 {
    let expected = t.expected();
    if expected.iter().any(|&e| e <= 0.0) {
        return 0.0;
    }
    let sum: f64 = t
        .observed()
        .iter()
        .zip(expected.iter())
        .filter(|(o, _)| **o > 0.0)
        .map(|(&o, &e)| o * (o / e).ln())
        .sum();
    finite_or(2.0 * sum, 0.0).max(0.0)
}

/// Odds ratio `(a d) / (b c)`.
///
/// With `smoothing = Some(s)`, `s` is added to every cell first
/// (Haldane–Anscombe uses 0.5). A zero denominator → `floor`.
pub fn odds_ratio(t: &ContingencyTable, floor: f64, smoothing: Option<f64>) -> f64 {
    let t = match smoothing {
        Some(s) if s > 0.0 => t.smoothed(s),
        _ => *t,
    };
    let denominator = t.b * t.c;
    if denominator <= 0.0 {
        return floor;
    }
    finite_or(t.a * t.d / denominator, floor)
}

/// Correlation coefficient as used for query profiling:
/// `√N (ad − cb) / √((a+b)(c+d))`.
///
/// Zero denominator → 0.
pub fn correlation_coefficient(t: &ContingencyTable) -> f64 {
    let denominator = (t.with_term() * t.without_term()).sqrt();
    if denominator <= 0.0 {
        return 0.0;
    }
    finite_or(t.total().sqrt() * (t.a * t.d - t.c * t.b) / denominator, 0.0)
}

/// Relevance correlation value: `a / (√(a+b) √(a+c))`.
///
/// Zero denominator → 0.
pub fn relevance_correlation(t: &ContingencyTable) -> f64 {
    let denominator = t.with_term().sqrt() * t.positive().sqrt();
    if denominator <= 0.0 {
        return 0.0;
    }
    finite_or(t.a / denominator, 0.0)
}

/// Robertson's selection value: `a log10(ad / (bc))`.
///
/// Zero denominator, or `ad = 0` (log of zero) → 0.
pub fn robertson_selection(t: &ContingencyTable) -> f64 {
    let numerator = t.a * t.d;
    let denominator = t.b * t.c;
    if numerator <= 0.0 || denominator <= 0.0 {
        return 0.0;
    }
    finite_or(t.a * (numerator / denominator).log10(), 0.0)
}

/// Document and relevance correlation: `a² / √(a+b)`.
///
/// Zero denominator → 0.
pub fn document_relevance_correlation(t: &ContingencyTable) -> f64 {
    let denominator = t.with_term().sqrt();
    if denominator <= 0.0 {
        return 0.0;
    }
    finite_or(t.a * t.a / denominator, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;
    const FLOOR: f64 = -50.0;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    /// "smoke" in the three-record aviation corpus: in both hazard records,
    /// absent from the single normal record.
    fn smoke() -> ContingencyTable {
        ContingencyTable::new(2.0, 0.0, 0.0, 1.0)
    }

    /// A balanced table with every cell populated.
    fn mixed() -> ContingencyTable {
        ContingencyTable::new(2.0, 1.0, 1.0, 3.0)
    }

    #[test]
    fn test_from_counts() {
        let entry = ContingencyEntry {
            df_positive: 2,
            df_negative: 1,
            tf_positive: 5,
            tf_negative: 1,
        };
        let totals = CorpusTotals {
            records: 7,
            positive: 3,
            negative: 4,
            rejected: 0,
        };
        let t = ContingencyTable::from_counts(&entry, &totals);
        assert_eq!(t, mixed());
    }

    // ─── tf_idf ─────────────────────────────────────────────────────────

    #[test]
    fn test_tf_idf_values() {
        assert_close(tf_idf(2, 2, 3), 2.0 * 1.5f64.ln());
        assert_close(tf_idf(1, 1, 3), 3.0f64.ln());
    }

    #[test]
    fn test_tf_idf_term_in_every_record_is_zero() {
        assert_eq!(tf_idf(17, 5, 5), 0.0);
    }

    #[test]
    fn test_tf_idf_degenerate() {
        assert_eq!(tf_idf(3, 0, 10), 0.0);
        assert_eq!(tf_idf(3, 1, 0), 0.0);
        assert_eq!(tf_idf(0, 1, 10), 0.0);
    }

    // ─── chi_squared ────────────────────────────────────────────────────

    #[test]
    fn test_chi_squared_perfect_association() {
        // 3 * (2*1 - 0*0)^2 / (2 * 1 * 2 * 1)
        assert_close(chi_squared(&smoke()), 3.0);
    }

    #[test]
    fn test_chi_squared_absent_from_nonempty_negative_stratum() {
        // a=1, b=0, c=1, d=2: 4 * (1*2)^2 / (1 * 3 * 2 * 2) = 16 / 12
        let t = ContingencyTable::new(1.0, 0.0, 1.0, 2.0);
        let value = chi_squared(&t);
        assert!(value.is_finite());
        assert_close(value, 4.0 / 3.0);
    }

    #[test]
    fn test_chi_squared_mixed() {
        // 7 * (6 - 1)^2 / (3 * 4 * 3 * 4) = 175 / 144
        assert_close(chi_squared(&mixed()), 175.0 / 144.0);
    }

    #[test]
    fn test_chi_squared_zero_expected_cell() {
        // Term in every record: c + d = 0.
        assert_eq!(chi_squared(&ContingencyTable::new(2.0, 1.0, 0.0, 0.0)), 0.0);
        // Empty negative stratum: b + d = 0.
        assert_eq!(chi_squared(&ContingencyTable::new(1.0, 0.0, 2.0, 0.0)), 0.0);
        assert_eq!(chi_squared(&ContingencyTable::new(0.0, 0.0, 0.0, 0.0)), 0.0);
    }

    // ─── pmi ────────────────────────────────────────────────────────────

    #[test]
    fn test_pmi_values() {
        // ln(2 * 3 / (2 * 2))
        assert_close(pmi(&smoke(), FLOOR), 1.5f64.ln());
        // ln(2 * 7 / (3 * 3))
        assert_close(pmi(&mixed(), FLOOR), (14.0f64 / 9.0).ln());
    }

    #[test]
    fn test_pmi_zero_positive_df_is_floor() {
        let routine = ContingencyTable::new(0.0, 1.0, 2.0, 0.0);
        assert_eq!(pmi(&routine, FLOOR), FLOOR);
        assert_eq!(pmi(&ContingencyTable::new(0.0, 0.0, 0.0, 0.0), FLOOR), FLOOR);
    }

    // ─── log_likelihood ─────────────────────────────────────────────────

    #[test]
    fn test_log_likelihood_values() {
        // Expected: a=4/3, b=2/3, c=2/3, d=1/3; only a and d are observed.
        let expected = 2.0 * (2.0 * 1.5f64.ln() + 3.0f64.ln());
        assert_close(log_likelihood(&smoke()), expected);
    }

    #[test]
    fn test_log_likelihood_independent_is_zero() {
        let t = ContingencyTable::new(1.0, 1.0, 1.0, 1.0);
        assert_close(log_likelihood(&t), 0.0);
    }

    #[test]
    fn test_log_likelihood_zero_expected_cell() {
        assert_eq!(log_likelihood(&ContingencyTable::new(2.0, 1.0, 0.0, 0.0)), 0.0);
    }

    // ─── odds_ratio ─────────────────────────────────────────────────────

    #[test]
    fn test_odds_ratio_values() {
        // (2 * 3) / (1 * 1)
        assert_close(odds_ratio(&mixed(), 0.0, None), 6.0);
    }

    #[test]
    fn test_odds_ratio_zero_denominator_is_floor() {
        assert_eq!(odds_ratio(&smoke(), 0.0, None), 0.0);
        assert_eq!(odds_ratio(&smoke(), -1.0, None), -1.0);
    }

    #[test]
    fn test_odds_ratio_smoothing() {
        // (2.5 * 1.5) / (0.5 * 0.5)
        assert_close(odds_ratio(&smoke(), 0.0, Some(0.5)), 15.0);
        // Non-positive smoothing is ignored.
        assert_eq!(odds_ratio(&smoke(), 0.0, Some(0.0)), 0.0);
    }

    // ─── information-retrieval family ───────────────────────────────────

    #[test]
    fn test_correlation_coefficient() {
        // sqrt(3) * 2 / sqrt(2 * 1)
        assert_close(correlation_coefficient(&smoke()), 6.0f64.sqrt());
        // sqrt(7) * 5 / sqrt(3 * 4)
        assert_close(
            correlation_coefficient(&mixed()),
            7.0f64.sqrt() * 5.0 / 12.0f64.sqrt(),
        );
        assert_eq!(correlation_coefficient(&ContingencyTable::new(2.0, 1.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_correlation_coefficient_negative_association() {
        let routine = ContingencyTable::new(0.0, 1.0, 2.0, 0.0);
        // sqrt(3) * (0 - 2) / sqrt(1 * 2)
        assert_close(correlation_coefficient(&routine), -6.0f64.sqrt());
    }

    #[test]
    fn test_relevance_correlation() {
        // 2 / (sqrt(2) * sqrt(2))
        assert_close(relevance_correlation(&smoke()), 1.0);
        assert_eq!(relevance_correlation(&ContingencyTable::new(0.0, 0.0, 0.0, 4.0)), 0.0);
    }

    #[test]
    fn test_robertson_selection() {
        // 2 * log10(6 / 1)
        assert_close(robertson_selection(&mixed()), 2.0 * 6.0f64.log10());
        assert_eq!(robertson_selection(&smoke()), 0.0);
        // ad = 0 would be log10(0).
        assert_eq!(robertson_selection(&ContingencyTable::new(0.0, 1.0, 2.0, 3.0)), 0.0);
    }

    #[test]
    fn test_document_relevance_correlation() {
        // 4 / sqrt(2)
        assert_close(document_relevance_correlation(&smoke()), 4.0 / 2.0f64.sqrt());
        assert_eq!(document_relevance_correlation(&ContingencyTable::new(0.0, 0.0, 1.0, 1.0)), 0.0);
    }
}
