//! # Proportion Analyzer
//!
//! Scores how closely the ratio of two magnitudes matches the golden ratio.
//!
//! ## Scoring
//!
//! - `ratio = max(a, b) / min(a, b)`, so the result is order independent and `>= 1`
//! - `variance = (ratio - φ) / φ * 100`, signed percent deviation from φ
//! - `score = clamp(round(100 - |variance| * 2), 0, 100)`
//!
//! `ratio` is reported to 3 decimals and `variance` to 2 decimals. The score
//! is derived from the unrounded variance.
//!
//! Degenerate input (absent, zero, negative or non-finite) never divides: it
//! yields the maximal-penalty sentinel `{ratio: 0, variance: 100, score: 0}`.

use serde::{Deserialize, Serialize};

/// φ, the target aesthetic proportion.
pub const GOLDEN_RATIO: f64 = 1.618_033_988_75;

/// φ rounded to 3 decimals, reported as `target` in every result.
pub const TARGET_RATIO: f64 = 1.618;

/// Outcome of one proportion scan. Immutable once produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProportionResult {
    /// `max / min` rounded to 3 decimals, or 0 for degenerate input.
    pub ratio: f64,
    /// Signed percent deviation from φ rounded to 2 decimals.
    pub variance: f64,
    /// Harmony score in `0..=100`.
    pub score: u8,
    /// Always [`TARGET_RATIO`].
    pub target: f64,
}

impl ProportionResult {
    /// Maximal-penalty result returned for degenerate input.
    pub const SENTINEL: ProportionResult = ProportionResult {
        ratio: 0.0,
        variance: 100.0,
        score: 0,
        target: TARGET_RATIO,
    };

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }
}

/// Height and width pair fed into the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub height: f64,
    pub width: f64,
}

impl Dimensions {
    /// Resolves user-supplied measurements against the image's pixel extent.
    ///
    /// A user field that is absent, non-positive or non-finite is replaced by
    /// the pixel extent on the same axis. Without a readable pixel extent the
    /// axis resolves to 0, which the analyzer turns into the sentinel result.
    pub fn resolve(height: Option<f64>, width: Option<f64>, pixels: Option<(u32, u32)>) -> Self {
        let (px_w, px_h) = pixels.map_or((0.0, 0.0), |(w, h)| (w as f64, h as f64));
        Self {
            height: usable(height).unwrap_or(px_h),
            width: usable(width).unwrap_or(px_w),
        }
    }

    pub fn analyze(&self) -> ProportionResult {
        analyze(Some(self.height), Some(self.width))
    }
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Scores the proportion between `a` and `b` against φ.
///
/// Pure and total: every input produces a result.
///
/// # Examples
///
/// ```rust
/// use golden_harmony::analysis::analyze;
///
/// let result = analyze(Some(190.0), Some(117.43));
/// assert_eq!(result.score, 100);
/// assert_eq!(result.target, 1.618);
/// ```
pub fn analyze(a: Option<f64>, b: Option<f64>) -> ProportionResult {
    let (a, b) = match (usable(a), usable(b)) {
        (Some(a), Some(b)) => (a, b),
        _ => return ProportionResult::SENTINEL,
    };

    let ratio = a.max(b) / a.min(b);
    let variance = (ratio - GOLDEN_RATIO) / GOLDEN_RATIO * 100.0;
    let score = (100.0 - variance.abs() * 2.0).round().clamp(0.0, 100.0) as u8;

    ProportionResult {
        ratio: round_to(ratio, 3),
        variance: round_to(variance, 2),
        score,
        target: TARGET_RATIO,
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independence() {
        let pairs = [(3.0, 5.0), (1.0, 1.618), (640.0, 480.0), (0.25, 19.5)];
        for (a, b) in pairs {
            assert_eq!(analyze(Some(a), Some(b)), analyze(Some(b), Some(a)));
        }
    }

    #[test]
    fn test_square_scores_by_formula() {
        let result = analyze(Some(42.0), Some(42.0));
        assert_eq!(result.ratio, 1.0);
        assert_eq!(result.variance, -38.2);
        // 100 - 38.197 * 2 = 23.6
        assert_eq!(result.score, 24);
        assert_eq!(result.target, 1.618);
    }

    #[test]
    fn test_degenerate_inputs_return_sentinel() {
        let cases = [
            (None, Some(10.0)),
            (Some(10.0), None),
            (Some(0.0), Some(10.0)),
            (Some(10.0), Some(-3.0)),
            (Some(f64::NAN), Some(10.0)),
            (Some(f64::INFINITY), Some(10.0)),
            (None, None),
        ];
        for (a, b) in cases {
            let result = analyze(a, b);
            assert_eq!(result, ProportionResult::SENTINEL, "input {:?}", (a, b));
            assert_eq!(result.ratio, 0.0);
            assert_eq!(result.variance, 100.0);
            assert_eq!(result.score, 0);
            assert_eq!(result.target, 1.618);
        }
    }

    #[test]
    fn test_near_golden_scores_full_marks() {
        let result = analyze(Some(190.0), Some(117.43));
        assert_eq!(result.ratio, 1.618);
        assert!(result.variance.abs() < 0.01);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_variance_sign_follows_ratio() {
        assert!(analyze(Some(2.0), Some(1.0)).variance > 0.0);
        assert!(analyze(Some(1.5), Some(1.0)).variance < 0.0);
    }

    #[test]
    fn test_score_is_monotone_and_clamped() {
        let mut previous_deviation = -1.0;
        let mut previous_score = 101u16;
        // Sweep ratios upward from φ so |variance| grows monotonically.
        for step in 0..400 {
            let ratio = GOLDEN_RATIO + step as f64 * 0.01;
            let result = analyze(Some(ratio), Some(1.0));
            assert!(result.score <= 100);
            assert!(result.variance.abs() >= previous_deviation);
            assert!(result.score as u16 <= previous_score);
            previous_deviation = result.variance.abs();
            previous_score = result.score as u16;
        }
        assert_eq!(previous_score, 0);
    }

    #[test]
    fn test_dimensions_fall_back_to_pixels() {
        let dims = Dimensions::resolve(None, Some(30.0), Some((800, 600)));
        assert_eq!(dims, Dimensions { height: 600.0, width: 30.0 });

        let dims = Dimensions::resolve(Some(0.0), None, Some((800, 600)));
        assert_eq!(dims, Dimensions { height: 600.0, width: 800.0 });

        let dims = Dimensions::resolve(Some(21.0), Some(34.0), None);
        assert_eq!(dims, Dimensions { height: 21.0, width: 34.0 });
    }

    #[test]
    fn test_unreadable_pixels_produce_sentinel() {
        let dims = Dimensions::resolve(None, None, None);
        assert!(dims.analyze().is_sentinel());
    }
}
