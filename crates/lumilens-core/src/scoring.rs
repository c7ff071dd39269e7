//! Score normalisation for scored rules.
//!
//! A rule's four 0–5 dimensions collapse into one value in `[0, 1]`:
//!
//! ```text
//! normalize = (doctrinal_fit + fact_match + party_assertion + precedent_alignment) / 20
//! ```
//!
//! A category total is the arithmetic mean of its rules' normalised scores,
//! rounded to three decimal places. Totals over an empty category are an
//! [`EmptyCategoryError`], never a division by zero.

use crate::error::EmptyCategoryError;
use crate::schema::{Category, DIMENSION_MAX, Dimensions, NormalizedScore};

/// Largest possible dimension sum (4 × 5).
const SCORE_SCALE: f64 = 4.0 * DIMENSION_MAX as f64;

/// Collapse four dimensions into a single value in `[0, 1]`.
pub fn normalize(dimensions: &Dimensions) -> f64 {
    f64::from(dimensions.sum()) / SCORE_SCALE
}

/// Round to three decimal places, halves away from zero.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Mean normalised score of a category, rounded to three decimals.
pub fn category_total(
    category: Category,
    scores: &[NormalizedScore],
) -> Result<f64, EmptyCategoryError> {
    if scores.is_empty() {
        return Err(EmptyCategoryError { category });
    }
    let sum: f64 = scores.iter().map(|s| s.score).sum();
    Ok(round3(sum / scores.len() as f64))
}
