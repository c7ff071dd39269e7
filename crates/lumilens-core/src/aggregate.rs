//! Assemble per-category scored-rule summaries into the final analysis.

use crate::error::EmptyCategoryError;
use crate::schema::{
    AdmissibilityScoringOutput, Category, CombinedAnalysis, NormalizedScore,
    RelevanceScoringOutput, ScoredRule,
};
use crate::scoring::{category_total, normalize};

/// Normalise each scored rule, keeping the order the scores arrive in.
pub fn summarize<S: ScoredRule>(scores: &[S]) -> Vec<NormalizedScore> {
    scores
        .iter()
        .map(|s| NormalizedScore {
            rule: s.title().to_string(),
            score: normalize(&s.dimensions()),
            rationale: s.rationale().to_string(),
        })
        .collect()
}

/// Build the combined analysis from both scoring outputs.
///
/// Fails if either category has no scored rules.
pub fn combine(
    admissibility: &AdmissibilityScoringOutput,
    relevance: &RelevanceScoringOutput,
) -> Result<CombinedAnalysis, EmptyCategoryError> {
    let admissible_summary = summarize(&admissibility.scores);
    let relevance_summary = summarize(&relevance.scores);

    let total_admissibility = category_total(Category::Admissibility, &admissible_summary)?;
    let total_relevance = category_total(Category::Relevance, &relevance_summary)?;

    Ok(CombinedAnalysis {
        admissible_summary,
        relevance_summary,
        total_admissibility,
        total_relevance,
    })
}
