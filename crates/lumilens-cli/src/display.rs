//! Vertical card display for a combined analysis.
//!
//! Renders per-rule scores grouped by category, followed by the category
//! totals, in the same two-column layout the rest of the CLI uses.

use std::fmt::Write;

use lumilens_core::{CombinedAnalysis, NormalizedScore};

const MAX_LIST_ITEMS: usize = 10;
const MAX_RATIONALE_CHARS: usize = 160;

// ── Public API ──

/// Print a combined analysis as a card grouped by category.
pub fn print_analysis_card(title: &str, analysis: &CombinedAnalysis) {
    print!("{}", render_analysis_card(title, analysis));
}

pub fn render_analysis_card(title: &str, analysis: &CombinedAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {title} ===");
    let _ = writeln!(out);

    render_section(&mut out, "Admissibility (procedural rules)", &analysis.admissible_summary);
    render_section(&mut out, "Relevance (substantive rules)", &analysis.relevance_summary);

    let _ = writeln!(out, "Totals");
    let _ = writeln!(out, "  {:<26} {:.3}", "total_admissibility_score", analysis.total_admissibility);
    let _ = writeln!(out, "  {:<26} {:.3}", "total_relevance_score", analysis.total_relevance);
    out
}

// ── Section rendering ──

fn render_section(out: &mut String, header: &str, scores: &[NormalizedScore]) {
    if scores.is_empty() {
        return;
    }

    let _ = writeln!(out, "{header} ({}):", scores.len());
    let show = scores.len().min(MAX_LIST_ITEMS);
    for score in &scores[..show] {
        let _ = writeln!(out, "  [{:.3}] {}", score.score, score.rule);
        if !score.rationale.is_empty() {
            let _ = writeln!(out, "          {}", truncate(&score.rationale, MAX_RATIONALE_CHARS));
        }
    }
    if scores.len() > show {
        let _ = writeln!(out, "  ... and {} more", scores.len() - show);
    }
    let _ = writeln!(out);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}...")
    }
}
