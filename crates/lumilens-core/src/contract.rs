//! Output contracts: turn untrusted oracle text into typed, validated values.
//!
//! Every stage output implements [`Contract`]. Parsing is two steps: serde
//! enforces the shape (field names, integer types), then [`Contract::validate`]
//! enforces the invariants serde cannot express (id ordering, score ranges).
//!
//! Scores are correlated back to extracted rules by [`align_scores`], which
//! prefers the stable `rule_id` echoed by the oracle and falls back to a
//! normalised title match.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::{
    AdmissibilityScoringOutput, ExtractedRule, FactsExtractionOutput, ListedRule,
    ProceduralRulesOutput, RefinedRulesOutput, RelevanceScoringOutput, ScoredRule,
    SubstantiveRulesOutput,
};

const EXCERPT_CHARS: usize = 200;

/// A declared output shape plus the invariants its values must satisfy.
pub trait Contract: DeserializeOwned {
    /// Schema name used in error messages.
    const NAME: &'static str;

    fn validate(&self) -> Result<(), SchemaError>;
}

/// Parse raw oracle text against contract `T`.
///
/// Accepts a bare JSON object or one wrapped in a markdown fence or
/// surrounding prose; anything else is a [`SchemaError`].
pub fn parse_contract<T: Contract>(raw: &str) -> Result<T, SchemaError> {
    let Some(json) = json_object(raw) else {
        return Err(SchemaError::NoJson {
            schema: T::NAME,
            excerpt: excerpt(raw),
        });
    };

    let value: T = serde_json::from_str(json).map_err(|source| SchemaError::Json {
        schema: T::NAME,
        source,
        excerpt: excerpt(raw),
    })?;
    value.validate()?;
    Ok(value)
}

/// Slice from the first `{` to the last `}`.
fn json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

fn excerpt(raw: &str) -> String {
    raw.chars().take(EXCERPT_CHARS).collect()
}

// ── Contracts ──

impl Contract for FactsExtractionOutput {
    const NAME: &'static str = "FactsExtractionOutput";

    fn validate(&self) -> Result<(), SchemaError> {
        for (position, fact) in self.facts.iter().enumerate() {
            if fact.id != position {
                return Err(SchemaError::invalid(
                    Self::NAME,
                    format!(
                        "fact ids must run 0..{} in source order; position {position} has id {}",
                        self.facts.len(),
                        fact.id
                    ),
                ));
            }
            if fact.citation.trim().is_empty() {
                return Err(SchemaError::invalid(
                    Self::NAME,
                    format!("fact {position} has an empty citation"),
                ));
            }
        }
        Ok(())
    }
}

impl Contract for ProceduralRulesOutput {
    const NAME: &'static str = "ProceduralRulesOutput";

    fn validate(&self) -> Result<(), SchemaError> {
        require_titles(Self::NAME, &self.rules)
    }
}

impl Contract for SubstantiveRulesOutput {
    const NAME: &'static str = "SubstantiveRulesOutput";

    fn validate(&self) -> Result<(), SchemaError> {
        require_titles(Self::NAME, &self.rules)
    }
}

impl Contract for RefinedRulesOutput {
    const NAME: &'static str = "RefinedRulesOutput";

    fn validate(&self) -> Result<(), SchemaError> {
        match self
            .rules
            .iter()
            .position(|r| r.id.is_none() && r.title.trim().is_empty())
        {
            Some(position) => Err(SchemaError::invalid(
                Self::NAME,
                format!("entry {position} has neither an id nor a title"),
            )),
            None => Ok(()),
        }
    }
}

impl Contract for AdmissibilityScoringOutput {
    const NAME: &'static str = "AdmissibilityScoringOutput";

    fn validate(&self) -> Result<(), SchemaError> {
        require_dimension_ranges(Self::NAME, &self.scores)
    }
}

impl Contract for RelevanceScoringOutput {
    const NAME: &'static str = "RelevanceScoringOutput";

    fn validate(&self) -> Result<(), SchemaError> {
        require_dimension_ranges(Self::NAME, &self.scores)
    }
}

fn require_titles<R: ExtractedRule>(schema: &'static str, rules: &[R]) -> Result<(), SchemaError> {
    match rules.iter().position(|r| r.title().trim().is_empty()) {
        Some(position) => Err(SchemaError::invalid(
            schema,
            format!("rule {position} has an empty title"),
        )),
        None => Ok(()),
    }
}

fn require_dimension_ranges<S: ScoredRule>(
    schema: &'static str,
    scores: &[S],
) -> Result<(), SchemaError> {
    for score in scores {
        if let Some((name, value)) = score.dimensions().out_of_range() {
            return Err(SchemaError::invalid(
                schema,
                format!("{name} = {value} for {:?} is outside 0..=5", score.title()),
            ));
        }
    }
    Ok(())
}

// ── Rule identity ──

/// Renumber rules zero-based in their current (extraction) order.
pub fn assign_rule_ids<R: ExtractedRule>(rules: &mut [R]) {
    for (position, rule) in rules.iter_mut().enumerate() {
        rule.set_id(position);
    }
}

/// Correlate oracle scores with the rules they score.
///
/// Returns exactly one score per rule, in the order of `rules`, each bound to
/// the rule's id and canonical title. Scores carrying a `rule_id` are placed
/// first; the rest are then matched by normalised title against the rules
/// still unscored, in order. Unknown ids, unmatched titles, duplicate scores,
/// and rules left without a score are contract violations.
pub fn align_scores<R, S>(
    schema: &'static str,
    rules: &[R],
    scores: Vec<S>,
) -> Result<Vec<S>, SchemaError>
where
    R: ExtractedRule,
    S: ScoredRule,
{
    let by_id = positions_by_id(rules);
    let mut slots: Vec<Option<S>> = rules.iter().map(|_| None).collect();
    let (with_id, without_id): (Vec<S>, Vec<S>) =
        scores.into_iter().partition(|s| s.rule_id().is_some());

    for score in with_id {
        let Some(id) = score.rule_id() else { continue };
        let position = *by_id.get(&id).ok_or_else(|| {
            SchemaError::invalid(schema, format!("score references unknown rule id {id}"))
        })?;
        if slots[position].is_some() {
            return Err(SchemaError::invalid(
                schema,
                format!("rule {id} scored more than once"),
            ));
        }
        slots[position] = Some(score);
    }

    for score in without_id {
        let key = title_key(score.title());
        let found =
            (0..rules.len()).find(|&p| slots[p].is_none() && title_key(rules[p].title()) == key);
        debug!(title = score.title(), matched = found.is_some(), "score without rule id, matching by title");
        let position = found.ok_or_else(|| {
            SchemaError::invalid(
                schema,
                format!("score for {:?} matches no unscored rule", score.title()),
            )
        })?;
        slots[position] = Some(score);
    }

    slots
        .into_iter()
        .zip(rules)
        .map(|(slot, rule)| {
            let mut score = slot.ok_or_else(|| {
                SchemaError::invalid(
                    schema,
                    format!("no score returned for rule {} ({:?})", rule.id(), rule.title()),
                )
            })?;
            score.bind(rule.id(), rule.title());
            Ok(score)
        })
        .collect()
}

/// Keep the rules of `original` named in `kept`, in original order and with
/// their original text, renumbered from zero.
///
/// Used when the oracle filters a list: it may only drop entries. An entry
/// is matched by its echoed id when present, otherwise by normalised title
/// against the rules not yet kept. Unknown ids, repeated ids, and titles
/// without a counterpart in `original` are violations.
pub fn retain_listed<R>(
    schema: &'static str,
    original: &[R],
    kept: &[ListedRule],
) -> Result<Vec<R>, SchemaError>
where
    R: ExtractedRule + Clone,
{
    let by_id = positions_by_id(original);
    let mut retained = vec![false; original.len()];

    for id in kept.iter().filter_map(|entry| entry.id) {
        let position = *by_id.get(&id).ok_or_else(|| {
            SchemaError::invalid(schema, format!("filtered list references unknown rule id {id}"))
        })?;
        if retained[position] {
            return Err(SchemaError::invalid(
                schema,
                format!("filtered list names rule {id} more than once"),
            ));
        }
        retained[position] = true;
    }

    for entry in kept.iter().filter(|entry| entry.id.is_none()) {
        let key = title_key(&entry.title);
        let position = (0..original.len())
            .find(|&p| !retained[p] && title_key(original[p].title()) == key)
            .ok_or_else(|| {
                SchemaError::invalid(
                    schema,
                    format!("filtered list introduced rule {:?} not in the input", entry.title),
                )
            })?;
        retained[position] = true;
    }

    let mut rules: Vec<R> = original
        .iter()
        .zip(&retained)
        .filter(|&(_, &keep)| keep)
        .map(|(rule, _)| rule.clone())
        .collect();
    assign_rule_ids(&mut rules);
    Ok(rules)
}

fn positions_by_id<R: ExtractedRule>(rules: &[R]) -> HashMap<usize, usize> {
    rules
        .iter()
        .enumerate()
        .map(|(position, rule)| (rule.id(), position))
        .collect()
}

/// Case-, whitespace- and trailing-punctuation-insensitive title key.
fn title_key(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches(['.', ';', ':'])
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ProceduralRule, ProceduralRuleScore};

    fn rule(id: usize, title: &str) -> ProceduralRule {
        ProceduralRule {
            id,
            rule: title.into(),
            effect: "effect".into(),
        }
    }

    fn score(rule_id: Option<usize>, title: &str, fit: u8) -> ProceduralRuleScore {
        ProceduralRuleScore {
            rule_id,
            procedural_rule: title.into(),
            doctrinal_fit: fit,
            fact_match: 0,
            party_assertion: 0,
            precedent_alignment: 0,
            rationale: "because".into(),
        }
    }

    // ── Parsing ──

    #[test]
    fn parses_bare_json() {
        let raw = r#"{"rules": [{"procedural_rule": "Claim certification", "effects": "Required for jurisdiction"}]}"#;
        let out: ProceduralRulesOutput = parse_contract(raw).unwrap();
        assert_eq!(out.rules.len(), 1);
        assert_eq!(out.rules[0].rule, "Claim certification");
    }

    #[test]
    fn parses_fenced_json_with_prose() {
        let raw = "Here is the result:\n```json\n{\"facts\": [{\"id\": 0, \"specific_fact_cited\": \"QTI submitted a claim.\", \"relevancy_reason\": \"r\", \"contestability_reason\": \"\"}]}\n```\n";
        let out: FactsExtractionOutput = parse_contract(raw).unwrap();
        assert_eq!(out.facts[0].citation, "QTI submitted a claim.");
    }

    #[test]
    fn text_without_json_is_rejected() {
        let err = parse_contract::<ProceduralRulesOutput>("I could not find any rules.").unwrap_err();
        assert!(matches!(err, SchemaError::NoJson { schema: "ProceduralRulesOutput", .. }));
    }

    #[test]
    fn missing_field_is_rejected() {
        let err = parse_contract::<ProceduralRulesOutput>(r#"{"rules": [{"procedural_rule": "x"}]}"#)
            .unwrap_err();
        assert!(matches!(err, SchemaError::Json { .. }));
        assert_eq!(err.schema(), "ProceduralRulesOutput");
    }

    #[test]
    fn long_excerpt_is_truncated_on_char_boundary() {
        let raw = "é".repeat(500);
        let err = parse_contract::<ProceduralRulesOutput>(&raw).unwrap_err();
        match err {
            SchemaError::NoJson { excerpt, .. } => assert_eq!(excerpt.chars().count(), 200),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fact_ids_must_follow_source_order() {
        let raw = r#"{"facts": [
            {"id": 1, "specific_fact_cited": "a", "relevancy_reason": "r", "contestability_reason": ""},
            {"id": 2, "specific_fact_cited": "b", "relevancy_reason": "r", "contestability_reason": ""}
        ]}"#;
        let err = parse_contract::<FactsExtractionOutput>(raw).unwrap_err();
        assert!(err.to_string().contains("position 0 has id 1"), "{err}");
    }

    #[test]
    fn fact_ids_zero_based_are_accepted() {
        let raw = r#"{"facts": [
            {"id": 0, "specific_fact_cited": "a", "relevancy_reason": "r", "contestability_reason": ""},
            {"id": 1, "specific_fact_cited": "b", "relevancy_reason": "r", "contestability_reason": "disputed"}
        ]}"#;
        let out = parse_contract::<FactsExtractionOutput>(raw).unwrap();
        let ids: Vec<usize> = out.facts.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn empty_rule_title_is_rejected() {
        let raw = r#"{"rules": [{"substantive_law": "  ", "applicability": "a", "relevance": "r"}]}"#;
        assert!(parse_contract::<SubstantiveRulesOutput>(raw).is_err());
    }

    #[test]
    fn dimension_above_five_is_rejected() {
        let raw = r#"{"scores": [{"procedural_rule": "x", "doctrinal_fit": 7, "fact_match": 1,
            "party_assertion": 1, "precedent_alignment": 1, "rationale": "r"}]}"#;
        let err = parse_contract::<AdmissibilityScoringOutput>(raw).unwrap_err();
        assert!(err.to_string().contains("doctrinal_fit = 7"), "{err}");
    }

    #[test]
    fn empty_lists_are_valid() {
        let out: RelevanceScoringOutput = parse_contract(r#"{"scores": []}"#).unwrap();
        assert!(out.scores.is_empty());
    }

    // ── Alignment ──

    #[test]
    fn assign_rule_ids_numbers_in_order() {
        let mut rules = vec![rule(7, "a"), rule(7, "b"), rule(7, "c")];
        assign_rule_ids(&mut rules);
        let ids: Vec<usize> = rules.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn align_by_id_restores_extraction_order() {
        let rules = vec![rule(0, "Certification"), rule(1, "Six-year deadline")];
        let scores = vec![score(Some(1), "deadline", 2), score(Some(0), "cert", 5)];
        let aligned = align_scores("test", &rules, scores).unwrap();
        assert_eq!(aligned[0].procedural_rule, "Certification");
        assert_eq!(aligned[0].doctrinal_fit, 5);
        assert_eq!(aligned[1].procedural_rule, "Six-year deadline");
        assert_eq!(aligned[1].rule_id, Some(1));
    }

    #[test]
    fn align_by_title_ignores_case_and_spacing() {
        let rules = vec![rule(0, "Claim  Certification."), rule(1, "Final decision")];
        let scores = vec![score(None, "final decision", 3), score(None, "claim certification", 4)];
        let aligned = align_scores("test", &rules, scores).unwrap();
        assert_eq!(aligned[0].rule_id, Some(0));
        assert_eq!(aligned[0].doctrinal_fit, 4);
        assert_eq!(aligned[1].doctrinal_fit, 3);
    }

    #[test]
    fn duplicate_titles_fill_in_order() {
        let rules = vec![rule(0, "Notice"), rule(1, "Notice")];
        let scores = vec![score(None, "Notice", 1), score(None, "Notice", 2)];
        let aligned = align_scores("test", &rules, scores).unwrap();
        assert_eq!(aligned[0].doctrinal_fit, 1);
        assert_eq!(aligned[1].doctrinal_fit, 2);
    }

    #[test]
    fn paraphrased_title_without_id_is_rejected() {
        let rules = vec![rule(0, "Claim certification requirement")];
        let err = align_scores("test", &rules, vec![score(None, "Certifying claims", 3)]).unwrap_err();
        assert!(err.to_string().contains("matches no unscored rule"), "{err}");
    }

    #[test]
    fn unknown_rule_id_is_rejected() {
        let rules = vec![rule(0, "a")];
        let err = align_scores("test", &rules, vec![score(Some(4), "a", 3)]).unwrap_err();
        assert!(err.to_string().contains("unknown rule id 4"), "{err}");
    }

    #[test]
    fn duplicate_score_is_rejected() {
        let rules = vec![rule(0, "a"), rule(1, "b")];
        let scores = vec![score(Some(0), "a", 3), score(Some(0), "a", 4)];
        let err = align_scores("test", &rules, scores).unwrap_err();
        assert!(err.to_string().contains("scored more than once"), "{err}");
    }

    #[test]
    fn ids_are_placed_before_title_matches() {
        let rules = vec![rule(0, "Notice"), rule(1, "Notice")];
        let scores = vec![score(None, "Notice", 1), score(Some(0), "Notice", 4)];
        let aligned = align_scores("test", &rules, scores).unwrap();
        assert_eq!(aligned[0].doctrinal_fit, 4);
        assert_eq!(aligned[1].doctrinal_fit, 1);
        assert_eq!(aligned[1].rule_id, Some(1));
    }

    fn listed(id: Option<usize>, title: &str) -> ListedRule {
        ListedRule {
            id,
            title: title.into(),
        }
    }

    #[test]
    fn retain_listed_keeps_original_order_and_text() {
        let original = vec![
            rule(0, "Claim certification"),
            rule(1, "Eichleay formula"),
            rule(2, "Final decision deadline"),
        ];
        let kept = vec![listed(None, "final decision deadline"), listed(None, "Claim certification")];
        let retained = retain_listed("test", &original, &kept).unwrap();

        let titles: Vec<&str> = retained.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(titles, vec!["Claim certification", "Final decision deadline"]);
        let ids: Vec<usize> = retained.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn retain_listed_rejects_invented_rules() {
        let original = vec![rule(0, "Claim certification")];
        let kept = vec![listed(None, "Sum certain requirement")];
        let err = retain_listed("test", &original, &kept).unwrap_err();
        assert!(err.to_string().contains("not in the input"), "{err}");
    }

    #[test]
    fn retain_listed_trusts_echoed_id_over_reworded_title() {
        let original = vec![rule(0, "Claim certification"), rule(1, "Eichleay formula")];
        let kept = vec![listed(Some(0), "Claim certification requirement")];
        let retained = retain_listed("test", &original, &kept).unwrap();
        assert_eq!(retained.len(), 1);
        assert_eq!(retained[0].rule, "Claim certification");
        assert_eq!(retained[0].id, 0);
    }

    #[test]
    fn retain_listed_mixes_ids_and_titles() {
        let original = vec![rule(0, "Notice"), rule(1, "Notice"), rule(2, "Eichleay formula")];
        let kept = vec![listed(None, "notice"), listed(Some(0), "Notice")];
        let retained = retain_listed("test", &original, &kept).unwrap();
        let titles: Vec<&str> = retained.iter().map(|r| r.rule.as_str()).collect();
        assert_eq!(titles, vec!["Notice", "Notice"]);
    }

    #[test]
    fn retain_listed_rejects_unknown_and_repeated_ids() {
        let original = vec![rule(0, "Claim certification")];
        let err = retain_listed("test", &original, &[listed(Some(3), "x")]).unwrap_err();
        assert!(err.to_string().contains("unknown rule id 3"), "{err}");

        let kept = vec![listed(Some(0), "a"), listed(Some(0), "b")];
        let err = retain_listed("test", &original, &kept).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");
    }

    #[test]
    fn refined_list_requires_id_or_title() {
        let out: RefinedRulesOutput = parse_contract(r#"{"rules": [{"id": 1}]}"#).unwrap();
        assert_eq!(out.rules[0].id, Some(1));
        assert!(parse_contract::<RefinedRulesOutput>(r#"{"rules": [{"effects": "x"}]}"#).is_err());
    }

    #[test]
    fn missing_score_is_rejected() {
        let rules = vec![rule(0, "a"), rule(1, "b")];
        let err = align_scores("test", &rules, vec![score(Some(0), "a", 3)]).unwrap_err();
        assert!(err.to_string().contains("no score returned for rule 1"), "{err}");
    }
}
