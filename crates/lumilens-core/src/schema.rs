//! Typed stage outputs for the legal-reasoning pipeline.
//!
//! Field names on the wire follow the JSON shapes the oracle is instructed to
//! produce (`specific_fact_cited`, `procedural_rule`, `effects`, ...). The Rust
//! field names are the domain names used throughout the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound (inclusive) of a single scoring dimension.
pub const DIMENSION_MAX: u8 = 5;

// ── Extraction ──

/// A factual assertion quoted from the source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Zero-based position of the fact in the source text.
    pub id: usize,
    #[serde(rename = "specific_fact_cited")]
    pub citation: String,
    pub relevancy_reason: String,
    /// Empty when the fact is clearly reliable and material.
    pub contestability_reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProceduralRule {
    /// Assigned by the pipeline in extraction order; never taken from the oracle.
    #[serde(default)]
    pub id: usize,
    #[serde(rename = "procedural_rule")]
    pub rule: String,
    #[serde(rename = "effects")]
    pub effect: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstantiveRule {
    /// Assigned by the pipeline in extraction order; never taken from the oracle.
    #[serde(default)]
    pub id: usize,
    #[serde(rename = "substantive_law")]
    pub law: String,
    pub applicability: String,
    pub relevance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsExtractionOutput {
    pub facts: Vec<Fact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProceduralRulesOutput {
    pub rules: Vec<ProceduralRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstantiveRulesOutput {
    pub rules: Vec<SubstantiveRule>,
}

/// A procedural rule named in a filtered list.
///
/// Unlike [`ProceduralRule`], the id is the oracle's echo and may be absent;
/// when present it identifies the rule and the title is informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,
    #[serde(rename = "procedural_rule", default)]
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinedRulesOutput {
    pub rules: Vec<ListedRule>,
}

/// Result of the combined extraction: the three stage-1 outputs side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactsAndRulesOutput {
    pub facts: FactsExtractionOutput,
    pub procedural_rules: ProceduralRulesOutput,
    pub substantive_rules: SubstantiveRulesOutput,
}

// ── Scoring ──

/// The four raw 0–5 judgements attached to every scored rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub doctrinal_fit: u8,
    pub fact_match: u8,
    pub party_assertion: u8,
    pub precedent_alignment: u8,
}

impl Dimensions {
    pub fn new(
        doctrinal_fit: u8,
        fact_match: u8,
        party_assertion: u8,
        precedent_alignment: u8,
    ) -> Self {
        Self {
            doctrinal_fit,
            fact_match,
            party_assertion,
            precedent_alignment,
        }
    }

    pub fn sum(&self) -> u32 {
        self.as_array().iter().map(|&d| u32::from(d)).sum()
    }

    /// Name and value of the first dimension above [`DIMENSION_MAX`], if any.
    pub fn out_of_range(&self) -> Option<(&'static str, u8)> {
        const NAMES: [&str; 4] = [
            "doctrinal_fit",
            "fact_match",
            "party_assertion",
            "precedent_alignment",
        ];
        NAMES
            .into_iter()
            .zip(self.as_array())
            .find(|&(_, v)| v > DIMENSION_MAX)
    }

    fn as_array(&self) -> [u8; 4] {
        [
            self.doctrinal_fit,
            self.fact_match,
            self.party_assertion,
            self.precedent_alignment,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProceduralRuleScore {
    /// Echo of [`ProceduralRule::id`]; optional because the oracle may drop it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<usize>,
    pub procedural_rule: String,
    pub doctrinal_fit: u8,
    pub fact_match: u8,
    pub party_assertion: u8,
    pub precedent_alignment: u8,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstantiveRuleScore {
    /// Echo of [`SubstantiveRule::id`]; optional because the oracle may drop it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<usize>,
    pub substantive_law: String,
    pub doctrinal_fit: u8,
    pub fact_match: u8,
    pub party_assertion: u8,
    pub precedent_alignment: u8,
    pub rationale: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissibilityScoringOutput {
    pub scores: Vec<ProceduralRuleScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceScoringOutput {
    pub scores: Vec<SubstantiveRuleScore>,
}

/// Everything the admissibility scorer sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissibilityScoringInput {
    pub facts: FactsExtractionOutput,
    pub procedural_rules: ProceduralRulesOutput,
    pub qa: String,
}

/// Everything the relevance scorer sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelevanceScoringInput {
    pub facts: FactsExtractionOutput,
    pub substantive_rules: SubstantiveRulesOutput,
    pub qa: String,
}

// ── Aggregation ──

/// A rule with its four dimensions collapsed into one 0.0–1.0 value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedScore {
    pub rule: String,
    #[serde(rename = "rule_score")]
    pub score: f64,
    pub rationale: String,
}

/// Final output of the full scoring pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedAnalysis {
    #[serde(rename = "admissible_rules_summary")]
    pub admissible_summary: Vec<NormalizedScore>,
    #[serde(rename = "relevance_rules_summary")]
    pub relevance_summary: Vec<NormalizedScore>,
    #[serde(rename = "total_admissibility_score")]
    pub total_admissibility: f64,
    #[serde(rename = "total_relevance_score")]
    pub total_relevance: f64,
}

/// The two scored rule categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Procedural rules, scored for admissibility.
    Admissibility,
    /// Substantive rules, scored for relevance.
    Relevance,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admissibility => "admissibility",
            Self::Relevance => "relevance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Shared rule accessors ──

/// An extracted rule that can be scored.
pub trait ExtractedRule {
    fn id(&self) -> usize;
    fn set_id(&mut self, id: usize);
    fn title(&self) -> &str;
}

impl ExtractedRule for ProceduralRule {
    fn id(&self) -> usize {
        self.id
    }
    fn set_id(&mut self, id: usize) {
        self.id = id;
    }
    fn title(&self) -> &str {
        &self.rule
    }
}

impl ExtractedRule for SubstantiveRule {
    fn id(&self) -> usize {
        self.id
    }
    fn set_id(&mut self, id: usize) {
        self.id = id;
    }
    fn title(&self) -> &str {
        &self.law
    }
}

/// A per-rule score as returned by one of the scoring stages.
pub trait ScoredRule {
    fn rule_id(&self) -> Option<usize>;
    /// Bind the score to an extracted rule: stable id plus canonical title.
    fn bind(&mut self, id: usize, title: &str);
    fn title(&self) -> &str;
    fn dimensions(&self) -> Dimensions;
    fn rationale(&self) -> &str;
}

impl ScoredRule for ProceduralRuleScore {
    fn rule_id(&self) -> Option<usize> {
        self.rule_id
    }
    fn bind(&mut self, id: usize, title: &str) {
        self.rule_id = Some(id);
        self.procedural_rule = title.to_string();
    }
    fn title(&self) -> &str {
        &self.procedural_rule
    }
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(
            self.doctrinal_fit,
            self.fact_match,
            self.party_assertion,
            self.precedent_alignment,
        )
    }
    fn rationale(&self) -> &str {
        &self.rationale
    }
}

impl ScoredRule for SubstantiveRuleScore {
    fn rule_id(&self) -> Option<usize> {
        self.rule_id
    }
    fn bind(&mut self, id: usize, title: &str) {
        self.rule_id = Some(id);
        self.substantive_law = title.to_string();
    }
    fn title(&self) -> &str {
        &self.substantive_law
    }
    fn dimensions(&self) -> Dimensions {
        Dimensions::new(
            self.doctrinal_fit,
            self.fact_match,
            self.party_assertion,
            self.precedent_alignment,
        )
    }
    fn rationale(&self) -> &str {
        &self.rationale
    }
}
