//! Pipeline stages: one fixed instruction, bound inputs, one typed output.
//!
//! A stage value carries borrowed references to its inputs, so building one is
//! free and the same document text can feed several stages concurrently.

use std::fmt;

use lumilens_core::{
    AdmissibilityScoringInput, AdmissibilityScoringOutput, Contract, FactsExtractionOutput,
    ProceduralRulesOutput, RefinedRulesOutput, RelevanceScoringInput, RelevanceScoringOutput,
    SchemaError,
    SubstantiveRulesOutput, align_scores, assign_rule_ids, parse_contract, retain_listed,
};
use serde::Serialize;

use crate::prompts;

/// Identity of a pipeline node, reported in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    PreAppealRedaction,
    ReasoningQa,
    Facts,
    ProceduralRules,
    SubstantiveRules,
    ProceduralRefinement,
    AdmissibilityScoring,
    RelevanceScoring,
    Aggregation,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreAppealRedaction => "pre_appeal_redaction",
            Self::ReasoningQa => "reasoning_qa",
            Self::Facts => "facts",
            Self::ProceduralRules => "procedural_rules",
            Self::SubstantiveRules => "substantive_rules",
            Self::ProceduralRefinement => "procedural_refinement",
            Self::AdmissibilityScoring => "admissibility_scoring",
            Self::RelevanceScoring => "relevance_scoring",
            Self::Aggregation => "aggregation",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prompted transformation.
pub trait Stage: Sync {
    type Output: Send;

    fn id(&self) -> StageId;

    /// Fixed system instruction.
    fn instruction(&self) -> &'static str;

    /// Bind the stage's inputs into the user message.
    fn render(&self) -> String;

    /// Whether the reply must be a JSON object.
    fn expects_json(&self) -> bool {
        true
    }

    /// Validate raw oracle text into the stage's output.
    fn parse(&self, raw: &str) -> Result<Self::Output, SchemaError>;
}

/// Raw document text plus the reasoning Q&A derived from it.
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    pub text: &'a str,
    pub qa: &'a str,
}

impl DocumentContext<'_> {
    fn render(&self) -> String {
        format!(
            "DOCUMENT TEXT:\n{}\n\nLEGAL REASONING Q&A:\n{}",
            self.text, self.qa
        )
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unserialisable: {e}>"))
}

fn free_text(schema: &'static str, raw: &str) -> Result<String, SchemaError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(SchemaError::invalid(schema, "empty reply"));
    }
    Ok(text.to_string())
}

// ── Free-text stages ──

/// Strip post-appeal reasoning and dispositions from a decision.
pub struct PreAppealRedaction<'a> {
    pub text: &'a str,
}

impl Stage for PreAppealRedaction<'_> {
    type Output = String;

    fn id(&self) -> StageId {
        StageId::PreAppealRedaction
    }
    fn instruction(&self) -> &'static str {
        prompts::PRE_APPEAL_REDACTION
    }
    fn render(&self) -> String {
        format!("DOCUMENT TEXT:\n{}", self.text)
    }
    fn expects_json(&self) -> bool {
        false
    }
    fn parse(&self, raw: &str) -> Result<String, SchemaError> {
        free_text("PreAppealDocument", raw)
    }
}

/// Stage 0: the structured reasoning Q&A shared by every later stage.
pub struct ReasoningQa<'a> {
    pub text: &'a str,
}

impl Stage for ReasoningQa<'_> {
    type Output = String;

    fn id(&self) -> StageId {
        StageId::ReasoningQa
    }
    fn instruction(&self) -> &'static str {
        prompts::REASONING_QA
    }
    fn render(&self) -> String {
        self.text.to_string()
    }
    fn expects_json(&self) -> bool {
        false
    }
    fn parse(&self, raw: &str) -> Result<String, SchemaError> {
        free_text("ReasoningQa", raw)
    }
}

// ── Extraction ──

pub struct FactsExtraction<'a> {
    pub context: DocumentContext<'a>,
}

impl Stage for FactsExtraction<'_> {
    type Output = FactsExtractionOutput;

    fn id(&self) -> StageId {
        StageId::Facts
    }
    fn instruction(&self) -> &'static str {
        prompts::FACTS_EXTRACTION
    }
    fn render(&self) -> String {
        self.context.render()
    }
    fn parse(&self, raw: &str) -> Result<FactsExtractionOutput, SchemaError> {
        parse_contract(raw)
    }
}

pub struct ProceduralRulesExtraction<'a> {
    pub context: DocumentContext<'a>,
}

impl Stage for ProceduralRulesExtraction<'_> {
    type Output = ProceduralRulesOutput;

    fn id(&self) -> StageId {
        StageId::ProceduralRules
    }
    fn instruction(&self) -> &'static str {
        prompts::PROCEDURAL_RULES_EXTRACTION
    }
    fn render(&self) -> String {
        self.context.render()
    }
    fn parse(&self, raw: &str) -> Result<ProceduralRulesOutput, SchemaError> {
        let mut output: ProceduralRulesOutput = parse_contract(raw)?;
        assign_rule_ids(&mut output.rules);
        Ok(output)
    }
}

pub struct SubstantiveRulesExtraction<'a> {
    pub context: DocumentContext<'a>,
}

impl Stage for SubstantiveRulesExtraction<'_> {
    type Output = SubstantiveRulesOutput;

    fn id(&self) -> StageId {
        StageId::SubstantiveRules
    }
    fn instruction(&self) -> &'static str {
        prompts::SUBSTANTIVE_RULES_EXTRACTION
    }
    fn render(&self) -> String {
        self.context.render()
    }
    fn parse(&self, raw: &str) -> Result<SubstantiveRulesOutput, SchemaError> {
        let mut output: SubstantiveRulesOutput = parse_contract(raw)?;
        assign_rule_ids(&mut output.rules);
        Ok(output)
    }
}

/// Stage 1.5: drop substantive rules that leaked into the procedural list.
pub struct ProceduralRefinement<'a> {
    pub rules: &'a ProceduralRulesOutput,
}

impl Stage for ProceduralRefinement<'_> {
    type Output = ProceduralRulesOutput;

    fn id(&self) -> StageId {
        StageId::ProceduralRefinement
    }
    fn instruction(&self) -> &'static str {
        prompts::PROCEDURAL_REFINEMENT
    }
    fn render(&self) -> String {
        to_json(self.rules)
    }
    fn parse(&self, raw: &str) -> Result<ProceduralRulesOutput, SchemaError> {
        let filtered: RefinedRulesOutput = parse_contract(raw)?;
        let rules = retain_listed(RefinedRulesOutput::NAME, &self.rules.rules, &filtered.rules)?;
        Ok(ProceduralRulesOutput { rules })
    }
}

// ── Scoring ──

pub struct AdmissibilityScoring<'a> {
    pub input: &'a AdmissibilityScoringInput,
}

impl Stage for AdmissibilityScoring<'_> {
    type Output = AdmissibilityScoringOutput;

    fn id(&self) -> StageId {
        StageId::AdmissibilityScoring
    }
    fn instruction(&self) -> &'static str {
        prompts::ADMISSIBILITY_SCORING
    }
    fn render(&self) -> String {
        format!(
            "FACTS:\n{}\n\nPROCEDURAL RULES:\n{}\n\nLEGAL REASONING Q&A:\n{}",
            to_json(&self.input.facts.facts),
            to_json(&self.input.procedural_rules.rules),
            self.input.qa
        )
    }
    fn parse(&self, raw: &str) -> Result<AdmissibilityScoringOutput, SchemaError> {
        let output: AdmissibilityScoringOutput = parse_contract(raw)?;
        let scores = align_scores(
            AdmissibilityScoringOutput::NAME,
            &self.input.procedural_rules.rules,
            output.scores,
        )?;
        Ok(AdmissibilityScoringOutput { scores })
    }
}

pub struct RelevanceScoring<'a> {
    pub input: &'a RelevanceScoringInput,
}

impl Stage for RelevanceScoring<'_> {
    type Output = RelevanceScoringOutput;

    fn id(&self) -> StageId {
        StageId::RelevanceScoring
    }
    fn instruction(&self) -> &'static str {
        prompts::RELEVANCE_SCORING
    }
    fn render(&self) -> String {
        format!(
            "FACTS:\n{}\n\nSUBSTANTIVE RULES:\n{}\n\nLEGAL REASONING Q&A:\n{}",
            to_json(&self.input.facts.facts),
            to_json(&self.input.substantive_rules.rules),
            self.input.qa
        )
    }
    fn parse(&self, raw: &str) -> Result<RelevanceScoringOutput, SchemaError> {
        let output: RelevanceScoringOutput = parse_contract(raw)?;
        let scores = align_scores(
            RelevanceScoringOutput::NAME,
            &self.input.substantive_rules.rules,
            output.scores,
        )?;
        Ok(RelevanceScoringOutput { scores })
    }
}
