//! The extraction-and-scoring pipeline.
//!
//! ```text
//!   [redaction]            optional, sequential
//!        │
//!   reasoning Q&A          stage 0, sequential
//!        │
//!   ┌────┼─────────┐
//! facts procedural substantive     stage 1, fan-out ×3
//!   └────┼─────────┘
//!   [refinement]           stage 1.5, optional, sequential
//!        │
//!   ┌────┴─────┐
//! admissibility relevance          stage 2, fan-out ×2
//!   └────┬─────┘
//!   aggregation            stage 3, sequential
//! ```
//!
//! Fan-out groups are joined futures on the calling task. Results are bound
//! by slot, and the first failure in a group returns immediately, dropping
//! (and so cancelling) the sibling calls still in flight.

use std::borrow::Cow;
use std::sync::Arc;

use lumilens_core::{
    AdmissibilityScoringInput, AdmissibilityScoringOutput, Category, CombinedAnalysis,
    EmptyCategoryError, FactsAndRulesOutput, FactsExtractionOutput, ProceduralRulesOutput,
    RelevanceScoringInput, RelevanceScoringOutput, SubstantiveRulesOutput, combine,
};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::executor::StageExecutor;
use crate::oracle::{Oracle, OracleConfig};
use crate::stage::{
    AdmissibilityScoring, DocumentContext, FactsExtraction, PreAppealRedaction,
    ProceduralRefinement, ProceduralRulesExtraction, ReasoningQa, RelevanceScoring,
    StageId, SubstantiveRulesExtraction,
};

/// Optional stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Re-run the procedural rule list through the oracle to drop substantive rules.
    pub refine_procedural: bool,
    /// Reduce a decision to its pre-appeal content before any analysis.
    pub redact_pre_appeal: bool,
}

/// Entry points for every pipeline depth.
///
/// Holds no per-invocation state: every method is a function of its
/// arguments and the oracle's replies, and calls may run concurrently.
#[derive(Clone)]
pub struct Pipeline {
    executor: StageExecutor,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(oracle: Arc<dyn Oracle>, config: &OracleConfig) -> Self {
        Self::from_executor(StageExecutor::new(oracle, config))
    }

    pub fn from_executor(executor: StageExecutor) -> Self {
        Self {
            executor,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    // ── Entry points ──

    /// Reduce a decision to the content that existed before the appeal.
    pub async fn redact_pre_appeal(&self, text: &str) -> Result<String, PipelineError> {
        self.executor.execute(&PreAppealRedaction { text }).await
    }

    /// Stage 0 only.
    pub async fn reasoning_qa(&self, text: &str) -> Result<String, PipelineError> {
        let document = self.document(text).await?;
        self.qa_for(&document, None).await
    }

    /// Facts extraction; computes the Q&A first unless one is supplied.
    pub async fn facts(
        &self,
        text: &str,
        qa: Option<&str>,
    ) -> Result<FactsExtractionOutput, PipelineError> {
        let document = self.document(text).await?;
        let qa = self.qa_for(&document, qa).await?;
        let context = DocumentContext {
            text: &document,
            qa: &qa,
        };
        self.executor.execute(&FactsExtraction { context }).await
    }

    /// Procedural rule extraction, refined when enabled.
    pub async fn procedural_rules(
        &self,
        text: &str,
        qa: Option<&str>,
    ) -> Result<ProceduralRulesOutput, PipelineError> {
        let document = self.document(text).await?;
        let qa = self.qa_for(&document, qa).await?;
        let context = DocumentContext {
            text: &document,
            qa: &qa,
        };
        let rules = self
            .executor
            .execute(&ProceduralRulesExtraction { context })
            .await?;
        self.refine(rules).await
    }

    pub async fn substantive_rules(
        &self,
        text: &str,
        qa: Option<&str>,
    ) -> Result<SubstantiveRulesOutput, PipelineError> {
        let document = self.document(text).await?;
        let qa = self.qa_for(&document, qa).await?;
        let context = DocumentContext {
            text: &document,
            qa: &qa,
        };
        self.executor
            .execute(&SubstantiveRulesExtraction { context })
            .await
    }

    /// Stages 0, 1 and (optionally) 1.5.
    pub async fn extract(&self, text: &str) -> Result<FactsAndRulesOutput, PipelineError> {
        let document = self.document(text).await?;
        let qa = self.qa_for(&document, None).await?;
        self.extract_with_qa(&document, &qa).await
    }

    /// Admissibility scoring of the procedural rules, without relevance.
    pub async fn admissibility(
        &self,
        text: &str,
    ) -> Result<AdmissibilityScoringOutput, PipelineError> {
        let document = self.document(text).await?;
        let qa = self.qa_for(&document, None).await?;
        let context = DocumentContext {
            text: &document,
            qa: &qa,
        };

        let facts_stage = FactsExtraction { context };
        let procedural_stage = ProceduralRulesExtraction { context };
        let (facts, procedural) = tokio::try_join!(
            self.executor.execute(&facts_stage),
            self.executor.execute(&procedural_stage),
        )?;
        let procedural_rules = self.refine(procedural).await?;
        ensure_rules(
            StageId::AdmissibilityScoring,
            Category::Admissibility,
            procedural_rules.rules.len(),
        )?;

        let input = AdmissibilityScoringInput {
            facts,
            procedural_rules,
            qa,
        };
        self.executor
            .execute(&AdmissibilityScoring { input: &input })
            .await
    }

    /// Relevance scoring of the substantive rules, without admissibility.
    pub async fn relevance(&self, text: &str) -> Result<RelevanceScoringOutput, PipelineError> {
        let document = self.document(text).await?;
        let qa = self.qa_for(&document, None).await?;
        let context = DocumentContext {
            text: &document,
            qa: &qa,
        };

        let facts_stage = FactsExtraction { context };
        let substantive_stage = SubstantiveRulesExtraction { context };
        let (facts, substantive_rules) = tokio::try_join!(
            self.executor.execute(&facts_stage),
            self.executor.execute(&substantive_stage),
        )?;
        ensure_rules(
            StageId::RelevanceScoring,
            Category::Relevance,
            substantive_rules.rules.len(),
        )?;

        let input = RelevanceScoringInput {
            facts,
            substantive_rules,
            qa,
        };
        self.executor
            .execute(&RelevanceScoring { input: &input })
            .await
    }

    /// The full pipeline: extraction, both scorings, and aggregation.
    pub async fn score(&self, text: &str) -> Result<CombinedAnalysis, PipelineError> {
        let document = self.document(text).await?;
        let qa = self.qa_for(&document, None).await?;
        let extraction = self.extract_with_qa(&document, &qa).await?;
        self.score_extracted(extraction, qa).await
    }

    /// Stages 2 and 3 over an extraction that has already been made.
    pub async fn score_extracted(
        &self,
        extraction: FactsAndRulesOutput,
        qa: String,
    ) -> Result<CombinedAnalysis, PipelineError> {
        let FactsAndRulesOutput {
            facts,
            procedural_rules,
            substantive_rules,
        } = extraction;

        ensure_rules(
            StageId::AdmissibilityScoring,
            Category::Admissibility,
            procedural_rules.rules.len(),
        )?;
        ensure_rules(
            StageId::RelevanceScoring,
            Category::Relevance,
            substantive_rules.rules.len(),
        )?;

        let admissibility_input = AdmissibilityScoringInput {
            facts: facts.clone(),
            procedural_rules,
            qa: qa.clone(),
        };
        let relevance_input = RelevanceScoringInput {
            facts,
            substantive_rules,
            qa,
        };

        let admissibility_stage = AdmissibilityScoring {
            input: &admissibility_input,
        };
        let relevance_stage = RelevanceScoring {
            input: &relevance_input,
        };
        let (admissibility, relevance) = tokio::try_join!(
            self.executor.execute(&admissibility_stage),
            self.executor.execute(&relevance_stage),
        )?;

        let analysis = combine(&admissibility, &relevance)
            .map_err(|e| PipelineError::new(StageId::Aggregation, e))?;
        info!(
            total_admissibility = analysis.total_admissibility,
            total_relevance = analysis.total_relevance,
            "scoring complete"
        );
        Ok(analysis)
    }

    // ── Internals ──

    async fn document<'a>(&self, text: &'a str) -> Result<Cow<'a, str>, PipelineError> {
        if !self.options.redact_pre_appeal {
            return Ok(Cow::Borrowed(text));
        }
        let redacted = self.redact_pre_appeal(text).await?;
        debug!(
            before_chars = text.len(),
            after_chars = redacted.len(),
            "document redacted to pre-appeal content"
        );
        Ok(Cow::Owned(redacted))
    }

    async fn qa_for(&self, text: &str, qa: Option<&str>) -> Result<String, PipelineError> {
        match qa {
            Some(qa) => Ok(qa.to_string()),
            None => self.executor.execute(&ReasoningQa { text }).await,
        }
    }

    async fn extract_with_qa(
        &self,
        text: &str,
        qa: &str,
    ) -> Result<FactsAndRulesOutput, PipelineError> {
        let context = DocumentContext { text, qa };

        let facts_stage = FactsExtraction { context };
        let procedural_stage = ProceduralRulesExtraction { context };
        let substantive_stage = SubstantiveRulesExtraction { context };
        let (facts, procedural, substantive_rules) = tokio::try_join!(
            self.executor.execute(&facts_stage),
            self.executor.execute(&procedural_stage),
            self.executor.execute(&substantive_stage),
        )?;
        let procedural_rules = self.refine(procedural).await?;

        info!(
            facts = facts.facts.len(),
            procedural_rules = procedural_rules.rules.len(),
            substantive_rules = substantive_rules.rules.len(),
            "extraction complete"
        );
        Ok(FactsAndRulesOutput {
            facts,
            procedural_rules,
            substantive_rules,
        })
    }

    async fn refine(
        &self,
        rules: ProceduralRulesOutput,
    ) -> Result<ProceduralRulesOutput, PipelineError> {
        if !self.options.refine_procedural || rules.rules.is_empty() {
            return Ok(rules);
        }
        let refined = self
            .executor
            .execute(&ProceduralRefinement { rules: &rules })
            .await?;
        debug!(
            before = rules.rules.len(),
            after = refined.rules.len(),
            "procedural rules refined"
        );
        Ok(refined)
    }
}

/// Refuse to score an empty category.
fn ensure_rules(stage: StageId, category: Category, count: usize) -> Result<(), PipelineError> {
    if count == 0 {
        warn!(stage = %stage, category = %category, "no rules extracted to score");
        return Err(PipelineError::new(stage, EmptyCategoryError { category }));
    }
    Ok(())
}
