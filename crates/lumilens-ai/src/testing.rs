//! Scripted oracle for pipeline tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::OracleError;
use crate::oracle::{GenerateRequest, GenerateResponse, Oracle};
use crate::stage::StageId;

pub const QA: &str =
    "1. Jurisdiction: The Board has jurisdiction under the Contract Disputes Act, 41 U.S.C. 7104.";

pub const FACTS: &str = r#"{"facts": [
    {"id": 0, "specific_fact_cited": "QTI submitted a claim for $42,000 on March 3, 2022.",
     "relevancy_reason": "Establishes the claim amount and filing date.", "contestability_reason": ""},
    {"id": 1, "specific_fact_cited": "The contracting officer denied the claim for lack of support.",
     "relevancy_reason": "The denial is the decision under appeal.",
     "contestability_reason": "QTI asserts it supplied supporting invoices."}
]}"#;

pub const PROCEDURAL: &str = r#"{"rules": [
    {"procedural_rule": "A claim must be submitted to the contracting officer for a final decision",
     "effects": "Without a final decision the Board lacks jurisdiction."}
]}"#;

pub const SUBSTANTIVE: &str = r#"{"rules": [
    {"substantive_law": "Suspension of Work clause (FAR 52.242-14)",
     "applicability": "The government halted site access for 40 days.",
     "relevance": "Determines entitlement to delay costs."}
]}"#;

pub const ADMISSIBILITY: &str = r#"```json
{"scores": [
    {"rule_id": 0, "procedural_rule": "Final decision requirement",
     "doctrinal_fit": 5, "fact_match": 4, "party_assertion": 3, "precedent_alignment": 2,
     "rationale": "The CO issued a final decision that QTI appealed."}
]}
```"#;

pub const RELEVANCE: &str = r#"{"scores": [
    {"substantive_law": "suspension of work clause (FAR 52.242-14)",
     "doctrinal_fit": 3, "fact_match": 3, "party_assertion": 3, "precedent_alignment": 3,
     "rationale": "Delay is alleged but poorly documented."}
]}"#;

pub enum Reply {
    Text(String),
    /// Fail with an oracle error after `after` has elapsed.
    Fail { message: String, after: Duration },
    /// Never reply; sets `cancelled` when the pending call is dropped.
    Stall { cancelled: Arc<AtomicBool> },
}

/// Replies per stage from a fixed script and records every request.
pub struct ScriptedOracle {
    replies: HashMap<StageId, Reply>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A script that takes a document through every scoring stage.
    pub fn full() -> Self {
        Self::new()
            .reply(StageId::ReasoningQa, QA)
            .reply(StageId::Facts, FACTS)
            .reply(StageId::ProceduralRules, PROCEDURAL)
            .reply(StageId::SubstantiveRules, SUBSTANTIVE)
            .reply(StageId::AdmissibilityScoring, ADMISSIBILITY)
            .reply(StageId::RelevanceScoring, RELEVANCE)
    }

    pub fn reply(mut self, stage: StageId, text: &str) -> Self {
        self.replies.insert(stage, Reply::Text(text.to_string()));
        self
    }

    pub fn fail(mut self, stage: StageId, message: &str, after: Duration) -> Self {
        self.replies.insert(
            stage,
            Reply::Fail {
                message: message.to_string(),
                after,
            },
        );
        self
    }

    pub fn stall(mut self, stage: StageId, cancelled: Arc<AtomicBool>) -> Self {
        self.replies.insert(stage, Reply::Stall { cancelled });
        self
    }

    pub fn stages_called(&self) -> Vec<StageId> {
        self.requests.lock().unwrap().iter().map(|r| r.stage).collect()
    }

    pub fn request_for(&self, stage: StageId) -> Option<GenerateRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.stage == stage)
            .cloned()
    }
}

struct CancelFlag(Arc<AtomicBool>);

impl Drop for CancelFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, OracleError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.get(&request.stage) {
            Some(Reply::Text(text)) => Ok(GenerateResponse {
                text: text.clone(),
                tokens_used: 100,
                model: "scripted".into(),
            }),
            Some(Reply::Fail { message, after }) => {
                tokio::time::sleep(*after).await;
                Err(OracleError::Other(message.clone()))
            }
            Some(Reply::Stall { cancelled }) => {
                let _flag = CancelFlag(cancelled.clone());
                std::future::pending().await
            }
            None => Err(OracleError::Other(format!(
                "no scripted reply for {}",
                request.stage
            ))),
        }
    }
}
