//! Runs a single stage: one oracle call under a deadline, then validation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::{OracleError, PipelineError};
use crate::oracle::{GenerateRequest, Oracle, OracleConfig, TEMPERATURE};
use crate::stage::Stage;

/// Executes stages against a shared oracle.
///
/// Exactly one attempt per stage: no retry, no backoff. Oracle failures and
/// timeouts surface as oracle-service errors, unparsable replies as schema
/// validation errors, both tagged with the stage that failed.
#[derive(Clone)]
pub struct StageExecutor {
    oracle: Arc<dyn Oracle>,
    max_tokens: u32,
    deadline: Duration,
}

impl StageExecutor {
    pub fn new(oracle: Arc<dyn Oracle>, config: &OracleConfig) -> Self {
        Self::with_limits(oracle, config.max_tokens, config.timeout())
    }

    pub fn with_limits(oracle: Arc<dyn Oracle>, max_tokens: u32, deadline: Duration) -> Self {
        Self {
            oracle,
            max_tokens,
            deadline,
        }
    }

    pub async fn execute<S: Stage>(&self, stage: &S) -> Result<S::Output, PipelineError> {
        let id = stage.id();
        let request = GenerateRequest {
            stage: id,
            system_prompt: stage.instruction().to_string(),
            user_prompt: stage.render(),
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
            json_output: stage.expects_json(),
        };

        debug!(stage = %id, prompt_chars = request.user_prompt.len(), "stage started");
        let started = Instant::now();

        let response = match tokio::time::timeout(self.deadline, self.oracle.generate(&request)).await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(stage = %id, error = %e, "oracle call failed");
                return Err(PipelineError::new(id, e));
            }
            Err(_) => {
                warn!(stage = %id, deadline = ?self.deadline, "oracle call timed out");
                return Err(PipelineError::new(id, OracleError::Timeout(self.deadline)));
            }
        };

        let output = stage.parse(&response.text).map_err(|e| {
            warn!(stage = %id, error = %e, "oracle output rejected");
            PipelineError::new(id, e)
        })?;

        info!(
            stage = %id,
            model = %response.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            tokens_used = response.tokens_used,
            response_chars = response.text.len(),
            "stage complete"
        );
        Ok(output)
    }
}
