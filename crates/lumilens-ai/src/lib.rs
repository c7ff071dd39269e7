//! Oracle-driven analysis layer: stage contracts, the chat-completions client,
//! and the pipeline that fans stages out and folds their results together.

mod error;
pub mod executor;
pub mod oracle;
pub mod pipeline;
pub mod prompts;
pub mod stage;
#[cfg(test)]
mod testing;

pub use error::{OracleError, PipelineError, StageError};
pub use executor::StageExecutor;
pub use oracle::{ChatCompletionsOracle, GenerateRequest, GenerateResponse, Oracle, OracleConfig};
pub use pipeline::{Pipeline, PipelineOptions};
pub use stage::StageId;
