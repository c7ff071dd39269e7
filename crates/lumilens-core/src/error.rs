use thiserror::Error;

use crate::schema::Category;

/// Oracle output that does not satisfy a stage's declared contract.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{schema}: no JSON object in oracle output (got {excerpt:?})")]
    NoJson {
        schema: &'static str,
        excerpt: String,
    },

    #[error("{schema}: output does not match schema: {source}")]
    Json {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },

    #[error("{schema}: {reason}")]
    Invalid {
        schema: &'static str,
        reason: String,
    },
}

impl SchemaError {
    pub fn invalid(schema: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            schema,
            reason: reason.into(),
        }
    }

    /// Name of the contract that was violated.
    pub fn schema(&self) -> &'static str {
        match self {
            Self::NoJson { schema, .. } | Self::Json { schema, .. } | Self::Invalid { schema, .. } => {
                schema
            }
        }
    }
}

/// A category total was requested over zero rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot compute {category} total: no rules in category")]
pub struct EmptyCategoryError {
    pub category: Category,
}
