pub mod aggregate;
pub mod contract;
pub mod error;
pub mod schema;
pub mod scoring;

pub use aggregate::combine;
pub use contract::{Contract, align_scores, assign_rule_ids, parse_contract, retain_listed};
pub use error::{EmptyCategoryError, SchemaError};
pub use schema::*;
pub use scoring::normalize;
