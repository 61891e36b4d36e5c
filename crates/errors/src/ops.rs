//! Operations layer error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum OpsError {
    #[error("{operation} requires exactly one product, got {count}")]
    SingleProductRequired { operation: String, count: usize },
}
