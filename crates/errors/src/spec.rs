//! Product spec resolution error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum SpecError {
    #[error("no products found")]
    NoProducts,

    #[error("unknown products {unknown:?}; known products are {known:?}")]
    UnknownProducts {
        unknown: Vec<String>,
        known: Vec<String>,
    },

    #[error("product {product} declares input product {input} that does not exist; known products are {known:?}")]
    UnresolvedInputProduct {
        product: String,
        input: String,
        known: Vec<String>,
    },

    #[error("failed to discover main packages under {path}: {message}")]
    DiscoveryFailed { path: String, message: String },
}
