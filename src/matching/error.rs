use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::ontology::StoreError;

/// Errors surfaced by matching and suggestion requests
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Concept not found: {0}")]
    ConceptNotFound(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;
