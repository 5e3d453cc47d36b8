//! Text embeddings: provider trait, backends, and the vector cache

mod cache;
mod provider;

pub use cache::EmbeddingCache;
pub use provider::{EmbeddingError, EmbeddingProvider, HashingEmbedder};

#[cfg(feature = "embeddings")]
pub use provider::FastEmbedProvider;
