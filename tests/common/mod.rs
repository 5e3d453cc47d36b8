//! Shared fixtures for the integration tests
//!
//! A small EDAM catalog plus deterministic embedders, so confidence values
//! in scenario tests can be worked out by hand.

#![allow(dead_code)]

pub mod catalog;
pub mod mock_embedder;

pub use catalog::{edam, fixture_catalog, FailingStore};
pub use mock_embedder::{FailingEmbedder, MockEmbedder, PartialFailingEmbedder};

use std::sync::Arc;

use edam_mcp::{
    ConceptMatcher, ConceptSuggester, EmbeddingProvider, OntologyStore, SimilarityEngine,
};

/// A matcher over `store` using `provider` with default fusion weights.
pub fn matcher_with(
    store: Arc<dyn OntologyStore>,
    provider: Arc<dyn EmbeddingProvider>,
) -> Arc<ConceptMatcher> {
    Arc::new(ConceptMatcher::new(store, Arc::new(SimilarityEngine::new(provider))))
}

/// The fixture catalog scored by [`MockEmbedder`].
pub fn fixture_matcher() -> Arc<ConceptMatcher> {
    matcher_with(Arc::new(fixture_catalog()), Arc::new(MockEmbedder::new()))
}

pub fn fixture_suggester() -> ConceptSuggester {
    ConceptSuggester::new(fixture_matcher())
}
