//! edam-mcp: EDAM Ontology Mapping Engine
//!
//! Maps free-text descriptions of bioinformatics tools, data and workflow
//! steps onto concepts of the EDAM ontology, and proposes well-formed new
//! concepts when nothing in the catalog fits.
//!
//! # Core Concepts
//!
//! - **Concepts**: EDAM terms (Operation, Data, Format, Topic, Identifier) with
//!   labels, synonyms, definitions and parent/child edges
//! - **Matching**: an exact label/synonym pass, then a semantic pass fusing
//!   embedding, token-overlap and surface similarity into one confidence
//! - **Suggestion**: type inference, label variations and hierarchy placement
//!   for concepts the catalog lacks
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use edam_mcp::{
//!     ConceptMatcher, ConceptRecord, ConceptType, HashingEmbedder, InMemoryOntology,
//!     MatchRequest, SimilarityEngine,
//! };
//!
//! let catalog = InMemoryOntology::from_records(vec![ConceptRecord::new(
//!     "http://edamontology.org/format_1929",
//!     "FASTA",
//!     ConceptType::Format,
//! )]);
//! let similarity = SimilarityEngine::new(Arc::new(HashingEmbedder::new(64)));
//! let matcher = ConceptMatcher::new(Arc::new(catalog), Arc::new(similarity));
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let outcome = rt.block_on(matcher.match_concepts(&MatchRequest::new("fasta"))).unwrap();
//! assert!(outcome.has_exact_match);
//! ```

pub mod api;
pub mod config;
pub mod embedding;
pub mod matching;
pub mod mcp;
pub mod ontology;
pub mod suggestion;
pub mod text;

pub use api::EdamApi;
pub use config::{ConfigError, Settings};
pub use embedding::{EmbeddingCache, EmbeddingError, EmbeddingProvider, HashingEmbedder};
pub use matching::{
    ConceptMatcher, EngineError, EngineResult, FusionWeights, MatchCandidate, MatchOutcome,
    MatchRequest, SimilarityEngine,
};
pub use ontology::{
    ConceptRecord, ConceptType, InMemoryOntology, OntologyLoader, OntologyStore, StoreError,
};
pub use suggestion::{
    ConceptSuggester, SuggesterConfig, SuggestionCandidate, SuggestionOutcome, SuggestionRequest,
};
pub use text::TextNormalizer;

#[cfg(feature = "embeddings")]
pub use embedding::FastEmbedProvider;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
