//! The ontology catalog: concept records, the store, hierarchy helpers,
//! snapshot loading and caching

mod cache;
mod concept;
pub mod hierarchy;
mod loader;
mod store;

pub use cache::CatalogCache;
pub use concept::{local_name, ConceptRecord, ConceptType};
pub use hierarchy::{concepts_of_type, lineage, neighbors, search, Neighbor};
pub use loader::{parse_snapshot, OntologyLoader, SnapshotFormat};
pub use store::{resolve_concept, InMemoryOntology, OntologyStore, StoreError, StoreResult};
