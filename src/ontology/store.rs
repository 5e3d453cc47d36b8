//! Read-only concept catalog

use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use super::concept::ConceptRecord;
use crate::text::canonical_form;

/// Errors from loading, caching or reading the catalog
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Catalog of concepts, immutable once loaded.
///
/// Implementations must be thread-safe; the matcher shares one store across
/// concurrent requests.
pub trait OntologyStore: Send + Sync {
    /// All concepts, ordered by uri
    fn list_concepts(&self) -> StoreResult<Vec<ConceptRecord>>;

    fn get_concept(&self, uri: &str) -> StoreResult<Option<ConceptRecord>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory catalog keyed by uri.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOntology {
    concepts: BTreeMap<String, ConceptRecord>,
}

impl InMemoryOntology {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from raw records.
    ///
    /// Records without a label or a derivable type are skipped. Duplicate
    /// uris keep the first record. Edges pointing outside the catalog are
    /// dropped, and every parent edge gets its child edge (and vice versa).
    pub fn from_records(records: impl IntoIterator<Item = ConceptRecord>) -> Self {
        let mut concepts: BTreeMap<String, ConceptRecord> = BTreeMap::new();
        for mut record in records {
            if record.uri.trim().is_empty() || record.label.trim().is_empty() {
                warn!(uri = %record.uri, "skipping concept without uri or label");
                continue;
            }
            match record.kind() {
                Some(kind) => record.concept_type = Some(kind),
                None => {
                    warn!(uri = %record.uri, "skipping concept with unknown type");
                    continue;
                }
            }
            if concepts.contains_key(&record.uri) {
                warn!(uri = %record.uri, "duplicate concept uri, keeping first");
                continue;
            }
            concepts.insert(record.uri.clone(), record);
        }

        let mut dangling = 0usize;
        let mut edges: Vec<(String, String)> = Vec::new(); // (parent, child)
        for record in concepts.values() {
            for parent in &record.parents {
                if concepts.contains_key(parent) {
                    edges.push((parent.clone(), record.uri.clone()));
                } else {
                    dangling += 1;
                }
            }
            for child in &record.children {
                if concepts.contains_key(child) {
                    edges.push((record.uri.clone(), child.clone()));
                } else {
                    dangling += 1;
                }
            }
        }
        if dangling > 0 {
            warn!(dangling, "dropped edges to concepts outside the catalog");
        }

        for record in concepts.values_mut() {
            record.parents.clear();
            record.children.clear();
        }
        for (parent, child) in edges {
            if let Some(p) = concepts.get_mut(&parent) {
                p.children.insert(child.clone());
            }
            if let Some(c) = concepts.get_mut(&child) {
                c.parents.insert(parent);
            }
        }

        Self { concepts }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConceptRecord> {
        self.concepts.values()
    }
}

impl OntologyStore for InMemoryOntology {
    fn list_concepts(&self) -> StoreResult<Vec<ConceptRecord>> {
        Ok(self.concepts.values().cloned().collect())
    }

    fn get_concept(&self, uri: &str) -> StoreResult<Option<ConceptRecord>> {
        Ok(self.concepts.get(uri).cloned())
    }

    fn len(&self) -> usize {
        self.concepts.len()
    }
}

/// Resolve a caller-supplied concept reference.
///
/// Accepts a full uri, a short id (`operation_0296`, case-insensitive) or a
/// label/synonym compared in canonical form. Short ids win over labels.
pub fn resolve_concept(
    store: &dyn OntologyStore,
    reference: &str,
) -> StoreResult<Option<ConceptRecord>> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Ok(None);
    }
    if let Some(record) = store.get_concept(reference)? {
        return Ok(Some(record));
    }

    let concepts = store.list_concepts()?;
    if let Some(record) = concepts
        .iter()
        .find(|c| c.short_id().eq_ignore_ascii_case(reference))
    {
        return Ok(Some(record.clone()));
    }

    let wanted = canonical_form(reference);
    Ok(concepts
        .into_iter()
        .find(|c| c.names().any(|name| canonical_form(name) == wanted)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::ConceptType;

    const BASE: &str = "http://edamontology.org/";

    fn uri(id: &str) -> String {
        format!("{}{}", BASE, id)
    }

    fn small_catalog() -> InMemoryOntology {
        InMemoryOntology::from_records(vec![
            ConceptRecord::new(uri("operation_0004"), "Operation", ConceptType::Operation),
            ConceptRecord::new(uri("operation_0296"), "Sequence alignment", ConceptType::Operation)
                .with_parent(uri("operation_0004"))
                .with_synonym("Sequence aligning"),
            ConceptRecord::new(uri("format_1929"), "FASTA", ConceptType::Format)
                .with_parent(uri("format_9999")),
        ])
    }

    #[test]
    fn children_completed_from_parents() {
        let store = small_catalog();
        let root = store.get_concept(&uri("operation_0004")).unwrap().unwrap();
        assert!(root.children.contains(&uri("operation_0296")));
    }

    #[test]
    fn dangling_parents_dropped() {
        let store = small_catalog();
        let fasta = store.get_concept(&uri("format_1929")).unwrap().unwrap();
        assert!(fasta.parents.is_empty());
    }

    #[test]
    fn records_without_type_or_label_skipped() {
        let mut untyped = ConceptRecord::new("http://example.org/x_1", "Thing", ConceptType::Data);
        untyped.concept_type = None;
        let unlabeled = ConceptRecord::new(uri("data_0006"), "  ", ConceptType::Data);
        let store = InMemoryOntology::from_records(vec![untyped, unlabeled]);
        assert!(store.is_empty());
    }

    #[test]
    fn list_is_ordered_by_uri() {
        let store = small_catalog();
        let uris: Vec<String> = store.list_concepts().unwrap().into_iter().map(|c| c.uri).collect();
        let mut sorted = uris.clone();
        sorted.sort();
        assert_eq!(uris, sorted);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn resolve_by_uri_short_id_and_label() {
        let store = small_catalog();
        let by_uri = resolve_concept(&store, &uri("operation_0296")).unwrap();
        let by_id = resolve_concept(&store, "OPERATION_0296").unwrap();
        let by_label = resolve_concept(&store, "sequence   alignment").unwrap();
        let by_synonym = resolve_concept(&store, "Sequence aligning").unwrap();
        for found in [by_uri, by_id, by_label, by_synonym] {
            assert_eq!(found.map(|c| c.uri), Some(uri("operation_0296")));
        }
        assert!(resolve_concept(&store, "protein folding").unwrap().is_none());
        assert!(resolve_concept(&store, "").unwrap().is_none());
    }
}
