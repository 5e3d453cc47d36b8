//! Fixture catalog: a slice of EDAM with a three-level operation branch.

use edam_mcp::ontology::StoreResult;
use edam_mcp::{ConceptRecord, ConceptType, InMemoryOntology, OntologyStore, StoreError};

pub fn edam(id: &str) -> String {
    format!("http://edamontology.org/{}", id)
}

/// ```text
/// operation_0004 Operation
/// ├── operation_2403 Sequence analysis
/// │   └── operation_0296 Sequence alignment
/// └── operation_2406 Protein structure analysis
///     └── operation_0474 Protein structure prediction
/// data_2044 Sequence
/// format_1929 FASTA (synonym "Pearson format")
/// topic_0081 Structure analysis
/// ```
pub fn fixture_catalog() -> InMemoryOntology {
    InMemoryOntology::from_records(vec![
        ConceptRecord::new(edam("operation_0004"), "Operation", ConceptType::Operation)
            .with_definition("A function that processes a set of inputs and results in a set of outputs."),
        ConceptRecord::new(edam("operation_2403"), "Sequence analysis", ConceptType::Operation)
            .with_definition("Analyse one or more known molecular sequences.")
            .with_parent(edam("operation_0004")),
        ConceptRecord::new(edam("operation_0296"), "Sequence alignment", ConceptType::Operation)
            .with_definition("Align two or more molecular sequences.")
            .with_parent(edam("operation_2403")),
        ConceptRecord::new(edam("operation_2406"), "Protein structure analysis", ConceptType::Operation)
            .with_definition("Analyse protein structural data.")
            .with_parent(edam("operation_0004")),
        ConceptRecord::new(edam("operation_0474"), "Protein structure prediction", ConceptType::Operation)
            .with_definition("Predict the three-dimensional structure of a protein.")
            .with_parent(edam("operation_2406")),
        ConceptRecord::new(edam("data_2044"), "Sequence", ConceptType::Data)
            .with_definition("One or more molecular sequences."),
        ConceptRecord::new(edam("format_1929"), "FASTA", ConceptType::Format)
            .with_definition("FASTA format including NCBI-style IDs.")
            .with_synonym("Pearson format"),
        ConceptRecord::new(edam("topic_0081"), "Structure analysis", ConceptType::Topic)
            .with_definition("The analysis of molecular structure."),
    ])
}

/// A store whose every read fails.
pub struct FailingStore;

impl OntologyStore for FailingStore {
    fn list_concepts(&self) -> StoreResult<Vec<ConceptRecord>> {
        Err(StoreError::Poisoned)
    }

    fn get_concept(&self, _uri: &str) -> StoreResult<Option<ConceptRecord>> {
        Err(StoreError::Poisoned)
    }

    fn len(&self) -> usize {
        0
    }
}
