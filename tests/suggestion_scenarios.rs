//! Suggestion workflow over the fixture catalog

mod common;

use std::sync::Arc;

use common::{
    edam, fixture_catalog, fixture_suggester, matcher_with, FailingStore, MockEmbedder,
};
use edam_mcp::{
    ConceptRecord, ConceptSuggester, ConceptType, EngineError, InMemoryOntology, OntologyStore,
    SuggestionRequest,
};

// === Scenario: a novel operation is placed under its nearest concept ===

#[tokio::test]
async fn quantum_protein_folding_gets_operation_suggestions() {
    let suggester = fixture_suggester();
    let request = SuggestionRequest::new("quantum computing for protein folding")
        .with_type(ConceptType::Operation);

    let outcome = suggester.suggest(&request).await.unwrap();

    assert!(outcome.mapping_attempted);
    assert!(outcome.accepted_match.is_none());
    let reason = outcome.mapping_failed_reason.as_deref().unwrap();
    assert!(
        reason.starts_with("no match above 0.80 (best: 'Protein structure prediction'"),
        "{}",
        reason
    );

    assert!(!outcome.suggestions.is_empty());
    let catalog = fixture_catalog();
    for suggestion in &outcome.suggestions {
        assert_eq!(suggestion.concept_type, ConceptType::Operation);
        let parent = suggestion.parent_uri.as_deref().unwrap();
        assert_eq!(parent, edam("operation_0474"));
        assert!(catalog.get_concept(parent).unwrap().is_some());
        assert!(suggestion
            .suggested_uri
            .starts_with("http://edamontology.org/suggested_"));
        assert!((0.0..=1.0).contains(&suggestion.confidence));
    }
    assert!(outcome
        .suggestions
        .iter()
        .any(|s| s.suggested_label == "Quantum Computing For Protein Folding"));
}

#[tokio::test]
async fn suggestions_are_ranked_and_capped() {
    let request = SuggestionRequest::new("quantum computing for protein folding")
        .with_type(ConceptType::Operation)
        .with_max_suggestions(2);

    let outcome = fixture_suggester().suggest(&request).await.unwrap();

    assert_eq!(outcome.suggestions.len(), 2);
    assert!(outcome.suggestions[0].confidence >= outcome.suggestions[1].confidence);
    assert_ne!(
        outcome.suggestions[0].suggested_label,
        outcome.suggestions[1].suggested_label
    );
}

// === Scenario: a good existing match is accepted instead ===

#[tokio::test]
async fn strong_match_is_accepted_without_suggestions() {
    let request = SuggestionRequest::new("sequence alignment tool").with_rationale("bioinformatics tool");

    let outcome = fixture_suggester().suggest(&request).await.unwrap();

    assert!(outcome.mapping_attempted);
    assert!(outcome.suggestions.is_empty());
    assert!(outcome.mapping_failed_reason.is_none());
    let accepted = outcome.accepted_match.unwrap();
    assert_eq!(accepted.uri, edam("operation_0296"));
    assert!(accepted.confidence >= 0.8);
}

// === Scenario: caller-supplied parents ===

#[tokio::test]
async fn supplied_parent_is_used_when_it_resolves() {
    let request = SuggestionRequest::new("quantum computing for protein folding")
        .with_type(ConceptType::Operation)
        .with_parent("Sequence analysis");

    let outcome = fixture_suggester().suggest(&request).await.unwrap();

    assert!(!outcome.suggestions.is_empty());
    for suggestion in &outcome.suggestions {
        assert_eq!(suggestion.parent_uri.as_deref(), Some(edam("operation_2403").as_str()));
        assert!(suggestion.rationale.contains("the closest is 'Protein structure prediction'"));
        assert!(suggestion.rationale.contains("Placed under 'Sequence analysis'"));
    }
    assert!(outcome.warnings.iter().all(|w| !w.contains("treated as a hint")));
    assert!(outcome
        .suggestions
        .iter()
        .any(|s| s.suggested_label == "Quantum Computing Sequence analysis"));
}

#[tokio::test]
async fn supplied_parent_does_not_change_confidence() {
    let free = SuggestionRequest::new("quantum computing for protein folding")
        .with_type(ConceptType::Operation)
        .with_max_suggestions(10);
    let anchored = free.clone().with_parent("operation_0004");

    let free = fixture_suggester().suggest(&free).await.unwrap();
    let anchored = fixture_suggester().suggest(&anchored).await.unwrap();

    let full = "Quantum Computing For Protein Folding";
    let confidence = |outcome: &edam_mcp::SuggestionOutcome| {
        outcome
            .suggestions
            .iter()
            .find(|s| s.suggested_label == full)
            .map(|s| s.confidence)
            .unwrap()
    };
    assert_eq!(confidence(&free), confidence(&anchored));
    assert!(anchored
        .suggestions
        .iter()
        .all(|s| s.parent_uri.as_deref() == Some(edam("operation_0004").as_str())));
}

#[tokio::test]
async fn unknown_parent_becomes_a_hint() {
    let request = SuggestionRequest::new("quantum computing for protein folding")
        .with_type(ConceptType::Operation)
        .with_parent("operation_9999");

    let outcome = fixture_suggester().suggest(&request).await.unwrap();

    assert!(outcome
        .warnings
        .iter()
        .any(|w| w.contains("'operation_9999' not found")));
    let catalog = fixture_catalog();
    for suggestion in &outcome.suggestions {
        let parent = suggestion.parent_uri.as_deref().unwrap();
        assert!(catalog.get_concept(parent).unwrap().is_some());
        assert!(suggestion.rationale.contains("operation_9999"));
    }
}

// === Scenario: type inference without a supplied type ===

#[tokio::test]
async fn type_is_inferred_from_description() {
    let outcome = fixture_suggester()
        .suggest(&SuggestionRequest::new("GenBank flat file"))
        .await
        .unwrap();

    assert!(!outcome.suggestions.is_empty());
    assert_eq!(outcome.suggestions[0].concept_type, ConceptType::Format);
}

// === Scenario: labels already in the catalog are not proposed again ===

#[tokio::test]
async fn existing_suggested_uri_is_not_reproposed() {
    let mut records: Vec<ConceptRecord> = fixture_catalog().iter().cloned().collect();
    records.push(ConceptRecord::new(
        edam("suggested_quantum_computing"),
        "Quantum Computing",
        ConceptType::Operation,
    ));
    let store = Arc::new(InMemoryOntology::from_records(records));
    let suggester = ConceptSuggester::new(matcher_with(store, Arc::new(MockEmbedder::new())));
    let request = SuggestionRequest::new("quantum computing for protein folding")
        .with_type(ConceptType::Operation)
        .with_max_suggestions(10);

    let outcome = suggester.suggest(&request).await.unwrap();

    assert!(!outcome.suggestions.is_empty());
    assert!(outcome
        .suggestions
        .iter()
        .all(|s| s.suggested_uri != edam("suggested_quantum_computing")));
}

// === Scenario: matcher failure still yields suggestions ===

#[tokio::test]
async fn matcher_failure_is_reported_not_raised() {
    let suggester = ConceptSuggester::new(matcher_with(
        Arc::new(FailingStore),
        Arc::new(MockEmbedder::new()),
    ));

    let outcome = suggester
        .suggest(&SuggestionRequest::new("quantum computing for protein folding"))
        .await
        .unwrap();

    assert!(outcome.mapping_attempted);
    assert!(outcome
        .mapping_failed_reason
        .as_deref()
        .unwrap()
        .starts_with("concept matching failed"));
    assert!(!outcome.suggestions.is_empty());
    assert!(outcome.suggestions.iter().all(|s| s.parent_uri.is_none()));
}

// === Scenario: invalid requests ===

#[tokio::test]
async fn empty_description_rejected_before_matching() {
    let suggester = ConceptSuggester::new(matcher_with(
        Arc::new(FailingStore),
        Arc::new(MockEmbedder::new()),
    ));

    let result = suggester.suggest(&SuggestionRequest::new("   ")).await;

    assert!(matches!(result, Err(EngineError::InvalidRequest(_))));
}

#[tokio::test]
async fn oversized_rationale_rejected() {
    let request = SuggestionRequest::new("quantum annealing").with_rationale("x".repeat(2_001));

    let result = fixture_suggester().suggest(&request).await;

    assert!(matches!(result, Err(EngineError::InvalidRequest(_))));
}
