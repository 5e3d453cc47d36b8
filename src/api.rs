//! Transport-independent API layer.
//!
//! `EdamApi` is the single entry point for consumer-facing operations. The
//! MCP server and the CLI call `EdamApi` methods; neither reaches into the
//! matcher, suggester or store directly.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Settings;
use crate::embedding::{EmbeddingCache, EmbeddingProvider, HashingEmbedder};
use crate::matching::{
    ConceptMatcher, EngineError, EngineResult, MatchOutcome, MatchRequest, SimilarityEngine,
    WarmUpReport,
};
use crate::ontology::{
    self, resolve_concept, ConceptRecord, ConceptType, InMemoryOntology, Neighbor,
    OntologyLoader, OntologyStore,
};
use crate::suggestion::{ConceptSuggester, SuggestionOutcome, SuggestionRequest};

/// Choose the embedding backend for `settings`.
///
/// With the `embeddings` feature the configured fastembed model is loaded,
/// falling back to the hashing embedder if it cannot be.
pub fn embedding_provider(settings: &Settings) -> Arc<dyn EmbeddingProvider> {
    #[cfg(feature = "embeddings")]
    {
        match crate::embedding::FastEmbedProvider::from_name(&settings.embedding_model) {
            Ok(provider) => return Arc::new(provider),
            Err(e) => warn!(
                model = %settings.embedding_model,
                error = %e,
                "embedding model unavailable, using hashing embedder"
            ),
        }
    }
    #[cfg(not(feature = "embeddings"))]
    info!(
        model = %settings.embedding_model,
        "built without the `embeddings` feature, using hashing embedder"
    );
    Arc::new(HashingEmbedder::new(settings.embedding_dimensions))
}

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct EdamApi {
    store: Arc<dyn OntologyStore>,
    matcher: Arc<ConceptMatcher>,
    suggester: Arc<ConceptSuggester>,
    settings: Arc<Settings>,
}

impl EdamApi {
    /// Wire the engine over an already-loaded store.
    pub fn new(
        store: Arc<dyn OntologyStore>,
        provider: Arc<dyn EmbeddingProvider>,
        settings: Settings,
    ) -> Self {
        let cache = match settings.embedding_cache_capacity {
            Some(capacity) => EmbeddingCache::with_capacity(capacity),
            None => EmbeddingCache::new(),
        };
        let similarity = SimilarityEngine::new(provider)
            .with_weights(settings.fusion)
            .with_cache(cache);
        let matcher = Arc::new(ConceptMatcher::new(store.clone(), Arc::new(similarity)));
        let suggester =
            ConceptSuggester::new(matcher.clone()).with_config(settings.suggester_config());

        Self {
            store,
            matcher,
            suggester: Arc::new(suggester),
            settings: Arc::new(settings),
        }
    }

    /// Load the catalog named by `settings` and pick the embedding backend.
    pub fn from_settings(settings: Settings) -> EngineResult<Self> {
        let mut loader = OntologyLoader::new(&settings.ontology_path);
        if let Some(cache_path) = &settings.ontology_cache_path {
            loader = loader.with_cache(cache_path, settings.cache_ttl());
        }
        let catalog: InMemoryOntology = loader.load()?;
        let provider = embedding_provider(&settings);
        info!(
            concepts = catalog.len(),
            model = provider.model_name(),
            "edam engine ready"
        );
        Ok(Self::new(Arc::new(catalog), provider, settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn OntologyStore> {
        &self.store
    }

    pub fn model_name(&self) -> &str {
        self.matcher.similarity().model_name()
    }

    // --- Matching & suggestion ---

    /// A match request carrying the configured default threshold.
    pub fn match_request(&self, description: impl Into<String>) -> MatchRequest {
        MatchRequest::new(description).with_min_confidence(self.settings.similarity_threshold)
    }

    /// A suggestion request carrying the configured default cap.
    pub fn suggestion_request(&self, description: impl Into<String>) -> SuggestionRequest {
        SuggestionRequest::new(description).with_max_suggestions(self.settings.max_suggestions)
    }

    pub async fn map(&self, request: &MatchRequest) -> EngineResult<MatchOutcome> {
        self.matcher.match_concepts(request).await
    }

    pub async fn suggest(&self, request: &SuggestionRequest) -> EngineResult<SuggestionOutcome> {
        self.suggester.suggest(request).await
    }

    /// Embed the whole catalog ahead of the first request.
    pub async fn warm_up(&self) -> EngineResult<WarmUpReport> {
        let report = self.matcher.similarity().warm_up(self.store.as_ref()).await?;
        if report.failed > 0 {
            warn!(failed = report.failed, "some concepts could not be embedded");
        }
        Ok(report)
    }

    // --- Catalog lookups ---

    /// Resolve a uri, short id or label.
    pub fn concept(&self, reference: &str) -> EngineResult<ConceptRecord> {
        resolve_concept(self.store.as_ref(), reference)?
            .ok_or_else(|| EngineError::ConceptNotFound(reference.to_string()))
    }

    pub fn neighbors(&self, reference: &str, max_distance: usize) -> EngineResult<Vec<Neighbor>> {
        let concept = self.concept(reference)?;
        Ok(ontology::neighbors(self.store.as_ref(), &concept.uri, max_distance)?)
    }

    /// Labels from the root down to the concept.
    pub fn lineage(&self, reference: &str) -> EngineResult<Vec<String>> {
        let concept = self.concept(reference)?;
        Ok(ontology::lineage(self.store.as_ref(), &concept.uri)?)
    }

    pub fn search(&self, query: &str, max_results: usize) -> EngineResult<Vec<ConceptRecord>> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidRequest("search query must not be empty".into()));
        }
        Ok(ontology::search(self.store.as_ref(), query, max_results)?)
    }

    pub fn concepts_of_type(&self, concept_type: ConceptType) -> EngineResult<Vec<ConceptRecord>> {
        Ok(ontology::concepts_of_type(self.store.as_ref(), concept_type)?)
    }

    /// Concept counts per type, every type present.
    pub fn catalog_summary(&self) -> EngineResult<BTreeMap<ConceptType, usize>> {
        let mut counts: BTreeMap<ConceptType, usize> =
            ConceptType::ALL.iter().map(|t| (*t, 0)).collect();
        for concept in self.store.list_concepts()? {
            if let Some(kind) = concept.kind() {
                *counts.entry(kind).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(id: &str) -> String {
        format!("http://edamontology.org/{}", id)
    }

    fn api() -> EdamApi {
        let store = InMemoryOntology::from_records(vec![
            ConceptRecord::new(u("operation_0004"), "Operation", ConceptType::Operation),
            ConceptRecord::new(u("operation_0296"), "Sequence alignment", ConceptType::Operation)
                .with_parent(u("operation_0004")),
            ConceptRecord::new(u("format_1929"), "FASTA", ConceptType::Format),
        ]);
        EdamApi::new(
            Arc::new(store),
            Arc::new(HashingEmbedder::new(64)),
            Settings::default(),
        )
    }

    #[test]
    fn concept_lookup_reports_not_found() {
        let api = api();
        assert_eq!(api.concept("operation_0296").unwrap().label, "Sequence alignment");
        assert!(matches!(
            api.concept("operation_9999"),
            Err(EngineError::ConceptNotFound(_))
        ));
        assert!(matches!(
            api.neighbors("nope", 2),
            Err(EngineError::ConceptNotFound(_))
        ));
    }

    #[test]
    fn lineage_and_neighbors_by_label() {
        let api = api();
        assert_eq!(api.lineage("Sequence alignment").unwrap(), vec!["Operation", "Sequence alignment"]);
        let neighbors = api.neighbors("Operation", 1).unwrap();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].uri, u("operation_0296"));
    }

    #[test]
    fn summary_lists_every_type() {
        let summary = api().catalog_summary().unwrap();
        assert_eq!(summary.len(), 5);
        assert_eq!(summary[&ConceptType::Operation], 2);
        assert_eq!(summary[&ConceptType::Format], 1);
        assert_eq!(summary[&ConceptType::Topic], 0);
    }

    #[test]
    fn empty_search_rejected() {
        assert!(matches!(api().search(" ", 5), Err(EngineError::InvalidRequest(_))));
    }

    #[test]
    fn requests_carry_configured_defaults() {
        let api = api();
        assert_eq!(api.match_request("x").min_confidence, 0.7);
        assert_eq!(api.suggestion_request("x").max_suggestions, 5);
    }

    #[tokio::test]
    async fn warm_up_embeds_catalog() {
        let report = api().warm_up().await.unwrap();
        assert_eq!(report.embedded, 3);
    }

    #[test]
    fn from_settings_loads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("edam.json");
        std::fs::write(
            &snapshot,
            r#"[{"uri": "http://edamontology.org/format_1929", "label": "FASTA"}]"#,
        )
        .unwrap();
        let settings = Settings {
            ontology_path: snapshot,
            ontology_cache_path: None,
            ..Settings::default()
        };
        let api = EdamApi::from_settings(settings).unwrap();
        assert_eq!(api.store().len(), 1);
    }
}
