//! Description → ranked existing concepts

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::{EngineError, EngineResult};
use super::similarity::{PreparedQuery, SimilarityEngine};
use crate::ontology::{ConceptRecord, ConceptType, OntologyStore};
use crate::text::canonical_form;

pub const MAX_DESCRIPTION_CHARS: usize = 10_000;
pub const MAX_CONTEXT_CHARS: usize = 2_000;
pub const MAX_RESULTS_LIMIT: usize = 20;
pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Parameters for [`ConceptMatcher::match_concepts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub description: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

fn default_min_confidence() -> f64 {
    DEFAULT_MIN_CONFIDENCE
}

impl MatchRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            context: None,
            max_results: DEFAULT_MAX_RESULTS,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        validate_description(&self.description)?;
        if let Some(context) = &self.context {
            if context.chars().count() > MAX_CONTEXT_CHARS {
                return Err(EngineError::InvalidRequest(format!(
                    "context exceeds {} characters",
                    MAX_CONTEXT_CHARS
                )));
            }
        }
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_results) {
            return Err(EngineError::InvalidRequest(format!(
                "max_results must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT, self.max_results
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(EngineError::InvalidRequest(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        Ok(())
    }
}

/// Shared by match and suggestion requests.
pub(crate) fn validate_description(description: &str) -> EngineResult<()> {
    if description.trim().is_empty() {
        return Err(EngineError::InvalidRequest("description must not be empty".into()));
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(EngineError::InvalidRequest(format!(
            "description exceeds {} characters",
            MAX_DESCRIPTION_CHARS
        )));
    }
    Ok(())
}

/// One existing concept proposed for a description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate {
    pub uri: String,
    pub label: String,
    pub confidence: f64,
    pub concept_type: Option<ConceptType>,
    pub definition: Option<String>,
    pub synonyms: Vec<String>,
    /// Produced by the exact label/synonym pass
    pub exact: bool,
}

impl MatchCandidate {
    pub fn from_record(record: &ConceptRecord, confidence: f64, exact: bool) -> Self {
        Self {
            uri: record.uri.clone(),
            label: record.label.clone(),
            confidence: confidence.clamp(0.0, 1.0),
            concept_type: record.kind(),
            definition: record.definition.clone(),
            synonyms: record.synonyms.clone(),
            exact,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub matches: Vec<MatchCandidate>,
    pub has_exact_match: bool,
    pub confidence_threshold: f64,
    /// Concepts left out of the semantic pass because embedding failed
    pub skipped_concepts: usize,
    pub warnings: Vec<String>,
}

/// Confidence descending, exact before semantic, then uri ascending.
fn rank(a: &MatchCandidate, b: &MatchCandidate) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| b.exact.cmp(&a.exact))
        .then_with(|| a.uri.cmp(&b.uri))
}

/// Exact pass followed by a fused-similarity pass over the whole catalog.
pub struct ConceptMatcher {
    store: Arc<dyn OntologyStore>,
    similarity: Arc<SimilarityEngine>,
}

impl ConceptMatcher {
    pub fn new(store: Arc<dyn OntologyStore>, similarity: Arc<SimilarityEngine>) -> Self {
        Self { store, similarity }
    }

    pub fn store(&self) -> &Arc<dyn OntologyStore> {
        &self.store
    }

    pub fn similarity(&self) -> &Arc<SimilarityEngine> {
        &self.similarity
    }

    /// Rank existing concepts against a description.
    ///
    /// Embedding failures never fail the request: a failed concept is
    /// skipped and counted, and a failed query embedding skips the semantic
    /// pass entirely while still returning exact matches.
    pub async fn match_concepts(&self, request: &MatchRequest) -> EngineResult<MatchOutcome> {
        request.validate()?;

        let concepts = self.store.list_concepts()?;
        let mut warnings = Vec::new();
        let mut skipped = 0usize;

        let mut matches: Vec<MatchCandidate> = exact_pass(&request.description, &concepts);
        let has_exact_match = !matches.is_empty();
        let exact_uris: HashSet<String> = matches.iter().map(|m| m.uri.clone()).collect();

        match self
            .similarity
            .prepare_query(&request.description, request.context.as_deref())
            .await
        {
            Ok(query) => {
                let remaining = concepts.iter().filter(|c| !exact_uris.contains(&c.uri));
                let (scored, failed) = self.score_concepts(&query, remaining).await;
                skipped += failed;
                if failed > 0 {
                    warnings.push(format!("{} concepts skipped: embedding failed", failed));
                }
                matches.extend(
                    scored
                        .into_iter()
                        .filter(|(_, confidence)| *confidence >= request.min_confidence)
                        .map(|(record, confidence)| MatchCandidate::from_record(record, confidence, false)),
                );
            }
            Err(e) => {
                warn!(error = %e, "query embedding failed, semantic pass skipped");
                skipped += concepts.len() - exact_uris.len();
                warnings.push(format!("semantic matching unavailable: {}", e));
            }
        }

        // A store may list a uri twice; the exact hit comes first and is kept
        let mut seen = HashSet::new();
        matches.retain(|m| seen.insert(m.uri.clone()));
        matches.sort_by(rank);
        matches.truncate(request.max_results);

        debug!(
            description = %request.description,
            matches = matches.len(),
            has_exact_match,
            skipped,
            "matched description"
        );

        Ok(MatchOutcome {
            matches,
            has_exact_match,
            confidence_threshold: request.min_confidence,
            skipped_concepts: skipped,
            warnings,
        })
    }

    /// Concepts whose label or a synonym equals the description in canonical form.
    pub fn find_exact_matches(&self, description: &str) -> EngineResult<Vec<MatchCandidate>> {
        let concepts = self.store.list_concepts()?;
        Ok(exact_pass(description, &concepts))
    }

    /// Highest fused-score concept regardless of threshold.
    ///
    /// Exact matches win outright. `None` only for an empty catalog or when
    /// every concept failed to embed.
    pub async fn nearest_concept(
        &self,
        description: &str,
        context: Option<&str>,
    ) -> EngineResult<Option<MatchCandidate>> {
        let concepts = self.store.list_concepts()?;
        if let Some(exact) = exact_pass(description, &concepts).into_iter().next() {
            return Ok(Some(exact));
        }

        let query = self.similarity.prepare_query(description, context).await?;
        let (scored, _) = self.score_concepts(&query, concepts.iter()).await;
        Ok(scored
            .into_iter()
            .map(|(record, confidence)| MatchCandidate::from_record(record, confidence, false))
            .min_by(rank))
    }

    /// Fused score per concept, plus the number of concepts that failed.
    async fn score_concepts<'a>(
        &self,
        query: &PreparedQuery,
        concepts: impl Iterator<Item = &'a ConceptRecord>,
    ) -> (Vec<(&'a ConceptRecord, f64)>, usize) {
        let mut scored = Vec::new();
        let mut failed = 0usize;
        for concept in concepts {
            match self.similarity.score(query, concept).await {
                Ok(signals) => scored.push((concept, self.similarity.fuse(&signals))),
                Err(e) => {
                    warn!(uri = %concept.uri, error = %e, "skipping concept");
                    failed += 1;
                }
            }
        }
        (scored, failed)
    }
}

fn exact_pass(description: &str, concepts: &[ConceptRecord]) -> Vec<MatchCandidate> {
    let wanted = canonical_form(description);
    if wanted.is_empty() {
        return Vec::new();
    }
    let mut found: Vec<MatchCandidate> = concepts
        .iter()
        .filter(|c| c.names().any(|name| canonical_form(name) == wanted))
        .map(|c| MatchCandidate::from_record(c, 1.0, true))
        .collect();
    found.sort_by(rank);
    found
}
