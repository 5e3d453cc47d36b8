//! Similarity signals and their fusion
//!
//! Three signals, each in [0, 1]:
//!
//! - **embedding**: cosine between the query vector and the concept vector
//!   (label + synonyms), negative values clamped to 0
//! - **token**: Jaccard overlap of normalized token sets, best of label and
//!   each synonym
//! - **surface**: normalized Levenshtein similarity between the description
//!   and the label or a synonym, best value wins
//!
//! The fused score is their weighted mean. The embedding weight dominates so
//! that paraphrases still score; the lexical signals break near-ties toward
//! concepts that share vocabulary with the query.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::embedding::{EmbeddingCache, EmbeddingError, EmbeddingProvider};
use crate::ontology::{ConceptRecord, OntologyStore, StoreResult};
use crate::text::{canonical_form, TextNormalizer};

const WARM_UP_BATCH: usize = 64;

/// Relative weight of each signal in the fused score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
    pub embedding: f64,
    pub token: f64,
    pub surface: f64,
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            embedding: 0.65,
            token: 0.20,
            surface: 0.15,
        }
    }
}

impl FusionWeights {
    /// Minimum share of the total weight carried by the embedding signal.
    pub const MIN_EMBEDDING_SHARE: f64 = 0.6;

    pub fn total(&self) -> f64 {
        self.embedding + self.token + self.surface
    }

    pub fn validate(&self) -> Result<(), String> {
        let all = [self.embedding, self.token, self.surface];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("fusion weights must be finite and non-negative".into());
        }
        let total = self.total();
        if total <= 0.0 {
            return Err("fusion weights must not all be zero".into());
        }
        if self.embedding / total < Self::MIN_EMBEDDING_SHARE {
            return Err(format!(
                "embedding weight must be at least {:.0}% of the total, got {:.0}%",
                Self::MIN_EMBEDDING_SHARE * 100.0,
                self.embedding / total * 100.0
            ));
        }
        Ok(())
    }

    pub fn fuse(&self, scores: &SignalScores) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        let weighted = self.embedding * scores.embedding
            + self.token * scores.token
            + self.surface * scores.surface;
        (weighted / total).clamp(0.0, 1.0)
    }
}

/// Per-concept signal values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SignalScores {
    pub embedding: f64,
    pub token: f64,
    pub surface: f64,
}

/// Cosine similarity clamped to [0, 1].
///
/// Zero vectors give 0.0. Vectors of different length are an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, EmbeddingError> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(0.0, 1.0))
}

/// Jaccard index of two token sets. Two empty sets score 0.0.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for i in 1..=a_chars.len() {
        curr[0] = i;
        for j in 1..=b_chars.len() {
            let cost = if a_chars[i - 1] == b_chars[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}

/// `1 - distance / max_len` over canonical forms. Two empty strings score 0.0.
pub fn surface_similarity(a: &str, b: &str) -> f64 {
    let a = canonical_form(a);
    let b = canonical_form(b);
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    1.0 - levenshtein_distance(&a, &b) as f64 / max_len as f64
}

/// A query prepared once and scored against many concepts.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    pub description: String,
    pub tokens: BTreeSet<String>,
    pub vector: Arc<Vec<f32>>,
}

/// Outcome of [`SimilarityEngine::warm_up`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmUpReport {
    pub embedded: usize,
    pub failed: usize,
}

/// Computes and fuses the three similarity signals.
///
/// Owns the embedding cache; concept vectors are computed once per distinct
/// concept text for the life of the engine.
pub struct SimilarityEngine {
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    normalizer: TextNormalizer,
    weights: FusionWeights,
}

impl SimilarityEngine {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(),
            normalizer: TextNormalizer::new(),
            weights: FusionWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: FusionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn weights(&self) -> &FusionWeights {
        &self.weights
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Embed through the cache.
    pub async fn embed(&self, text: &str) -> Result<Arc<Vec<f32>>, EmbeddingError> {
        if let Some(hit) = self.cache.get(text) {
            return Ok(hit);
        }
        let vector = self.provider.embed(text).await?;
        if vector.is_empty() {
            return Err(EmbeddingError::EmptyResult);
        }
        Ok(self.cache.insert(text, vector))
    }

    /// Tokenize and embed a query. `context`, when present, is appended to
    /// the description for the embedding and token signals.
    pub async fn prepare_query(
        &self,
        description: &str,
        context: Option<&str>,
    ) -> Result<PreparedQuery, EmbeddingError> {
        let effective = match context.map(str::trim).filter(|c| !c.is_empty()) {
            Some(context) => format!("{} {}", description, context),
            None => description.to_string(),
        };
        let vector = self.embed(&effective).await?;
        Ok(PreparedQuery {
            description: description.to_string(),
            tokens: self.normalizer.normalize(&effective).tokens,
            vector,
        })
    }

    /// Best Jaccard over the concept label and each synonym.
    pub fn token_similarity(&self, query_tokens: &BTreeSet<String>, concept: &ConceptRecord) -> f64 {
        concept
            .names()
            .map(|name| jaccard(query_tokens, &self.normalizer.normalize(name).tokens))
            .fold(0.0, f64::max)
    }

    /// Best surface similarity over the concept label and each synonym.
    pub fn surface_similarity(&self, description: &str, concept: &ConceptRecord) -> f64 {
        concept
            .names()
            .map(|name| surface_similarity(description, name))
            .fold(0.0, f64::max)
    }

    /// All three signals for one concept.
    pub async fn score(
        &self,
        query: &PreparedQuery,
        concept: &ConceptRecord,
    ) -> Result<SignalScores, EmbeddingError> {
        let concept_vector = self.embed(&concept.embedding_text()).await?;
        Ok(SignalScores {
            embedding: cosine_similarity(&query.vector, &concept_vector)?,
            token: self.token_similarity(&query.tokens, concept),
            surface: self.surface_similarity(&query.description, concept),
        })
    }

    pub fn fuse(&self, scores: &SignalScores) -> f64 {
        self.weights.fuse(scores)
    }

    /// Pre-embed every concept in the store.
    ///
    /// Batches go through `embed_batch`; a failed batch falls back to
    /// embedding its items one at a time.
    pub async fn warm_up(&self, store: &dyn OntologyStore) -> StoreResult<WarmUpReport> {
        let pending: Vec<String> = store
            .list_concepts()?
            .iter()
            .map(|c| c.embedding_text())
            .filter(|text| self.cache.get(text).is_none())
            .collect();

        let mut report = WarmUpReport::default();
        for chunk in pending.chunks(WARM_UP_BATCH) {
            let texts: Vec<&str> = chunk.iter().map(|s| s.as_str()).collect();
            match self.provider.embed_batch(&texts).await {
                Ok(vectors) if vectors.len() == texts.len() => {
                    for (text, vector) in texts.iter().zip(vectors) {
                        self.cache.insert(text, vector);
                    }
                    report.embedded += texts.len();
                }
                Ok(_) | Err(_) => {
                    debug!(batch = texts.len(), "batch embedding failed, retrying per item");
                    for text in texts {
                        match self.embed(text).await {
                            Ok(_) => report.embedded += 1,
                            Err(e) => {
                                warn!(text, error = %e, "failed to embed concept");
                                report.failed += 1;
                            }
                        }
                    }
                }
            }
        }
        Ok(report)
    }
}
