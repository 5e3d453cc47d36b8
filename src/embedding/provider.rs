//! Embedding backends
//!
//! `EmbeddingProvider` is the only suspending seam of the engine. Production
//! deployments use fastembed (behind the `embeddings` feature); without it the
//! feature-hashing embedder keeps the server usable with lexical-semantic
//! vectors. Tests use deterministic mocks.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

use crate::text::TextNormalizer;

/// Errors from embedding computation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbeddingError {
    /// The model returned no vectors
    #[error("embedding returned no results")]
    EmptyResult,

    /// Model loading or inference failed
    #[error("embedding model error: {0}")]
    ModelError(String),

    /// Two vectors of different length were compared
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Maps text to a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifies the model (logged and reported by the server).
    fn model_name(&self) -> &str;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts, one vector per text.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

// ---------------------------------------------------------------------------
// HashingEmbedder: dependency-free fallback
// ---------------------------------------------------------------------------

/// Feature-hashing embedder over word stems and character trigrams.
///
/// Deterministic for a given dimension and build. Vectors come from
/// `DefaultHasher`, whose algorithm may change between Rust releases, so
/// cached vectors should not outlive the binary that produced them. It only
/// captures lexical overlap, so paraphrases score lower than with a real model.
pub struct HashingEmbedder {
    dimensions: usize,
    normalizer: TextNormalizer,
    name: String,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            normalizer: TextNormalizer::new(),
            name: format!("hashing-{}", dimensions.max(1)),
        }
    }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let index = (h % self.dimensions as u64) as usize;
        // Sign bit reduces collision bias
        let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
        (index, sign)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in self.normalizer.tokens(text) {
            let (i, sign) = self.bucket(&token);
            vector[i] += 2.0 * sign;

            let padded: Vec<char> = format!("#{}#", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                let (i, sign) = self.bucket(&trigram);
                vector[i] += 0.5 * sign;
            }
        }
        Ok(vector)
    }
}

// ---------------------------------------------------------------------------
// FastEmbedProvider: ONNX models behind the `embeddings` feature
// ---------------------------------------------------------------------------

#[cfg(feature = "embeddings")]
mod fastembed_impl {
    use super::{EmbeddingError, EmbeddingProvider};
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    /// Embedder backed by fastembed (ONNX Runtime).
    ///
    /// `TextEmbedding::embed` needs `&mut self`, hence the `Mutex`.
    pub struct FastEmbedProvider {
        model: Mutex<TextEmbedding>,
        name: String,
    }

    impl FastEmbedProvider {
        /// Load a model by its common name, e.g. `all-MiniLM-L6-v2`.
        pub fn from_name(name: &str) -> Result<Self, EmbeddingError> {
            let model = match name.to_ascii_lowercase().as_str() {
                "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
                    EmbeddingModel::AllMiniLML6V2
                }
                "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
                "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
                    EmbeddingModel::NomicEmbedTextV15
                }
                other => {
                    return Err(EmbeddingError::ModelError(format!(
                        "unsupported embedding model: {}",
                        other
                    )))
                }
            };
            let options = InitOptions::new(model).with_show_download_progress(false);
            let embedding = TextEmbedding::try_new(options)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(embedding),
                name: name.to_string(),
            })
        }

        fn run(&self, texts: Vec<&str>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let mut model = self
                .model
                .lock()
                .map_err(|_| EmbeddingError::ModelError("embedding model lock poisoned".into()))?;
            let vectors = model
                .embed(texts, None)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            if vectors.is_empty() {
                return Err(EmbeddingError::EmptyResult);
            }
            Ok(vectors)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FastEmbedProvider {
        fn model_name(&self) -> &str {
            &self.name
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.run(vec![text])?
                .into_iter()
                .next()
                .ok_or(EmbeddingError::EmptyResult)
        }

        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            self.run(texts.to_vec())
        }
    }
}

#[cfg(feature = "embeddings")]
pub use fastembed_impl::FastEmbedProvider;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::cosine_similarity;

    #[tokio::test]
    async fn hashing_embedder_is_deterministic() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("sequence alignment").await.unwrap();
        let b = embedder.embed("sequence alignment").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn hashing_embedder_separates_unrelated_text() {
        let embedder = HashingEmbedder::new(256);
        let align = embedder.embed("sequence alignment").await.unwrap();
        let aligned = embedder.embed("aligned sequences").await.unwrap();
        let mass = embedder.embed("mass spectrometry").await.unwrap();

        let close = cosine_similarity(&align, &aligned).unwrap();
        let far = cosine_similarity(&align, &mass).unwrap();
        assert!(close > far, "close={} far={}", close, far);
    }

    #[tokio::test]
    async fn hashing_embedder_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(16);
        let v = embedder.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn default_batch_embeds_in_order() {
        let embedder = HashingEmbedder::new(32);
        let batch = embedder.embed_batch(&["fasta", "fastq"]).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], embedder.embed("fasta").await.unwrap());
        assert_eq!(batch[1], embedder.embed("fastq").await.unwrap());
    }

    #[cfg(feature = "embeddings")]
    #[tokio::test]
    #[ignore] // requires model download
    async fn fastembed_default_model_embeds_text() {
        let embedder = super::FastEmbedProvider::from_name("all-MiniLM-L6-v2").expect("model should load");
        let result = embedder.embed_batch(&["sequence alignment"]).await.expect("should embed");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].len(), 384);
    }

    #[cfg(feature = "embeddings")]
    #[test]
    fn fastembed_rejects_unknown_model_name() {
        let err = super::FastEmbedProvider::from_name("word2vec-classic").err();
        assert!(matches!(err, Some(EmbeddingError::ModelError(_))));
    }
}
