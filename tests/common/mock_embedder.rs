//! Deterministic embedders for scenario tests
//!
//! `MockEmbedder` counts words from a fixed vocabulary, one axis per
//! meaning. Words outside the vocabulary are ignored, so cosine
//! similarities between short texts are easy to compute by hand.

use async_trait::async_trait;
use edam_mcp::{EmbeddingError, EmbeddingProvider};

/// word → axis. "folding" counts as a prediction word.
const VOCABULARY: &[(&str, usize)] = &[
    ("sequence", 0),
    ("sequences", 0),
    ("alignment", 1),
    ("align", 1),
    ("aligning", 1),
    ("protein", 2),
    ("proteins", 2),
    ("structure", 3),
    ("structural", 3),
    ("prediction", 4),
    ("predict", 4),
    ("folding", 4),
    ("analysis", 5),
    ("analyse", 5),
    ("fasta", 6),
    ("format", 6),
    ("operation", 7),
];

const DIMENSIONS: usize = 8;

#[derive(Default)]
pub struct MockEmbedder;

impl MockEmbedder {
    pub fn new() -> Self {
        Self
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            if let Some((_, axis)) = VOCABULARY.iter().find(|(w, _)| *w == word) {
                vector[*axis] += 1.0;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn model_name(&self) -> &str {
        "mock-vocabulary"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(Self::vector(text))
    }
}

/// Fails every call.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    fn model_name(&self) -> &str {
        "failing"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::ModelError("model offline".into()))
    }
}

/// Like [`MockEmbedder`] but fails for one exact text.
pub struct PartialFailingEmbedder {
    poisoned: String,
}

impl PartialFailingEmbedder {
    pub fn new(poisoned: impl Into<String>) -> Self {
        Self {
            poisoned: poisoned.into(),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for PartialFailingEmbedder {
    fn model_name(&self) -> &str {
        "partial-failing"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text == self.poisoned {
            return Err(EmbeddingError::ModelError(format!("cannot embed '{}'", text)));
        }
        Ok(MockEmbedder::vector(text))
    }
}
