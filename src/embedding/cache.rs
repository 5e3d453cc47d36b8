//! Process-lifetime embedding cache.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::text::canonical_form;

/// Embedding vectors keyed by the canonical form of the embedded text.
///
/// Insert-if-absent: the first vector stored for a key is the one every later
/// reader sees. Concurrent misses may compute the same vector twice, but the
/// cache never holds two values for one key.
pub struct EmbeddingCache {
    entries: DashMap<String, Arc<Vec<f32>>>,
    /// When set, vectors past this many entries are computed but not retained
    capacity: Option<usize>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            capacity: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// Cache key for a text.
    pub fn key(text: &str) -> String {
        canonical_form(text)
    }

    pub fn get(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        self.entries.get(&Self::key(text)).map(|e| Arc::clone(e.value()))
    }

    /// Store `vector` unless the key is already present or the cache is full.
    ///
    /// Returns the vector callers should use: the resident one when the key
    /// was already cached.
    pub fn insert(&self, text: &str, vector: Vec<f32>) -> Arc<Vec<f32>> {
        let key = Self::key(text);
        if let Some(existing) = self.entries.get(&key) {
            return Arc::clone(existing.value());
        }
        let vector = Arc::new(vector);
        if let Some(cap) = self.capacity {
            if self.entries.len() >= cap {
                debug!(capacity = cap, "embedding cache full, not retaining vector");
                return vector;
            }
        }
        Arc::clone(self.entries.entry(key).or_insert(vector).value())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_canonical() {
        let cache = EmbeddingCache::new();
        cache.insert("Sequence  Alignment", vec![1.0, 0.0]);
        assert!(cache.get("sequence alignment").is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn first_writer_wins() {
        let cache = EmbeddingCache::new();
        let first = cache.insert("fasta", vec![1.0]);
        let second = cache.insert("FASTA", vec![2.0]);
        assert_eq!(*first, vec![1.0]);
        assert_eq!(*second, vec![1.0]);
        assert_eq!(*cache.get("fasta").unwrap(), vec![1.0]);
    }

    #[test]
    fn full_cache_returns_vector_without_retaining() {
        let cache = EmbeddingCache::with_capacity(1);
        cache.insert("a", vec![1.0]);
        let v = cache.insert("b", vec![2.0]);
        assert_eq!(*v, vec![2.0]);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_cache() {
        let cache = EmbeddingCache::new();
        cache.insert("x", vec![0.5]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
