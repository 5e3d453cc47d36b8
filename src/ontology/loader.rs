//! Snapshot loading with an optional on-disk cache

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use super::cache::CatalogCache;
use super::concept::ConceptRecord;
use super::store::{InMemoryOntology, OntologyStore, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// `.yaml`/`.yml` are YAML, everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "yaml" || ext == "yml" => SnapshotFormat::Yaml,
            _ => SnapshotFormat::Json,
        }
    }
}

/// Snapshots are either a bare list or `{ concepts: [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    List(Vec<ConceptRecord>),
    Wrapped { concepts: Vec<ConceptRecord> },
}

impl SnapshotDocument {
    fn into_records(self) -> Vec<ConceptRecord> {
        match self {
            SnapshotDocument::List(records) => records,
            SnapshotDocument::Wrapped { concepts } => concepts,
        }
    }
}

/// Parse snapshot text into raw records.
pub fn parse_snapshot(text: &str, format: SnapshotFormat) -> StoreResult<Vec<ConceptRecord>> {
    let document: SnapshotDocument = match format {
        SnapshotFormat::Json => serde_json::from_str(text)?,
        SnapshotFormat::Yaml => serde_yaml::from_str(text)?,
    };
    Ok(document.into_records())
}

/// Loads the catalog from a snapshot file, consulting the cache first.
pub struct OntologyLoader {
    snapshot_path: PathBuf,
    cache: Option<(PathBuf, Duration)>,
}

impl OntologyLoader {
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache_path: impl Into<PathBuf>, ttl: Duration) -> Self {
        self.cache = Some((cache_path.into(), ttl));
        self
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Load the catalog.
    ///
    /// A fresh cached snapshot is used when the snapshot file has not changed
    /// since it was cached. Cache failures are logged and never fatal.
    pub fn load(&self) -> StoreResult<InMemoryOntology> {
        let source = self.snapshot_path.display().to_string();

        let cache = match &self.cache {
            Some((path, ttl)) => match CatalogCache::open(path) {
                Ok(cache) => Some((cache, *ttl)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "catalog cache unavailable");
                    None
                }
            },
            None => None,
        };

        if let Some((cache, ttl)) = &cache {
            match self.cached_records(cache, &source, *ttl) {
                Ok(Some(records)) => {
                    info!(concepts = records.len(), source = %source, "loaded catalog from cache");
                    return Ok(InMemoryOntology::from_records(records));
                }
                Ok(None) => debug!(source = %source, "catalog cache miss"),
                Err(e) => warn!(error = %e, "catalog cache read failed"),
            }
        }

        let text = std::fs::read_to_string(&self.snapshot_path)?;
        let records = parse_snapshot(&text, SnapshotFormat::from_path(&self.snapshot_path))?;
        let parsed = records.len();
        let catalog = InMemoryOntology::from_records(records);
        if catalog.is_empty() && parsed > 0 {
            return Err(StoreError::InvalidCatalog(format!(
                "{}: none of {} records were usable",
                source, parsed
            )));
        }
        info!(concepts = catalog.len(), skipped = parsed - catalog.len(), source = %source, "loaded catalog snapshot");

        if let Some((cache, _)) = &cache {
            let normalized: Vec<ConceptRecord> = catalog.iter().cloned().collect();
            if let Err(e) = cache.store(&source, &normalized) {
                warn!(error = %e, "failed to refresh catalog cache");
            }
        }

        Ok(catalog)
    }

    fn cached_records(
        &self,
        cache: &CatalogCache,
        source: &str,
        ttl: Duration,
    ) -> StoreResult<Option<Vec<ConceptRecord>>> {
        if let (Some((_, cached_at)), Some(modified)) = (cache.snapshot_info()?, self.snapshot_modified()) {
            let cached_at: SystemTime = cached_at.into();
            if modified > cached_at {
                return Ok(None);
            }
        }
        cache.load_fresh(source, ttl)
    }

    fn snapshot_modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.snapshot_path).and_then(|m| m.modified()).ok()
    }
}
