//! Runtime settings.
//!
//! Layered lowest to highest: built-in defaults, an optional YAML file,
//! `EDAM_*` environment variables, then CLI flags (applied by the binary).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::matching::{FusionWeights, MAX_RESULTS_LIMIT};
use crate::suggestion::SuggesterConfig;

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "EDAM_";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Catalog snapshot (JSON or YAML list of concepts)
    pub ontology_path: PathBuf,
    /// SQLite snapshot cache; `None` disables caching
    pub ontology_cache_path: Option<PathBuf>,
    pub cache_ttl_secs: u64,
    /// Default `min_confidence` for match requests
    pub similarity_threshold: f64,
    pub max_suggestions: usize,
    pub acceptance_threshold: f64,
    pub suggestion_match_floor: f64,
    pub embedding_model: String,
    /// Vector size of the hashing embedder
    pub embedding_dimensions: usize,
    pub embedding_cache_capacity: Option<usize>,
    pub fusion: FusionWeights,
    pub uri_base: String,
    pub log_level: String,
}

/// `~/.local/share/edam-mcp` or the platform equivalent.
pub fn default_data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("edam-mcp")
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            ontology_path: data_dir.join("edam.json"),
            ontology_cache_path: Some(data_dir.join("catalog.db")),
            cache_ttl_secs: 3600,
            similarity_threshold: 0.7,
            max_suggestions: 5,
            acceptance_threshold: 0.8,
            suggestion_match_floor: 0.3,
            embedding_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dimensions: 384,
            embedding_cache_capacity: None,
            fusion: FusionWeights::default(),
            uri_base: "http://edamontology.org/".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Parse YAML; missing keys keep their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Defaults, then `path` if given, then the process environment. Validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `EDAM_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = get("ONTOLOGY_PATH") {
            self.ontology_path = PathBuf::from(v);
        }
        if let Some(v) = get("ONTOLOGY_CACHE_PATH") {
            self.ontology_cache_path = if v.trim().is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Some(v) = get("CACHE_TTL") {
            self.cache_ttl_secs = parse_env("CACHE_TTL", &v)?;
        }
        if let Some(v) = get("SIMILARITY_THRESHOLD") {
            self.similarity_threshold = parse_env("SIMILARITY_THRESHOLD", &v)?;
        }
        if let Some(v) = get("MAX_SUGGESTIONS") {
            self.max_suggestions = parse_env("MAX_SUGGESTIONS", &v)?;
        }
        if let Some(v) = get("ACCEPTANCE_THRESHOLD") {
            self.acceptance_threshold = parse_env("ACCEPTANCE_THRESHOLD", &v)?;
        }
        if let Some(v) = get("SUGGESTION_MATCH_FLOOR") {
            self.suggestion_match_floor = parse_env("SUGGESTION_MATCH_FLOOR", &v)?;
        }
        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embedding_model = v;
        }
        if let Some(v) = get("EMBEDDING_DIMENSIONS") {
            self.embedding_dimensions = parse_env("EMBEDDING_DIMENSIONS", &v)?;
        }
        if let Some(v) = get("EMBEDDING_CACHE_CAPACITY") {
            self.embedding_cache_capacity = if v.trim().is_empty() {
                None
            } else {
                Some(parse_env("EMBEDDING_CACHE_CAPACITY", &v)?)
            };
        }
        if let Some(v) = get("URI_BASE") {
            self.uri_base = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("acceptance_threshold", self.acceptance_threshold),
            ("suggestion_match_floor", self.suggestion_match_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.suggestion_match_floor >= self.acceptance_threshold {
            return Err(ConfigError::Invalid(format!(
                "suggestion_match_floor ({}) must be below acceptance_threshold ({})",
                self.suggestion_match_floor, self.acceptance_threshold
            )));
        }
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_suggestions) {
            return Err(ConfigError::Invalid(format!(
                "max_suggestions must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT, self.max_suggestions
            )));
        }
        if self.embedding_dimensions == 0 {
            return Err(ConfigError::Invalid("embedding_dimensions must be positive".into()));
        }
        if self.embedding_cache_capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "embedding_cache_capacity must be positive when set".into(),
            ));
        }
        if self.uri_base.trim().is_empty() {
            return Err(ConfigError::Invalid("uri_base must not be empty".into()));
        }
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log_level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.log_level
            )));
        }
        self.fusion.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn suggester_config(&self) -> SuggesterConfig {
        SuggesterConfig {
            acceptance_threshold: self.acceptance_threshold,
            match_floor: self.suggestion_match_floor,
            uri_base: self.uri_base.clone(),
        }
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| {
        ConfigError::Invalid(format!("{}{}='{}': {}", ENV_PREFIX, name, value, e))
    })
}
