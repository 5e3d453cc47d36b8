//! Matching descriptions against the catalog

mod error;
mod matcher;
mod similarity;

pub use error::{EngineError, EngineResult};
pub(crate) use matcher::validate_description;
pub use matcher::{
    ConceptMatcher, MatchCandidate, MatchOutcome, MatchRequest, DEFAULT_MAX_RESULTS,
    DEFAULT_MIN_CONFIDENCE, MAX_CONTEXT_CHARS, MAX_DESCRIPTION_CHARS, MAX_RESULTS_LIMIT,
};
pub use similarity::{
    cosine_similarity, jaccard, levenshtein_distance, surface_similarity, FusionWeights,
    PreparedQuery, SignalScores, SimilarityEngine, WarmUpReport,
};
