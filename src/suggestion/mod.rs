//! Proposing new concepts when nothing in the catalog fits

pub mod heuristics;
mod suggester;

pub use heuristics::{infer_type, label_variations, suggested_uri, TypeInference};
pub use suggester::{
    ConceptSuggester, SuggesterConfig, SuggestionCandidate, SuggestionOutcome, SuggestionRequest,
    DEFAULT_MAX_SUGGESTIONS, MAX_PARENT_CHARS, MAX_RATIONALE_CHARS,
};
