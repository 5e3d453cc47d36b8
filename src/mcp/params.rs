//! MCP tool parameter structs with schemars-derived JSON schemas.

use schemars::JsonSchema;
use serde::Deserialize;

// ── Mapping & suggestion ────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MapParams {
    #[schemars(description = "Description of the tool, data or workflow step to map (1-10000 characters)")]
    pub description: String,
    #[schemars(description = "Additional context, e.g. the surrounding workflow (max 2000 characters)")]
    pub context: Option<String>,
    #[schemars(description = "Maximum number of matches to return (1-20, default 5)")]
    pub max_results: Option<usize>,
    #[schemars(description = "Minimum confidence for a match (0.0-1.0, default from server settings)")]
    pub min_confidence: Option<f64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SuggestParams {
    #[schemars(description = "Description of the concept that needs an EDAM term")]
    pub description: String,
    #[schemars(description = "Concept type: Operation, Data, Format, Topic or Identifier (inferred when omitted)")]
    pub concept_type: Option<String>,
    #[schemars(description = "Preferred parent concept: URI, short id (operation_0296) or label")]
    pub parent_concept: Option<String>,
    #[schemars(description = "Why a new concept is needed (max 2000 characters)")]
    pub rationale: Option<String>,
    #[schemars(description = "Maximum number of suggestions (1-20, default from server settings)")]
    pub max_suggestions: Option<usize>,
}

// ── Catalog lookups ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ConceptRefParams {
    #[schemars(description = "Concept URI, short id (operation_0296) or exact label")]
    pub concept: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct NeighborsParams {
    #[schemars(description = "Concept URI, short id or exact label")]
    pub concept: String,
    #[schemars(description = "Maximum hops along parent/child edges (1-5, default 2)")]
    pub max_distance: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Case-insensitive text to find in labels, definitions and synonyms")]
    pub query: String,
    #[schemars(description = "Maximum number of results (default 10)")]
    pub max_results: Option<usize>,
}
