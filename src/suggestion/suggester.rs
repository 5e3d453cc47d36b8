//! Description → proposed new concepts anchored in the hierarchy

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::heuristics::{
    infer_type, label_quality, label_variations, suggested_uri, synthesize_definition,
    with_contextual_label, TypeInference,
};
use crate::matching::{
    validate_description, ConceptMatcher, EngineError, EngineResult, MatchCandidate, MatchRequest,
    MAX_RESULTS_LIMIT,
};
use crate::ontology::{resolve_concept, ConceptRecord, ConceptType};

pub const MAX_PARENT_CHARS: usize = 500;
pub const MAX_RATIONALE_CHARS: usize = 2_000;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Parameters for [`ConceptSuggester::suggest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRequest {
    pub description: String,
    #[serde(default)]
    pub concept_type: Option<ConceptType>,
    #[serde(default)]
    pub parent_concept: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_max_suggestions() -> usize {
    DEFAULT_MAX_SUGGESTIONS
}

impl SuggestionRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            concept_type: None,
            parent_concept: None,
            rationale: None,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    pub fn with_type(mut self, concept_type: ConceptType) -> Self {
        self.concept_type = Some(concept_type);
        self
    }

    pub fn with_parent(mut self, parent_concept: impl Into<String>) -> Self {
        self.parent_concept = Some(parent_concept.into());
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self
    }

    pub fn validate(&self) -> EngineResult<()> {
        validate_description(&self.description)?;
        if let Some(parent) = &self.parent_concept {
            if parent.chars().count() > MAX_PARENT_CHARS {
                return Err(EngineError::InvalidRequest(format!(
                    "parent_concept exceeds {} characters",
                    MAX_PARENT_CHARS
                )));
            }
        }
        if let Some(rationale) = &self.rationale {
            if rationale.chars().count() > MAX_RATIONALE_CHARS {
                return Err(EngineError::InvalidRequest(format!(
                    "rationale exceeds {} characters",
                    MAX_RATIONALE_CHARS
                )));
            }
        }
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_suggestions) {
            return Err(EngineError::InvalidRequest(format!(
                "max_suggestions must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT, self.max_suggestions
            )));
        }
        Ok(())
    }
}

/// A proposed concept not yet in the ontology.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionCandidate {
    pub suggested_label: String,
    pub suggested_uri: String,
    pub concept_type: ConceptType,
    pub definition: String,
    pub parent_uri: Option<String>,
    pub rationale: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionOutcome {
    pub suggestions: Vec<SuggestionCandidate>,
    pub mapping_attempted: bool,
    pub mapping_failed_reason: Option<String>,
    /// Set when an existing concept was good enough and nothing was proposed
    pub accepted_match: Option<MatchCandidate>,
    pub warnings: Vec<String>,
}

/// Thresholds and naming for proposals.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggesterConfig {
    /// A match at or above this score is accepted instead of proposing
    pub acceptance_threshold: f64,
    /// Floor for the preliminary match that also feeds parent placement
    pub match_floor: f64,
    pub uri_base: String,
}

impl Default for SuggesterConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: 0.8,
            match_floor: 0.3,
            uri_base: "http://edamontology.org/".to_string(),
        }
    }
}

// Confidence = BASE + NEAREST·similarity + TYPE·strength + LABEL·quality
const BASE_CONFIDENCE: f64 = 0.2;
const NEAREST_WEIGHT: f64 = 0.4;
const TYPE_WEIGHT: f64 = 0.25;
const LABEL_WEIGHT: f64 = 0.15;

/// Where a proposal hangs in the hierarchy and how close it is to it.
struct Placement {
    uri: String,
    label: String,
    similarity: f64,
}

impl Placement {
    fn from_candidate(candidate: &MatchCandidate) -> Self {
        Self {
            uri: candidate.uri.clone(),
            label: candidate.label.clone(),
            similarity: candidate.confidence,
        }
    }
}

/// Proposes new concepts when matching finds nothing good enough.
pub struct ConceptSuggester {
    matcher: Arc<ConceptMatcher>,
    config: SuggesterConfig,
}

impl ConceptSuggester {
    pub fn new(matcher: Arc<ConceptMatcher>) -> Self {
        Self {
            matcher,
            config: SuggesterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SuggesterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SuggesterConfig {
        &self.config
    }

    pub fn matcher(&self) -> &Arc<ConceptMatcher> {
        &self.matcher
    }

    /// Match first; propose new concepts only when no match is accepted.
    ///
    /// Only an invalid request is an error. Matching and lookup failures are
    /// reported in `mapping_failed_reason` and `warnings`.
    pub async fn suggest(&self, request: &SuggestionRequest) -> EngineResult<SuggestionOutcome> {
        request.validate()?;
        let acceptance = self.config.acceptance_threshold;
        let mut warnings = Vec::new();

        let match_request = MatchRequest {
            description: request.description.clone(),
            context: request.rationale.clone(),
            max_results: MAX_RESULTS_LIMIT,
            min_confidence: self.config.match_floor,
        };
        let (candidates, mapping_failed_reason) = match self.matcher.match_concepts(&match_request).await {
            Ok(outcome) => {
                warnings.extend(outcome.warnings);
                if let Some(top) = outcome.matches.first() {
                    if top.confidence >= acceptance {
                        info!(uri = %top.uri, confidence = top.confidence, "existing concept accepted");
                        return Ok(SuggestionOutcome {
                            suggestions: Vec::new(),
                            mapping_attempted: true,
                            mapping_failed_reason: None,
                            accepted_match: Some(top.clone()),
                            warnings,
                        });
                    }
                }
                let reason = match outcome.matches.first() {
                    Some(best) => format!(
                        "no match above {:.2} (best: '{}' at {:.2})",
                        acceptance, best.label, best.confidence
                    ),
                    None => format!("no match above {:.2}", acceptance),
                };
                (outcome.matches, reason)
            }
            Err(e) => {
                warn!(error = %e, "concept matching failed, proposing without it");
                (Vec::new(), format!("concept matching failed: {}", e))
            }
        };

        let normalizer = *self.matcher.similarity().normalizer();
        let inference = match request.concept_type {
            Some(concept_type) => TypeInference::supplied(concept_type),
            None => infer_type(&normalizer.normalize(&request.description).tokens),
        };

        // Closest existing concept, independent of where the proposal is placed
        let mut nearest_error = None;
        let nearest = match candidates.first() {
            Some(top) => Some(top.clone()),
            None => match self
                .matcher
                .nearest_concept(&request.description, request.rationale.as_deref())
                .await
            {
                Ok(nearest) => nearest,
                Err(e) => {
                    warn!(error = %e, "nearest concept lookup failed");
                    nearest_error = Some(e);
                    None
                }
            },
        };
        let nearest_similarity = nearest.as_ref().map(|n| n.confidence).unwrap_or(0.0);

        let (placement, unresolved_parent) = self
            .place(request, inference.concept_type, &candidates, nearest.as_ref(), &mut warnings)
            .await;
        if placement.is_none() {
            warnings.push(match nearest_error {
                Some(e) => format!("parent placement unavailable: {}", e),
                None => "no existing concept available for parent placement".to_string(),
            });
        }

        let store = self.matcher.store();
        let mut labels = label_variations(&request.description, inference.concept_type);
        if let Some(parent) = &placement {
            labels = with_contextual_label(labels, &request.description, &parent.label);
        }
        let labels: Vec<String> = labels
            .into_iter()
            .filter(|label| {
                let uri = suggested_uri(&self.config.uri_base, label);
                !matches!(store.get_concept(&uri), Ok(Some(_)))
            })
            .collect();

        let definition = synthesize_definition(&request.description, request.rationale.as_deref());
        let rationale = self.rationale(
            request,
            nearest.as_ref(),
            placement.as_ref(),
            unresolved_parent.as_deref(),
        );

        let mut suggestions: Vec<SuggestionCandidate> = labels
            .into_iter()
            .map(|label| {
                let label_type = match request.concept_type {
                    Some(_) => inference,
                    None => {
                        let own = infer_type(&normalizer.normalize(&label).tokens);
                        if !own.defaulted && own.concept_type != inference.concept_type {
                            own
                        } else {
                            inference
                        }
                    }
                };
                let confidence = BASE_CONFIDENCE
                    + NEAREST_WEIGHT * nearest_similarity
                    + TYPE_WEIGHT * label_type.strength
                    + LABEL_WEIGHT * label_quality(&label, &request.description);
                SuggestionCandidate {
                    suggested_uri: suggested_uri(&self.config.uri_base, &label),
                    suggested_label: label,
                    concept_type: label_type.concept_type,
                    definition: definition.clone(),
                    parent_uri: placement.as_ref().map(|p| p.uri.clone()),
                    rationale: rationale.clone(),
                    confidence: confidence.clamp(0.0, 1.0),
                }
            })
            .collect();

        suggestions.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.suggested_label.cmp(&b.suggested_label))
        });
        suggestions.truncate(request.max_suggestions);

        info!(
            suggestions = suggestions.len(),
            concept_type = %inference.concept_type,
            parent = placement.as_ref().map(|p| p.uri.as_str()).unwrap_or("-"),
            "proposed new concepts"
        );

        Ok(SuggestionOutcome {
            suggestions,
            mapping_attempted: true,
            mapping_failed_reason: Some(mapping_failed_reason),
            accepted_match: None,
            warnings,
        })
    }

    /// Resolve the parent for all proposals.
    ///
    /// A caller-supplied parent wins when it resolves; otherwise it becomes a
    /// hint and placement falls back to the closest existing concept,
    /// preferring one of the proposal's type.
    async fn place(
        &self,
        request: &SuggestionRequest,
        concept_type: ConceptType,
        candidates: &[MatchCandidate],
        nearest: Option<&MatchCandidate>,
        warnings: &mut Vec<String>,
    ) -> (Option<Placement>, Option<String>) {
        let store = self.matcher.store();
        let mut unresolved = None;

        if let Some(reference) = request.parent_concept.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            match resolve_concept(store.as_ref(), reference) {
                Ok(Some(parent)) => {
                    let similarity = self.similarity_to(request, &parent, candidates).await;
                    return (
                        Some(Placement {
                            uri: parent.uri,
                            label: parent.label,
                            similarity,
                        }),
                        None,
                    );
                }
                Ok(None) => {
                    warnings.push(format!(
                        "parent concept '{}' not found; treated as a hint",
                        reference
                    ));
                }
                Err(e) => {
                    warn!(error = %e, "parent lookup failed");
                    warnings.push(format!("parent concept '{}' could not be resolved: {}", reference, e));
                }
            }
            unresolved = Some(reference.to_string());
        }

        let preferred = candidates
            .iter()
            .find(|c| c.concept_type == Some(concept_type))
            .or(nearest);
        (preferred.map(Placement::from_candidate), unresolved)
    }

    /// Fused similarity between the request and a specific concept.
    async fn similarity_to(
        &self,
        request: &SuggestionRequest,
        concept: &ConceptRecord,
        candidates: &[MatchCandidate],
    ) -> f64 {
        if let Some(known) = candidates.iter().find(|c| c.uri == concept.uri) {
            return known.confidence;
        }
        let engine = self.matcher.similarity();
        let query = match engine
            .prepare_query(&request.description, request.rationale.as_deref())
            .await
        {
            Ok(query) => query,
            Err(e) => {
                debug!(error = %e, "could not embed request for parent scoring");
                return 0.0;
            }
        };
        match engine.score(&query, concept).await {
            Ok(signals) => engine.fuse(&signals),
            Err(e) => {
                debug!(uri = %concept.uri, error = %e, "could not score requested parent");
                0.0
            }
        }
    }

    fn rationale(
        &self,
        request: &SuggestionRequest,
        nearest: Option<&MatchCandidate>,
        placement: Option<&Placement>,
        unresolved_parent: Option<&str>,
    ) -> String {
        let threshold = self.config.acceptance_threshold;
        let mut text = match (&request.rationale, placement) {
            (Some(given), _) if !given.trim().is_empty() => given.trim().to_string(),
            (_, Some(p)) => {
                let mut text = match nearest {
                    Some(n) => format!(
                        "No existing concept matched above {:.2}; the closest is '{}' ({}) at {:.2}.",
                        threshold, n.label, n.uri, n.confidence
                    ),
                    None => format!("No existing concept matched above {:.2}.", threshold),
                };
                if nearest.map_or(true, |n| n.uri != p.uri) {
                    text.push_str(&format!(" Placed under '{}' ({}) at {:.2}.", p.label, p.uri, p.similarity));
                }
                text
            }
            (_, None) => format!(
                "No existing concept matched above {:.2} and none was close enough to anchor this proposal.",
                threshold
            ),
        };
        if let Some(hint) = unresolved_parent {
            text.push_str(&format!(" Requested parent '{}' is not in the ontology.", hint));
        }
        text
    }
}
