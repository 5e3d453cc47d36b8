//! Hierarchy navigation over an [`OntologyStore`]

use serde::Serialize;
use std::collections::{HashSet, VecDeque};

use super::concept::{ConceptRecord, ConceptType};
use super::store::{OntologyStore, StoreResult};

/// Confidence lost per hop away from the origin concept.
pub const NEIGHBOR_DECAY: f64 = 0.2;

/// A concept reached by walking parent/child edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub uri: String,
    pub label: String,
    pub concept_type: Option<ConceptType>,
    pub distance: usize,
    pub confidence: f64,
}

/// Breadth-first walk over parents and children up to `max_distance` hops.
///
/// The origin is excluded. Each concept is reported once, at its shortest
/// distance, so cyclic catalogs terminate. Ordered by distance then uri.
/// Unknown origin gives an empty list.
pub fn neighbors(
    store: &dyn OntologyStore,
    uri: &str,
    max_distance: usize,
) -> StoreResult<Vec<Neighbor>> {
    let mut found = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, usize)> = VecDeque::new();
    queue.push_back((uri.to_string(), 0));

    while let Some((current, distance)) = queue.pop_front() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let Some(concept) = store.get_concept(&current)? else {
            continue;
        };
        if distance > 0 {
            found.push(Neighbor {
                uri: concept.uri.clone(),
                label: concept.label.clone(),
                concept_type: concept.kind(),
                distance,
                confidence: (1.0 - NEIGHBOR_DECAY * distance as f64).max(0.0),
            });
        }
        if distance < max_distance {
            for next in concept.parents.iter().chain(concept.children.iter()) {
                if !visited.contains(next) {
                    queue.push_back((next.clone(), distance + 1));
                }
            }
        }
    }

    found.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.uri.cmp(&b.uri)));
    Ok(found)
}

/// Labels from the root down to `uri`, following the first parent.
///
/// Stops at a cycle or a reference that does not resolve.
pub fn lineage(store: &dyn OntologyStore, uri: &str) -> StoreResult<Vec<String>> {
    let mut path = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current = Some(uri.to_string());

    while let Some(current_uri) = current.take() {
        if !seen.insert(current_uri.clone()) {
            break;
        }
        let Some(concept) = store.get_concept(&current_uri)? else {
            break;
        };
        path.push(concept.label.clone());
        current = concept.parents.iter().next().cloned();
    }

    path.reverse();
    Ok(path)
}

/// Case-insensitive substring search over label, definition and synonyms.
pub fn search(
    store: &dyn OntologyStore,
    query: &str,
    max_results: usize,
) -> StoreResult<Vec<ConceptRecord>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Ok(Vec::new());
    }
    Ok(store
        .list_concepts()?
        .into_iter()
        .filter(|c| {
            c.label.to_lowercase().contains(&needle)
                || c.definition
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
                || c.synonyms.iter().any(|s| s.to_lowercase().contains(&needle))
        })
        .take(max_results)
        .collect())
}

pub fn concepts_of_type(
    store: &dyn OntologyStore,
    concept_type: ConceptType,
) -> StoreResult<Vec<ConceptRecord>> {
    Ok(store
        .list_concepts()?
        .into_iter()
        .filter(|c| c.kind() == Some(concept_type))
        .collect())
}
