//! Concept records and the EDAM concept-type enumeration

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The five EDAM sub-ontologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConceptType {
    Operation,
    Data,
    Format,
    Topic,
    Identifier,
}

impl ConceptType {
    /// All variants in declaration order.
    pub const ALL: [ConceptType; 5] = [
        ConceptType::Operation,
        ConceptType::Data,
        ConceptType::Format,
        ConceptType::Topic,
        ConceptType::Identifier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptType::Operation => "Operation",
            ConceptType::Data => "Data",
            ConceptType::Format => "Format",
            ConceptType::Topic => "Topic",
            ConceptType::Identifier => "Identifier",
        }
    }

    /// Lowercase prefix used in EDAM local names (`operation_0296`).
    pub fn prefix(&self) -> &'static str {
        match self {
            ConceptType::Operation => "operation",
            ConceptType::Data => "data",
            ConceptType::Format => "format",
            ConceptType::Topic => "topic",
            ConceptType::Identifier => "identifier",
        }
    }

    /// Derive the type from a concept URI.
    ///
    /// The local name prefix decides when present; otherwise the first type
    /// name contained in the URI wins, checked in declaration order.
    pub fn from_uri(uri: &str) -> Option<Self> {
        let lower = uri.to_ascii_lowercase();
        let local = local_name(&lower);
        Self::ALL
            .iter()
            .find(|t| local.starts_with(&format!("{}_", t.prefix())))
            .or_else(|| Self::ALL.iter().find(|t| lower.contains(t.prefix())))
            .copied()
    }
}

impl fmt::Display for ConceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConceptType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| {
                format!(
                    "unknown concept type '{}' (expected Operation, Data, Format, Topic or Identifier)",
                    s
                )
            })
    }
}

/// Part of a URI after the last `/` or `#`.
pub fn local_name(uri: &str) -> &str {
    uri.rsplit(|c| c == '/' || c == '#').next().unwrap_or(uri)
}

/// One ontology concept as loaded from a snapshot.
///
/// `concept_type` may be omitted in snapshot files; the loader derives it
/// from the URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptRecord {
    pub uri: String,
    pub label: String,
    #[serde(rename = "type", alias = "concept_type", default)]
    pub concept_type: Option<ConceptType>,
    #[serde(default)]
    pub definition: Option<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub parents: BTreeSet<String>,
    #[serde(default)]
    pub children: BTreeSet<String>,
}

impl ConceptRecord {
    pub fn new(uri: impl Into<String>, label: impl Into<String>, concept_type: ConceptType) -> Self {
        Self {
            uri: uri.into(),
            label: label.into(),
            concept_type: Some(concept_type),
            definition: None,
            synonyms: Vec::new(),
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    pub fn with_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.synonyms.push(synonym.into());
        self
    }

    pub fn with_parent(mut self, parent_uri: impl Into<String>) -> Self {
        self.parents.insert(parent_uri.into());
        self
    }

    /// The record's type, falling back to the URI-derived one.
    pub fn kind(&self) -> Option<ConceptType> {
        self.concept_type.or_else(|| ConceptType::from_uri(&self.uri))
    }

    /// Text embedded for this concept: label followed by synonyms.
    pub fn embedding_text(&self) -> String {
        let mut text = self.label.clone();
        for synonym in &self.synonyms {
            text.push(' ');
            text.push_str(synonym);
        }
        text
    }

    /// Label and synonyms, label first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.label.as_str()).chain(self.synonyms.iter().map(|s| s.as_str()))
    }

    /// Local name of the URI, e.g. `operation_0296`.
    pub fn short_id(&self) -> &str {
        local_name(&self.uri)
    }
}
