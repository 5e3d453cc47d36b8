//! Keyword tables and label heuristics for new-concept proposals
//!
//! Everything here is table-driven: extending type inference or label
//! rewriting means editing `TYPE_KEYWORDS` or `LABEL_SUBSTITUTIONS`, not the
//! functions that read them.

use std::collections::BTreeSet;

use crate::ontology::ConceptType;
use crate::text::{canonical_form, is_stopword, stem, title_case, TextNormalizer};

/// Keywords signalling each concept type, in tie-break order.
///
/// Keywords are stemmed before comparison, so inflected forms may be listed
/// for readability.
pub const TYPE_KEYWORDS: &[(ConceptType, &[&str])] = &[
    (
        ConceptType::Operation,
        &[
            "align", "alignment", "analyse", "analyze", "analysis", "annotate", "annotation",
            "assemble", "assembly", "calculate", "calculation", "classify", "classification",
            "cluster", "compare", "comparison", "compute", "computation", "convert", "conversion",
            "detect", "detection", "extract", "extraction", "filter", "generate", "generation",
            "identify", "identification", "map", "mapping", "merge", "predict", "prediction",
            "process", "quantify", "quantification", "search", "simulate", "simulation", "split",
            "transform", "visualise", "visualize", "visualisation", "visualization",
        ],
    ),
    (
        ConceptType::Data,
        &[
            "sequence", "matrix", "table", "list", "tree", "graph", "network", "profile",
            "signature", "pattern", "motif", "dataset", "collection", "record", "report", "score",
            "value", "measurement", "image", "model", "structure",
        ],
    ),
    (
        ConceptType::Format,
        &[
            "format", "file", "extension", "encoding", "syntax", "fasta", "fastq", "sam", "bam",
            "vcf", "bed", "gff", "gtf", "csv", "tsv", "json", "xml", "yaml", "html", "pdb",
        ],
    ),
    (
        ConceptType::Topic,
        &[
            "biology", "bioinformatics", "genomics", "proteomics", "metabolomics",
            "transcriptomics", "phylogenetics", "evolution", "disease", "cancer", "drug",
            "protein", "gene", "dna", "rna",
        ],
    ),
    (
        ConceptType::Identifier,
        &["identifier", "id", "accession", "uri", "doi"],
    ),
];

/// Word rewrites toward EDAM-style nominalised labels. An empty replacement
/// drops the word.
pub const LABEL_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("align", "alignment"),
    ("aligning", "alignment"),
    ("aligned", "alignment"),
    ("aligner", "alignment"),
    ("predict", "prediction"),
    ("predicting", "prediction"),
    ("predictor", "prediction"),
    ("analyze", "analysis"),
    ("analyse", "analysis"),
    ("analyzing", "analysis"),
    ("analysing", "analysis"),
    ("analyzer", "analysis"),
    ("annotate", "annotation"),
    ("annotating", "annotation"),
    ("assemble", "assembly"),
    ("assembling", "assembly"),
    ("assembler", "assembly"),
    ("classify", "classification"),
    ("classifying", "classification"),
    ("classifier", "classification"),
    ("compare", "comparison"),
    ("comparing", "comparison"),
    ("convert", "conversion"),
    ("converting", "conversion"),
    ("converter", "conversion"),
    ("detect", "detection"),
    ("detecting", "detection"),
    ("detector", "detection"),
    ("identify", "identification"),
    ("identifying", "identification"),
    ("quantify", "quantification"),
    ("quantifying", "quantification"),
    ("simulate", "simulation"),
    ("simulating", "simulation"),
    ("simulator", "simulation"),
    ("visualize", "visualisation"),
    ("visualise", "visualisation"),
    ("visualizing", "visualisation"),
    ("visualising", "visualisation"),
    ("viewer", "visualisation"),
    ("calculate", "calculation"),
    ("calculating", "calculation"),
    ("calculator", "calculation"),
    ("compute", "computation"),
    ("computing", "computation"),
    ("cluster", "clustering"),
    ("searching", "search"),
    ("filter", "filtering"),
    ("map", "mapping"),
    ("mapper", "mapping"),
    ("tool", ""),
    ("tools", ""),
    ("software", ""),
    ("program", ""),
    ("pipeline", ""),
    ("method", ""),
    ("utility", ""),
];

/// Longest label derived from a description, in words.
pub const MAX_LABEL_WORDS: usize = 8;

/// Appended when a description yields fewer than two distinct labels.
fn type_suffix(concept_type: ConceptType) -> &'static str {
    match concept_type {
        ConceptType::Operation => "Analysis",
        ConceptType::Data => "Data",
        ConceptType::Format => "Format",
        ConceptType::Topic => "Research",
        ConceptType::Identifier => "Identifier",
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeInference {
    pub concept_type: ConceptType,
    /// Winner's share of all keyword hits; 1.0 when caller-supplied
    pub strength: f64,
    /// No keyword matched and the Operation default was used
    pub defaulted: bool,
}

impl TypeInference {
    pub fn supplied(concept_type: ConceptType) -> Self {
        Self {
            concept_type,
            strength: 1.0,
            defaulted: false,
        }
    }
}

/// Token forms a keyword can appear as: its stem, and the stem without a
/// final `e` so that "compute" also matches "computing" (stem "comput").
fn keyword_forms(keyword: &str) -> [String; 2] {
    let stemmed = stem(keyword);
    let trimmed = stemmed
        .strip_suffix('e')
        .filter(|s| s.len() >= 4)
        .map(str::to_string)
        .unwrap_or_else(|| stemmed.clone());
    [stemmed, trimmed]
}

/// Keyword hits per type, in table order.
pub fn type_scores(tokens: &BTreeSet<String>) -> Vec<(ConceptType, usize)> {
    TYPE_KEYWORDS
        .iter()
        .map(|(concept_type, keywords)| {
            let hits = keywords
                .iter()
                .filter(|k| keyword_forms(k).iter().any(|form| tokens.contains(form)))
                .count();
            (*concept_type, hits)
        })
        .collect()
}

/// Pick the type with the most keyword hits, earliest in the table on ties.
/// Without any hit the type defaults to Operation.
pub fn infer_type(tokens: &BTreeSet<String>) -> TypeInference {
    let scores = type_scores(tokens);
    let total: usize = scores.iter().map(|(_, hits)| hits).sum();

    let mut best = (ConceptType::Operation, 0usize);
    for (concept_type, hits) in scores {
        if hits > best.1 {
            best = (concept_type, hits);
        }
    }

    if best.1 == 0 {
        return TypeInference {
            concept_type: ConceptType::Operation,
            strength: 0.0,
            defaulted: true,
        };
    }
    TypeInference {
        concept_type: best.0,
        strength: best.1 as f64 / total as f64,
        defaulted: false,
    }
}

fn substitute(word: &str) -> &str {
    LABEL_SUBSTITUTIONS
        .iter()
        .find(|(from, _)| *from == word)
        .map(|(_, to)| *to)
        .unwrap_or(word)
}

fn join_title(words: &[&str]) -> String {
    title_case(&words.join(" "))
}

/// Two to four distinct labels for a description.
///
/// In order: the title-cased description, its first four non-stopwords, the
/// same with [`LABEL_SUBSTITUTIONS`] applied, and its leading three words.
/// Once a parent is known, [`with_contextual_label`] may add one more.
/// Labels are distinct by normalized token set (stopwords and inflections
/// ignored), then by canonical form. Only a description with no alphanumeric
/// content yields none.
pub fn label_variations(description: &str, concept_type: ConceptType) -> Vec<String> {
    let cleaned = canonical_form(description);
    let words: Vec<&str> = cleaned.split_whitespace().take(MAX_LABEL_WORDS * 4).collect();
    if words.is_empty() {
        return Vec::new();
    }
    let content: Vec<&str> = words.iter().copied().filter(|w| !is_stopword(w)).collect();
    let substituted: Vec<&str> = content
        .iter()
        .map(|w| substitute(w))
        .filter(|w| !w.is_empty())
        .collect();
    let mut leading: Vec<&str> = words.iter().copied().take(3).collect();
    while leading.len() > 1 && leading.last().is_some_and(|w| is_stopword(w)) {
        leading.pop();
    }

    let candidates = [
        join_title(&words[..words.len().min(MAX_LABEL_WORDS)]),
        join_title(&content[..content.len().min(4)]),
        join_title(&substituted[..substituted.len().min(4)]),
        join_title(&leading),
    ];

    let mut seen = LabelKeys::default();
    let mut labels: Vec<String> = Vec::new();
    for label in candidates {
        if !label.is_empty() && seen.insert(&label) {
            labels.push(label);
        }
    }

    if labels.len() < 2 {
        if let Some(first) = labels.first().cloned() {
            let suffix = type_suffix(concept_type);
            let extended = format!("{} {}", first, suffix);
            if seen.insert(&extended) {
                labels.push(extended);
            }
        }
    }
    labels
}

/// Labels already emitted, keyed by token set and canonical form.
#[derive(Default)]
struct LabelKeys {
    tokens: BTreeSet<BTreeSet<String>>,
    canonical: BTreeSet<String>,
}

impl LabelKeys {
    /// `false` when `label` duplicates an earlier one under either key.
    /// All-stopword labels have no token key and compare by canonical form.
    fn insert(&mut self, label: &str) -> bool {
        let canonical = canonical_form(label);
        if self.canonical.contains(&canonical) {
            return false;
        }
        let tokens = TextNormalizer::new().normalize(label).tokens;
        if !tokens.is_empty() && !self.tokens.insert(tokens) {
            return false;
        }
        self.canonical.insert(canonical);
        true
    }
}

/// Label anchored on the parent: the description's first two content words
/// followed by the parent's label, e.g. "Quantum Computing Sequence analysis".
pub fn contextual_label(description: &str, parent_label: &str) -> Option<String> {
    let parent_label = parent_label.trim();
    if parent_label.is_empty() {
        return None;
    }
    let cleaned = canonical_form(description);
    let key_terms: Vec<&str> = cleaned.split_whitespace().filter(|w| !is_stopword(w)).take(2).collect();
    if key_terms.is_empty() {
        return None;
    }
    Some(format!("{} {}", join_title(&key_terms), parent_label))
}

/// Append the parent-anchored label unless it repeats one already present.
pub fn with_contextual_label(mut labels: Vec<String>, description: &str, parent_label: &str) -> Vec<String> {
    let Some(label) = contextual_label(description, parent_label) else {
        return labels;
    };
    let mut seen = LabelKeys::default();
    for existing in &labels {
        seen.insert(existing);
    }
    if seen.insert(&label) {
        labels.push(label);
    }
    labels
}

/// Lowercase words joined by `_`.
pub fn slugify(label: &str) -> String {
    canonical_form(label).split_whitespace().collect::<Vec<_>>().join("_")
}

/// Deterministic uri for a proposed label.
pub fn suggested_uri(uri_base: &str, label: &str) -> String {
    format!("{}suggested_{}", uri_base, slugify(label))
}

/// Heuristic label quality in [0.5, 1.0].
///
/// Rewards three to six words, more than ten characters, plain
/// alphanumeric text, and vocabulary shared with the description.
pub fn label_quality(label: &str, description: &str) -> f64 {
    let mut quality: f64 = 0.5;
    let word_count = label.split_whitespace().count();
    if (3..=6).contains(&word_count) {
        quality += 0.2;
    }
    if label.chars().count() > 10 {
        quality += 0.1;
    }
    if label.chars().all(|c| c.is_alphanumeric() || c.is_whitespace()) {
        quality += 0.1;
    }
    let normalizer = TextNormalizer::new();
    let description_tokens = normalizer.normalize(description).tokens;
    let overlap = normalizer
        .normalize(label)
        .tokens
        .intersection(&description_tokens)
        .count();
    quality += (0.1 * overlap as f64).min(0.2);
    quality.min(1.0)
}

/// Sentence form: trimmed, whitespace collapsed, capitalised, terminated.
fn sentence(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let mut out: String = first.to_uppercase().chain(chars).collect();
    if !out.ends_with(|c| matches!(c, '.' | '!' | '?')) {
        out.push('.');
    }
    out
}

/// Definition for a proposed concept: the description, then the rationale.
pub fn synthesize_definition(description: &str, rationale: Option<&str>) -> String {
    let mut definition = sentence(description);
    if let Some(extra) = rationale.map(sentence).filter(|s| !s.is_empty()) {
        definition.push(' ');
        definition.push_str(&extra);
    }
    definition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> BTreeSet<String> {
        TextNormalizer::new().normalize(text).tokens
    }

    #[test]
    fn infers_format_from_file_vocabulary() {
        let inference = infer_type(&tokens("convert FASTQ files to FASTA format"));
        assert_eq!(inference.concept_type, ConceptType::Format);
        assert!((inference.strength - 0.8).abs() < 1e-9);
        assert!(!inference.defaulted);
    }

    #[test]
    fn ties_follow_table_order() {
        // align → Operation, sequences → Data, protein → Topic
        let inference = infer_type(&tokens("align protein sequences"));
        assert_eq!(inference.concept_type, ConceptType::Operation);
        assert!((inference.strength - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn defaults_to_operation_without_keywords() {
        let inference = infer_type(&tokens("frobnicate the widgets"));
        assert_eq!(inference.concept_type, ConceptType::Operation);
        assert_eq!(inference.strength, 0.0);
        assert!(inference.defaulted);
    }

    #[test]
    fn inflected_verbs_hit_keywords() {
        let inference = infer_type(&tokens("annotating and computing"));
        assert_eq!(inference.concept_type, ConceptType::Operation);
        assert_eq!(type_scores(&tokens("annotating and computing"))[0], (ConceptType::Operation, 2));
    }

    #[test]
    fn identifier_keywords() {
        let inference = infer_type(&tokens("UniProt accession"));
        assert_eq!(inference.concept_type, ConceptType::Identifier);
    }

    #[test]
    fn variations_cover_each_form() {
        let labels = label_variations("quantum computing for protein folding", ConceptType::Operation);
        assert_eq!(
            labels,
            vec![
                "Quantum Computing For Protein Folding",
                "Quantum Computation Protein Folding",
                "Quantum Computing",
            ]
        );
    }

    #[test]
    fn stopword_only_differences_collapse() {
        let labels = label_variations("mapping of reads to a genome", ConceptType::Operation);
        let token_sets: BTreeSet<BTreeSet<String>> = labels.iter().map(|l| tokens(l)).collect();
        assert_eq!(token_sets.len(), labels.len());
        assert_eq!(labels[0], "Mapping Of Reads To A Genome");
        assert!(!labels.contains(&"Mapping Reads Genome".to_string()));
    }

    #[test]
    fn quantum_is_not_a_topic_signal() {
        let inference = infer_type(&tokens("quantum computing for protein folding"));
        assert_eq!(inference.concept_type, ConceptType::Operation);
        assert!((inference.strength - 0.5).abs() < 1e-9);
    }

    #[test]
    fn variations_are_distinct_and_at_least_two() {
        let labels = label_variations("FASTA", ConceptType::Format);
        assert_eq!(labels, vec!["Fasta", "Fasta Format"]);

        let labels = label_variations("align reads", ConceptType::Operation);
        let canonical: BTreeSet<String> = labels.iter().map(|l| canonical_form(l)).collect();
        assert_eq!(canonical.len(), labels.len());
        assert!((2..=4).contains(&labels.len()));
        assert!(labels.contains(&"Alignment Reads".to_string()));
    }

    #[test]
    fn contextual_label_prefixes_parent() {
        assert_eq!(
            contextual_label("quantum computing for protein folding", "Sequence analysis").as_deref(),
            Some("Quantum Computing Sequence analysis")
        );
        assert_eq!(contextual_label("of the", "Sequence analysis"), None);
        assert_eq!(contextual_label("quantum computing", "  "), None);
    }

    #[test]
    fn contextual_label_skipped_when_it_repeats() {
        let labels = with_contextual_label(
            label_variations("sequence alignment", ConceptType::Operation),
            "sequence alignment",
            "Alignment",
        );
        // "Sequence Alignment Alignment" normalizes to the description's tokens
        assert!(!labels.iter().any(|l| l == "Sequence Alignment Alignment"));

        let labels = with_contextual_label(
            label_variations("quantum computing for protein folding", ConceptType::Operation),
            "quantum computing for protein folding",
            "Protein structure prediction",
        );
        assert_eq!(labels.last().map(String::as_str), Some("Quantum Computing Protein structure prediction"));
        assert_eq!(labels.len(), 4);
    }

    #[test]
    fn generic_nouns_dropped_by_substitution() {
        let labels = label_variations("variant calling tool", ConceptType::Operation);
        assert!(labels.contains(&"Variant Calling".to_string()));
    }

    #[test]
    fn punctuation_only_description_has_no_labels() {
        assert!(label_variations("?!", ConceptType::Data).is_empty());
    }

    #[test]
    fn uri_depends_on_label_only() {
        let base = "http://edamontology.org/";
        assert_eq!(
            suggested_uri(base, "Quantum Computing: Protein Folding"),
            "http://edamontology.org/suggested_quantum_computing_protein_folding"
        );
        assert_eq!(suggested_uri(base, "quantum  computing"), suggested_uri(base, "Quantum Computing"));
    }

    #[test]
    fn label_quality_rewards_descriptive_labels() {
        let good = label_quality("Protein Structure Prediction", "predict protein structure");
        let poor = label_quality("X", "predict protein structure");
        assert!((good - 1.0).abs() < 1e-9, "good={}", good);
        assert!((poor - 0.6).abs() < 1e-9, "poor={}", poor);
    }

    #[test]
    fn definition_joins_sentences() {
        assert_eq!(
            synthesize_definition("  quantum computing for   protein folding", Some("no EDAM term covers this")),
            "Quantum computing for protein folding. No EDAM term covers this."
        );
        assert_eq!(synthesize_definition("Done!", None), "Done!");
        assert_eq!(synthesize_definition("x", Some("  ")), "X.");
    }
}
