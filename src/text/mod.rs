//! Text normalization: tokens, stems, canonical forms

mod normalize;

pub use normalize::{
    canonical_form, is_stopword, stem, title_case, NormalizedText, TextNormalizer, STOPWORDS,
};
