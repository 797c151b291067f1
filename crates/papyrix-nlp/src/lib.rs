//! papyrix-nlp — Text feature extraction.
//!
//! Turns raw document text into sentences, named entities, and keyword
//! tokens. The linguistic work happens behind the [`NlpCapability`]
//! contract; [`LexiconNlp`] is the built-in provider (rule-based sentence
//! boundaries, alphabetic tokenizer with an embedded stopword list, and an
//! aho-corasick gazetteer for entity spans). Any model-backed provider can
//! be swapped in behind the same trait.

pub mod analyzer;
pub mod capability;
pub mod lexicon;
mod stopwords;

pub use analyzer::{TextAnalysis, TextAnalyzer, TextAnalyzerConfig};
pub use capability::{Annotations, EntitySpan, NlpCapability, Span, TokenAnnotation};
pub use lexicon::LexiconNlp;
