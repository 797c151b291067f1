//! Reduction of capability annotations to the searchable feature set.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use papyrix_common::Entity;

use crate::capability::NlpCapability;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextAnalyzerConfig {
    /// Keep only the first occurrence of each keyword. Off by default:
    /// repeated words appear once per occurrence, in document order.
    pub dedup_keywords: bool,
}

impl Default for TextAnalyzerConfig {
    fn default() -> Self {
        Self { dedup_keywords: false }
    }
}

/// Sentences, entities, and keywords of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub sentences: Vec<String>,
    pub entities: Vec<Entity>,
    pub keywords: Vec<String>,
}

/// Wraps an injected NLP capability and reduces its annotations:
/// sentences are trimmed and kept in reading order, entity spans become
/// `{text, label}` pairs (duplicates kept), and keywords are the alphabetic
/// non-stopword tokens in document order.
pub struct TextAnalyzer {
    nlp: Arc<dyn NlpCapability>,
    config: TextAnalyzerConfig,
}

impl TextAnalyzer {
    pub fn new(nlp: Arc<dyn NlpCapability>, config: TextAnalyzerConfig) -> Self {
        Self { nlp, config }
    }

    /// Analyze one document's text. A capability error fails the whole
    /// document; no partial output is returned.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub fn analyze(&self, text: &str) -> anyhow::Result<TextAnalysis> {
        let annotations = self.nlp.annotate(text)?;

        let sentences: Vec<String> = annotations
            .sentences
            .iter()
            .map(|span| span.slice(text).trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        let entities: Vec<Entity> = annotations
            .entities
            .iter()
            .map(|e| Entity {
                text: e.span.slice(text).to_string(),
                label: e.label.clone(),
            })
            .collect();

        let mut keywords: Vec<String> = annotations
            .tokens
            .iter()
            .filter(|t| t.is_alpha && !t.is_stop)
            .map(|t| t.span.slice(text).to_string())
            .collect();
        if self.config.dedup_keywords {
            let mut seen = HashSet::new();
            keywords.retain(|k| seen.insert(k.clone()));
        }

        debug!(
            sentences = sentences.len(),
            entities = entities.len(),
            keywords = keywords.len(),
            "text analyzed"
        );
        Ok(TextAnalysis { sentences, entities, keywords })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconNlp;

    fn analyzer(config: TextAnalyzerConfig) -> TextAnalyzer {
        TextAnalyzer::new(Arc::new(LexiconNlp::with_embedded_subset()), config)
    }

    const TEXT: &str =
        "The transformer model beats the baseline model. We trained on MNIST at MIT.";

    #[test]
    fn sentences_are_trimmed_and_ordered() {
        let analysis = analyzer(TextAnalyzerConfig::default()).analyze(TEXT).unwrap();
        assert_eq!(
            analysis.sentences,
            vec![
                "The transformer model beats the baseline model.",
                "We trained on MNIST at MIT."
            ]
        );
    }

    #[test]
    fn entities_reduce_to_text_and_label() {
        let analysis = analyzer(TextAnalyzerConfig::default()).analyze(TEXT).unwrap();
        assert!(analysis.entities.contains(&Entity {
            text: "transformer".into(),
            label: "METHOD".into()
        }));
        assert!(analysis.entities.contains(&Entity {
            text: "MNIST".into(),
            label: "DATASET".into()
        }));
        assert!(analysis.entities.contains(&Entity { text: "MIT".into(), label: "ORG".into() }));
    }

    #[test]
    fn keywords_keep_every_occurrence_by_default() {
        let analysis = analyzer(TextAnalyzerConfig::default()).analyze(TEXT).unwrap();
        let model_count = analysis.keywords.iter().filter(|k| *k == "model").count();
        assert_eq!(model_count, 2);
        // Stopwords and non-alphabetic tokens never qualify.
        assert!(!analysis.keywords.iter().any(|k| k == "The" || k == "the"));
    }

    #[test]
    fn dedup_flag_keeps_first_occurrence_order() {
        let config = TextAnalyzerConfig { dedup_keywords: true };
        let analysis = analyzer(config).analyze(TEXT).unwrap();
        let model_count = analysis.keywords.iter().filter(|k| *k == "model").count();
        assert_eq!(model_count, 1);
    }

    #[test]
    fn capability_error_fails_the_document() {
        struct FailingNlp;
        impl NlpCapability for FailingNlp {
            fn annotate(&self, _text: &str) -> anyhow::Result<crate::capability::Annotations> {
                anyhow::bail!("model crashed")
            }
        }
        let analyzer = TextAnalyzer::new(Arc::new(FailingNlp), TextAnalyzerConfig::default());
        assert!(analyzer.analyze("anything").is_err());
    }
}
