//! Lexicon-backed NLP provider.
//!
//! Entities come from an aho-corasick automaton over a `(pattern, label)`
//! gazetteer, leftmost-longest so "Stanford University" beats "Stanford".
//! Sentence boundaries are rule-based: terminator runs followed by an
//! upper-case or numeric start, with an abbreviation guard, plus blank
//! lines as hard breaks. Tokens are maximal alphanumeric runs; the
//! stopword flag uses the embedded English list.

use std::collections::HashSet;

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::debug;

use crate::capability::{Annotations, EntitySpan, NlpCapability, Span, TokenAnnotation};
use crate::stopwords::STOPWORDS;

/// Words a trailing period does not end a sentence after.
const ABBREVIATIONS: &[&str] = &[
    "al", "cf", "dr", "eds", "eq", "eqs", "etc", "fig", "figs", "no", "pp", "prof", "ref", "refs",
    "sec", "vol", "vs",
];

pub struct LexiconNlp {
    automaton: AhoCorasick,
    labels: Vec<String>,
    stopwords: HashSet<&'static str>,
}

impl LexiconNlp {
    /// Build a provider from `(pattern, label)` gazetteer entries.
    pub fn new<I, P, L>(entries: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (P, L)>,
        P: AsRef<str>,
        L: Into<String>,
    {
        let mut patterns = Vec::new();
        let mut labels = Vec::new();
        for (pattern, label) in entries {
            patterns.push(pattern.as_ref().to_string());
            labels.push(label.into());
        }
        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .ascii_case_insensitive(true)
            .build(&patterns)?;
        debug!(patterns = patterns.len(), "lexicon automaton built");
        Ok(Self {
            automaton,
            labels,
            stopwords: STOPWORDS.iter().copied().collect(),
        })
    }

    /// Small embedded gazetteer, enough to exercise the pipeline without
    /// shipping a real lexicon.
    pub fn with_embedded_subset() -> Self {
        let entries = [
            ("Stanford University", "ORG"),
            ("MIT", "ORG"),
            ("Carnegie Mellon", "ORG"),
            ("Oxford", "ORG"),
            ("Google", "ORG"),
            ("DeepMind", "ORG"),
            ("OpenAI", "ORG"),
            ("United States", "GPE"),
            ("United Kingdom", "GPE"),
            ("Germany", "GPE"),
            ("Japan", "GPE"),
            ("China", "GPE"),
            ("transformer", "METHOD"),
            ("convolutional neural network", "METHOD"),
            ("support vector machine", "METHOD"),
            ("random forest", "METHOD"),
            ("gradient descent", "METHOD"),
            ("logistic regression", "METHOD"),
            ("k-means", "METHOD"),
            ("ImageNet", "DATASET"),
            ("MNIST", "DATASET"),
            ("CIFAR-10", "DATASET"),
            ("PubMed", "DATASET"),
        ];
        // The embedded set is static and well-formed, so construction
        // cannot fail.
        Self::new(entries).expect("embedded gazetteer builds")
    }
}

impl NlpCapability for LexiconNlp {
    fn annotate(&self, text: &str) -> anyhow::Result<Annotations> {
        Ok(Annotations {
            sentences: sentence_spans(text),
            entities: self.entity_spans(text),
            tokens: self.token_annotations(text),
        })
    }
}

impl LexiconNlp {
    fn entity_spans(&self, text: &str) -> Vec<EntitySpan> {
        self.automaton
            .find_iter(text)
            .filter(|m| on_word_boundary(text, m.start(), m.end()))
            .map(|m| EntitySpan {
                span: Span { start: m.start(), end: m.end() },
                label: self.labels[m.pattern().as_usize()].clone(),
            })
            .collect()
    }

    fn token_annotations(&self, text: &str) -> Vec<TokenAnnotation> {
        let mut tokens = Vec::new();
        let mut iter = text.char_indices().peekable();
        while let Some(&(start, first)) = iter.peek() {
            if !first.is_alphanumeric() {
                iter.next();
                continue;
            }
            let mut end = start + first.len_utf8();
            let mut is_alpha = first.is_alphabetic();
            iter.next();
            while let Some(&(pos, ch)) = iter.peek() {
                if !ch.is_alphanumeric() {
                    break;
                }
                is_alpha &= ch.is_alphabetic();
                end = pos + ch.len_utf8();
                iter.next();
            }
            let is_stop = self
                .stopwords
                .contains(text[start..end].to_lowercase().as_str());
            tokens.push(TokenAnnotation { span: Span { start, end }, is_alpha, is_stop });
        }
        tokens
    }
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
}

/// Rule-based sentence boundary detection over byte offsets.
fn sentence_spans(text: &str) -> Vec<Span> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let n = chars.len();
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < n {
        let (pos, ch) = chars[i];

        // (span end byte, char index to resume scanning whitespace from)
        let boundary: Option<(usize, usize)> = if matches!(ch, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < n && matches!(chars[j].1, '.' | '!' | '?' | '"' | '\'' | ')' | ']') {
                j += 1;
            }
            let end_byte = chars.get(j).map_or(text.len(), |(p, _)| *p);
            let trailing_ws = j >= n || chars[j].1.is_whitespace();
            let abbrev = ch == '.' && is_abbreviation(text, pos);
            let next_starts_sentence = chars[j..]
                .iter()
                .find(|(_, c)| !c.is_whitespace())
                .map_or(true, |(_, c)| c.is_uppercase() || c.is_numeric());
            if trailing_ws && !abbrev && next_starts_sentence {
                Some((end_byte, j))
            } else {
                i = j;
                continue;
            }
        } else if ch == '\n' {
            // A blank line is a hard break regardless of punctuation.
            let mut j = i + 1;
            let mut blank_line = false;
            while j < n && chars[j].1.is_whitespace() {
                blank_line |= chars[j].1 == '\n';
                j += 1;
            }
            if blank_line {
                Some((pos, j))
            } else {
                i += 1;
                continue;
            }
        } else {
            i += 1;
            continue;
        };

        if let Some((end_byte, j)) = boundary {
            if end_byte > start {
                spans.push(Span { start, end: end_byte });
            }
            match chars[j..].iter().position(|(_, c)| !c.is_whitespace()) {
                Some(offset) => {
                    start = chars[j + offset].0;
                    i = j + offset;
                }
                None => {
                    start = text.len();
                    i = n;
                }
            }
        }
    }

    if start < text.len() {
        spans.push(Span { start, end: text.len() });
    }
    spans
}

/// True when the word ending at `period_pos` should swallow its period:
/// single-letter initials and common scholarly abbreviations.
fn is_abbreviation(text: &str, period_pos: usize) -> bool {
    let word: String = text[..period_pos]
        .chars()
        .rev()
        .take_while(|c| c.is_alphabetic())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if word.is_empty() {
        return false;
    }
    if word.chars().count() == 1 {
        return true;
    }
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}
