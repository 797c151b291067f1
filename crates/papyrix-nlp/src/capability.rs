//! The NLP capability contract.

/// Byte-offset span into the annotated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// A recognized entity span with its provider-defined label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub span: Span,
    pub label: String,
}

/// One token with the two flags keyword extraction needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAnnotation {
    pub span: Span,
    pub is_alpha: bool,
    pub is_stop: bool,
}

/// Everything one annotation pass produces. Sentence spans are in reading
/// order; tokens are in document order; entity spans may repeat.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    pub sentences: Vec<Span>,
    pub entities: Vec<EntitySpan>,
    pub tokens: Vec<TokenAnnotation>,
}

/// External NLP capability: text in, annotations out.
///
/// Injected as an explicitly constructed object; implementations must be
/// reentrant so one handle can serve concurrent documents. An error from
/// the provider fails the whole document; there is no partial output.
pub trait NlpCapability: Send + Sync {
    fn annotate(&self, text: &str) -> anyhow::Result<Annotations>;
}
