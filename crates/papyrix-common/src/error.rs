use thiserror::Error;

/// Pipeline stage, carried in error context so a caller can decide what to
/// retry without parsing error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Stage {
    Extracting,
    AnalyzingCharts,
    AnalyzingText,
    Embedding,
    Merging,
    Persisting,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extracting      => "extracting",
            Stage::AnalyzingCharts => "analyzing_charts",
            Stage::AnalyzingText   => "analyzing_text",
            Stage::Embedding       => "embedding",
            Stage::Merging         => "merging",
            Stage::Persisting      => "persisting",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Neither the text layer nor OCR yielded any text. Fatal for the
    /// document; nothing is persisted.
    #[error("extraction failed for {document}: {reason}")]
    ExtractionFailed { document: String, reason: String },

    /// One page image could not be analyzed. Recoverable: the image is
    /// skipped and the run continues.
    #[error("page image {page} unreadable: {reason}")]
    ImageUnreadable { page: u32, reason: String },

    /// The NLP capability failed. Fatal for the document; no partial
    /// analysis output is returned.
    #[error("text analysis failed for {document}")]
    AnalysisFailed {
        document: String,
        #[source]
        source: anyhow::Error,
    },

    /// The embedding capability failed. Fatal for the document; no partial
    /// vector set is returned.
    #[error("embedding failed for {document}")]
    EmbeddingFailed {
        document: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{stage} failed for {document}")]
    StageFailed {
        document: String,
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// The stage an error belongs to, for caller-side retry decisions.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::ExtractionFailed { .. } => Some(Stage::Extracting),
            PipelineError::ImageUnreadable { .. }  => Some(Stage::AnalyzingCharts),
            PipelineError::AnalysisFailed { .. }   => Some(Stage::AnalyzingText),
            PipelineError::EmbeddingFailed { .. }  => Some(Stage::Embedding),
            PipelineError::StageFailed { stage, .. } => Some(*stage),
            PipelineError::Io(_) => None,
        }
    }

    /// True when the error is tolerated at per-image granularity rather
    /// than aborting the document run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::ImageUnreadable { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
