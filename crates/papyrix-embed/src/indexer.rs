//! Sentence-list → (vectors, index) construction.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::capability::EmbeddingCapability;
use crate::index::FlatIndex;

/// Encodes a document's sentences through the injected capability and
/// builds the run's flat index. All-or-nothing per document: any
/// capability error propagates and no partial vector set is returned.
pub struct EmbeddingIndexer {
    capability: Arc<dyn EmbeddingCapability>,
    batch_size: usize,
}

impl EmbeddingIndexer {
    pub fn new(capability: Arc<dyn EmbeddingCapability>, batch_size: usize) -> Self {
        Self { capability, batch_size: batch_size.max(1) }
    }

    /// One vector per sentence, order preserved, plus the index over them.
    /// Zero sentences is not an error: the result is an empty vector set
    /// and a valid, always-empty index.
    #[instrument(skip_all, fields(sentences = sentences.len()))]
    pub async fn build(&self, sentences: &[String]) -> anyhow::Result<(Vec<Vec<f32>>, FlatIndex)> {
        if sentences.is_empty() {
            return Ok((Vec::new(), FlatIndex::empty()));
        }

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(sentences.len());
        for batch in sentences.chunks(self.batch_size) {
            let embedded = self.capability.embed(batch).await?;
            anyhow::ensure!(
                embedded.len() == batch.len(),
                "embedding capability returned {} vectors for {} sentences",
                embedded.len(),
                batch.len()
            );
            vectors.extend(embedded);
        }

        // The dimension is fixed at first use and must hold for the run.
        let dim = vectors[0].len();
        anyhow::ensure!(
            vectors.iter().all(|v| v.len() == dim),
            "embedding capability changed dimension mid-run"
        );

        let index = FlatIndex::build(vectors.clone())?;
        debug!(vectors = vectors.len(), dim, "vector index built");
        Ok((vectors, index))
    }
}
