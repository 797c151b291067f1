//! Configuration for the sentence embedder.

use serde::{Deserialize, Serialize};

use crate::pooling::PoolingStrategy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderConfig {
    /// Hugging Face model ID.
    pub model_id: String,

    /// Maximum sequence length per sentence.
    pub max_length: usize,

    /// Sentences per inference batch.
    pub batch_size: usize,

    /// L2-normalize output vectors. Off by default: the flat index ranks
    /// by raw Euclidean distance.
    pub normalize: bool,

    pub pooling: PoolingStrategy,

    /// Cache directory for downloaded model files.
    pub cache_dir: Option<String>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            model_id: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            max_length: 512,
            batch_size: 32,
            normalize: false,
            pooling: PoolingStrategy::Mean,
            cache_dir: None,
        }
    }
}

impl EmbedderConfig {
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }
}
