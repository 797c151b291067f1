//! papyrix-embed — Sentence embeddings and the per-document flat index.
//!
//! Encodes sentences into fixed-dimension vectors behind the
//! [`EmbeddingCapability`] contract and builds an exhaustive L2
//! nearest-neighbor index over them. The built-in provider is a pure Rust
//! Candle BERT encoder (`all-MiniLM-L6-v2` by default) loaded from the
//! Hugging Face Hub. No Python, no external service.
//!
//! Encoding is order-preserving and deterministic for identical input and
//! model, and batching never changes the resulting vectors.

pub mod bert;
pub mod capability;
pub mod config;
pub mod error;
pub mod index;
pub mod indexer;
pub mod pooling;

pub use bert::BertSentenceEmbedder;
pub use capability::EmbeddingCapability;
pub use config::EmbedderConfig;
pub use error::EmbedError;
pub use index::{FlatIndex, Neighbor};
pub use indexer::EmbeddingIndexer;
pub use pooling::PoolingStrategy;
