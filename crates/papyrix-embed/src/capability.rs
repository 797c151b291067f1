//! The embedding capability contract.

use async_trait::async_trait;

/// External embedding capability: sentences in, one fixed-dimension vector
/// per sentence out, same order.
///
/// The vector dimension is determined by the capability at first use and
/// must stay constant for the life of one pipeline run. Implementations
/// must be deterministic given identical input and model, and reentrant so
/// one handle can serve concurrent documents.
#[async_trait]
pub trait EmbeddingCapability: Send + Sync {
    async fn embed(&self, sentences: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}
