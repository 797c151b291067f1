//! Token-to-sentence pooling over BERT hidden states.

use candle_core::Tensor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolingStrategy {
    /// Attention-weighted mean over token embeddings. What MiniLM sentence
    /// models were trained with.
    Mean,
    /// The [CLS] token embedding.
    Cls,
}

impl PoolingStrategy {
    /// Reduce `(batch, seq, hidden)` hidden states to `(batch, hidden)`
    /// sentence embeddings. `attention_mask` is `(batch, seq)` as F32.
    pub fn apply(&self, hidden: &Tensor, attention_mask: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            PoolingStrategy::Mean => {
                let mask = attention_mask.unsqueeze(2)?;
                let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
                let counts = mask.sum(1)?.clamp(1e-9f32, f32::INFINITY)?;
                summed.broadcast_div(&counts)
            }
            PoolingStrategy::Cls => hidden.narrow(1, 0, 1)?.squeeze(1),
        }
    }
}

/// Row-wise L2 normalization of a `(batch, hidden)` tensor.
pub fn l2_normalize(t: &Tensor) -> candle_core::Result<Tensor> {
    let norm = t.sqr()?.sum_keepdim(1)?.sqrt()?;
    t.broadcast_div(&norm)
}
