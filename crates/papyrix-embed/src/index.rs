//! Flat (exhaustive) nearest-neighbor index over L2 distance.

use serde::Serialize;

/// One search hit: the ordinal of a stored vector and its Euclidean
/// distance from the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub ordinal: usize,
    pub distance: f32,
}

/// Exhaustive L2 index over one run's sentence vectors. No approximate
/// structure and no pruning: per-document sentence counts are small enough
/// that correctness wins over speed. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// A valid, queryable index over nothing. Every search returns no
    /// neighbors.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from one run's vectors. All vectors must share one non-zero
    /// dimension.
    pub fn build(vectors: Vec<Vec<f32>>) -> anyhow::Result<Self> {
        let Some(first) = vectors.first() else {
            return Ok(Self::empty());
        };
        let dim = first.len();
        anyhow::ensure!(dim > 0, "vectors must have non-zero dimension");
        for (i, v) in vectors.iter().enumerate() {
            anyhow::ensure!(
                v.len() == dim,
                "vector {} has dimension {} but the index dimension is {}",
                i,
                v.len(),
                dim
            );
        }
        Ok(Self { dim, vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Index dimension; zero for an empty index.
    pub fn dimension(&self) -> usize {
        self.dim
    }

    /// The `k` nearest stored vectors by Euclidean distance, ascending,
    /// ties broken by ordinal.
    pub fn search(&self, query: &[f32], k: usize) -> anyhow::Result<Vec<Neighbor>> {
        if self.vectors.is_empty() {
            return Ok(Vec::new());
        }
        anyhow::ensure!(
            query.len() == self.dim,
            "query has dimension {} but the index dimension is {}",
            query.len(),
            self.dim
        );

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(ordinal, v)| Neighbor { ordinal, distance: l2_distance(query, v) })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.ordinal.cmp(&b.ordinal))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}
