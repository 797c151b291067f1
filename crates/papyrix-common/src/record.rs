//! Records emitted by the ingestion pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structural features of one page image, each derived independently.
///
/// `confidence` is the fraction of features that fired; `is_chart` requires
/// all three. The two are locked together: `confidence == 1.0` exactly when
/// `is_chart` is true.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartFeatures {
    pub has_lines: bool,
    pub has_shapes: bool,
    pub regular_patterns: bool,
    pub confidence: f32,
    pub is_chart: bool,
}

impl ChartFeatures {
    pub fn from_flags(has_lines: bool, has_shapes: bool, regular_patterns: bool) -> Self {
        let fired = has_lines as u32 + has_shapes as u32 + regular_patterns as u32;
        Self {
            has_lines,
            has_shapes,
            regular_patterns,
            confidence: fired as f32 / 3.0,
            is_chart: has_lines && has_shapes && regular_patterns,
        }
    }
}

/// Per-page chart verdict carried into the merged output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRecord {
    pub page: u32,
    pub features: ChartFeatures,
}

/// A named entity span reduced to text and label. Duplicates are permitted;
/// the label taxonomy is whatever the NLP capability provides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

/// The merged, storage-ready output of one document's ingestion run.
/// Immutable once emitted; `charts` holds only pages that classified as
/// charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub document: String,
    pub sentences: Vec<String>,
    pub entities: Vec<Entity>,
    pub keywords: Vec<String>,
    pub charts: Vec<ChartRecord>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_tracks_fired_feature_count() {
        let f = ChartFeatures::from_flags(false, false, false);
        assert_eq!(f.confidence, 0.0);
        assert!(!f.is_chart);

        let f = ChartFeatures::from_flags(true, false, false);
        assert!((f.confidence - 1.0 / 3.0).abs() < 1e-6);
        assert!(!f.is_chart);

        let f = ChartFeatures::from_flags(true, true, false);
        assert!((f.confidence - 2.0 / 3.0).abs() < 1e-6);
        assert!(!f.is_chart);
    }

    #[test]
    fn full_confidence_iff_chart() {
        let f = ChartFeatures::from_flags(true, true, true);
        assert_eq!(f.confidence, 1.0);
        assert!(f.is_chart);
    }
}
