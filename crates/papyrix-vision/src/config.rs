//! Detector configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Every numeric threshold the detector uses. Defaults mirror the tuning
/// the heuristics were calibrated with; change them together or the
/// feature cutoffs stop meaning anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartDetectorConfig {
    /// Adaptive-threshold window (pixels, odd).
    pub threshold_window: u32,
    /// Constant subtracted from the local mean before binarization.
    pub threshold_constant: i16,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Minimum Hough accumulator votes for a candidate line.
    pub hough_vote_threshold: u32,
    /// Minimum length (pixels) for a detected line segment.
    pub min_line_length: u32,
    /// Maximum gap (pixels) bridged within one segment.
    pub max_line_gap: u32,
    /// `has_lines` fires when segment count exceeds this.
    pub line_count_cutoff: usize,
    /// `has_shapes` fires when external contour count exceeds this.
    pub contour_count_cutoff: usize,
    /// Degrees of slack when classifying a segment as horizontal/vertical.
    pub angle_tolerance: f32,
    /// `regular_patterns` fires when both axis-aligned counts exceed these.
    pub horizontal_count_cutoff: usize,
    pub vertical_count_cutoff: usize,
    /// When set, the edge map of every positive verdict is written here
    /// for human inspection.
    pub debug_dir: Option<PathBuf>,
}

impl Default for ChartDetectorConfig {
    fn default() -> Self {
        Self {
            threshold_window: 11,
            threshold_constant: 2,
            canny_low: 50.0,
            canny_high: 150.0,
            hough_vote_threshold: 100,
            min_line_length: 100,
            max_line_gap: 20,
            line_count_cutoff: 10,
            contour_count_cutoff: 5,
            angle_tolerance: 5.0,
            horizontal_count_cutoff: 3,
            vertical_count_cutoff: 3,
            debug_dir: None,
        }
    }
}

impl ChartDetectorConfig {
    pub fn with_debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(dir.into());
        self
    }
}
