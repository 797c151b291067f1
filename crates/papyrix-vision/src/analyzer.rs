//! Chart/not-chart classification of one page image.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::edges::canny;
use imageproc::filter::box_filter;
use imageproc::hough::{detect_lines, LineDetectionOptions};
use tracing::{debug, warn};

use papyrix_common::{ChartFeatures, PageImage, PipelineError, Result};

use crate::config::ChartDetectorConfig;
use crate::segments::{extract_segments, LineSegment};

/// Structural chart detector. Holds only configuration; `analyze` is a pure
/// function of its input image, so one detector can serve any number of
/// concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct ChartDetector {
    config: ChartDetectorConfig,
}

impl ChartDetector {
    pub fn new(config: ChartDetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChartDetectorConfig {
        &self.config
    }

    /// Classify one page image.
    ///
    /// All three features are always computed; none is short-circuited.
    /// A degenerate image is reported as `ImageUnreadable`, which callers
    /// treat as skip-this-image, not abort-the-run.
    pub fn analyze(&self, page: &PageImage) -> Result<ChartFeatures> {
        let cfg = &self.config;
        if page.image.width() == 0 || page.image.height() == 0 {
            return Err(PipelineError::ImageUnreadable {
                page: page.ordinal,
                reason: "zero-sized raster".into(),
            });
        }

        let gray = page.image.to_luma8();
        let binary = adaptive_threshold_inv(&gray, cfg.threshold_window, cfg.threshold_constant);
        let edges = canny(&binary, cfg.canny_low, cfg.canny_high);

        let polar = detect_lines(
            &edges,
            LineDetectionOptions {
                vote_threshold: cfg.hough_vote_threshold,
                suppression_radius: 0,
            },
        );
        let segments = extract_segments(&edges, &polar, cfg.min_line_length, cfg.max_line_gap);
        let has_lines = segments.len() > cfg.line_count_cutoff;

        let contour_count = external_contour_count(&binary);
        let has_shapes = contour_count > cfg.contour_count_cutoff;

        let (horizontal, vertical) = axis_aligned_counts(&segments, cfg.angle_tolerance);
        let regular_patterns =
            horizontal > cfg.horizontal_count_cutoff && vertical > cfg.vertical_count_cutoff;

        let features = ChartFeatures::from_flags(has_lines, has_shapes, regular_patterns);
        debug!(
            page = page.ordinal,
            segments = segments.len(),
            contours = contour_count,
            horizontal,
            vertical,
            confidence = features.confidence,
            "page analyzed"
        );

        if features.is_chart {
            self.persist_debug_edges(page.ordinal, &edges);
        }
        Ok(features)
    }

    /// Diagnostic side channel: keep the edge map of positive verdicts for
    /// human inspection. Never part of the data contract, so a write
    /// failure is only logged.
    fn persist_debug_edges(&self, ordinal: u32, edges: &GrayImage) {
        let Some(dir) = &self.config.debug_dir else {
            return;
        };
        let path = dir.join(format!("debug_page_{ordinal}.png"));
        if let Err(e) = edges.save(&path) {
            warn!(page = ordinal, error = %e, "failed to write debug edge map");
        }
    }
}

/// Inverted adaptive mean threshold: a pixel becomes foreground when it is
/// darker than its local mean by more than `constant`. Ink lands at 255 on
/// a black background, which is what the contour and edge passes expect.
fn adaptive_threshold_inv(gray: &GrayImage, window: u32, constant: i16) -> GrayImage {
    let radius = (window.max(3) / 2).max(1);
    let local_mean = box_filter(gray, radius, radius);

    let mut binary = GrayImage::new(gray.width(), gray.height());
    for (x, y, px) in gray.enumerate_pixels() {
        let mean = local_mean.get_pixel(x, y)[0] as i16;
        let value = if (px[0] as i16) < mean - constant { 255 } else { 0 };
        binary.put_pixel(x, y, Luma([value]));
    }
    binary
}

/// Count external contours only: top-level outer borders, the equivalent of
/// one count per connected foreground component.
fn external_contour_count(binary: &GrayImage) -> usize {
    find_contours::<u32>(binary)
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .count()
}

fn axis_aligned_counts(segments: &[LineSegment], tolerance: f32) -> (usize, usize) {
    let mut horizontal = 0;
    let mut vertical = 0;
    for s in segments {
        if s.is_horizontal(tolerance) {
            horizontal += 1;
        } else if s.is_vertical(tolerance) {
            vertical += 1;
        }
        // Oblique segments are left uncounted.
    }
    (horizontal, vertical)
}
