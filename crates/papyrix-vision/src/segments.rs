//! Line-segment extraction along Hough-voted lines.
//!
//! The Hough accumulator only says "a line with this angle and offset got
//! enough votes"; it does not say where on that line the ink actually is.
//! Each voted line is walked across the edge map, collecting runs of edge
//! pixels. Runs may bridge gaps up to `max_gap` pixels; runs shorter than
//! `min_length` are discarded. The walk is fully deterministic, so repeated
//! analysis of one image always yields the same segments.

use image::GrayImage;
use imageproc::hough::PolarLine;

/// A detected line segment in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl LineSegment {
    pub fn length(&self) -> f32 {
        let dx = self.x1 - self.x0;
        let dy = self.y1 - self.y0;
        (dx * dx + dy * dy).sqrt()
    }

    /// Absolute angle from the horizontal axis, in degrees within [0, 180].
    pub fn angle_degrees(&self) -> f32 {
        let dy = self.y1 - self.y0;
        let dx = self.x1 - self.x0;
        dy.atan2(dx).to_degrees().abs()
    }

    pub fn is_horizontal(&self, tolerance: f32) -> bool {
        let a = self.angle_degrees();
        a < tolerance || a > 180.0 - tolerance
    }

    pub fn is_vertical(&self, tolerance: f32) -> bool {
        (self.angle_degrees() - 90.0).abs() < tolerance
    }
}

/// Walk every voted polar line across the edge map and return the segments
/// of actual edge support.
pub fn extract_segments(
    edges: &GrayImage,
    lines: &[PolarLine],
    min_length: u32,
    max_gap: u32,
) -> Vec<LineSegment> {
    let mut segments = Vec::new();
    for line in lines {
        walk_line(edges, line, min_length as f32, max_gap as f32, &mut segments);
    }
    segments
}

fn walk_line(
    edges: &GrayImage,
    line: &PolarLine,
    min_length: f32,
    max_gap: f32,
    out: &mut Vec<LineSegment>,
) {
    let (w, h) = (edges.width() as f32, edges.height() as f32);
    let diag = (w * w + h * h).sqrt();

    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    // Base point on the line; the direction vector is its perpendicular.
    let (px, py) = (line.r * cos_t, line.r * sin_t);
    let (dx, dy) = (-sin_t, cos_t);

    let mut run_start: Option<f32> = None;
    let mut last_hit = 0.0f32;

    let mut t = -diag;
    while t <= diag {
        let x = (px + t * dx).round();
        let y = (py + t * dy).round();
        let on_edge = x >= 0.0
            && y >= 0.0
            && x < w
            && y < h
            && near_edge(edges, x as i64, y as i64);

        if on_edge {
            if run_start.is_none() {
                run_start = Some(t);
            }
            last_hit = t;
        } else if let Some(start) = run_start {
            if t - last_hit > max_gap {
                close_run(px, py, dx, dy, start, last_hit, min_length, out);
                run_start = None;
            }
        }
        t += 1.0;
    }
    if let Some(start) = run_start {
        close_run(px, py, dx, dy, start, last_hit, min_length, out);
    }
}

#[allow(clippy::too_many_arguments)]
fn close_run(
    px: f32,
    py: f32,
    dx: f32,
    dy: f32,
    start: f32,
    end: f32,
    min_length: f32,
    out: &mut Vec<LineSegment>,
) {
    if end - start >= min_length {
        out.push(LineSegment {
            x0: px + start * dx,
            y0: py + start * dy,
            x1: px + end * dx,
            y1: py + end * dy,
        });
    }
}

/// Rasterized lines rarely sit exactly on the ideal polar line, so sample a
/// 3x3 neighborhood around the walked point.
fn near_edge(edges: &GrayImage, x: i64, y: i64) -> bool {
    let (w, h) = (edges.width() as i64, edges.height() as i64);
    for oy in -1..=1 {
        for ox in -1..=1 {
            let (xx, yy) = (x + ox, y + oy);
            if xx >= 0 && yy >= 0 && xx < w && yy < h && edges.get_pixel(xx as u32, yy as u32)[0] > 0
            {
                return true;
            }
        }
    }
    false
}
