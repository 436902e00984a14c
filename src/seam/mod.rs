//! Seam (belt joint) detection between consecutive sampled frames.
//!
//! Two independent heuristics, combined with a logical OR:
//! - a near-horizontal straight line spanning at least half the frame width
//!   in the current frame ([`SeamDetector::line_signal`]);
//! - a large mean intensity change against the previous frame
//!   ([`SeamDetector::intensity_signal`]).

pub mod canny;
pub mod hough;

use image::GrayImage;

pub use canny::{canny, sobel_gradients, Gradients};
pub use hough::{detect_segments, HoughParams, LineSegment};

#[derive(Debug, Clone)]
pub struct SeamDetector {
    /// Mean absolute luma change, as a fraction of 255, that signals a seam.
    intensity_threshold: f64,
    canny_low: f32,
    canny_high: f32,
    hough_threshold: u32,
    /// Minimum line length as a fraction of the frame width.
    min_line_ratio: f64,
    max_line_gap: u32,
    /// Lines flatter than this (radians) count as seams.
    max_line_angle: f64,
}

impl Default for SeamDetector {
    fn default() -> Self {
        Self::new(0.3)
    }
}

impl SeamDetector {
    pub fn new(intensity_threshold: f64) -> Self {
        Self {
            intensity_threshold,
            canny_low: 50.0,
            canny_high: 150.0,
            hough_threshold: 100,
            min_line_ratio: 0.5,
            max_line_gap: 10,
            max_line_angle: 0.1,
        }
    }

    /// Seam signal for `current` given the previous sampled frame, if any.
    /// Always false for the first frame.
    pub fn detect(&self, current: &GrayImage, previous: Option<&GrayImage>) -> bool {
        let Some(previous) = previous else {
            return false;
        };

        if self.line_signal(current) {
            tracing::debug!("seam: horizontal line");
            return true;
        }
        if self.intensity_signal(current, previous) {
            tracing::debug!("seam: intensity change");
            return true;
        }
        false
    }

    /// True if the frame contains a long, nearly horizontal straight line.
    pub fn line_signal(&self, gray: &GrayImage) -> bool {
        let edges = canny(gray, self.canny_low, self.canny_high);
        let params = HoughParams {
            threshold: self.hough_threshold,
            min_line_length: f64::from(gray.width()) * self.min_line_ratio,
            max_line_gap: self.max_line_gap,
            ..Default::default()
        };
        detect_segments(&edges, &params)
            .iter()
            .any(|segment| segment.angle() < self.max_line_angle)
    }

    /// True if the mean absolute luma difference exceeds the threshold.
    pub fn intensity_signal(&self, current: &GrayImage, previous: &GrayImage) -> bool {
        mean_abs_difference(current, previous) > self.intensity_threshold * 255.0
    }
}

/// Mean of `|a - b|` over all pixels. Frames of different size never differ.
pub fn mean_abs_difference(a: &GrayImage, b: &GrayImage) -> f64 {
    if a.dimensions() != b.dimensions() {
        tracing::warn!(
            "Frame size changed from {:?} to {:?}; skipping intensity comparison",
            b.dimensions(),
            a.dimensions()
        );
        return 0.0;
    }
    let len = a.as_raw().len();
    if len == 0 {
        return 0.0;
    }
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(&p, &q)| u64::from(p.abs_diff(q)))
        .sum();
    total as f64 / len as f64
}
