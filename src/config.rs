use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::types::Roi;

/// Thresholds and crop settings shared by video and image analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Widths below this (px) are rejected as absent.
    pub min_width_threshold: f64,
    /// Widths above this (px) are rejected as absent.
    pub max_width_threshold: f64,
    /// Mean luma change (0-1, fraction of 255) that counts as a seam.
    pub seam_detection_threshold: f64,
    /// Pixels per millimetre, recorded in report summaries. Widths stay in pixels.
    pub calibration_px_per_mm: f64,
    /// Crop applied to every frame before analysis.
    pub roi: Option<Roi>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_width_threshold: 100.0,
            max_width_threshold: 2000.0,
            seam_detection_threshold: 0.3,
            calibration_px_per_mm: 1.0,
            roi: None,
        }
    }
}

impl AnalyzerConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Widths under this value are recorded but raise a warning alert.
    pub fn warning_width(&self) -> f64 {
        self.min_width_threshold * 1.1
    }
}
