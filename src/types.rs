use chrono::{DateTime, Local};
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

/// Rectangular crop in source-frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Crop a frame to this region. Parts outside the frame are clamped away.
    pub fn crop(&self, frame: &RgbImage) -> RgbImage {
        imageops::crop_imm(frame, self.x, self.y, self.width, self.height).to_image()
    }
}

/// One physically continuous belt section between two seams.
///
/// Statistics are derived from `widths` on demand and are 0.0 for an empty
/// segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    id: u32,
    start_frame: u64,
    end_frame: u64,
    widths: Vec<f64>,
}

impl Segment {
    pub fn new(id: u32, start_frame: u64) -> Self {
        Self {
            id,
            start_frame,
            end_frame: start_frame,
            widths: Vec::new(),
        }
    }

    pub fn with_widths(id: u32, start_frame: u64, end_frame: u64, widths: Vec<f64>) -> Self {
        Self {
            id,
            start_frame,
            end_frame,
            widths,
        }
    }

    /// Record a valid measurement taken at `frame`.
    pub fn push(&mut self, width: f64, frame: u64) {
        self.widths.push(width);
        self.end_frame = frame;
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn start_frame(&self) -> u64 {
        self.start_frame
    }

    pub fn end_frame(&self) -> u64 {
        self.end_frame
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    pub fn min_width(&self) -> f64 {
        if self.widths.is_empty() {
            return 0.0;
        }
        self.widths.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_width(&self) -> f64 {
        if self.widths.is_empty() {
            return 0.0;
        }
        self.widths.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn mean_width(&self) -> f64 {
        if self.widths.is_empty() {
            return 0.0;
        }
        self.widths.iter().sum::<f64>() / self.widths.len() as f64
    }

    /// Population variance of the recorded widths.
    pub fn variance(&self) -> f64 {
        if self.widths.len() < 2 {
            return 0.0;
        }
        let mean = self.mean_width();
        self.widths.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / self.widths.len() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    WidthWarning,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::WidthWarning => "width_warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    /// Absent for still images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<u64>,
    pub message: String,
    pub severity: Severity,
}

impl Alert {
    pub fn width_warning(frame: Option<u64>, width: f64) -> Self {
        Self {
            kind: AlertKind::WidthWarning,
            frame,
            message: format!("Belt width below threshold: {width:.2}px"),
            severity: Severity::Warning,
        }
    }
}

/// Output of one analysis run. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    source: String,
    total_frames: u64,
    fps: f64,
    segments: Vec<Segment>,
    alerts: Vec<Alert>,
    calibration_px_per_mm: f64,
    created_at: DateTime<Local>,
}

impl AnalysisResult {
    pub fn new(
        source: impl Into<String>,
        total_frames: u64,
        fps: f64,
        segments: Vec<Segment>,
        alerts: Vec<Alert>,
    ) -> Self {
        Self {
            source: source.into(),
            total_frames,
            fps,
            segments,
            alerts,
            calibration_px_per_mm: 1.0,
            created_at: Local::now(),
        }
    }

    /// Record the pixels-per-millimetre factor the analysis ran with.
    pub fn with_calibration(mut self, px_per_mm: f64) -> Self {
        self.calibration_px_per_mm = px_per_mm;
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Frames per second; 0.0 for a still image.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn calibration_px_per_mm(&self) -> f64 {
        self.calibration_px_per_mm
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    /// Mean over every measurement of every segment.
    pub fn global_mean_width(&self) -> f64 {
        let (sum, count) = self
            .segments
            .iter()
            .flat_map(|s| s.widths().iter())
            .fold((0.0, 0usize), |(sum, count), w| (sum + w, count + 1));
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// One row per segment, widths rounded to 2 decimals.
    pub fn segment_rows(&self) -> Vec<SegmentRow> {
        let global_mean = self.global_mean_width();
        self.segments
            .iter()
            .map(|s| SegmentRow::from_segment(s, global_mean))
            .collect()
    }

    pub fn to_summary(&self) -> AnalysisSummary {
        AnalysisSummary {
            source_file: self.source.clone(),
            total_frames: self.total_frames,
            fps: self.fps,
            calibration_px_per_mm: self.calibration_px_per_mm,
            total_segments: self.segments.len(),
            segments: self.segment_rows(),
            alerts: self.alerts.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Ok,
    Attention,
}

impl SegmentStatus {
    const MAX_VARIANCE: f64 = 100.0;
    const MIN_RATIO_TO_GLOBAL_MEAN: f64 = 0.9;

    fn classify(segment: &Segment, global_mean: f64) -> Self {
        if segment.variance() > Self::MAX_VARIANCE
            || segment.min_width() < global_mean * Self::MIN_RATIO_TO_GLOBAL_MEAN
        {
            SegmentStatus::Attention
        } else {
            SegmentStatus::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Ok => "ok",
            SegmentStatus::Attention => "attention",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentRow {
    pub segment_id: u32,
    pub frame_start: u64,
    pub frame_end: u64,
    pub min_width_px: f64,
    pub max_width_px: f64,
    pub avg_width_px: f64,
    pub variance: f64,
    pub measurement_count: usize,
    pub status: SegmentStatus,
}

impl SegmentRow {
    fn from_segment(segment: &Segment, global_mean: f64) -> Self {
        Self {
            segment_id: segment.id(),
            frame_start: segment.start_frame(),
            frame_end: segment.end_frame(),
            min_width_px: round2(segment.min_width()),
            max_width_px: round2(segment.max_width()),
            avg_width_px: round2(segment.mean_width()),
            variance: round2(segment.variance()),
            measurement_count: segment.widths().len(),
            status: SegmentStatus::classify(segment, global_mean),
        }
    }
}

/// Serializable document form of an [`AnalysisResult`].
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub source_file: String,
    pub total_frames: u64,
    pub fps: f64,
    pub calibration_px_per_mm: f64,
    pub total_segments: usize,
    pub segments: Vec<SegmentRow>,
    pub alerts: Vec<Alert>,
    pub created_at: DateTime<Local>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
