use super::assembler::{SampledFrame, SegmentAssembler};
use crate::capture::{FrameSource, StillImageSource, VideoFileSource};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::measurement::{
    annotate, locate_edges, to_luma, EdgePair, Preprocessor, WidthOutcome, WidthValidator,
};
use crate::seam::SeamDetector;
use crate::types::AnalysisResult;
use image::{GrayImage, RgbImage};
use std::borrow::Cow;
use std::path::Path;
use std::time::{Duration, Instant};

/// Conveyor belt width analyzer.
///
/// Holds no per-run state: every analysis owns its own
/// [`SegmentAssembler`], so one analyzer can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct BeltAnalyzer {
    config: AnalyzerConfig,
    preprocessor: Preprocessor,
    validator: WidthValidator,
    seam_detector: SeamDetector,
}

impl Default for BeltAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl BeltAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let validator = WidthValidator::new(config.min_width_threshold, config.max_width_threshold);
        let seam_detector = SeamDetector::new(config.seam_detection_threshold);
        Self {
            config,
            preprocessor: Preprocessor::default(),
            validator,
            seam_detector,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze a video file, measuring every `sample_rate`-th frame.
    pub fn analyze_video<P: AsRef<Path>>(
        &self,
        path: P,
        sample_rate: u32,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mut source = VideoFileSource::open(path)?;
        Ok(self.analyze_source(&mut source, sample_rate))
    }

    /// Analyze a single image file.
    pub fn analyze_image<P: AsRef<Path>>(&self, path: P) -> Result<AnalysisResult, AnalysisError> {
        let source = StillImageSource::open(path)?;
        Ok(self.analyze_frame(source.image(), source.source_id()))
    }

    /// Run the sequential frame loop over any frame source.
    ///
    /// A read error mid-stream ends the stream; everything accumulated up to
    /// that point is returned.
    pub fn analyze_source(&self, source: &mut dyn FrameSource, sample_rate: u32) -> AnalysisResult {
        let sample_rate = if sample_rate == 0 {
            tracing::warn!("Sample rate 0 is not meaningful, using 1");
            1
        } else {
            u64::from(sample_rate)
        };

        let mut assembler = SegmentAssembler::new(self.config.warning_width());
        let mut previous: Option<GrayImage> = None;
        let mut frame_count = 0u64;
        let mut sampled = 0u64;
        let mut total_process_time = Duration::ZERO;

        loop {
            let frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(
                        "Failed to decode frame {}, ending stream: {err:#}",
                        frame_count + 1
                    );
                    break;
                }
            };

            frame_count += 1;
            if frame_count % sample_rate != 0 {
                continue;
            }

            let process_start = Instant::now();
            let _span = tracing::debug_span!("frame", index = frame_count).entered();

            let luma = to_luma(&self.crop(&frame));
            let width = self.measure_luma(&luma);
            let seam = self.seam_detector.detect(&luma, previous.as_ref());
            if seam {
                tracing::info!("Seam detected at frame {}", frame_count);
            }

            assembler = assembler.advance(SampledFrame {
                index: frame_count,
                width,
                seam,
            });
            previous = Some(luma);

            sampled += 1;
            total_process_time += process_start.elapsed();
            if sampled % 100 == 0 {
                tracing::debug!(
                    "Frame {}: avg process={:.1}ms",
                    frame_count,
                    total_process_time.as_secs_f64() * 1000.0 / sampled as f64
                );
            }
        }

        let (segments, alerts) = assembler.finish();
        tracing::info!(
            "Analysis complete. Found {} segments, {} alerts ({} frames read, {} sampled)",
            segments.len(),
            alerts.len(),
            frame_count,
            sampled
        );

        AnalysisResult::new(
            source.source_id(),
            source.total_frames(),
            source.frame_rate(),
            segments,
            alerts,
        )
        .with_calibration(self.config.calibration_px_per_mm)
    }

    /// Image mode: one measurement, no seam detection.
    pub fn analyze_frame(&self, frame: &RgbImage, source: &str) -> AnalysisResult {
        let width = self.measure_width(&self.crop(frame));
        let (segments, alerts) = SegmentAssembler::new(self.config.warning_width())
            .advance_still(width)
            .finish();
        tracing::info!("Image analysis complete: {:?}", width);
        AnalysisResult::new(source, 1, 0.0, segments, alerts)
            .with_calibration(self.config.calibration_px_per_mm)
    }

    /// Measure the belt width in a frame that is already cropped.
    pub fn measure_width(&self, frame: &RgbImage) -> WidthOutcome {
        self.measure_luma(&to_luma(frame))
    }

    /// Edge columns of a frame that is already cropped.
    pub fn detect_edges(&self, frame: &RgbImage) -> EdgePair {
        locate_edges(&self.preprocessor.preprocess(frame))
    }

    /// Seam signal between two frames that are already cropped.
    pub fn detect_seam(&self, frame: &RgbImage, previous: Option<&RgbImage>) -> bool {
        let previous = previous.map(to_luma);
        self.seam_detector.detect(&to_luma(frame), previous.as_ref())
    }

    /// The cropped frame with detected edges and width drawn on it.
    pub fn visualize(&self, frame: &RgbImage) -> RgbImage {
        let cropped = self.crop(frame);
        annotate(&cropped, self.detect_edges(&cropped))
    }

    fn measure_luma(&self, luma: &GrayImage) -> WidthOutcome {
        let mask = self.preprocessor.preprocess_luma(luma);
        let edges = locate_edges(&mask);
        let outcome = self.validator.validate(edges);
        tracing::debug!(?edges, ?outcome, "measured");
        outcome
    }

    fn crop<'a>(&self, frame: &'a RgbImage) -> Cow<'a, RgbImage> {
        match &self.config.roi {
            Some(roi) => Cow::Owned(roi.crop(frame)),
            None => Cow::Borrowed(frame),
        }
    }
}
