mod common;

use anyhow::{anyhow, Result};
use belt_monitor::capture::{FrameSequence, FrameSource};
use belt_monitor::{AlertKind, AnalysisError, AnalyzerConfig, BeltAnalyzer, Roi, Severity};
use common::synthetic_frames::{belt_frame, belt_frame_sized, seam_frame, with_bar};
use image::RgbImage;

// Belt on columns 80..=250 measures 250 - 80 + 10 px.
const LEFT: u32 = 80;
const RIGHT: u32 = 250;
const BELT_WIDTH: f64 = 180.0;

fn sequence(frames: Vec<RgbImage>) -> FrameSequence {
    FrameSequence::new("synthetic.mp4", frames, 30.0)
}

/// Yields `good` belt frames, then fails.
struct FailingSource {
    good: usize,
    served: usize,
}

impl FrameSource for FailingSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.served < self.good {
            self.served += 1;
            Ok(Some(belt_frame(LEFT, RIGHT)))
        } else {
            Err(anyhow!("corrupt packet"))
        }
    }

    fn frame_rate(&self) -> f64 {
        25.0
    }

    fn total_frames(&self) -> u64 {
        100
    }

    fn source_id(&self) -> &str {
        "broken.mp4"
    }
}

#[test]
fn steady_belt_forms_one_segment() {
    let analyzer = BeltAnalyzer::default();
    let frames = (0..6).map(|_| belt_frame(LEFT, RIGHT)).collect();
    let result = analyzer.analyze_source(&mut sequence(frames), 1);

    assert_eq!(result.source(), "synthetic.mp4");
    assert_eq!(result.total_frames(), 6);
    assert_eq!(result.fps(), 30.0);
    assert!(result.alerts().is_empty());

    let segments = result.segments();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].id(), 1);
    assert_eq!(segments[0].start_frame(), 0);
    assert_eq!(segments[0].end_frame(), 6);
    assert_eq!(segments[0].widths(), &[BELT_WIDTH; 6]);
    assert_eq!(segments[0].variance(), 0.0);
}

#[test]
fn seam_splits_segments_after_measuring() {
    let analyzer = BeltAnalyzer::default();
    let frames = vec![
        belt_frame(LEFT, RIGHT),
        belt_frame(LEFT, RIGHT),
        seam_frame(LEFT, RIGHT),
        belt_frame(LEFT, RIGHT),
        belt_frame(LEFT, RIGHT),
    ];
    let result = analyzer.analyze_source(&mut sequence(frames), 1);

    let segments = result.segments();
    assert_eq!(segments.len(), 2);

    assert_eq!(segments[0].id(), 1);
    assert_eq!(segments[0].start_frame(), 0);
    assert_eq!(segments[0].end_frame(), 3);
    assert_eq!(segments[0].widths().len(), 3);

    assert_eq!(segments[1].id(), 2);
    assert_eq!(segments[1].start_frame(), 3);
    assert_eq!(segments[1].end_frame(), 5);
    assert_eq!(segments[1].widths().len(), 2);

    for segment in segments {
        assert!(segment.widths().iter().all(|&w| w == BELT_WIDTH));
    }
}

#[test]
fn seam_on_first_frame_is_ignored() {
    let analyzer = BeltAnalyzer::default();
    let frames = vec![
        seam_frame(LEFT, RIGHT),
        belt_frame(LEFT, RIGHT),
        belt_frame(LEFT, RIGHT),
    ];
    let result = analyzer.analyze_source(&mut sequence(frames), 1);

    assert_eq!(result.segments().len(), 1);
    assert_eq!(result.segments()[0].widths().len(), 3);
}

#[test]
fn sample_rate_skips_frames() {
    let analyzer = BeltAnalyzer::default();
    let frames = (0..7).map(|_| belt_frame(LEFT, RIGHT)).collect();
    let result = analyzer.analyze_source(&mut sequence(frames), 2);

    assert_eq!(result.total_frames(), 7);
    let segments = result.segments();
    assert_eq!(segments.len(), 1);
    // Frames 2, 4 and 6 are sampled
    assert_eq!(segments[0].widths().len(), 3);
    assert_eq!(segments[0].end_frame(), 6);
}

#[test]
fn zero_sample_rate_processes_every_frame() {
    let analyzer = BeltAnalyzer::default();
    let frames = (0..3).map(|_| belt_frame(LEFT, RIGHT)).collect();
    let result = analyzer.analyze_source(&mut sequence(frames), 0);
    assert_eq!(result.segments()[0].widths().len(), 3);
}

#[test]
fn narrow_belt_raises_indexed_warnings() {
    // Measures 105 px: valid, but under the 110 px warning level
    let analyzer = BeltAnalyzer::default();
    let frames = (0..3).map(|_| belt_frame(100, 195)).collect();
    let result = analyzer.analyze_source(&mut sequence(frames), 1);

    assert_eq!(result.segments().len(), 1);
    assert_eq!(result.segments()[0].widths(), &[105.0; 3]);

    let alerts = result.alerts();
    assert_eq!(alerts.len(), 3);
    for (alert, frame) in alerts.iter().zip(1u64..) {
        assert_eq!(alert.kind, AlertKind::WidthWarning);
        assert_eq!(alert.severity, Severity::Warning);
        assert_eq!(alert.frame, Some(frame));
        assert_eq!(alert.message, "Belt width below threshold: 105.00px");
    }
}

#[test]
fn out_of_range_widths_are_discarded() {
    let config = AnalyzerConfig {
        max_width_threshold: 150.0,
        ..AnalyzerConfig::default()
    };
    let analyzer = BeltAnalyzer::new(config);
    let frames = (0..4).map(|_| belt_frame(LEFT, RIGHT)).collect();
    let result = analyzer.analyze_source(&mut sequence(frames), 1);

    assert!(result.segments().is_empty());
    assert!(result.alerts().is_empty());
}

#[test]
fn blank_frames_produce_no_segments() {
    let analyzer = BeltAnalyzer::default();
    let frames = (0..3).map(|_| RgbImage::new(320, 240)).collect();
    let result = analyzer.analyze_source(&mut sequence(frames), 1);

    assert_eq!(result.total_frames(), 3);
    assert!(result.segments().is_empty());
    assert!(result.alerts().is_empty());
}

#[test]
fn decode_failure_ends_stream_gracefully() {
    let analyzer = BeltAnalyzer::default();
    let mut source = FailingSource { good: 3, served: 0 };
    let result = analyzer.analyze_source(&mut source, 1);

    assert_eq!(result.source(), "broken.mp4");
    assert_eq!(result.total_frames(), 100);
    assert_eq!(result.segments().len(), 1);
    assert_eq!(result.segments()[0].widths().len(), 3);
    assert_eq!(result.segments()[0].end_frame(), 3);
}

#[test]
fn repeated_runs_are_identical() {
    let analyzer = BeltAnalyzer::default();
    let frames = || {
        vec![
            belt_frame(LEFT, RIGHT),
            seam_frame(LEFT, RIGHT),
            belt_frame(100, 195),
        ]
    };
    let first = analyzer.analyze_source(&mut sequence(frames()), 1);
    let second = analyzer.analyze_source(&mut sequence(frames()), 1);

    assert_eq!(first.segments(), second.segments());
    assert_eq!(first.alerts(), second.alerts());
}

#[test]
fn roi_excludes_structures_outside_it() {
    // A bright rail at 20..=40 sits left of the belt at 150..=320
    let frame = with_bar(belt_frame_sized(400, 300, 150, 320), 20, 40);

    let unrestricted = BeltAnalyzer::default();
    let frames = vec![frame.clone()];
    let result = unrestricted.analyze_source(&mut FrameSequence::new("rail", frames, 30.0), 1);
    assert_eq!(result.segments()[0].widths(), &[310.0]);

    let config = AnalyzerConfig {
        roi: Some(Roi::new(100, 20, 280, 240)),
        ..AnalyzerConfig::default()
    };
    let restricted = BeltAnalyzer::new(config);
    let result = restricted.analyze_source(&mut FrameSequence::new("rail", vec![frame], 30.0), 1);
    assert_eq!(result.segments()[0].widths(), &[BELT_WIDTH]);
}

#[test]
fn missing_video_is_reported_as_unavailable() {
    let analyzer = BeltAnalyzer::default();
    let err = analyzer
        .analyze_video("/nonexistent/belt-footage.mp4", 1)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::SourceUnavailable { .. }));
}
