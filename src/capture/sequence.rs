use super::FrameSource;
use anyhow::Result;
use image::RgbImage;
use std::collections::VecDeque;

/// Frames already decoded into memory, e.g. by a caller with its own decoder.
pub struct FrameSequence {
    frames: VecDeque<RgbImage>,
    fps: f64,
    total_frames: u64,
    source_id: String,
}

impl FrameSequence {
    pub fn new(source_id: impl Into<String>, frames: Vec<RgbImage>, fps: f64) -> Self {
        let total_frames = frames.len() as u64;
        Self {
            frames: frames.into(),
            fps,
            total_frames,
            source_id: source_id.into(),
        }
    }
}

impl FrameSource for FrameSequence {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }
}
