mod sequence;
mod still;
mod video;

pub use sequence::FrameSequence;
pub use still::StillImageSource;
pub use video::{parse_framerate, probe, VideoFileSource, VideoInfo};

use anyhow::Result;
use image::RgbImage;

/// Ordered supply of decoded frames.
pub trait FrameSource {
    /// Read the next frame; `Ok(None)` at end of stream
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;

    /// Frames per second (0.0 for a still image)
    fn frame_rate(&self) -> f64;

    /// Total frame count as reported by the container
    fn total_frames(&self) -> u64;

    /// Identifier copied into the analysis result, usually the file path
    fn source_id(&self) -> &str;
}
