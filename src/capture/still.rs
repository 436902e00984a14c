use super::FrameSource;
use crate::error::AnalysisError;
use anyhow::Result;
use image::{ImageError, RgbImage};
use std::path::Path;

/// A single decoded image, yielded once.
pub struct StillImageSource {
    image: RgbImage,
    consumed: bool,
    source_id: String,
}

impl StillImageSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| match source {
                ImageError::IoError(e) => AnalysisError::unavailable(path, e),
                source => AnalysisError::ImageDecode {
                    path: path.to_path_buf(),
                    source,
                },
            })?
            .into_rgb8();

        tracing::info!(
            "Loaded image {} ({}x{})",
            path.display(),
            image.width(),
            image.height()
        );

        Ok(Self::from_image(image, path.display().to_string()))
    }

    pub fn from_image(image: RgbImage, source_id: impl Into<String>) -> Self {
        Self {
            image,
            consumed: false,
            source_id: source_id.into(),
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }
}

impl FrameSource for StillImageSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.consumed {
            return Ok(None);
        }
        self.consumed = true;
        Ok(Some(self.image.clone()))
    }

    fn frame_rate(&self) -> f64 {
        0.0
    }

    fn total_frames(&self) -> u64 {
        1
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_exactly_one_frame() {
        let mut source = StillImageSource::from_image(RgbImage::new(4, 4), "still");
        assert!(source.read_frame().unwrap().is_some());
        assert!(source.read_frame().unwrap().is_none());
        assert_eq!(source.frame_rate(), 0.0);
        assert_eq!(source.total_frames(), 1);
    }

    #[test]
    fn missing_image_is_unavailable() {
        let err = StillImageSource::open("/nonexistent/belt.png")
            .err()
            .expect("opening a missing file must fail");
        assert!(matches!(err, AnalysisError::SourceUnavailable { .. }));
    }
}
