use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort an analysis before any result is produced.
///
/// Per-frame detection failures are not errors; they show up as absent
/// measurements (see [`crate::measurement::WidthOutcome`]).
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The frame source could not be opened or probed at all.
    #[error("cannot open source {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    /// A still image could not be decoded.
    #[error("cannot decode image {}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl AnalysisError {
    pub fn unavailable(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
