//! Conveyor belt width monitoring.
//!
//! Frames are cropped to an optional region of interest, reduced to a binary
//! mask, scanned for the two belt edges and checked against width limits.
//! Seams between belt sections split the footage into segments, each with
//! its own width statistics; narrow readings raise alerts.

pub mod capture;
pub mod config;
pub mod error;
pub mod measurement;
pub mod output;
pub mod pipeline;
pub mod seam;
pub mod types;

pub use crate::config::AnalyzerConfig;
pub use crate::error::AnalysisError;
pub use crate::pipeline::BeltAnalyzer;
pub use crate::types::{Alert, AlertKind, AnalysisResult, Roi, Segment, Severity};
