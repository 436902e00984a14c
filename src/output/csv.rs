use super::{ensure_dir, ReportSink};
use crate::types::AnalysisResult;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const HEADER: &str = "segment_id,frame_start,frame_end,min_width_px,max_width_px,avg_width_px,variance,measurement_count,status";

/// One row per segment.
pub struct CsvReport {
    output_dir: PathBuf,
}

impl CsvReport {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn render(result: &AnalysisResult) -> String {
        let mut out = String::with_capacity(HEADER.len() + 1 + result.segments().len() * 64);
        out.push_str(HEADER);
        out.push('\n');
        for row in result.segment_rows() {
            // Writing to a String cannot fail
            let _ = writeln!(
                out,
                "{},{},{},{:.2},{:.2},{:.2},{:.2},{},{}",
                row.segment_id,
                row.frame_start,
                row.frame_end,
                row.min_width_px,
                row.max_width_px,
                row.avg_width_px,
                row.variance,
                row.measurement_count,
                row.status.as_str()
            );
        }
        out
    }
}

impl ReportSink for CsvReport {
    fn write_report(&self, result: &AnalysisResult, base_name: &str) -> Result<PathBuf> {
        ensure_dir(&self.output_dir)?;
        let path = self.output_dir.join(format!("{base_name}.{}", self.extension()));
        fs::write(&path, Self::render(result))
            .with_context(|| format!("Failed to write CSV report {}", path.display()))?;
        tracing::info!("CSV report saved: {}", path.display());
        Ok(path)
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}
