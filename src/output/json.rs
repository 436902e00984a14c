use super::{ensure_dir, ReportSink};
use crate::types::{AnalysisResult, AnalysisSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct JsonDocument {
    #[serde(flatten)]
    summary: AnalysisSummary,
    generated_at: DateTime<Local>,
}

/// Full analysis document: summary, segment rows and alerts.
pub struct JsonReport {
    output_dir: PathBuf,
}

impl JsonReport {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn render(result: &AnalysisResult) -> Result<String> {
        let document = JsonDocument {
            summary: result.to_summary(),
            generated_at: Local::now(),
        };
        serde_json::to_string_pretty(&document).context("Failed to serialize analysis")
    }
}

impl ReportSink for JsonReport {
    fn write_report(&self, result: &AnalysisResult, base_name: &str) -> Result<PathBuf> {
        ensure_dir(&self.output_dir)?;
        let path = self.output_dir.join(format!("{base_name}.{}", self.extension()));
        fs::write(&path, Self::render(result)?)
            .with_context(|| format!("Failed to write JSON report {}", path.display()))?;
        tracing::info!("JSON report saved: {}", path.display());
        Ok(path)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
