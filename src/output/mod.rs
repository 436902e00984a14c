mod csv;
mod json;
mod xlsx;

pub use self::csv::CsvReport;
pub use self::json::JsonReport;
pub use self::xlsx::XlsxReport;

use crate::types::AnalysisResult;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Trait for report destinations
pub trait ReportSink {
    /// Render `result` and write it as `<dir>/<base_name>.<extension>`
    fn write_report(&self, result: &AnalysisResult, base_name: &str) -> Result<PathBuf>;

    /// File extension of the written report
    fn extension(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    All,
    Excel,
    Csv,
    Json,
}

impl ReportFormat {
    pub fn sinks(self, output_dir: &Path) -> Vec<Box<dyn ReportSink>> {
        let csv = || Box::new(CsvReport::new(output_dir)) as Box<dyn ReportSink>;
        let json = || Box::new(JsonReport::new(output_dir)) as Box<dyn ReportSink>;
        let excel = || Box::new(XlsxReport::new(output_dir)) as Box<dyn ReportSink>;
        match self {
            ReportFormat::All => vec![excel(), csv(), json()],
            ReportFormat::Excel => vec![excel()],
            ReportFormat::Csv => vec![csv()],
            ReportFormat::Json => vec![json()],
        }
    }
}

/// Write `result` in every format selected by `format`.
pub fn write_reports(
    result: &AnalysisResult,
    output_dir: &Path,
    base_name: &str,
    format: ReportFormat,
) -> Result<Vec<PathBuf>> {
    format
        .sinks(output_dir)
        .iter()
        .map(|sink| sink.write_report(result, base_name))
        .collect()
}

fn ensure_dir(dir: &Path) -> Result<()> {
    use anyhow::Context;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create report directory {}", dir.display()))
}
