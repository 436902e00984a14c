use super::{ensure_dir, ReportSink};
use crate::types::{AnalysisResult, SegmentStatus};
use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{
    Chart, ChartType, Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError,
};
use std::path::{Path, PathBuf};

pub const SUMMARY_SHEET: &str = "Summary";
pub const SEGMENTS_SHEET: &str = "Segments";
pub const ALERTS_SHEET: &str = "Alerts";
pub const CHART_SHEET: &str = "Chart";

const SEGMENT_HEADERS: [&str; 9] = [
    "Segment ID",
    "Start Frame",
    "End Frame",
    "Min Width (px)",
    "Max Width (px)",
    "Avg Width (px)",
    "Variance",
    "Measurements",
    "Status",
];
const ALERT_HEADERS: [&str; 4] = ["Type", "Frame", "Message", "Severity"];

const HEADER_FILL: u32 = 0x2F5496;
const ALERT_FILL: u32 = 0xFFC7CE;
const GOOD_FILL: u32 = 0xC6EFCE;

/// Workbook with a summary sheet, the segment table, the alert list and,
/// for two or more segments, a width chart.
pub struct XlsxReport {
    output_dir: PathBuf,
}

struct Styles {
    title: Format,
    label: Format,
    header: Format,
    cell: Format,
    ok: Format,
    attention: Format,
}

impl Styles {
    fn new() -> Self {
        let cell = Format::new()
            .set_border(FormatBorder::Thin)
            .set_align(FormatAlign::Center);
        Self {
            title: Format::new().set_bold().set_font_size(14),
            label: Format::new().set_bold(),
            header: cell
                .clone()
                .set_bold()
                .set_font_color(Color::White)
                .set_background_color(Color::RGB(HEADER_FILL)),
            ok: cell.clone().set_background_color(Color::RGB(GOOD_FILL)),
            attention: cell.clone().set_background_color(Color::RGB(ALERT_FILL)),
            cell,
        }
    }
}

impl XlsxReport {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Build the workbook in memory.
    pub fn build(result: &AnalysisResult) -> Result<Workbook, XlsxError> {
        let styles = Styles::new();
        let mut workbook = Workbook::new();

        write_summary(workbook.add_worksheet(), result, &styles)?;
        write_segments(workbook.add_worksheet(), result, &styles)?;
        write_alerts(workbook.add_worksheet(), result, &styles)?;
        if result.segments().len() >= 2 {
            write_chart(workbook.add_worksheet(), result.segments().len() as u32)?;
        }

        Ok(workbook)
    }
}

impl ReportSink for XlsxReport {
    fn write_report(&self, result: &AnalysisResult, base_name: &str) -> Result<PathBuf> {
        ensure_dir(&self.output_dir)?;
        let path = self.output_dir.join(format!("{base_name}.{}", self.extension()));
        Self::build(result)
            .and_then(|mut workbook| workbook.save(&path))
            .with_context(|| format!("Failed to write Excel report {}", path.display()))?;
        tracing::info!("Excel report saved: {}", path.display());
        Ok(path)
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }
}

fn write_summary(
    sheet: &mut Worksheet,
    result: &AnalysisResult,
    styles: &Styles,
) -> Result<(), XlsxError> {
    sheet.set_name(SUMMARY_SHEET)?;
    sheet.set_column_width(0, 28)?;
    sheet.set_column_width(1, 40)?;
    sheet.write_string_with_format(0, 0, "Conveyor Belt Analysis Report", &styles.title)?;

    let date = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let texts = [
        ("Source file:", result.source()),
        ("Analysis date:", date.as_str()),
    ];
    for (row, (label, value)) in (2u32..).zip(texts) {
        sheet.write_string_with_format(row, 0, label, &styles.label)?;
        sheet.write_string(row, 1, value)?;
    }

    let numbers = [
        ("Total frames:", result.total_frames() as f64),
        ("FPS:", result.fps()),
        ("Calibration (px/mm):", result.calibration_px_per_mm()),
        ("Segments detected:", result.segments().len() as f64),
        ("Alerts:", result.alerts().len() as f64),
    ];
    for (row, (label, value)) in (4u32..).zip(numbers) {
        sheet.write_string_with_format(row, 0, label, &styles.label)?;
        sheet.write_number(row, 1, value)?;
    }
    Ok(())
}

fn write_segments(
    sheet: &mut Worksheet,
    result: &AnalysisResult,
    styles: &Styles,
) -> Result<(), XlsxError> {
    sheet.set_name(SEGMENTS_SHEET)?;
    for (col, header) in (0u16..).zip(SEGMENT_HEADERS) {
        sheet.write_string_with_format(0, col, header, &styles.header)?;
        sheet.set_column_width(col, 18)?;
    }

    for (row, segment) in (1u32..).zip(result.segment_rows()) {
        let numbers = [
            f64::from(segment.segment_id),
            segment.frame_start as f64,
            segment.frame_end as f64,
            segment.min_width_px,
            segment.max_width_px,
            segment.avg_width_px,
            segment.variance,
            segment.measurement_count as f64,
        ];
        for (col, value) in (0u16..).zip(numbers) {
            sheet.write_number_with_format(row, col, value, &styles.cell)?;
        }
        let status_format = match segment.status {
            SegmentStatus::Ok => &styles.ok,
            SegmentStatus::Attention => &styles.attention,
        };
        sheet.write_string_with_format(row, 8, segment.status.as_str(), status_format)?;
    }
    Ok(())
}

fn write_alerts(
    sheet: &mut Worksheet,
    result: &AnalysisResult,
    styles: &Styles,
) -> Result<(), XlsxError> {
    sheet.set_name(ALERTS_SHEET)?;
    for (col, header) in (0u16..).zip(ALERT_HEADERS) {
        sheet.write_string_with_format(0, col, header, &styles.header)?;
    }
    sheet.set_column_width(2, 40)?;

    for (row, alert) in (1u32..).zip(result.alerts()) {
        sheet.write_string_with_format(row, 0, alert.kind.as_str(), &styles.attention)?;
        if let Some(frame) = alert.frame {
            sheet.write_number_with_format(row, 1, frame as f64, &styles.attention)?;
        }
        sheet.write_string_with_format(row, 2, alert.message.as_str(), &styles.attention)?;
        sheet.write_string_with_format(row, 3, alert.severity.as_str(), &styles.attention)?;
    }
    Ok(())
}

/// Line chart of min, max and average width per segment, read from the
/// segment sheet.
fn write_chart(sheet: &mut Worksheet, segments: u32) -> Result<(), XlsxError> {
    sheet.set_name(CHART_SHEET)?;

    let mut chart = Chart::new(ChartType::Line);
    for col in [3u16, 4, 5] {
        chart
            .add_series()
            .set_name((SEGMENTS_SHEET, 0, col))
            .set_categories((SEGMENTS_SHEET, 1, 0, segments, 0))
            .set_values((SEGMENTS_SHEET, 1, col, segments, col));
    }
    chart.title().set_name("Belt Width per Segment");
    chart.x_axis().set_name("Segment");
    chart.y_axis().set_name("Width (px)");

    sheet.insert_chart(1, 1, &chart)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Alert, Segment};
    use calamine::{open_workbook, Data, Reader, Xlsx};

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("belt-monitor-xlsx-{}-{name}", std::process::id()))
    }

    fn sample_result() -> AnalysisResult {
        AnalysisResult::new(
            "belt.mp4",
            100,
            25.0,
            vec![
                Segment::with_widths(1, 0, 42, vec![100.0, 150.0, 200.0]),
                Segment::with_widths(2, 42, 90, vec![150.0, 151.0]),
            ],
            vec![Alert::width_warning(Some(7), 104.5)],
        )
        .with_calibration(2.0)
    }

    #[test]
    fn workbook_has_summary_segments_alerts_and_chart() {
        let dir = scratch_dir("full");
        let path = XlsxReport::new(&dir)
            .write_report(&sample_result(), "belt")
            .unwrap();
        assert_eq!(path, dir.join("belt.xlsx"));

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec![SUMMARY_SHEET, SEGMENTS_SHEET, ALERTS_SHEET, CHART_SHEET]
        );

        let summary = workbook.worksheet_range(SUMMARY_SHEET).unwrap();
        let summary_rows: Vec<&[Data]> = summary.rows().collect();
        assert_eq!(summary_rows[2][1], Data::String("belt.mp4".into()));
        assert_eq!(summary_rows[4][1], Data::Float(100.0));
        assert_eq!(summary_rows[6][1], Data::Float(2.0));
        assert_eq!(summary_rows[7][1], Data::Float(2.0));

        let segments = workbook.worksheet_range(SEGMENTS_SHEET).unwrap();
        let rows: Vec<&[Data]> = segments.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Data::String("Segment ID".into()));
        assert_eq!(rows[0][8], Data::String("Status".into()));
        assert_eq!(
            rows[1],
            &[
                Data::Float(1.0),
                Data::Float(0.0),
                Data::Float(42.0),
                Data::Float(100.0),
                Data::Float(200.0),
                Data::Float(150.0),
                Data::Float(1666.67),
                Data::Float(3.0),
                Data::String("attention".into()),
            ][..]
        );
        assert_eq!(rows[2][0], Data::Float(2.0));
        assert_eq!(rows[2][8], Data::String("ok".into()));

        let alerts = workbook.worksheet_range(ALERTS_SHEET).unwrap();
        let alert_rows: Vec<&[Data]> = alerts.rows().collect();
        assert_eq!(alert_rows.len(), 2);
        assert_eq!(alert_rows[1][0], Data::String("width_warning".into()));
        assert_eq!(alert_rows[1][1], Data::Float(7.0));
        assert_eq!(
            alert_rows[1][2],
            Data::String("Belt width below threshold: 104.50px".into())
        );
        assert_eq!(alert_rows[1][3], Data::String("warning".into()));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn single_segment_workbook_has_no_chart() {
        let dir = scratch_dir("single");
        let result = AnalysisResult::new(
            "belt.png",
            1,
            0.0,
            vec![Segment::with_widths(1, 0, 0, vec![180.0])],
            Vec::new(),
        );
        let path = XlsxReport::new(&dir).write_report(&result, "belt").unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec![SUMMARY_SHEET, SEGMENTS_SHEET, ALERTS_SHEET]
        );
        let alerts = workbook.worksheet_range(ALERTS_SHEET).unwrap();
        assert_eq!(alerts.rows().count(), 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}
