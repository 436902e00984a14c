use anyhow::{bail, Context, Result};
use belt_monitor::output::{write_reports, ReportFormat};
use belt_monitor::{AnalysisResult, AnalyzerConfig, BeltAnalyzer, Roi};
use clap::Parser;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

#[derive(Parser, Debug)]
#[command(author, version, about = "Conveyor belt width monitor", long_about = None)]
struct Args {
    /// Input video or image file
    input: PathBuf,

    /// Report output directory
    #[arg(short, long, default_value = "reports")]
    output: PathBuf,

    /// JSON file with analyzer settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum belt width threshold (px) [default: 100]
    #[arg(long)]
    min_width: Option<f64>,

    /// Maximum belt width threshold (px) [default: 2000]
    #[arg(long)]
    max_width: Option<f64>,

    /// Seam detection sensitivity, 0-1 [default: 0.3]
    #[arg(long)]
    seam_threshold: Option<f64>,

    /// Pixels per millimetre, recorded in report summaries [default: 1]
    #[arg(long)]
    calibration: Option<f64>,

    /// Process every Nth frame
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    sample_rate: u32,

    /// Region of interest
    #[arg(long, num_args = 4, value_names = ["X", "Y", "W", "H"])]
    roi: Option<Vec<u32>>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::All)]
    format: ReportFormat,

    /// Print the JSON summary to stdout instead of writing reports
    #[arg(long)]
    json_stdout: bool,

    /// Save the input image with detected edges drawn on it (image inputs only)
    #[arg(long)]
    annotate: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => AnalyzerConfig::from_json_file(path)?,
            None => AnalyzerConfig::default(),
        };

        if let Some(min_width) = self.min_width {
            config.min_width_threshold = min_width;
        }
        if let Some(max_width) = self.max_width {
            config.max_width_threshold = max_width;
        }
        if let Some(seam_threshold) = self.seam_threshold {
            config.seam_detection_threshold = seam_threshold;
        }
        if let Some(calibration) = self.calibration {
            config.calibration_px_per_mm = calibration;
        }
        if let Some(roi) = &self.roi {
            if let &[x, y, w, h] = roi.as_slice() {
                config.roi = Some(Roi::new(x, y, w, h));
            }
        }

        Ok(config)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if !args.input.exists() {
        bail!("File not found: {}", args.input.display());
    }

    let config = args.analyzer_config()?;
    tracing::info!(
        "Width limits: {}..{}px, seam threshold: {}",
        config.min_width_threshold,
        config.max_width_threshold,
        config.seam_detection_threshold
    );
    if let Some(roi) = &config.roi {
        tracing::info!("ROI: x={} y={} {}x{}", roi.x, roi.y, roi.width, roi.height);
    }

    let analyzer = BeltAnalyzer::new(config);
    let image_input = is_image(&args.input);

    let result = if image_input {
        analyzer.analyze_image(&args.input)
    } else {
        analyzer.analyze_video(&args.input, args.sample_rate)
    }
    .with_context(|| format!("Analysis of {} failed", args.input.display()))?;

    if let Some(path) = &args.annotate {
        if image_input {
            let frame = image::open(&args.input)
                .with_context(|| format!("Failed to reload {}", args.input.display()))?
                .into_rgb8();
            analyzer
                .visualize(&frame)
                .save(path)
                .with_context(|| format!("Failed to save annotated image {}", path.display()))?;
            tracing::info!("Annotated image saved: {}", path.display());
        } else {
            tracing::warn!("--annotate is only supported for image inputs, ignoring");
        }
    }

    if args.json_stdout {
        println!("{}", serde_json::to_string_pretty(&result.to_summary())?);
    } else {
        let base_name = args
            .input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "belt_analysis".to_string());
        let paths = write_reports(&result, &args.output, &base_name, args.format)?;
        println!("Reports generated:");
        for path in paths {
            println!("  {}", path.display());
        }
    }

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &AnalysisResult) {
    // stderr keeps --json-stdout output parseable
    eprintln!();
    eprintln!("Analysis Summary:");
    eprintln!("  Total frames: {}", result.total_frames());
    eprintln!("  Segments detected: {}", result.segments().len());
    eprintln!("  Alerts: {}", result.alerts().len());

    if !result.segments().is_empty() {
        eprintln!();
        eprintln!("Segment Details:");
        for segment in result.segments() {
            eprintln!(
                "  Segment {}: min={:.1}px, max={:.1}px, avg={:.1}px",
                segment.id(),
                segment.min_width(),
                segment.max_width(),
                segment.mean_width()
            );
        }
    }
}
