use super::FrameSource;
use crate::error::AnalysisError;
use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

const FFMPEG: &str = "ffmpeg";
const FFPROBE: &str = "ffprobe";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub framerate: f64,
    pub total_frames: u64,
    pub codec: String,
}

/// Get video stream information using ffprobe
pub fn probe(input: &Path) -> Result<VideoInfo> {
    let output = Command::new(FFPROBE)
        .args([
            "-v", "quiet",
            "-print_format", "json",
            "-show_format",
            "-show_streams",
            "-select_streams", "v:0",
        ])
        .arg(input)
        .output()
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        return Err(anyhow!(
            "ffprobe failed: {}",
            String::from_utf8_lossy(&output.stderr)
        ));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let stream = json["streams"]
        .as_array()
        .and_then(|s| s.first())
        .ok_or_else(|| anyhow!("No video stream found"))?;

    let width = stream["width"].as_u64().unwrap_or(0) as u32;
    let height = stream["height"].as_u64().unwrap_or(0) as u32;
    let codec = stream["codec_name"]
        .as_str()
        .unwrap_or("unknown")
        .to_string();

    let framerate = parse_framerate(
        stream["r_frame_rate"]
            .as_str()
            .or_else(|| stream["avg_frame_rate"].as_str())
            .unwrap_or("0"),
    );

    // nb_frames is missing for some containers; fall back to duration * fps
    let total_frames = stream["nb_frames"]
        .as_str()
        .and_then(|n| n.parse::<u64>().ok())
        .unwrap_or_else(|| {
            let duration = json["format"]["duration"]
                .as_str()
                .and_then(|d| d.parse::<f64>().ok())
                .unwrap_or(0.0);
            (duration * framerate).round().max(0.0) as u64
        });

    Ok(VideoInfo {
        width,
        height,
        framerate,
        total_frames,
        codec,
    })
}

/// Parse an ffprobe rate such as `30000/1001` or `25`.
pub fn parse_framerate(fps_str: &str) -> f64 {
    if let Some((num, den)) = fps_str.split_once('/') {
        let num: f64 = num.trim().parse().unwrap_or(0.0);
        let den: f64 = den.trim().parse().unwrap_or(1.0);
        if den != 0.0 {
            return num / den;
        }
        return 0.0;
    }
    fps_str.trim().parse().unwrap_or(0.0)
}

/// ffmpeg invocation writing raw rgb24 frames of the probed stream to stdout.
///
/// Frames keep their stored orientation and the first video stream is
/// selected explicitly, so every frame matches the size reported by [`probe`].
fn decode_command(input: &Path) -> Command {
    let mut command = Command::new(FFMPEG);
    command
        .args(["-v", "error", "-nostdin", "-noautorotate", "-i"])
        .arg(input)
        .args(["-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"]);
    command
}

/// Video file decoded to raw RGB frames by an `ffmpeg` child process.
pub struct VideoFileSource {
    child: Child,
    stdout: BufReader<ChildStdout>,
    info: VideoInfo,
    frame_len: usize,
    source_id: String,
}

impl VideoFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AnalysisError::unavailable(path, "file not found"));
        }

        let info = probe(path).map_err(|e| AnalysisError::unavailable(path, format!("{e:#}")))?;
        if info.width == 0 || info.height == 0 {
            return Err(AnalysisError::unavailable(path, "stream has no frame size"));
        }

        tracing::info!("Analyzing video: {}", path.display());
        tracing::info!(
            "Total frames: {}, FPS: {:.2}, {}x{} ({})",
            info.total_frames,
            info.framerate,
            info.width,
            info.height,
            info.codec
        );

        let mut child = decode_command(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AnalysisError::unavailable(path, format!("failed to start ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AnalysisError::unavailable(path, "ffmpeg stdout not captured"))?;

        let frame_len = info.width as usize * info.height as usize * 3;
        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            info,
            frame_len,
            source_id: path.display().to_string(),
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }
}

impl FrameSource for VideoFileSource {
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut buffer = vec![0u8; self.frame_len];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e).context("Failed to read frame from ffmpeg"),
        }

        let frame = RgbImage::from_raw(self.info.width, self.info.height, buffer)
            .context("Decoded frame has unexpected size")?;
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> f64 {
        self.info.framerate
    }

    fn total_frames(&self) -> u64 {
        self.info.total_frames
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }
}

impl Drop for VideoFileSource {
    fn drop(&mut self) {
        // ffmpeg may still be writing if the caller stopped early
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
