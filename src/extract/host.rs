use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use super::ExtractStrategy;
use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::media::{FrameSequence, ProgressCallback, VideoSource};

/// Fallback extraction strategy: decodes with the host-installed media
/// stack, no staged engine involved. One continuous decode session per run;
/// a media error anywhere aborts the whole run, unlike the per-frame
/// tolerance of the engine path.
pub struct HostExtractor {
    config: ExtractionConfig,
}

impl HostExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExtractStrategy for HostExtractor {
    fn name(&self) -> &str {
        "host"
    }

    async fn extract(
        &self,
        video: &VideoSource,
        mut on_progress: ProgressCallback<'_>,
    ) -> Result<FrameSequence> {
        // The in-memory bytes become a temporary playable file for the host
        // decoder; the handle is released when `staging` drops.
        let staging = tempfile::tempdir()?;
        let input = staging.path().join("input");
        tokio::fs::write(&input, &video.bytes).await?;

        let meta = probe_metadata(&input).await?;
        let (width, height) =
            capped_dimensions(meta.width, meta.height, self.config.scale_width);
        let interval = self.config.frame_interval_secs;
        let total = ((meta.duration / interval).ceil() as usize).max(1);
        debug!(
            "host decode session: {:.1}s of {}x{} video, {} frames at {}x{}",
            meta.duration, meta.width, meta.height, total, width, height
        );

        let mut child = Command::new("ffmpeg")
            .arg("-i")
            .arg(&input)
            .args([
                "-vf",
                &format!("fps=1/{},scale={}:{}", interval, width, height),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-",
            ])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::DecodeFailure(format!("host decoder unavailable: {}", e)))?;

        let stdout = child.stdout.take().ok_or_else(|| {
            Error::DecodeFailure("host decoder produced no output stream".to_string())
        })?;

        let mut frames = FrameSequence::with_expected(total);
        on_progress(0.0);
        capture_session(
            stdout,
            width,
            height,
            meta.duration,
            interval,
            &mut frames,
            on_progress,
        )
        .await?;

        let status = child.wait().await?;
        if !status.success() {
            return Err(Error::DecodeFailure(
                "host decode session ended with an error".to_string(),
            ));
        }

        if frames.is_empty() {
            return Err(Error::DecodeFailure(
                "host decoder produced no frames".to_string(),
            ));
        }

        Ok(frames)
    }
}

/// Sequential seek/capture loop over the session's frame stream: await the
/// next decoded frame (the position-ready signal), capture it, advance the
/// playback position, repeat until the position reaches the duration.
pub(crate) async fn capture_session<R: AsyncRead + Unpin>(
    mut stream: R,
    width: u32,
    height: u32,
    duration: f64,
    interval: f64,
    frames: &mut FrameSequence,
    mut on_progress: ProgressCallback<'_>,
) -> Result<()> {
    let total = ((duration / interval).ceil() as usize).max(1);
    let frame_len = (width as usize) * (height as usize) * 3;
    let mut buf = vec![0u8; frame_len];
    let mut position = 0.0;

    while position < duration {
        if !read_frame(&mut stream, &mut buf).await? {
            // Clean end of stream at a frame boundary.
            break;
        }

        let png = encode_png(width, height, &buf)?;
        frames.push_png(&png, interval);
        on_progress(frames.len() as f32 / total as f32 * 100.0);

        position += interval;
    }

    Ok(())
}

/// Fill `buf` with exactly one raw frame. Returns false on a clean EOF
/// before any byte of the frame; a mid-frame EOF is a session error.
async fn read_frame<R: AsyncRead + Unpin>(stream: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = stream.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(Error::DecodeFailure(
                "decode session ended mid-frame".to_string(),
            ));
        }
        filled += n;
    }
    Ok(true)
}

fn encode_png(width: u32, height: u32, rgb: &[u8]) -> Result<Vec<u8>> {
    let img = image::RgbImage::from_raw(width, height, rgb.to_vec()).ok_or_else(|| {
        Error::DecodeFailure("captured frame has an unexpected length".to_string())
    })?;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageOutputFormat::Png,
        )
        .map_err(|e| Error::DecodeFailure(format!("frame encoding failed: {}", e)))?;

    Ok(png)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct MediaMetadata {
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// Read duration and native dimensions from the container metadata via the
/// host prober.
async fn probe_metadata(path: &Path) -> Result<MediaMetadata> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| Error::DecodeFailure(format!("host prober unavailable: {}", e)))?;

    if !output.status.success() {
        return Err(Error::DecodeFailure(
            "host prober could not read the video".to_string(),
        ));
    }

    parse_metadata(&String::from_utf8_lossy(&output.stdout))
}

pub(crate) fn parse_metadata(json: &str) -> Result<MediaMetadata> {
    let data: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| Error::DecodeFailure(format!("malformed prober output: {}", e)))?;

    let streams = data["streams"].as_array().cloned().unwrap_or_default();
    let video = streams
        .iter()
        .find(|s| s["codec_type"] == "video")
        .ok_or_else(|| Error::DecodeFailure("no video stream found".to_string()))?;

    let duration: f64 = data["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0);
    let width = video["width"].as_u64().unwrap_or(0) as u32;
    let height = video["height"].as_u64().unwrap_or(0) as u32;

    if duration <= 0.0 || width == 0 || height == 0 {
        return Err(Error::DecodeFailure(
            "video metadata is incomplete".to_string(),
        ));
    }

    Ok(MediaMetadata {
        duration,
        width,
        height,
    })
}

/// Cap output width, preserving the native aspect ratio.
pub(crate) fn capped_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (height as f64 * max_width as f64 / width as f64).round() as u32;
    (max_width, scaled.max(1))
}
