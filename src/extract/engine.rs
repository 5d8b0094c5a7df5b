use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use super::ExtractStrategy;
use crate::config::ExtractionConfig;
use crate::engine::{Engine, EngineLoader};
use crate::error::{Error, Result};
use crate::media::{FrameSequence, ProgressCallback, VideoSource};

/// Fixed name the input video is staged under inside the engine's scratch
/// namespace.
const INPUT_NAME: &str = "input.mp4";

/// Duration assumed when the probe output cannot be parsed.
const DEFAULT_DURATION_SECS: f64 = 10.0;

/// Primary extraction strategy: drives the remotely staged decoder engine,
/// one seek-and-decode invocation per sampled position.
pub struct EngineExtractor {
    loader: EngineLoader,
    config: ExtractionConfig,
}

impl EngineExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        Ok(Self {
            loader: EngineLoader::new()?,
            config,
        })
    }

    pub fn with_loader(loader: EngineLoader, config: ExtractionConfig) -> Self {
        Self { loader, config }
    }
}

#[async_trait]
impl ExtractStrategy for EngineExtractor {
    fn name(&self) -> &str {
        "engine"
    }

    async fn extract(
        &self,
        video: &VideoSource,
        on_progress: ProgressCallback<'_>,
    ) -> Result<FrameSequence> {
        let engine = self.loader.load().await?;
        extract_with_engine(engine.as_ref(), &self.config, video, on_progress).await
    }
}

/// Core seek/capture loop against an already-loaded engine. A single
/// frame's failure is logged and skipped; partial sequences are acceptable
/// on this path. Zero captured frames is a failure.
pub async fn extract_with_engine(
    engine: &dyn Engine,
    config: &ExtractionConfig,
    video: &VideoSource,
    mut on_progress: ProgressCallback<'_>,
) -> Result<FrameSequence> {
    engine.write_file(INPUT_NAME, &video.bytes).await?;

    if let Ok(info) = engine.probe(INPUT_NAME).await {
        debug!("input container metadata: {}", info.trim());
    }

    let duration = probe_duration(engine).await;
    let interval = config.frame_interval_secs;
    let total = ((duration / interval).ceil() as usize).max(1);
    debug!(
        "probed duration {:.1}s, capturing {} frames at {}s intervals",
        duration, total, interval
    );

    let scale = format!("scale={}:-1", config.scale_width);
    let mut frames = FrameSequence::with_expected(total);
    on_progress(0.0);

    for i in 0..total {
        let timestamp = i as f64 * interval;
        let out_name = format!("frame_{}.png", i);

        match capture_frame(engine, timestamp, &scale, &out_name).await {
            Ok(png) => {
                frames.push_png(&png, interval);
                if let Err(e) = engine.remove_file(&out_name).await {
                    debug!("failed to remove transient {}: {}", out_name, e);
                }
            }
            Err(e) => {
                warn!("Failed to extract frame at {}s: {}", timestamp, e);
            }
        }

        on_progress((i + 1) as f32 / total as f32 * 100.0);
    }

    // Best-effort: the scratch namespace outlives a failed removal.
    if let Err(e) = engine.remove_file(INPUT_NAME).await {
        debug!("failed to remove staged input: {}", e);
    }

    if frames.is_empty() {
        return Err(Error::DecodeFailure(
            "no frames could be decoded from the input".to_string(),
        ));
    }

    if frames.loss_ratio() > 0.5 {
        warn!(
            "captured only {} of {} expected frames",
            frames.len(),
            frames.expected()
        );
    }

    Ok(frames)
}

async fn capture_frame(
    engine: &dyn Engine,
    timestamp: f64,
    scale: &str,
    out_name: &str,
) -> Result<Vec<u8>> {
    let ts = format!("{}", timestamp);
    let output = engine
        .exec(&[
            "-i", INPUT_NAME, "-ss", &ts, "-vframes", "1", "-vf", scale, "-y", out_name,
        ])
        .await?;

    if !output.success {
        return Err(Error::DecodeFailure(format!(
            "decoder exited with an error: {}",
            last_log_line(&output.log)
        )));
    }

    engine.read_file(out_name).await
}

/// Run a no-output decode pass and mine the duration banner out of the
/// diagnostic stream. Best-effort: any failure falls back to a documented
/// default rather than aborting the run.
async fn probe_duration(engine: &dyn Engine) -> f64 {
    let log = match engine.exec(&["-i", INPUT_NAME, "-f", "null", "-"]).await {
        Ok(output) => output.log,
        Err(_) => return DEFAULT_DURATION_SECS,
    };

    parse_duration(&log).unwrap_or(DEFAULT_DURATION_SECS)
}

/// Parse a `Duration: HH:MM:SS.ff` banner into seconds.
pub(crate) fn parse_duration(log: &str) -> Option<f64> {
    let re = Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})\.(\d{2})").ok()?;
    let caps = re.captures(log)?;

    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn last_log_line(log: &str) -> &str {
    log.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration_banner() {
        let log = "Input #0, mov,mp4, from 'input.mp4':\n  Duration: 00:01:30.52, start: 0.000000, bitrate: 1205 kb/s\n";
        assert_eq!(parse_duration(log), Some(90.0));
    }

    #[test]
    fn parses_hours_component() {
        let log = "  Duration: 01:02:03.04, start: 0.0";
        assert_eq!(parse_duration(log), Some(3723.0));
    }

    #[test]
    fn missing_banner_yields_none() {
        assert_eq!(parse_duration("no banner here"), None);
        assert_eq!(parse_duration("Duration: N/A"), None);
    }

    #[test]
    fn last_log_line_skips_trailing_blanks() {
        assert_eq!(last_log_line("first\nsecond\n\n"), "second");
        assert_eq!(last_log_line(""), "");
    }
}
