pub mod engine;
pub mod host;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::ExtractionConfig;
use crate::error::{Error, Result};
use crate::media::{FrameSequence, ProgressCallback, VideoSource};

pub use engine::EngineExtractor;
pub use host::HostExtractor;

/// One frame-extraction strategy. Both implementations produce frames
/// strictly sequentially: the decode resource they drive cannot process two
/// positions at once.
#[async_trait]
pub trait ExtractStrategy: Send + Sync {
    fn name(&self) -> &str;

    async fn extract(
        &self,
        video: &VideoSource,
        on_progress: ProgressCallback<'_>,
    ) -> Result<FrameSequence>;
}

/// Extracts frames with the staged engine, transparently retrying with the
/// host decoder when the engine path fails entirely.
pub struct FrameExtractor {
    primary: EngineExtractor,
    fallback: HostExtractor,
}

impl FrameExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        Ok(Self {
            primary: EngineExtractor::new(config.clone())?,
            fallback: HostExtractor::new(config),
        })
    }

    pub async fn extract(
        &self,
        video: &VideoSource,
        on_progress: ProgressCallback<'_>,
    ) -> Result<FrameSequence> {
        extract_with_fallback(&self.primary, &self.fallback, video, on_progress).await
    }
}

/// Try `primary`; on any failure retry once with `fallback`. Progress
/// restarts at 0 for the fallback run; the two strategies report their own
/// 0→100 sequences. No retries beyond the single fallback hop.
pub async fn extract_with_fallback(
    primary: &dyn ExtractStrategy,
    fallback: &dyn ExtractStrategy,
    video: &VideoSource,
    on_progress: ProgressCallback<'_>,
) -> Result<FrameSequence> {
    info!(
        "Extracting frames from {} using the {} decoder...",
        video.file_name,
        primary.name()
    );

    let primary_error = match primary.extract(video, &mut *on_progress).await {
        Ok(frames) => return Ok(frames),
        Err(e) => e,
    };

    warn!(
        "{} extraction failed, falling back to the {} decoder: {}",
        primary.name(),
        fallback.name(),
        primary_error
    );

    match fallback.extract(video, on_progress).await {
        Ok(frames) => Ok(frames),
        Err(fallback_error) => Err(Error::ExtractionExhausted {
            engine: primary_error.to_string(),
            host: fallback_error.to_string(),
        }),
    }
}
