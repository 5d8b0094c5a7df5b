use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use crate::ai::{CodeGenerator, ComponentDetector, DetectedComponent};
use crate::bundle::GeneratedBundle;
use crate::config::Config;
use crate::export;
use crate::extract::FrameExtractor;
use crate::media::{FrameSequence, ProgressCallback, VideoSource};

/// Everything one run produces.
pub struct PipelineOutcome {
    pub frames: FrameSequence,
    pub components: Vec<DetectedComponent>,
    pub bundle: GeneratedBundle,
}

/// End-to-end composition: extraction → detection → generation. All policy
/// lives in the stage components; this type only sequences them.
pub struct SitePipeline {
    config: Config,
    extractor: FrameExtractor,
    detector: ComponentDetector,
    generator: CodeGenerator,
}

impl SitePipeline {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            extractor: FrameExtractor::new(config.extraction.clone())?,
            detector: ComponentDetector::new(config.detection.clone())?,
            generator: CodeGenerator::new(config.generation.clone())?,
            config,
        })
    }

    /// Run the full flow for one video. `responses` carries the
    /// questionnaire answers collected by the wizard collaborator, keyed by
    /// question id.
    pub async fn run(
        &self,
        video: &VideoSource,
        responses: &HashMap<String, String>,
        on_progress: ProgressCallback<'_>,
    ) -> Result<PipelineOutcome> {
        info!(
            "🎞️ Processing {} ({} bytes, {})",
            video.file_name,
            video.size(),
            video.media_type
        );

        let frames = self.extractor.extract(video, on_progress).await?;
        info!(
            "🖼️ Extracted {} of {} expected frames",
            frames.len(),
            frames.expected()
        );

        let components = self.detector.detect(&frames).await?;
        info!("🔍 Detected {} components", components.len());

        let bundle = self.generator.generate(&components, responses).await?;
        info!("🧩 Generated site bundle ({} files)", bundle.files().len());

        Ok(PipelineOutcome {
            frames,
            components,
            bundle,
        })
    }

    /// Run the full flow and write the bundle to the configured export
    /// directory.
    pub async fn run_and_export(
        &self,
        video: &VideoSource,
        responses: &HashMap<String, String>,
        on_progress: ProgressCallback<'_>,
    ) -> Result<(PipelineOutcome, Vec<PathBuf>)> {
        let outcome = self.run(video, responses, on_progress).await?;
        let written = export::write_bundle(&outcome.bundle, &self.config.export.output_dir).await?;
        Ok((outcome, written))
    }
}
