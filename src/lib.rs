/// vid2site - video to website generator core
///
/// Turns a screen recording of a website into sampled frames, a detected
/// UI-component inventory, and a generated three-file site bundle.

pub mod ai;
pub mod bundle;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod extract;
pub mod media;
pub mod pipeline;

// Re-export main types for easy access
pub use crate::ai::{CodeGenerator, ComponentDetector, ComponentKind, DetectedComponent};
pub use crate::bundle::{CodeBundleParser, FileKind, GeneratedBundle, GeneratedFile};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::engine::{DecoderEngine, EngineLoader, EngineSource};
pub use crate::error::Error;
pub use crate::extract::{EngineExtractor, FrameExtractor, HostExtractor};
pub use crate::media::{Frame, FrameSequence, VideoSource};
pub use crate::pipeline::{PipelineOutcome, SitePipeline};
