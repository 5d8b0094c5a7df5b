use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the video-to-site pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Frame extraction settings
    pub extraction: ExtractionConfig,

    /// Component detection provider settings
    pub detection: DetectionConfig,

    /// Code generation provider settings
    pub generation: GenerationConfig,

    /// Export settings
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Seconds between sampled video positions
    pub frame_interval_secs: f64,

    /// Captured frames are scaled down to this width, aspect preserved
    pub scale_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// API key for the vision provider; mock components are used when absent
    pub api_key: Option<String>,

    /// Vision model to use
    pub model: String,

    /// How many leading frames to send for analysis
    pub max_frames: usize,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// API token for the generation provider; the mock bundle is used when absent
    pub api_token: Option<String>,

    /// Inference endpoint for the code generation model
    pub endpoint: String,

    /// Maximum tokens to generate
    pub max_new_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory the generated site is written to
    pub output_dir: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| anyhow!("failed to parse config file {}: {}", path.display(), e))?;
        config.validate()?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.extraction.frame_interval_secs <= 0.0 {
            return Err(anyhow!("frame_interval_secs must be greater than 0"));
        }

        if self.extraction.scale_width == 0 {
            return Err(anyhow!("scale_width must be greater than 0"));
        }

        if self.detection.max_frames == 0 {
            return Err(anyhow!("max_frames must be greater than 0"));
        }

        if self.generation.endpoint.is_empty() {
            return Err(anyhow!("generation endpoint must not be empty"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            detection: DetectionConfig {
                api_key: None,
                model: "gemini-1.5-flash".to_string(),
                max_frames: 5,
                timeout_seconds: 60,
            },
            generation: GenerationConfig {
                api_token: None,
                endpoint:
                    "https://api-inference.huggingface.co/models/codellama/CodeLlama-7b-Instruct-hf"
                        .to_string(),
                max_new_tokens: 3000,
                temperature: 0.5,
                timeout_seconds: 120,
            },
            export: ExportConfig {
                output_dir: PathBuf::from("./generated-site"),
            },
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            frame_interval_secs: 2.0, // One frame every 2 seconds
            scale_width: 800,
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_frame_interval(mut self, secs: f64) -> Self {
        self.config.extraction.frame_interval_secs = secs;
        self
    }

    pub fn with_scale_width(mut self, width: u32) -> Self {
        self.config.extraction.scale_width = width;
        self
    }

    pub fn with_detection_key(mut self, api_key: String) -> Self {
        self.config.detection.api_key = Some(api_key);
        self
    }

    pub fn with_generation_token(mut self, token: String) -> Self {
        self.config.generation.api_token = Some(token);
        self
    }

    pub fn with_output_dir(mut self, dir: PathBuf) -> Self {
        self.config.export.output_dir = dir;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
