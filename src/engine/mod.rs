pub mod loader;
pub mod sources;

use async_trait::async_trait;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::debug;

use crate::error::{Error, Result};

pub use loader::{ArtifactFetcher, EngineLoader, HttpFetcher};
pub use sources::{default_sources, EngineSource};

/// Outcome of one engine invocation. Decoder diagnostics (including the
/// duration banner) land on the log stream whether or not the run succeeded.
#[derive(Debug, Clone)]
pub struct DecodeOutput {
    pub success: bool,
    pub log: String,
}

/// The staged decoding runtime. Implementations expose a private scratch
/// namespace for input/output artifacts plus decode and probe invocations.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Stage a named file into the engine's scratch namespace.
    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Read a named artifact out of the scratch namespace.
    async fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Remove a named artifact from the scratch namespace.
    async fn remove_file(&self, name: &str) -> Result<()>;

    /// Run one decode invocation with the scratch namespace as its working
    /// directory.
    async fn exec(&self, args: &[&str]) -> Result<DecodeOutput>;

    /// Probe a staged file's container metadata, returned as raw JSON.
    async fn probe(&self, name: &str) -> Result<String>;
}

/// A decoder toolchain staged from a remote source: the decoder and prober
/// executables plus the scratch directory acting as the engine's private
/// filesystem. Held process-wide once loaded; never torn down by this core.
#[derive(Debug)]
pub struct DecoderEngine {
    source_name: String,
    decoder: PathBuf,
    prober: PathBuf,
    home: TempDir,
}

impl DecoderEngine {
    /// Validate freshly staged artifacts and assemble the engine. A decoder
    /// that cannot report its version is treated as an init rejection so the
    /// loader can advance to the next source.
    pub(crate) async fn initialize(
        source_name: &str,
        home: TempDir,
        decoder: PathBuf,
        prober: PathBuf,
    ) -> Result<Self> {
        make_executable(&decoder).await?;
        make_executable(&prober).await?;

        let version = tokio::process::Command::new(&decoder)
            .arg("-version")
            .output()
            .await
            .map_err(|e| Error::DecodeFailure(format!("staged decoder failed to start: {}", e)))?;
        if !version.status.success() {
            return Err(Error::DecodeFailure(format!(
                "staged decoder rejected the version probe: {}",
                String::from_utf8_lossy(&version.stderr).trim()
            )));
        }

        tokio::fs::create_dir_all(home.path().join("scratch")).await?;
        debug!(
            "decoder engine staged from {} at {}",
            source_name,
            home.path().display()
        );

        Ok(Self {
            source_name: source_name.to_string(),
            decoder,
            prober,
            home,
        })
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    fn scratch(&self) -> PathBuf {
        self.home.path().join("scratch")
    }

    fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch().join(name)
    }
}

#[async_trait]
impl Engine for DecoderEngine {
    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(self.scratch_path(name), bytes).await?;
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(self.scratch_path(name)).await?)
    }

    async fn remove_file(&self, name: &str) -> Result<()> {
        tokio::fs::remove_file(self.scratch_path(name)).await?;
        Ok(())
    }

    async fn exec(&self, args: &[&str]) -> Result<DecodeOutput> {
        let output = tokio::process::Command::new(&self.decoder)
            .args(args)
            .current_dir(self.scratch())
            .output()
            .await
            .map_err(|e| Error::DecodeFailure(format!("decoder invocation failed: {}", e)))?;

        Ok(DecodeOutput {
            success: output.status.success(),
            log: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn probe(&self, name: &str) -> Result<String> {
        let output = tokio::process::Command::new(&self.prober)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                name,
            ])
            .current_dir(self.scratch())
            .output()
            .await
            .map_err(|e| Error::DecodeFailure(format!("prober invocation failed: {}", e)))?;

        if !output.status.success() {
            return Err(Error::DecodeFailure(format!(
                "prober could not read {}",
                name
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(unix)]
async fn make_executable(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn make_executable(_path: &std::path::Path) -> Result<()> {
    Ok(())
}
