use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::sources::{default_sources, EngineSource};
use super::DecoderEngine;
use crate::error::{Error, Result};

/// Retrieves one engine artifact into a local file. Seam for tests and for
/// the two retrieval strategies a source can select.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, url: &str, dest: &Path, stream_to_disk: bool) -> Result<()>;
}

/// Production fetcher. No request timeout: the loader is bounded by its
/// source count, not wall clock.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path, stream_to_disk: bool) -> Result<()> {
        let response = self.client.get(url).send().await?.error_for_status()?;

        if stream_to_disk {
            let mut file = tokio::fs::File::create(dest).await?;
            let mut body = response.bytes_stream();
            while let Some(chunk) = body.next().await {
                file.write_all(&chunk?).await?;
            }
            file.flush().await?;
        } else {
            let bytes = response.bytes().await?;
            tokio::fs::write(dest, &bytes).await?;
        }

        Ok(())
    }
}

/// Loads the decoder engine from an ordered source list, caching the first
/// success for the rest of the process lifetime. Loading is expensive
/// (two downloads plus staging), so the cache guarantees the cost is paid at
/// most once on the success path. A failed load is never cached; the next
/// call retries the full list. Concurrent first-time callers converge on a
/// single load.
pub struct EngineLoader {
    sources: Vec<EngineSource>,
    fetcher: Arc<dyn ArtifactFetcher>,
    engine: OnceCell<Arc<DecoderEngine>>,
}

impl EngineLoader {
    pub fn new() -> Result<Self> {
        Ok(Self::with_sources(
            default_sources(),
            Arc::new(HttpFetcher::new()?),
        ))
    }

    pub fn with_sources(sources: Vec<EngineSource>, fetcher: Arc<dyn ArtifactFetcher>) -> Self {
        Self {
            sources,
            fetcher,
            engine: OnceCell::new(),
        }
    }

    /// Idempotent: returns the cached engine when one is ready, otherwise
    /// walks the source list in order until a source yields a working
    /// engine.
    pub async fn load(&self) -> Result<Arc<DecoderEngine>> {
        self.engine
            .get_or_try_init(|| async { self.try_sources().await.map(Arc::new) })
            .await
            .map(Arc::clone)
    }

    async fn try_sources(&self) -> Result<DecoderEngine> {
        let mut last_error: Option<Error> = None;

        for source in &self.sources {
            info!("Attempting to load decoder engine via {}...", source.name);

            match self.try_source(source).await {
                Ok(engine) => {
                    info!("✅ Decoder engine loaded via {}", source.name);
                    return Ok(engine);
                }
                Err(e) => {
                    warn!("Failed to load engine via {}: {}", source.name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(Error::ResourceUnavailable {
            attempts: self.sources.len(),
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no engine sources configured".to_string()),
        })
    }

    async fn try_source(&self, source: &EngineSource) -> Result<DecoderEngine> {
        let home = tempfile::tempdir()?;
        let decoder = home.path().join("decoder");
        let prober = home.path().join("prober");

        self.fetcher
            .fetch(&source.decoder_url, &decoder, source.stream_to_disk)
            .await?;
        self.fetcher
            .fetch(&source.prober_url, &prober, source.stream_to_disk)
            .await?;

        DecoderEngine::initialize(&source.name, home, decoder, prober).await
    }
}
