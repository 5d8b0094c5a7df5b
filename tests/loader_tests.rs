use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use vid2site::engine::{ArtifactFetcher, EngineLoader, EngineSource};
use vid2site::error::{Error, Result};

/// Stands in for the CDN: writes a tiny script instead of a real decoder
/// build. Sources whose URLs contain "unreachable" fail before any bytes
/// land, and the first `fail_first` decoder fetches fail regardless.
struct ScriptedFetcher {
    decoder_fetches: AtomicUsize,
    fail_first: usize,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self::failing_first(0)
    }

    fn failing_first(fail_first: usize) -> Self {
        Self {
            decoder_fetches: AtomicUsize::new(0),
            fail_first,
        }
    }

    /// Number of sources attempted so far (every attempt starts with the
    /// decoder artifact).
    fn attempts(&self) -> usize {
        self.decoder_fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str, dest: &Path, _stream_to_disk: bool) -> Result<()> {
        if url.ends_with("/decoder") {
            let attempt = self.decoder_fetches.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.fail_first {
                return Err(Error::DecodeFailure(format!(
                    "network error on attempt {}",
                    attempt
                )));
            }
        }

        if url.contains("unreachable") {
            return Err(Error::DecodeFailure(format!("connection refused: {}", url)));
        }

        tokio::fs::write(dest, b"#!/bin/sh\nexit 0\n").await?;
        Ok(())
    }
}

fn source(name: &str, reachable: bool) -> EngineSource {
    let host = if reachable {
        "cdn.example.test"
    } else {
        "unreachable.example.test"
    };
    EngineSource::new(
        name,
        &format!("https://{}/{}/decoder", host, name),
        &format!("https://{}/{}/prober", host, name),
        true,
    )
}

#[cfg(unix)]
#[tokio::test]
async fn failing_source_advances_to_the_next() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let loader = EngineLoader::with_sources(
        vec![source("primary-cdn", false), source("mirror-cdn", true)],
        fetcher.clone(),
    );

    let engine = loader.load().await.unwrap();
    assert_eq!(engine.source_name(), "mirror-cdn");
    assert_eq!(fetcher.attempts(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn ready_engine_is_cached_across_calls() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let loader = EngineLoader::with_sources(vec![source("only-cdn", true)], fetcher.clone());

    let first = loader.load().await.unwrap();
    let second = loader.load().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(fetcher.attempts(), 1, "cached load must not refetch");
}

#[tokio::test]
async fn exhausted_sources_report_attempt_count() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let loader = EngineLoader::with_sources(
        vec![
            source("cdn-a", false),
            source("cdn-b", false),
            source("cdn-c", false),
        ],
        fetcher.clone(),
    );

    let err = loader.load().await.unwrap_err();
    assert!(matches!(
        err,
        Error::ResourceUnavailable { attempts: 3, .. }
    ));

    let rendered = err.to_string();
    assert!(rendered.contains("3 sources"));
    assert!(rendered.contains("connection refused"));
    assert_eq!(fetcher.attempts(), 3);
}

#[cfg(unix)]
#[tokio::test]
async fn failed_loads_are_not_cached() {
    let fetcher = Arc::new(ScriptedFetcher::failing_first(1));
    let loader = EngineLoader::with_sources(vec![source("flaky-cdn", true)], fetcher.clone());

    assert!(loader.load().await.is_err());

    // The transient failure must not poison the cache.
    let engine = loader.load().await.unwrap();
    assert_eq!(engine.source_name(), "flaky-cdn");
    assert_eq!(fetcher.attempts(), 2);
}

#[cfg(unix)]
#[tokio::test]
async fn concurrent_first_loads_converge_on_one_engine() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let loader = EngineLoader::with_sources(vec![source("only-cdn", true)], fetcher.clone());

    let (a, b) = tokio::join!(loader.load(), loader.load());
    let (a, b) = (a.unwrap(), b.unwrap());

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(fetcher.attempts(), 1);
}
