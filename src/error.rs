use thiserror::Error;

/// Failure taxonomy for the extraction and bundle-parsing core.
///
/// Per-frame and per-source failures are recovered locally by the loops that
/// produce them; only exhaustion of every local option surfaces as one of
/// these variants.
#[derive(Debug, Error)]
pub enum Error {
    /// Every configured engine source was tried and none produced a working
    /// decoder. Fatal to the primary extraction path only.
    #[error(
        "failed to initialize the decoder engine after trying {attempts} sources\n\n\
         Possible causes:\n\
         - network connectivity issues (check your internet)\n\
         - CDN unavailable or blocked\n\
         - a proxy or TLS interception corrupting binary downloads\n\
         - no portable decoder build for this platform\n\n\
         Last error: {last_error}"
    )]
    ResourceUnavailable { attempts: usize, last_error: String },

    /// A decode operation failed. On the primary path a per-frame decode
    /// failure is logged and skipped; this variant escalates only for
    /// systemic failures (staging, zero frames, a dead session).
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// Both the engine and the host extraction strategies failed.
    #[error(
        "failed to extract frames using both decoders\n\n\
         Engine error: {engine}\n\
         Host decoder error: {host}\n\n\
         Please ensure your video file is valid and try again."
    )]
    ExtractionExhausted { engine: String, host: String },

    /// The mandatory markup part could not be recovered from generated text.
    #[error("could not extract valid markup from the generated output: {0}")]
    BundleIncomplete(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_unavailable_names_attempt_count() {
        let err = Error::ResourceUnavailable {
            attempts: 5,
            last_error: "HTTP 503".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("5 sources"));
        assert!(rendered.contains("HTTP 503"));
    }

    #[test]
    fn exhausted_carries_both_messages() {
        let err = Error::ExtractionExhausted {
            engine: "engine exploded".to_string(),
            host: "host exploded".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("engine exploded"));
        assert!(rendered.contains("host exploded"));
    }
}
