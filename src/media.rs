use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A video handed to the extraction core: raw bytes plus the metadata the
/// upload layer collected. Type and size limits (non-video rejection, the
/// 100 MB cap) are enforced upstream; the core does not re-validate.
#[derive(Debug, Clone)]
pub struct VideoSource {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl VideoSource {
    pub fn new(
        file_name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// One captured frame, already encoded into its transportable string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub index: usize,
    /// Capture timestamp, `index * frame_interval` by construction.
    pub timestamp: Duration,
    /// `data:image/png;base64,…` payload.
    pub data_url: String,
}

/// Ordered frames from one extraction run. Order matches chronological
/// position in the source video; the sequence is immutable once returned.
#[derive(Debug, Clone, Default)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    expected: usize,
}

impl FrameSequence {
    /// Create an empty sequence that expects `expected` frames. The expected
    /// count lets callers judge partial runs instead of the core hiding them.
    pub fn with_expected(expected: usize) -> Self {
        Self {
            frames: Vec::with_capacity(expected),
            expected,
        }
    }

    /// Append a frame from raw PNG bytes. The timestamp is derived from the
    /// frame's position in the sequence.
    pub fn push_png(&mut self, png: &[u8], interval_secs: f64) {
        let index = self.frames.len();
        self.frames.push(Frame {
            index,
            timestamp: Duration::from_secs_f64(index as f64 * interval_secs),
            data_url: png_data_url(png),
        });
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Fraction of expected frames that were not captured, in [0, 1].
    pub fn loss_ratio(&self) -> f64 {
        if self.expected == 0 {
            return 0.0;
        }
        let captured = self.frames.len().min(self.expected) as f64;
        1.0 - captured / self.expected as f64
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn data_urls(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|f| f.data_url.as_str())
    }
}

/// Encode PNG bytes into the transportable data-URL form consumed by the
/// detection collaborator.
pub fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

/// Progress observer invoked with a percentage in [0, 100]. The signal is
/// monotonically non-decreasing within one strategy and reaches exactly 100
/// on that strategy's successful completion.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(f32) + Send);
