pub mod detection;
pub mod generation;

use serde::{Deserialize, Serialize};

pub use detection::ComponentDetector;
pub use generation::CodeGenerator;

/// UI component kinds the detection provider is asked to classify into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Button,
    Input,
    Form,
    Navigation,
    Card,
    Modal,
    Slider,
    Other,
}

/// One UI component recognized in the frame sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedComponent {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type")]
    pub kind: ComponentKind,

    pub label: String,

    pub description: String,

    /// Detection confidence in [0, 1].
    pub confidence: f32,

    /// Index of the frame the component was first seen in.
    #[serde(default, rename = "frameIndex")]
    pub frame_index: usize,
}

/// Returns the key only when it is set to something usable; empty strings
/// and the documented placeholder values mean "not configured".
pub(crate) fn usable_credential<'a>(
    credential: &'a Option<String>,
    placeholder: &str,
) -> Option<&'a str> {
    match credential.as_deref() {
        Some(value) if !value.trim().is_empty() && value != placeholder => Some(value),
        _ => None,
    }
}
