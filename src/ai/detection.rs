use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{usable_credential, ComponentKind, DetectedComponent};
use crate::config::DetectionConfig;
use crate::media::FrameSequence;

const PLACEHOLDER_KEY: &str = "your_gemini_api_key_here";

const DETECTION_PROMPT: &str = "You are analyzing website video frames to identify UI components.\n\n\
Carefully examine each frame and identify ALL UI components visible. For each component, provide:\n\
- type: one of [button, input, form, navigation, card, modal, slider, other]\n\
- label: a descriptive name based on what you see in the frame\n\
- description: what the component does or its purpose\n\
- confidence: 0-1 score (be honest about uncertainty)\n\n\
IMPORTANT: Return ONLY a valid JSON array in this exact format (no markdown, no code blocks):\n\
[{\"id\": \"unique_id_1\", \"type\": \"button\", \"label\": \"Submit Button\", \"description\": \"Submit form data\", \"confidence\": 0.9}]\n\n\
Be thorough and identify all interactive and visual elements. Base your analysis on what you actually see in the frames.";

/// Vision client that turns a frame sequence into a component inventory.
/// Falls back to the built-in mock inventory when no API key is configured.
pub struct ComponentDetector {
    config: DetectionConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct VisionRequest {
    contents: Vec<VisionContent>,
}

#[derive(Debug, Serialize)]
struct VisionContent {
    parts: Vec<VisionPart>,
}

#[derive(Debug, Serialize)]
struct VisionPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct VisionResponse {
    candidates: Vec<VisionCandidate>,
}

#[derive(Debug, Deserialize)]
struct VisionCandidate {
    content: VisionCandidateContent,
}

#[derive(Debug, Deserialize)]
struct VisionCandidateContent {
    parts: Vec<VisionCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct VisionCandidatePart {
    text: String,
}

impl ComponentDetector {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    pub async fn detect(&self, frames: &FrameSequence) -> Result<Vec<DetectedComponent>> {
        let Some(api_key) = usable_credential(&self.config.api_key, PLACEHOLDER_KEY) else {
            warn!("Detection API key not provided or is a placeholder, using mock components");
            return Ok(mock_components());
        };

        // Only the leading frames go out, to stay under provider token limits.
        let selected: Vec<&str> = frames
            .data_urls()
            .take(self.config.max_frames)
            .collect();
        if selected.is_empty() {
            return Err(anyhow!("no frames available for component detection"));
        }

        let mut parts = vec![VisionPart {
            text: Some(DETECTION_PROMPT.to_string()),
            inline_data: None,
        }];
        for (index, data_url) in selected.iter().enumerate() {
            parts.push(VisionPart {
                text: Some(format!("Frame {} of {}", index + 1, selected.len())),
                inline_data: None,
            });
            parts.push(VisionPart {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: "image/png".to_string(),
                    data: strip_data_url_prefix(data_url).to_string(),
                }),
            });
        }

        let request = VisionRequest {
            contents: vec![VisionContent { parts }],
        };
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.config.model, api_key
        );

        debug!("Sending {} frames for component detection", selected.len());

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("component detection API error {}: {}", status, text));
        }

        let vision_response: VisionResponse = response.json().await?;
        let text = vision_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| anyhow!("empty response from the detection provider"))?;

        let mut components =
            parse_components(&text).context("failed to parse component detection response")?;

        // Back-fill missing ids and spread components over the full sequence.
        for (index, component) in components.iter_mut().enumerate() {
            if component.id.is_empty() {
                component.id = format!("comp_{}", index + 1);
            }
            component.frame_index = index * frames.len() / selected.len().max(1);
        }

        Ok(components)
    }
}

/// Mine a JSON component array out of the provider's free-form reply: a bare
/// array first, then a fenced block.
pub(crate) fn parse_components(text: &str) -> Result<Vec<DetectedComponent>> {
    let candidate = Regex::new(r"(?s)\[.*\]")
        .ok()
        .and_then(|re| re.find(text))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            Regex::new(r"(?s)```(?:json)?\s*(\[.*?\])\s*```")
                .ok()
                .and_then(|re| re.captures(text))
                .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        })
        .ok_or_else(|| anyhow!("no JSON array found in the response"))?;

    let components: Vec<DetectedComponent> = serde_json::from_str(&candidate)?;
    if components.is_empty() {
        return Err(anyhow!("component array is empty"));
    }

    Ok(components)
}

fn strip_data_url_prefix(data_url: &str) -> &str {
    data_url
        .split_once(',')
        .map(|(_, payload)| payload)
        .unwrap_or(data_url)
}

/// Inventory returned when no detection provider is configured.
pub(crate) fn mock_components() -> Vec<DetectedComponent> {
    vec![
        DetectedComponent {
            id: "comp_1".to_string(),
            kind: ComponentKind::Button,
            label: "Submit Button".to_string(),
            description: "Primary action button for form submission".to_string(),
            confidence: 0.95,
            frame_index: 0,
        },
        DetectedComponent {
            id: "comp_2".to_string(),
            kind: ComponentKind::Input,
            label: "Email Input".to_string(),
            description: "Text input field for email address".to_string(),
            confidence: 0.88,
            frame_index: 0,
        },
        DetectedComponent {
            id: "comp_3".to_string(),
            kind: ComponentKind::Navigation,
            label: "Main Navigation".to_string(),
            description: "Top navigation bar with menu items".to_string(),
            confidence: 0.92,
            frame_index: 0,
        },
    ]
}
