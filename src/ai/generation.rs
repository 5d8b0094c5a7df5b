use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::{usable_credential, DetectedComponent};
use crate::bundle::{CodeBundleParser, GeneratedBundle};
use crate::config::GenerationConfig;

const PLACEHOLDER_TOKEN: &str = "your_huggingface_token_here";

/// Code generation client: builds the generation prompt, calls the inference
/// endpoint, and parses the reply into a validated bundle. Falls back to the
/// built-in mock bundle when no token is configured.
pub struct CodeGenerator {
    config: GenerationConfig,
    client: reqwest::Client,
    parser: CodeBundleParser,
}

#[derive(Debug, Serialize)]
struct GenerationRequest {
    inputs: String,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct GenerationCandidate {
    generated_text: Option<String>,
}

impl CodeGenerator {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            client,
            parser: CodeBundleParser::new(),
        })
    }

    pub async fn generate(
        &self,
        components: &[DetectedComponent],
        responses: &HashMap<String, String>,
    ) -> Result<GeneratedBundle> {
        let Some(token) = usable_credential(&self.config.api_token, PLACEHOLDER_TOKEN) else {
            warn!("Generation token not provided or is a placeholder, using mock bundle");
            return Ok(mock_bundle());
        };

        let prompt = build_prompt(components, responses);
        let request = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_new_tokens: self.config.max_new_tokens,
                temperature: self.config.temperature,
                return_full_text: false,
                top_p: 0.95,
            },
        };

        debug!(
            "Requesting site code for {} components from {}",
            components.len(),
            self.config.endpoint
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("code generation API error {}: {}", status, text));
        }

        let candidates: Vec<GenerationCandidate> = response.json().await?;
        let generated = candidates
            .first()
            .and_then(|c| c.generated_text.as_deref())
            .unwrap_or("");
        if generated.trim().is_empty() {
            return Err(anyhow!("empty response from the generation API"));
        }

        let bundle = self.parser.parse(generated)?;
        if is_template_leak(&bundle) {
            return Err(anyhow!(
                "received the built-in template instead of generated code"
            ));
        }

        Ok(bundle)
    }
}

/// A bundle whose markup carries both signature phrases of the built-in
/// template is the template echoed back, not generated code.
pub(crate) fn is_template_leak(bundle: &GeneratedBundle) -> bool {
    let markup = &bundle.markup().content;
    markup.contains("My Website") && markup.contains("Generated Website")
}

pub(crate) fn build_prompt(
    components: &[DetectedComponent],
    responses: &HashMap<String, String>,
) -> String {
    let component_descriptions = components
        .iter()
        .enumerate()
        .map(|(index, c)| {
            let answer = responses
                .iter()
                .find(|(key, _)| key.contains(&c.id))
                .map(|(_, value)| format!(" - User specified: {}", value))
                .unwrap_or_default();
            format!(
                "{}. {} ({:?}): {}{}",
                index + 1,
                c.label,
                c.kind,
                c.description,
                answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let requirements = if responses.is_empty() {
        "No specific requirements provided".to_string()
    } else {
        responses
            .values()
            .map(|value| format!("- {}", value))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are a web developer generating a complete, functional website based on video frame analysis.\n\n\
         DETECTED COMPONENTS:\n{}\n\n\
         USER REQUIREMENTS:\n{}\n\n\
         INSTRUCTIONS:\n\
         1. Create a complete, modern, responsive website with separate HTML, CSS, and JavaScript files\n\
         2. Include ALL detected components with the functionality specified by the user\n\
         3. Use modern CSS (flexbox/grid) and vanilla JavaScript\n\
         4. Ensure all components are interactive and work as described\n\n\
         Return the code in this format:\n\
         ===HTML===\n[HTML code here]\n===CSS===\n[CSS code here]\n===JS===\n[JavaScript code here]\n\n\
         Generate code that matches the detected components and user requirements exactly.",
        component_descriptions, requirements
    )
}

const MOCK_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Generated Website</title>
    <link rel="stylesheet" href="styles.css">
</head>
<body>
    <nav class="navbar">
        <div class="nav-container">
            <h1 class="logo">My Website</h1>
            <ul class="nav-menu">
                <li><a href="#home">Home</a></li>
                <li><a href="#about">About</a></li>
                <li><a href="#contact">Contact</a></li>
            </ul>
        </div>
    </nav>

    <main class="container">
        <section class="hero">
            <h2>Welcome to Our Website</h2>
            <p>Transform your ideas into reality</p>
        </section>

        <form class="contact-form" id="contactForm">
            <div class="form-group">
                <label for="email">Email Address</label>
                <input type="email" id="email" name="email" class="input-field" required>
            </div>
            <button type="submit" class="btn-primary">Submit</button>
        </form>
    </main>

    <script src="script.js"></script>
</body>
</html>"##;

const MOCK_CSS: &str = r#"* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    line-height: 1.6;
    color: #333;
    background: #f5f5f5;
}

.navbar {
    background: #fff;
    box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    padding: 1rem 0;
}

.nav-container {
    max-width: 1200px;
    margin: 0 auto;
    padding: 0 2rem;
    display: flex;
    justify-content: space-between;
    align-items: center;
}

.nav-menu {
    display: flex;
    list-style: none;
    gap: 2rem;
}

.hero {
    text-align: center;
    padding: 4rem 0;
    background: white;
    border-radius: 8px;
    margin-bottom: 2rem;
}

.contact-form {
    background: white;
    padding: 2rem;
    border-radius: 8px;
    max-width: 500px;
    margin: 0 auto;
}

.input-field {
    width: 100%;
    padding: 0.75rem;
    border: 1px solid #ddd;
    border-radius: 4px;
    font-size: 1rem;
}

.btn-primary {
    background: #0ea5e9;
    color: white;
    padding: 0.75rem 2rem;
    border: none;
    border-radius: 4px;
    font-size: 1rem;
    cursor: pointer;
}

.btn-primary:hover {
    background: #0284c7;
}"#;

const MOCK_JS: &str = r#"document.addEventListener('DOMContentLoaded', function() {
    const form = document.getElementById('contactForm');

    if (form) {
        form.addEventListener('submit', function(e) {
            e.preventDefault();
            const email = document.getElementById('email').value;
            alert('Thank you! Your email ' + email + ' has been received.');
            form.reset();
        });
    }
});"#;

/// Bundle returned when no generation provider is configured.
pub(crate) fn mock_bundle() -> GeneratedBundle {
    GeneratedBundle::new(
        MOCK_HTML.to_string(),
        MOCK_CSS.to_string(),
        MOCK_JS.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::detection::mock_components;
    use crate::config::Config;

    #[test]
    fn mock_bundle_is_flagged_as_template() {
        assert!(is_template_leak(&mock_bundle()));
    }

    #[test]
    fn generated_markup_is_not_flagged() {
        let bundle = GeneratedBundle::new(
            "<html><body><h1>Bespoke storefront landing page</h1></body></html>".to_string(),
            "h1 {}".to_string(),
            "void 0;".to_string(),
        );
        assert!(!is_template_leak(&bundle));
    }

    #[test]
    fn prompt_includes_components_and_responses() {
        let components = mock_components();
        let mut responses = HashMap::new();
        responses.insert(
            "question_comp_1".to_string(),
            "The button should open a modal".to_string(),
        );

        let prompt = build_prompt(&components, &responses);
        assert!(prompt.contains("Submit Button"));
        assert!(prompt.contains("The button should open a modal"));
        assert!(prompt.contains("===HTML==="));
    }

    #[test]
    fn prompt_notes_missing_requirements() {
        let prompt = build_prompt(&mock_components(), &HashMap::new());
        assert!(prompt.contains("No specific requirements provided"));
    }

    #[tokio::test]
    async fn missing_token_falls_back_to_mock_bundle() {
        let generator = CodeGenerator::new(Config::default().generation).unwrap();
        let bundle = generator
            .generate(&mock_components(), &HashMap::new())
            .await
            .unwrap();
        assert!(is_template_leak(&bundle));
        assert_eq!(bundle.files().len(), 3);
    }
}
