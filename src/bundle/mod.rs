pub mod parser;

use serde::{Deserialize, Serialize};

pub use parser::CodeBundleParser;

/// Fixed relative paths of the three bundle parts.
pub const MARKUP_PATH: &str = "index.html";
pub const STYLESHEET_PATH: &str = "styles.css";
pub const SCRIPT_PATH: &str = "script.js";

/// Content written for an optional part the parser could not recover.
pub const STYLESHEET_PLACEHOLDER: &str = "/* CSS will be generated based on your components */";
pub const SCRIPT_PLACEHOLDER: &str = "// JavaScript will be generated based on your components";

/// Minimum markup length, measured after fence stripping.
pub const MIN_MARKUP_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Html,
    Css,
    Js,
}

/// One part of the generated site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
    pub kind: FileKind,
}

/// The three-part generated site: markup, stylesheet, script, always in
/// that order, always under the fixed paths. Constructed once per generation
/// request and immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedBundle {
    files: Vec<GeneratedFile>,
}

impl GeneratedBundle {
    pub(crate) fn new(markup: String, stylesheet: String, script: String) -> Self {
        Self {
            files: vec![
                GeneratedFile {
                    path: MARKUP_PATH.to_string(),
                    content: markup,
                    kind: FileKind::Html,
                },
                GeneratedFile {
                    path: STYLESHEET_PATH.to_string(),
                    content: stylesheet,
                    kind: FileKind::Css,
                },
                GeneratedFile {
                    path: SCRIPT_PATH.to_string(),
                    content: script,
                    kind: FileKind::Js,
                },
            ],
        }
    }

    pub fn files(&self) -> &[GeneratedFile] {
        &self.files
    }

    pub fn markup(&self) -> &GeneratedFile {
        &self.files[0]
    }

    pub fn stylesheet(&self) -> &GeneratedFile {
        &self.files[1]
    }

    pub fn script(&self) -> &GeneratedFile {
        &self.files[2]
    }
}
