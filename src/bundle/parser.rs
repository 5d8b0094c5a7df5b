use regex::Regex;
use tracing::debug;

use super::{
    GeneratedBundle, MIN_MARKUP_LEN, SCRIPT_PLACEHOLDER, STYLESHEET_PLACEHOLDER,
};
use crate::error::{Error, Result};

/// Per-part findings of one extraction pass over the generated text.
#[derive(Debug, Clone, Default)]
struct Extraction {
    html: Option<String>,
    css: Option<String>,
    js: Option<String>,
}

impl Extraction {
    /// Fill parts this pass is still missing from a later pass. First match
    /// per part wins across the cascade.
    fn merge(&mut self, other: Extraction) {
        if self.html.is_none() {
            self.html = other.html;
        }
        if self.css.is_none() {
            self.css = other.css;
        }
        if self.js.is_none() {
            self.js = other.js;
        }
    }

    fn is_blank(&self) -> bool {
        self.html.is_none() && self.css.is_none() && self.js.is_none()
    }
}

/// Recovers a three-file website bundle from unstructured model output.
///
/// The input is adversarial: models wrap code in fences, emit whole
/// documents, or label sections in prose. Each strategy is an independent
/// best-effort pass; the cascade stops looking for a part once any pass has
/// produced it. Only the markup part is mandatory.
#[derive(Debug, Default)]
pub struct CodeBundleParser;

impl CodeBundleParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, text: &str) -> Result<GeneratedBundle> {
        let mut parts = section_markers(text);
        parts.merge(fenced_blocks(text));

        if parts.html.is_none() {
            parts.merge(whole_document(text));
        }

        if parts.is_blank() {
            debug!("falling back to line-oriented section segmentation");
            parts.merge(line_sections(text));
        }

        let markup = parts.html.map(|s| strip_fences(&s)).unwrap_or_default();
        if markup.len() < MIN_MARKUP_LEN {
            return Err(Error::BundleIncomplete(format!(
                "markup is missing or too short ({} chars)",
                markup.len()
            )));
        }

        let stylesheet = parts
            .css
            .map(|s| strip_fences(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| STYLESHEET_PLACEHOLDER.to_string());
        let script = parts
            .js
            .map(|s| strip_fences(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| SCRIPT_PLACEHOLDER.to_string());

        Ok(GeneratedBundle::new(markup, stylesheet, script))
    }
}

/// Strategy 1: explicit `===HTML===` / `===CSS===` / `===JS===` section
/// markers, each section running to the next marker or end of text.
fn section_markers(text: &str) -> Extraction {
    Extraction {
        html: capture(r"(?is)===HTML===\s*(.*?)(?:===CSS===|===JS===|\z)", text),
        css: capture(r"(?is)===CSS===\s*(.*?)(?:===JS===|\z)", text),
        js: capture(r"(?is)===JS===\s*(.*?)\z", text),
    }
}

/// Strategy 2: fenced code blocks tagged by language, with raw tag-delimited
/// blocks as the per-part fallback.
fn fenced_blocks(text: &str) -> Extraction {
    let html = capture(r"(?is)```html\s*(.*?)```", text)
        .or_else(|| capture(r"(?s)```\s*((?:<!DOCTYPE|<html).*?)\s*```", text))
        .or_else(|| matched(r"(?is)<html.*?</html>", text));
    let css = capture(r"(?is)```css\s*(.*?)```", text)
        .or_else(|| matched(r"(?is)<style>.*?</style>", text));
    let js = capture(r"(?is)```(?:javascript|js)\s*(.*?)```", text)
        .or_else(|| matched(r"(?is)<script>.*?</script>", text));

    Extraction { html, css, js }
}

/// Strategy 3: take a whole markup document as the markup part and mine its
/// embedded style/script tags for the other two.
fn whole_document(text: &str) -> Extraction {
    let doc = matched(r"(?is)<!DOCTYPE.*?</html>", text)
        .or_else(|| matched(r"(?is)<html.*?</html>", text));

    match doc {
        Some(doc) => {
            let css = capture(r"(?is)<style>(.*?)</style>", &doc);
            let js = capture(r"(?is)<script>(.*?)</script>", &doc);
            Extraction {
                html: Some(doc),
                css,
                js,
            }
        }
        None => Extraction::default(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Html,
    Css,
    Js,
}

/// Strategy 4: line-oriented heuristic segmentation. A line naming one of
/// the three parts acts as a section header; everything until the next
/// header accumulates into that section.
fn line_sections(text: &str) -> Extraction {
    let mut parts = Extraction::default();
    let mut current: Option<Section> = None;
    let mut buffer = String::new();

    for line in text.lines() {
        if let Some(section) = header_for(line) {
            flush_section(&mut parts, current, &buffer);
            current = Some(section);
            buffer.clear();
        } else if current.is_some() {
            buffer.push_str(line);
            buffer.push('\n');
        }
    }
    flush_section(&mut parts, current, &buffer);

    parts
}

fn header_for(line: &str) -> Option<Section> {
    let lowered = line.to_lowercase();
    if lowered.contains("html") {
        Some(Section::Html)
    } else if lowered.contains("css") {
        Some(Section::Css)
    } else if lowered.contains("javascript") || lowered.contains("js") {
        Some(Section::Js)
    } else {
        None
    }
}

fn flush_section(parts: &mut Extraction, current: Option<Section>, buffer: &str) {
    let content = buffer.trim();
    if content.is_empty() {
        return;
    }
    let slot = match current {
        Some(Section::Html) => &mut parts.html,
        Some(Section::Css) => &mut parts.css,
        Some(Section::Js) => &mut parts.js,
        None => return,
    };
    if slot.is_none() {
        *slot = Some(content.to_string());
    }
}

/// Strategy 5 / final normalization: strip leading and trailing code-fence
/// markers left around a recovered part.
fn strip_fences(content: &str) -> String {
    let mut out = content.trim().to_string();
    if let Ok(re) = Regex::new(r"^```[A-Za-z]*\s*") {
        out = re.replace(&out, "").into_owned();
    }
    if let Ok(re) = Regex::new(r"\s*```$") {
        out = re.replace(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// First capture group of `pattern`, trimmed, if non-empty. Pattern
/// compilation failures degrade to "no match"; every pass is best-effort.
fn capture(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(text)?;
    let content = caps.get(1)?.as_str().trim();
    (!content.is_empty()).then(|| content.to_string())
}

/// The whole match of `pattern`, trimmed, if non-empty.
fn matched(pattern: &str, text: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    let content = re.find(text)?.as_str().trim();
    (!content.is_empty()).then(|| content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{SCRIPT_PLACEHOLDER, STYLESHEET_PLACEHOLDER};

    const MARKUP: &str = "<!DOCTYPE html>\n<html><body><h1>Landing page</h1></body></html>";

    #[test]
    fn section_markers_roundtrip() {
        let text = format!(
            "===HTML===\n{}\n===CSS===\nbody {{ color: red; }}\n===JS===\nconsole.log('hi');\n",
            MARKUP
        );
        let bundle = CodeBundleParser::new().parse(&text).unwrap();

        assert_eq!(bundle.markup().content, MARKUP);
        assert_eq!(bundle.stylesheet().content, "body { color: red; }");
        assert_eq!(bundle.script().content, "console.log('hi');");
    }

    #[test]
    fn markers_are_case_insensitive() {
        let text = format!("===html===\n{}\n===css===\np {{ margin: 0; }}\n", MARKUP);
        let bundle = CodeBundleParser::new().parse(&text).unwrap();

        assert_eq!(bundle.markup().content, MARKUP);
        assert_eq!(bundle.stylesheet().content, "p { margin: 0; }");
        assert_eq!(bundle.script().content, SCRIPT_PLACEHOLDER);
    }

    #[test]
    fn fenced_html_only_gets_placeholders() {
        let text = format!("Here is the site:\n```html\n{}\n```\nEnjoy!", MARKUP);
        let bundle = CodeBundleParser::new().parse(&text).unwrap();

        assert_eq!(bundle.markup().content, MARKUP);
        assert_eq!(bundle.stylesheet().content, STYLESHEET_PLACEHOLDER);
        assert_eq!(bundle.script().content, SCRIPT_PLACEHOLDER);
    }

    #[test]
    fn untagged_fence_with_doctype_is_markup() {
        let text = format!("```\n{}\n```", MARKUP);
        let bundle = CodeBundleParser::new().parse(&text).unwrap();
        assert_eq!(bundle.markup().content, MARKUP);
    }

    #[test]
    fn whole_document_mines_embedded_parts() {
        let text = "Sure! Here you go: <!DOCTYPE html><html><head>\
                    <style>h1 { font-size: 2rem; }</style></head><body><h1>Shop</h1>\
                    <script>document.title = 'Shop';</script></body></html> Hope it helps.";
        let parts = whole_document(text);

        let doc = parts.html.unwrap();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.ends_with("</html>"));
        assert_eq!(parts.css.as_deref(), Some("h1 { font-size: 2rem; }"));
        assert_eq!(parts.js.as_deref(), Some("document.title = 'Shop';"));
    }

    #[test]
    fn tag_delimited_blocks_recovered_from_prose() {
        let text = "The page: <html><body><h1>Catalog overview page</h1></body></html>\n\
                    The styling: <style>h1 { color: teal; }</style>";
        let bundle = CodeBundleParser::new().parse(text).unwrap();

        assert!(bundle.markup().content.starts_with("<html>"));
        // Tag-delimited fallbacks keep their delimiters, as documented.
        assert_eq!(
            bundle.stylesheet().content,
            "<style>h1 { color: teal; }</style>"
        );
        assert_eq!(bundle.script().content, SCRIPT_PLACEHOLDER);
    }

    #[test]
    fn line_sections_segment_labeled_output() {
        let text = "\
Here is the HTML:
<div class=\"page\"><h1>Welcome to the generated landing page</h1></div>
Here is the CSS:
.page { padding: 2rem; }
Here is the JavaScript:
document.querySelector('.page').classList.add('ready');
";
        let bundle = CodeBundleParser::new().parse(text).unwrap();

        assert!(bundle.markup().content.contains("<h1>"));
        assert_eq!(bundle.stylesheet().content, ".page { padding: 2rem; }");
        assert!(bundle.script().content.contains("querySelector"));
    }

    #[test]
    fn short_markup_is_rejected() {
        let err = CodeBundleParser::new()
            .parse("===HTML===\n<p>hi</p>\n")
            .unwrap_err();
        assert!(matches!(err, Error::BundleIncomplete(_)));
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = CodeBundleParser::new().parse("").unwrap_err();
        assert!(matches!(err, Error::BundleIncomplete(_)));
    }

    #[test]
    fn nested_fences_are_stripped() {
        let text = format!("===HTML===\n```html\n{}\n```\n", MARKUP);
        let bundle = CodeBundleParser::new().parse(&text).unwrap();
        assert_eq!(bundle.markup().content, MARKUP);
    }

    #[test]
    fn strip_fences_handles_untagged_markers() {
        assert_eq!(strip_fences("```\nbody {}\n```"), "body {}");
        assert_eq!(strip_fences("```css\nbody {}\n```"), "body {}");
        assert_eq!(strip_fences("plain content"), "plain content");
    }

    #[test]
    fn markers_beat_later_strategies() {
        // A stray fenced block must not displace marker content.
        let text = format!(
            "```css\n.ignored {{}}\n```\n===HTML===\n{}\n===CSS===\nbody {{ color: blue; }}",
            MARKUP
        );
        let bundle = CodeBundleParser::new().parse(&text).unwrap();
        assert_eq!(bundle.stylesheet().content, "body { color: blue; }");
    }
}
