//! Positioned XHTML parser
//!
//! Parses the page dump some PDF readers emit as XHTML:
//! - Page divs with data-width / data-height (optionally data-units, data-error)
//! - Spans with data-bbox ("x,y,width,height") and optional data-baseline
//! - CSS font classes in a <style> block
//! - Document metadata in <meta> tags
//! - <hr data-bbox> rules (footnote separators)

use super::preprocessor::{has_extension, Preprocessor};
use crate::error::ExtractionError;
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

static PAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<div class="page"([^>]*)>(.*?)</div>"#).unwrap());

static SPAN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<span([^>]*)>([^<]*)</span>").unwrap());

static RULE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<hr([^>]*?)/?>").unwrap());

static ATTR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w-]+)="([^"]*)""#).unwrap());

static META_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="([^"]*)"[^>]*content="([^"]*)"[^>]*/?>"#).unwrap()
});

static STYLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<style[^>]*>(.*?)</style>").unwrap());

static FONT_CLASS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([\w-]+)\s*\{([^}]*)\}").unwrap());

static NUMERIC_ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|\d+);").unwrap());

/// Font attributes resolved from a CSS class
#[derive(Debug, Clone, PartialEq)]
struct FontClass {
    family: String,
    size: f32,
    flags: StyleFlags,
}

fn fallback_font() -> FontClass {
    FontClass {
        family: "unknown".to_string(),
        size: 12.0,
        flags: StyleFlags::default(),
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct XhtmlPreprocessor;

impl Preprocessor for XhtmlPreprocessor {
    fn parse_markup(&self, markup: &str) -> Result<RawDocument> {
        parse_xhtml(markup)
    }

    fn name(&self) -> &str {
        "XhtmlPreprocessor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, &["xhtml", "html", "htm"])
    }
}

/// Parse positioned XHTML into a RawDocument
pub fn parse_xhtml(xhtml: &str) -> Result<RawDocument> {
    let metadata = extract_metadata(xhtml);
    let font_classes = extract_font_classes(xhtml);

    let mut pages = Vec::new();
    for page_cap in PAGE_REGEX.captures_iter(xhtml) {
        let attrs = parse_attributes(page_cap.get(1).map_or("", |m| m.as_str()));
        let body = page_cap.get(2).map_or("", |m| m.as_str());
        pages.push(parse_page(&attrs, body, &font_classes));
    }

    if pages.is_empty() {
        return Err(ExtractionError::MalformedMarkup("no page elements found".to_string()).into());
    }

    tracing::debug!(
        pages = pages.len(),
        runs = pages.iter().map(|p| p.runs.len()).sum::<usize>(),
        font_classes = font_classes.len(),
        "XHTML parsing complete"
    );

    Ok(RawDocument { pages, metadata })
}

fn parse_page(attrs: &HashMap<String, String>, body: &str, fonts: &HashMap<String, FontClass>) -> RawPage {
    let number = |key: &str| attrs.get(key).and_then(|v| v.trim().parse::<f32>().ok());

    let mut page = RawPage {
        width: number("data-width").unwrap_or(0.0),
        height: number("data-height").unwrap_or(0.0),
        units_per_inch: number("data-units").unwrap_or(POINTS_PER_INCH),
        runs: Vec::new(),
        separators: Vec::new(),
        error: attrs.get("data-error").cloned(),
    };

    if page.error.is_none() && (page.width <= 0.0 || page.height <= 0.0) {
        page.error = Some("missing page dimensions".to_string());
        return page;
    }

    for cap in SPAN_REGEX.captures_iter(body) {
        let span_attrs = parse_attributes(cap.get(1).map_or("", |m| m.as_str()));
        let text = decode_entities(cap.get(2).map_or("", |m| m.as_str()));
        if text.trim().is_empty() {
            continue;
        }
        let Some(bbox) = span_attrs.get("data-bbox").and_then(|b| parse_bbox(b)) else {
            continue;
        };

        let font = span_attrs
            .get("class")
            .and_then(|class| class.split_whitespace().find_map(|c| fonts.get(c)))
            .cloned()
            .unwrap_or_else(fallback_font);
        let baseline = span_attrs
            .get("data-baseline")
            .and_then(|b| b.trim().parse::<f32>().ok());

        page.runs.push(RawTextRun {
            text,
            font_name: font.family,
            font_size: font.size,
            flags: font.flags,
            bbox,
            baseline,
        });
    }

    for cap in RULE_REGEX.captures_iter(body) {
        let rule_attrs = parse_attributes(cap.get(1).map_or("", |m| m.as_str()));
        if let Some(bbox) = rule_attrs.get("data-bbox").and_then(|b| parse_bbox(b)) {
            page.separators.push(bbox);
        }
    }

    page
}

fn parse_attributes(raw: &str) -> HashMap<String, String> {
    ATTR_REGEX
        .captures_iter(raw)
        .filter_map(|cap| Some((cap.get(1)?.as_str().to_string(), decode_entities(cap.get(2)?.as_str()))))
        .collect()
}

/// "x,y,width,height" -> BoundingBox
fn parse_bbox(raw: &str) -> Option<BoundingBox> {
    let parts: Vec<f32> = raw
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [x, y, w, h] => Some(BoundingBox::new(*x, *y, x + w, y + h)),
        _ => None,
    }
}

fn decode_entities(text: &str) -> String {
    let named = text
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&para;", "¶")
        .replace("&sect;", "§");
    let numeric = NUMERIC_ENTITY_REGEX.replace_all(&named, |caps: &regex::Captures| {
        let code = &caps[1];
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        value
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    // &amp; last so "&amp;lt;" stays literal
    numeric.replace("&amp;", "&")
}

fn extract_metadata(xhtml: &str) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::default();

    for cap in META_REGEX.captures_iter(xhtml) {
        if let (Some(name), Some(content)) = (cap.get(1), cap.get(2)) {
            let content = decode_entities(content.as_str());
            match name.as_str() {
                "dc:title" => metadata.title = Some(content),
                "pdf:producer" => metadata.producer = Some(content),
                "xmp:CreatorTool" => metadata.creator_tool = Some(content),
                "pdf:encrypted" => metadata.encrypted = Some(content == "true"),
                "xmpTPg:NPages" => {
                    if let Ok(pages) = content.parse::<u32>() {
                        metadata.page_count = pages;
                    }
                }
                _ => {}
            }
        }
    }

    metadata
}

/// CSS classes -> font attributes. Properties may appear in any order.
fn extract_font_classes(xhtml: &str) -> HashMap<String, FontClass> {
    let mut classes = HashMap::new();
    let Some(css) = STYLE_REGEX
        .captures(xhtml)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
    else {
        tracing::debug!("no CSS styles found in XHTML");
        return classes;
    };

    for cap in FONT_CLASS_REGEX.captures_iter(css) {
        let (Some(name), Some(body)) = (cap.get(1), cap.get(2)) else {
            continue;
        };
        let mut font = fallback_font();
        for declaration in body.as_str().split(';') {
            let Some((key, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "font-family" => font.family = value.trim_matches(|c| c == '"' || c == '\'').to_string(),
                "font-size" => {
                    if let Ok(size) = value.trim_end_matches("px").trim_end_matches("pt").trim().parse::<f32>() {
                        font.size = size;
                    }
                }
                "font-style" => font.flags.italic = matches!(value, "italic" | "oblique"),
                "font-weight" => {
                    font.flags.bold = value == "bold"
                        || value == "bolder"
                        || value.parse::<u32>().map(|w| w >= 600).unwrap_or(false)
                }
                _ => {}
            }
        }
        classes.insert(name.as_str().to_string(), font);
    }

    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html><head>
<meta name="pdf:producer" content="Word &amp; PDF"/>
<meta name="xmpTPg:NPages" content="2"/>
<style>
.f1 { font-family: Times New Roman; font-size: 12px; font-style: normal; font-weight: normal; color: #000000; }
.f2 { font-weight: bold; font-size: 14px; font-family: "Century Schoolbook"; }
</style></head><body>
<div class="page" data-width="612" data-height="792">
<span class="f2" data-bbox="200,100,212,16" data-baseline="113">BRIEF OF APPELLANT</span>
<span class="f1" data-bbox="108,200,100,14">&para; 1 Facts &lt;here&gt;</span>
<hr data-bbox="108,600,144,0.5"/>
</div>
<div class="page" data-width="612" data-height="792" data-error="content stream could not be decoded"></div>
</body></html>"#;

    #[test]
    fn test_parses_pages_runs_and_fonts() {
        let doc = parse_xhtml(SAMPLE).unwrap();
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.metadata.page_count, 2);
        assert_eq!(doc.metadata.producer.as_deref(), Some("Word & PDF"));

        let page = &doc.pages[0];
        assert_eq!(page.runs.len(), 2);
        let heading = &page.runs[0];
        assert_eq!(heading.text, "BRIEF OF APPELLANT");
        assert_eq!(heading.font_name, "Century Schoolbook");
        assert_eq!(heading.font_size, 14.0);
        assert!(heading.flags.bold);
        assert_eq!(heading.baseline, Some(113.0));
        assert_eq!(heading.bbox, BoundingBox::new(200.0, 100.0, 412.0, 116.0));
        assert_eq!(page.runs[1].text, "¶ 1 Facts <here>");
        assert_eq!(page.separators.len(), 1);
    }

    #[test]
    fn test_failed_page_is_carried_with_cause() {
        let doc = parse_xhtml(SAMPLE).unwrap();
        assert_eq!(doc.pages[1].error.as_deref(), Some("content stream could not be decoded"));
    }

    #[test]
    fn test_page_without_dimensions_is_flagged() {
        let doc = parse_xhtml(r#"<div class="page"><span class="f1" data-bbox="1,2,3,4">x</span></div>"#).unwrap();
        assert_eq!(doc.pages[0].error.as_deref(), Some("missing page dimensions"));
    }

    #[test]
    fn test_no_pages_is_an_error() {
        assert!(parse_xhtml("<html><body></body></html>").is_err());
    }
}
