use crate::config::ZoneConfig;
use crate::types::{Page, PageNumberToken};
use regex::Regex;
use std::sync::LazyLock;

static ARABIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-–—]?\s*(\d+)\s*[-–—]?$").unwrap());

/// Well-formed numerals below 400; front matter never runs longer
static ROMAN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[-–—]?\s*(c{0,3}(?:xc|xl|l?x{0,3})(?:ix|iv|v?i{0,3}))\s*[-–—]?$").unwrap()
});

/// Page-number token from the bottom band: the lowest visual line whose
/// whole text is a number, optionally dash-flanked.
pub fn detect_page_number(page: &Page, zones: &ZoneConfig) -> Option<PageNumberToken> {
    let floor = page.height_pt * (1.0 - zones.footer_band);
    page.lines
        .iter()
        .rev()
        .filter(|line| line.bbox.center_y() >= floor)
        .find_map(|line| parse_token(&line.text))
}

pub fn parse_token(text: &str) -> Option<PageNumberToken> {
    let text = text.trim();
    if let Some(cap) = ARABIC_REGEX.captures(text) {
        return Some(PageNumberToken {
            text: text.to_string(),
            value: cap[1].parse::<u32>().ok(),
        });
    }
    let numeral = ROMAN_REGEX.captures(text)?.get(1)?.as_str();
    let single_case = numeral.chars().all(|c| c.is_ascii_lowercase())
        || numeral.chars().all(|c| c.is_ascii_uppercase());
    (!numeral.is_empty() && single_case).then(|| PageNumberToken {
        text: text.to_string(),
        value: None,
    })
}
