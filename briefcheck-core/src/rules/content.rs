//! Text presence checks over the cover and the full brief text.

use super::engine::{CheckContext, Evaluation};
use crate::types::BriefType;
use regex::Regex;
use serde_json::json;
use std::sync::LazyLock;

static BRACKET_NUMBER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());

static PARAGRAPH_SYMBOL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"¶\s*\d+").unwrap());

static CERTIFICATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)certificate\s+of\s+compliance").unwrap());

/// (R<index>:<page>) register-of-actions citation
static RECORD_CITE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(R\d+:\d+").unwrap());

/// Paragraph markers needed before numbering counts as present
const MIN_PARAGRAPH_MARKERS: usize = 3;

fn full_text<'a>(ctx: &CheckContext<'a>) -> Result<&'a str, Evaluation> {
    let text = ctx.document.full_text.as_str();
    if text.trim().is_empty() {
        return Err(Evaluation::indeterminate("the brief has no extractable text"));
    }
    Ok(text)
}

/// Physical cover colour cannot be read from the document; the result
/// names the expected colour for manual review.
pub(crate) fn cover_color(ctx: &CheckContext<'_>) -> Evaluation {
    let brief_type = ctx.document.brief_type;
    match ctx.config.cover_colors.expected(brief_type) {
        Some(colour) => Evaluation::pass(format!(
            "Cover color should be {colour} for {brief_type} brief. Cannot verify from PDF; manual check required."
        ))
        .with_details(json!({ "expected_color": colour })),
        None => Evaluation::not_applicable(format!("No cover color configured for {brief_type} briefs.")),
    }
}

pub(crate) fn oral_argument(ctx: &CheckContext<'_>) -> Evaluation {
    let cover = &ctx.document.cover_text;
    if cover.trim().is_empty() {
        return Evaluation::indeterminate("the cover page has no extractable text");
    }
    if cover.to_uppercase().contains("ORAL ARGUMENT") {
        return Evaluation::pass("Cover includes oral argument request notation.");
    }
    Evaluation::fail("No 'ORAL ARGUMENT REQUESTED' found on cover page.")
}

pub(crate) fn paragraph_numbering(ctx: &CheckContext<'_>) -> Evaluation {
    let text = match full_text(ctx) {
        Ok(text) => text,
        Err(indeterminate) => return indeterminate,
    };
    let brackets = BRACKET_NUMBER_REGEX.find_iter(text).count();
    let symbols = PARAGRAPH_SYMBOL_REGEX.find_iter(text).count();
    if brackets >= MIN_PARAGRAPH_MARKERS || symbols >= MIN_PARAGRAPH_MARKERS {
        return Evaluation::pass("Paragraphs appear to use arabic numeral numbering.");
    }
    Evaluation::fail("Paragraph numbering with arabic numerals not detected.").with_details(json!({
        "bracket_numbers": brackets,
        "paragraph_symbols": symbols,
    }))
}

pub(crate) fn certificate_of_compliance(ctx: &CheckContext<'_>) -> Evaluation {
    let text = match full_text(ctx) {
        Ok(text) => text,
        Err(indeterminate) => return indeterminate,
    };
    if CERTIFICATE_REGEX.is_match(text) {
        Evaluation::pass("Certificate of Compliance found.")
    } else {
        Evaluation::fail("Certificate of Compliance not found.")
    }
}

pub(crate) fn record_citations(ctx: &CheckContext<'_>) -> Evaluation {
    let text = match full_text(ctx) {
        Ok(text) => text,
        Err(indeterminate) => return indeterminate,
    };
    match RECORD_CITE_REGEX.find_iter(text).count() {
        0 => Evaluation::fail("No record citations in (R#:#) format detected."),
        count => Evaluation::pass(format!("Found {count} record citation(s) in (R#:#) format.")),
    }
}

/// Advisory only: an unknown type still gets every type-independent check
pub(crate) fn brief_type_identified(ctx: &CheckContext<'_>) -> Evaluation {
    match ctx.document.brief_type {
        BriefType::Unknown => Evaluation::fail(
            "Brief type could not be determined from the cover; the most permissive page limit was applied \
             and type-specific checks were marked not applicable.",
        ),
        other => Evaluation::pass(format!("Brief identified as {} brief.", other.label().to_lowercase())),
    }
}
