//! Page numbering and length limits.

use super::engine::{page_list, CheckContext, Evaluation};
use crate::types::BriefType;
use serde_json::json;

pub(crate) fn page_numbers_present(ctx: &CheckContext<'_>) -> Evaluation {
    let pages = &ctx.document.pages;
    if !pages.iter().any(|p| p.has_text()) {
        return Evaluation::indeterminate("no page has extractable text");
    }

    let unnumbered: Vec<usize> = pages
        .iter()
        .filter(|p| p.has_text() && p.page_number.is_none())
        .map(|p| p.index)
        .collect();
    let unreadable = ctx.document.unreadable_pages();

    if unnumbered.is_empty() {
        let message = if unreadable.is_empty() {
            "All pages have bottom page numbers.".to_string()
        } else {
            format!(
                "All readable pages have bottom page numbers (page(s) {} could not be read).",
                page_list(&unreadable)
            )
        };
        return Evaluation::pass(message);
    }
    Evaluation::fail(format!(
        "Pages without bottom page numbers: {}.",
        page_list(&unnumbered)
    ))
    .with_details(json!({ "pages": unnumbered, "unreadable_pages": unreadable }))
}

/// Numbering starts at 1 on the cover and rises by one per page. Pages
/// without a token are FMT-011's concern and are skipped here; roman
/// numerals break the sequence.
pub(crate) fn numbering_sequence(ctx: &CheckContext<'_>) -> Evaluation {
    let numbered: Vec<_> = ctx
        .document
        .pages
        .iter()
        .filter_map(|p| p.page_number.as_ref().map(|token| (p.index, token)))
        .collect();
    if numbered.is_empty() {
        return Evaluation::indeterminate("no page-number tokens were detected");
    }

    let offenders: Vec<usize> = numbered
        .iter()
        .filter(|(index, token)| token.value != u32::try_from(*index).ok())
        .map(|(index, _)| *index)
        .collect();
    let Some(&first) = offenders.first() else {
        return Evaluation::pass("Page numbering starts at 1 on the cover and runs consecutively.");
    };

    let found = numbered
        .iter()
        .find(|(index, _)| *index == first)
        .map(|(_, token)| token.text.clone())
        .unwrap_or_default();
    Evaluation::fail(format!(
        "Page numbering breaks at page {first}: expected \"{first}\", found \"{found}\"."
    ))
    .with_details(json!({
        "first_offending_page": first,
        "expected": first,
        "found": found,
        "offending_pages": offenders,
    }))
}

fn check_pages(ctx: &CheckContext<'_>, limit: usize, advisory: Option<String>) -> Evaluation {
    let document = ctx.document;
    let body = document.body_pages();
    let details = json!({
        "body_pages": body,
        "total_pages": document.total_pages(),
        "addendum_start": document.addendum_start(),
        "limit": limit,
    });
    let prefix = advisory.map(|a| format!("{a} ")).unwrap_or_default();

    if body > limit {
        return Evaluation::fail(format!(
            "{prefix}{} brief is {body} pages; limit is {limit}.",
            document.brief_type.label()
        ))
        .with_details(details);
    }
    Evaluation::pass(format!("{prefix}Brief is {body} pages (limit: {limit}).")).with_details(details)
}

/// PG-001 / PG-002: page limit for the document's type. An unknown type
/// is held to the most permissive limit.
pub(crate) fn page_limit(ctx: &CheckContext<'_>) -> Evaluation {
    let brief_type = ctx.document.brief_type;
    let Some(limit) = ctx.config.limits.page_limit(brief_type) else {
        return Evaluation::not_applicable(format!("No page limit configured for {brief_type} briefs."));
    };
    let advisory = (brief_type == BriefType::Unknown).then(|| {
        format!("Brief type unknown; checked against the most permissive limit ({limit} pages).")
    });
    check_pages(ctx, limit, advisory)
}

pub(crate) fn amicus_page_limit(ctx: &CheckContext<'_>) -> Evaluation {
    if ctx.document.rehearing {
        return Evaluation::not_applicable("Rehearing amicus briefs are limited by word count.");
    }
    page_limit(ctx)
}

pub(crate) fn amicus_word_limit(ctx: &CheckContext<'_>) -> Evaluation {
    if !ctx.document.rehearing {
        return Evaluation::not_applicable("Word limit applies only to amicus briefs on rehearing.");
    }
    let limit = ctx.config.limits.amicus_rehearing_words;
    let words = ctx.metrics.word_count;
    let details = json!({ "word_count": words, "limit": limit });

    if words > limit {
        return Evaluation::fail(format!("Brief is {words} words; limit is {limit}.")).with_details(details);
    }
    // A partial count under the limit proves nothing
    let missing: Vec<usize> = ctx
        .document
        .pages
        .iter()
        .filter(|p| !p.is_readable() && !p.is_addendum)
        .map(|p| p.index)
        .collect();
    if !missing.is_empty() {
        return Evaluation::indeterminate(format!(
            "page(s) {} could not be read, so the word count is incomplete",
            page_list(&missing)
        ));
    }
    Evaluation::pass(format!("Brief is {words} words (limit: {limit}).")).with_details(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComplianceConfig;
    use crate::metrics::DocumentMetrics;
    use crate::types::{Document, DocumentMetadata, Page, PageNumberToken, PageStatus};

    fn page(index: usize, number: Option<&str>) -> Page {
        let mut page = Page::unreadable(index, "");
        page.status = PageStatus::Readable;
        page.page_number = number.map(|text| PageNumberToken {
            text: text.to_string(),
            value: text.parse().ok(),
        });
        page
    }

    fn document(brief_type: BriefType, pages: Vec<Page>) -> Document {
        Document {
            pages,
            brief_type,
            rehearing: false,
            full_text: String::new(),
            cover_text: String::new(),
            metadata: DocumentMetadata::default(),
        }
    }

    fn evaluate(check: fn(&CheckContext<'_>) -> Evaluation, document: &Document) -> Evaluation {
        let config = ComplianceConfig::default();
        let metrics = DocumentMetrics::default();
        check(&CheckContext {
            document,
            metrics: &metrics,
            config: &config,
        })
    }

    #[test]
    fn test_gap_reports_first_offending_index() {
        let pages = ["1", "2", "3", "5"]
            .iter()
            .enumerate()
            .map(|(i, n)| page(i + 1, Some(*n)))
            .collect();
        let doc = document(BriefType::Appellant, pages);
        match evaluate(numbering_sequence, &doc) {
            Evaluation::Fail { details, .. } => {
                assert_eq!(details.unwrap()["first_offending_page"], 4);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_roman_token_breaks_sequence() {
        let doc = document(BriefType::Appellant, vec![page(1, Some("1")), page(2, Some("ii"))]);
        match evaluate(numbering_sequence, &doc) {
            Evaluation::Fail { message, .. } => {
                assert_eq!(message, "Page numbering breaks at page 2: expected \"2\", found \"ii\".")
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_page_limit_counts_only_body_pages() {
        let mut pages: Vec<Page> = (1..=48).map(|i| page(i, None)).collect();
        for p in &mut pages[38..] {
            p.is_addendum = true;
        }
        let doc = document(BriefType::Appellant, pages);
        assert!(matches!(evaluate(page_limit, &doc), Evaluation::Pass { .. }));

        let over = document(BriefType::Appellant, (1..=39).map(|i| page(i, None)).collect());
        match evaluate(page_limit, &over) {
            Evaluation::Fail { message, .. } => assert_eq!(message, "Appellant brief is 39 pages; limit is 38."),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_uses_permissive_limit_with_advisory() {
        let doc = document(BriefType::Unknown, (1..=20).map(|i| page(i, None)).collect());
        match evaluate(page_limit, &doc) {
            Evaluation::Pass { message, .. } => {
                assert!(message.starts_with("Brief type unknown; checked against the most permissive limit (38 pages)."))
            }
            other => panic!("expected pass, got {other:?}"),
        }
    }

    #[test]
    fn test_word_limit_only_on_rehearing() {
        let mut doc = document(BriefType::Amicus, vec![page(1, Some("1"))]);
        assert!(matches!(evaluate(amicus_word_limit, &doc), Evaluation::NotApplicable { .. }));
        doc.rehearing = true;
        assert!(matches!(evaluate(amicus_word_limit, &doc), Evaluation::Pass { .. }));
        assert!(matches!(evaluate(amicus_page_limit, &doc), Evaluation::NotApplicable { .. }));

        doc.pages.push(Page::unreadable(2, "bad stream"));
        assert!(matches!(evaluate(amicus_word_limit, &doc), Evaluation::Indeterminate { .. }));
    }
}
