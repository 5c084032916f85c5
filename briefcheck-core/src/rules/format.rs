//! Physical format predicates: paper, margins, typeface, density, spacing.

use super::engine::{page_list, CheckContext, Evaluation};
use crate::metrics::PageFontProfile;
use crate::types::{Margins, Severity, Zone};
use serde_json::json;

pub(crate) fn paper_size(ctx: &CheckContext<'_>) -> Evaluation {
    let paper = &ctx.config.paper;
    let measured: Vec<_> = ctx.document.pages.iter().filter(|p| p.is_readable()).collect();
    let Some(first) = measured.first() else {
        return Evaluation::indeterminate("no readable pages to measure");
    };

    let bad: Vec<usize> = measured
        .iter()
        .filter(|p| {
            (p.width_in() - paper.width_in).abs() > paper.tolerance_in
                || (p.height_in() - paper.height_in).abs() > paper.tolerance_in
        })
        .map(|p| p.index)
        .collect();

    if bad.is_empty() {
        return Evaluation::pass(format!(
            "All pages are {}\" x {}\".",
            paper.width_in, paper.height_in
        ));
    }
    Evaluation::fail(format!(
        "Pages not {}\" x {}\": {}.",
        paper.width_in,
        paper.height_in,
        page_list(&bad)
    ))
    .with_details(json!({
        "expected_in": [paper.width_in, paper.height_in],
        "first_page_in": [round2(first.width_in()), round2(first.height_in())],
        "pages": bad,
    }))
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    fn label(self) -> &'static str {
        match self {
            Side::Left => "Left margin",
            Side::Right => "Right margin",
            Side::Top => "Top margin",
            Side::Bottom => "Bottom margin",
        }
    }

    fn of(self, margins: &Margins) -> f32 {
        match self {
            Side::Left => margins.left,
            Side::Right => margins.right,
            Side::Top => margins.top,
            Side::Bottom => margins.bottom,
        }
    }
}

fn margin(ctx: &CheckContext<'_>, side: Side) -> Evaluation {
    let config = &ctx.config.margins;
    let required = match side {
        Side::Left => config.left_in,
        Side::Right => config.right_in,
        Side::Top => config.top_in,
        Side::Bottom => config.bottom_in,
    };

    let measured: Vec<(usize, f32)> = ctx
        .document
        .pages
        .iter()
        .filter_map(|p| p.margins.as_ref().map(|m| (p.index, side.of(m))))
        .collect();
    let Some(smallest) = measured.iter().map(|(_, v)| *v).min_by(|a, b| a.total_cmp(b)) else {
        return Evaluation::indeterminate("no page has measurable text");
    };

    let bad: Vec<usize> = measured
        .iter()
        .filter(|(_, value)| *value < required - config.tolerance_in)
        .map(|(page, _)| *page)
        .collect();

    if bad.is_empty() {
        return Evaluation::pass(format!("{} meets the {required}\" requirement.", side.label()));
    }
    Evaluation::fail(format!(
        "{} < {required}\" on page(s) {}.",
        side.label(),
        page_list(&bad)
    ))
    .with_details(json!({
        "smallest_in": round2(smallest),
        "required_in": required,
        "tolerance_in": config.tolerance_in,
        "pages": bad,
    }))
}

pub(crate) fn left_margin(ctx: &CheckContext<'_>) -> Evaluation {
    margin(ctx, Side::Left)
}

pub(crate) fn right_margin(ctx: &CheckContext<'_>) -> Evaluation {
    margin(ctx, Side::Right)
}

pub(crate) fn top_margin(ctx: &CheckContext<'_>) -> Evaluation {
    margin(ctx, Side::Top)
}

pub(crate) fn bottom_margin(ctx: &CheckContext<'_>) -> Evaluation {
    margin(ctx, Side::Bottom)
}

/// Zone-aware minimum font size.
///
/// Characters under the floor in header/footer, superscript, footnote or
/// small-caps positions are conventional and downgrade the result to a
/// passing note. Undersized body text fails: reject once any page carries
/// `noncompliant_char_threshold` such characters, note below that.
pub(crate) fn font_size(ctx: &CheckContext<'_>) -> Evaluation {
    let typography = &ctx.config.typography;
    let minimum = typography.min_font_size_pt;
    if ctx.metrics.zone(Zone::Body).is_none() {
        return Evaluation::indeterminate("no body text could be measured");
    }

    let profiles = &ctx.metrics.page_profiles;
    if profiles.is_empty() {
        return Evaluation::pass(format!("Font size meets the {minimum}pt minimum."));
    }

    let details = json!({
        "minimum_pt": minimum,
        "tolerance_pt": typography.font_size_tolerance_pt,
        "floor_pt": typography.font_floor(),
        "dominant_body_pt": ctx.metrics.dominant_body_size,
        "smallest_pt": ctx.metrics.overall_min_font,
        "pages": profiles,
        "breakdown": profiles.iter().map(breakdown_line).collect::<Vec<_>>(),
    });

    let offending: Vec<&PageFontProfile> = profiles.iter().filter(|p| p.undersized.body > 0).collect();
    if offending.is_empty() {
        return Evaluation::pass(format!(
            "Sub-{minimum}pt characters detected; all appear consistent with conventional formatting ({}).",
            benign_summary(profiles)
        ))
        .with_severity(Severity::Note)
        .with_details(details);
    }

    let severe = offending
        .iter()
        .any(|p| p.undersized.body >= typography.noncompliant_char_threshold);
    let smallest = ctx
        .metrics
        .body_min_font
        .or(ctx.metrics.overall_min_font)
        .unwrap_or(minimum);
    let pages: Vec<usize> = offending.iter().map(|p| p.page).collect();

    Evaluation::fail(format!(
        "Font size {smallest:.1}pt found on page(s) {}; minimum is {minimum}pt (sizes from {:.1}pt accepted).",
        page_list(&pages),
        typography.font_floor()
    ))
    .with_severity(if severe { Severity::Reject } else { Severity::Note })
    .with_details(details)
}

fn breakdown_line(profile: &PageFontProfile) -> String {
    let u = &profile.undersized;
    let parts: Vec<String> = [
        (u.body, "body"),
        (u.small_caps, "small caps"),
        (u.header_footer, "header/footer"),
        (u.superscript, "superscript"),
        (u.footnote, "footnote"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{count} {label}"))
    .collect();
    let pct = if profile.total_chars > 0 {
        u.total() as f32 / profile.total_chars as f32 * 100.0
    } else {
        0.0
    };
    format!(
        "Page {}: {} of {} chars ({pct:.1}%) noncompliant: {}",
        profile.page,
        u.total(),
        profile.total_chars,
        parts.join(", ")
    )
}

fn benign_summary(profiles: &[PageFontProfile]) -> String {
    let categories: [(&str, fn(&PageFontProfile) -> usize); 4] = [
        ("small caps", |p| p.undersized.small_caps),
        ("headers/footers", |p| p.undersized.header_footer),
        ("superscripts", |p| p.undersized.superscript),
        ("footnotes", |p| p.undersized.footnote),
    ];
    categories
        .iter()
        .filter_map(|(label, count)| {
            let pages: Vec<usize> = profiles.iter().filter(|p| count(p) > 0).map(|p| p.page).collect();
            (!pages.is_empty()).then(|| format!("{label} on pages {}", page_list(&pages)))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn char_density(ctx: &CheckContext<'_>) -> Evaluation {
    let limit = ctx.config.typography.max_chars_per_inch;
    let Some(max_cpi) = ctx.metrics.max_cpi else {
        return Evaluation::indeterminate("no body line long enough to measure character density");
    };

    let dense: Vec<usize> = ctx
        .metrics
        .page_cpi
        .iter()
        .filter(|(_, cpi)| **cpi > limit)
        .map(|(page, _)| *page)
        .collect();
    if dense.is_empty() {
        return Evaluation::pass(format!(
            "Character density within {limit} characters per inch (highest {max_cpi:.1})."
        ));
    }
    Evaluation::fail(format!(
        "High character density detected on page(s) {}.",
        page_list(&dense)
    ))
    .with_details(json!({
        "limit_cpi": limit,
        "max_cpi": round2(max_cpi),
        "page_cpi": ctx.metrics.page_cpi.iter().map(|(p, c)| (p.to_string(), json!(round2(*c)))).collect::<serde_json::Map<_, _>>(),
    }))
}

pub(crate) fn font_style(ctx: &CheckContext<'_>) -> Evaluation {
    let style = &ctx.metrics.style;
    let Some(share) = style.roman_share() else {
        return Evaluation::indeterminate("no body text outside the cover");
    };
    if share >= ctx.config.typography.min_roman_share {
        return Evaluation::pass("Font style appears to be plain roman.");
    }
    Evaluation::fail(format!(
        "Only {:.0}% of body text is plain roman.",
        share * 100.0
    ))
    .with_details(json!({
        "style": style,
        "predominant_font": ctx.metrics.predominant_font,
    }))
}

pub(crate) fn double_spacing(ctx: &CheckContext<'_>) -> Evaluation {
    let (Some(ratio), Some(gap)) = (ctx.metrics.line_spacing_ratio, ctx.metrics.median_baseline_gap_pt) else {
        return Evaluation::indeterminate("line spacing could not be measured");
    };
    let minimum = ctx.config.typography.min_double_spacing_ratio;
    if ratio >= minimum {
        return Evaluation::pass(format!(
            "Body text appears double-spaced (median baseline gap {gap:.1}pt)."
        ));
    }
    Evaluation::fail(format!(
        "Body text appears single-spaced (median baseline gap {gap:.1}pt)."
    ))
    .with_details(json!({
        "spacing_ratio": round2(ratio),
        "required_ratio": minimum,
        "dominant_body_pt": ctx.metrics.dominant_body_size,
    }))
}

pub(crate) fn footnote_typeface(ctx: &CheckContext<'_>) -> Evaluation {
    let typography = &ctx.config.typography;
    let Some(smallest) = ctx.metrics.footnote_min_font else {
        return Evaluation::pass("No footnotes detected.");
    };
    if smallest >= typography.font_floor() {
        return Evaluation::pass("Footnotes use the same minimum typeface as the body.");
    }
    let pages: Vec<usize> = ctx
        .metrics
        .page_profiles
        .iter()
        .filter(|p| p.undersized.footnote > 0)
        .map(|p| p.page)
        .collect();
    Evaluation::fail(format!(
        "Footnote text as small as {smallest:.1}pt on page(s) {}; footnotes must meet the {}pt minimum.",
        page_list(&pages),
        typography.min_font_size_pt
    ))
}

fn round2(value: f32) -> f64 {
    (f64::from(value) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComplianceConfig;
    use crate::metrics::{DocumentMetrics, UndersizedChars, ZoneFontStats};
    use crate::types::{BriefType, Document, DocumentMetadata, Page, PageStatus};
    use std::collections::BTreeMap;

    fn page_with_margins(index: usize, left: f32) -> Page {
        let mut page = Page::unreadable(index, "");
        page.status = PageStatus::Readable;
        page.width_pt = 612.0;
        page.height_pt = 792.0;
        page.margins = Some(Margins {
            left,
            right: 1.0,
            top: 1.0,
            bottom: 1.0,
        });
        page
    }

    fn document(pages: Vec<Page>) -> Document {
        Document {
            pages,
            brief_type: BriefType::Appellant,
            rehearing: false,
            full_text: String::new(),
            cover_text: String::new(),
            metadata: DocumentMetadata::default(),
        }
    }

    fn body_metrics(profiles: Vec<PageFontProfile>) -> DocumentMetrics {
        DocumentMetrics {
            zone_stats: BTreeMap::from([(
                Zone::Body,
                ZoneFontStats {
                    min_size: 12.0,
                    median_size: 12.0,
                    chars: 4000,
                    runs: 100,
                },
            )]),
            body_min_font: Some(12.0),
            overall_min_font: Some(8.0),
            page_profiles: profiles,
            ..DocumentMetrics::default()
        }
    }

    fn profile(page: usize, undersized: UndersizedChars) -> PageFontProfile {
        PageFontProfile {
            page,
            total_chars: 1500,
            min_size: Some(8.0),
            undersized,
            conventional: false,
        }
    }

    fn run<F: Fn(&CheckContext<'_>) -> Evaluation>(check: F, document: &Document, metrics: &DocumentMetrics) -> Evaluation {
        let config = ComplianceConfig::default();
        check(&CheckContext {
            document,
            metrics,
            config: &config,
        })
    }

    #[test]
    fn test_left_margin_boundary() {
        let metrics = DocumentMetrics::default();
        let exact = document(vec![page_with_margins(1, 1.50)]);
        assert!(matches!(run(left_margin, &exact, &metrics), Evaluation::Pass { .. }));

        let within = document(vec![page_with_margins(1, 1.46)]);
        assert!(matches!(run(left_margin, &within, &metrics), Evaluation::Pass { .. }));

        let short = document(vec![page_with_margins(1, 1.50), page_with_margins(2, 1.44)]);
        match run(left_margin, &short, &metrics) {
            Evaluation::Fail { message, .. } => assert_eq!(message, "Left margin < 1.5\" on page(s) 2."),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_paper_size_mismatch_lists_pages() {
        let mut legal = page_with_margins(2, 1.5);
        legal.height_pt = 1008.0;
        let doc = document(vec![page_with_margins(1, 1.5), legal]);
        match run(paper_size, &doc, &DocumentMetrics::default()) {
            Evaluation::Fail { message, .. } => assert_eq!(message, "Pages not 8.5\" x 11\": 2."),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_superscript_only_undersize_passes_as_note() {
        let doc = document(vec![]);
        let metrics = body_metrics(vec![profile(
            3,
            UndersizedChars {
                superscript: 6,
                ..UndersizedChars::default()
            },
        )]);
        match run(font_size, &doc, &metrics) {
            Evaluation::Pass { severity, message, .. } => {
                assert_eq!(severity, Some(Severity::Note));
                assert!(message.contains("superscripts on pages 3"));
            }
            other => panic!("expected downgraded pass, got {other:?}"),
        }
    }

    #[test]
    fn test_body_undersize_severity_is_graduated() {
        let doc = document(vec![]);
        let few = body_metrics(vec![profile(
            4,
            UndersizedChars {
                body: 3,
                ..UndersizedChars::default()
            },
        )]);
        assert!(matches!(
            run(font_size, &doc, &few),
            Evaluation::Fail { severity: Some(Severity::Note), .. }
        ));

        let mut many = body_metrics(vec![profile(
            4,
            UndersizedChars {
                body: 1200,
                ..UndersizedChars::default()
            },
        )]);
        many.body_min_font = Some(11.0);
        match run(font_size, &doc, &many) {
            Evaluation::Fail { severity, message, details } => {
                assert_eq!(severity, Some(Severity::Reject));
                assert_eq!(
                    message,
                    "Font size 11.0pt found on page(s) 4; minimum is 12pt (sizes from 11.7pt accepted)."
                );
                let details = details.unwrap();
                assert_eq!(details["minimum_pt"], json!(12.0));
                assert!((details["tolerance_pt"].as_f64().unwrap() - 0.3).abs() < 1e-6);
                assert!((details["floor_pt"].as_f64().unwrap() - 11.7).abs() < 1e-5);
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[test]
    fn test_breakdown_line() {
        let line = breakdown_line(&profile(
            2,
            UndersizedChars {
                body: 10,
                superscript: 5,
                ..UndersizedChars::default()
            },
        ));
        assert_eq!(line, "Page 2: 15 of 1500 chars (1.0%) noncompliant: 10 body, 5 superscript");
    }

    #[test]
    fn test_spacing_without_measurement_is_indeterminate() {
        let doc = document(vec![]);
        assert!(matches!(
            run(double_spacing, &doc, &DocumentMetrics::default()),
            Evaluation::Indeterminate { .. }
        ));
    }
}
