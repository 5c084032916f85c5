//! Layout extraction: raw collaborator pages -> normalized pages.
//!
//! Converts coordinates to points, groups runs into visual lines, labels
//! zones, detects the page-number token and measures margins. A page the
//! reader failed on becomes an unreadable page that still counts toward
//! page totals.

pub mod lines;
pub mod page_numbers;

use crate::config::ComplianceConfig;
use crate::metrics::zones::ZoneClassifier;
use crate::types::*;
use regex::Regex;
use std::sync::LazyLock;

static ADDENDUM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*addendum\s*$").unwrap());

static TABLE_HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)table\s+of\s+(contents|authorities)").unwrap());

/// Lines inspected for a table-of-contents / authorities heading
const TABLE_HEADING_LINES: usize = 3;

pub struct LayoutExtractor<'a> {
    config: &'a ComplianceConfig,
    zones: ZoneClassifier<'a>,
}

impl<'a> LayoutExtractor<'a> {
    pub fn new(config: &'a ComplianceConfig) -> Self {
        Self {
            config,
            zones: ZoneClassifier::new(&config.zones),
        }
    }

    /// Normalize every page. Never fails: page-level problems become
    /// `PageStatus::Unreadable`.
    pub fn extract(&self, raw: &RawDocument) -> Vec<Page> {
        let locked = raw.metadata.encrypted == Some(true) && raw.pages.iter().all(|p| p.runs.is_empty());

        let mut pages: Vec<Page> = raw
            .pages
            .iter()
            .enumerate()
            .map(|(i, raw_page)| {
                if locked {
                    Page::unreadable(i + 1, "encrypted document")
                } else {
                    self.extract_page(i + 1, raw_page)
                }
            })
            .collect();

        mark_addendum(&mut pages);

        let unreadable: Vec<usize> = pages.iter().filter(|p| !p.is_readable()).map(|p| p.index).collect();
        if !unreadable.is_empty() {
            tracing::warn!(pages = ?unreadable, "pages could not be read");
        }
        tracing::info!(
            pages = pages.len(),
            runs = pages.iter().map(|p| p.runs.len()).sum::<usize>(),
            addendum_start = ?pages.iter().find(|p| p.is_addendum).map(|p| p.index),
            "layout extracted"
        );

        pages
    }

    pub fn extract_page(&self, index: usize, raw: &RawPage) -> Page {
        if let Some(cause) = &raw.error {
            return Page::unreadable(index, cause.clone());
        }
        if !(raw.units_per_inch.is_finite() && raw.units_per_inch > 0.0) {
            return Page::unreadable(index, format!("invalid unit scale {}", raw.units_per_inch));
        }

        let scale = POINTS_PER_INCH / raw.units_per_inch;
        let width_pt = raw.width * scale;
        let height_pt = raw.height * scale;
        if !(width_pt.is_finite() && height_pt.is_finite() && width_pt > 0.0 && height_pt > 0.0) {
            return Page::unreadable(index, "invalid page dimensions");
        }

        let runs: Vec<TextRun> = raw.runs.iter().filter_map(|r| normalize_run(r, scale)).collect();
        let skipped = raw.runs.len() - runs.len();
        if skipped > 0 {
            tracing::debug!(page = index, skipped, "dropped blank or malformed runs");
        }

        let mut page = Page {
            index,
            width_pt,
            height_pt,
            status: if runs.is_empty() {
                PageStatus::Empty
            } else {
                PageStatus::Readable
            },
            runs,
            lines: Vec::new(),
            separators: raw
                .separators
                .iter()
                .filter(|s| s.is_finite())
                .map(|s| s.scaled(scale))
                .collect(),
            margins: None,
            page_number: None,
            is_addendum: false,
            is_table_page: false,
        };

        if page.runs.is_empty() {
            return page;
        }

        lines::group_lines(&mut page, self.config.zones.line_grouping_tolerance);
        self.zones.label(&mut page);
        page.page_number = page_numbers::detect_page_number(&page, &self.config.zones);
        page.margins = measure_margins(&page);
        page.is_table_page = is_table_page(&page);
        page
    }
}

fn normalize_run(raw: &RawTextRun, scale: f32) -> Option<TextRun> {
    if raw.text.trim().is_empty()
        || !raw.bbox.is_finite()
        || !raw.font_size.is_finite()
        || raw.font_size <= 0.0
    {
        return None;
    }
    let bbox = raw.bbox.scaled(scale);
    let baseline = raw
        .baseline
        .filter(|b| b.is_finite())
        .map(|b| b * scale)
        .unwrap_or(bbox.bottom);
    Some(TextRun {
        text: raw.text.trim().to_string(),
        font_name: raw.font_name.clone(),
        font_size: raw.font_size * scale,
        flags: raw.flags,
        bbox,
        baseline,
        zone: Zone::Body,
        line: 0,
    })
}

/// Margins of the main text block (every zone except header/footer), in inches.
/// None when the page carries no such text.
pub fn measure_margins(page: &Page) -> Option<Margins> {
    let mut block: Option<BoundingBox> = None;
    for run in page.runs.iter().filter(|r| r.zone != Zone::HeaderFooter) {
        let b = run.bbox;
        block = Some(match block {
            None => b,
            Some(acc) => BoundingBox::new(
                acc.left.min(b.left),
                acc.top.min(b.top),
                acc.right.max(b.right),
                acc.bottom.max(b.bottom),
            ),
        });
    }
    block.map(|b| Margins {
        left: b.left / POINTS_PER_INCH,
        right: (page.width_pt - b.right) / POINTS_PER_INCH,
        top: b.top / POINTS_PER_INCH,
        bottom: (page.height_pt - b.bottom) / POINTS_PER_INCH,
    })
}

fn is_table_page(page: &Page) -> bool {
    page.main_lines()
        .take(TABLE_HEADING_LINES)
        .any(|(_, line)| TABLE_HEADING_REGEX.is_match(&line.text))
}

/// The first page whose top line reads "ADDENDUM" starts the addendum;
/// it and every later page are excluded from page limits.
pub fn mark_addendum(pages: &mut [Page]) {
    let start = pages.iter().position(|page| {
        page.main_lines()
            .next()
            .is_some_and(|(_, line)| ADDENDUM_REGEX.is_match(&line.text))
    });
    if let Some(start) = start {
        for page in &mut pages[start..] {
            page.is_addendum = true;
        }
    }
}

/// Assemble the run's Document once the brief type is known
pub fn assemble_document(
    pages: Vec<Page>,
    metadata: DocumentMetadata,
    brief_type: BriefType,
    rehearing: bool,
) -> Document {
    let cover_text = cover_text(&pages);
    let full_text = pages
        .iter()
        .filter(|p| p.has_text())
        .map(Page::text)
        .collect::<Vec<_>>()
        .join("\n\n");
    Document {
        pages,
        brief_type,
        rehearing,
        full_text,
        cover_text,
        metadata,
    }
}

pub fn cover_text(pages: &[Page]) -> String {
    pages
        .first()
        .filter(|p| p.has_text())
        .map(Page::text)
        .unwrap_or_default()
}
