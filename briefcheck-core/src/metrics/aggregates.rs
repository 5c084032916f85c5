use super::stats::{median, weighted_mode};
use crate::config::ComplianceConfig;
use crate::types::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Pages where small caps are conventional (signature blocks, certificates, tables)
static CONVENTIONAL_PAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)respectfully\s+submitted|certificate\s+of\s+(service|compliance|mailing)|table\s+of\s+(contents|authorities)")
        .unwrap()
});

/// Baseline gaps outside this multiple of the body size are paragraph
/// breaks, headings or column jumps, not line spacing
const SPACING_GAP_RANGE: (f32, f32) = (0.6, 4.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneFontStats {
    pub min_size: f32,
    pub median_size: f32,
    pub chars: usize,
    pub runs: usize,
}

/// Character shares by style over body text (cover excluded)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleDistribution {
    pub roman: usize,
    pub bold: usize,
    pub italic: usize,
    pub bold_italic: usize,
}

impl StyleDistribution {
    pub fn total(&self) -> usize {
        self.roman + self.bold + self.italic + self.bold_italic
    }

    pub fn roman_share(&self) -> Option<f32> {
        match self.total() {
            0 => None,
            total => Some(self.roman as f32 / total as f32),
        }
    }
}

/// Characters below the font floor on one page, by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndersizedChars {
    pub body: usize,
    pub small_caps: usize,
    pub header_footer: usize,
    pub superscript: usize,
    pub footnote: usize,
}

impl UndersizedChars {
    pub fn total(&self) -> usize {
        self.body + self.benign()
    }

    /// Everything except undersized body text
    pub fn benign(&self) -> usize {
        self.small_caps + self.header_footer + self.superscript + self.footnote
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageFontProfile {
    pub page: usize,
    pub total_chars: usize,
    /// Smallest undersized size on the page
    pub min_size: Option<f32>,
    pub undersized: UndersizedChars,
    /// Cover, table or certificate page
    pub conventional: bool,
}

/// Document-level aggregates. Every measurement is optional: None means
/// the input did not allow it, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetrics {
    pub zone_stats: BTreeMap<Zone, ZoneFontStats>,
    pub body_min_font: Option<f32>,
    pub overall_min_font: Option<f32>,
    pub footnote_min_font: Option<f32>,
    /// Character-weighted mode of body sizes
    pub dominant_body_size: Option<f32>,
    pub predominant_font: Option<String>,
    pub style: StyleDistribution,
    /// Median characters per inch of measurable body lines, per page
    pub page_cpi: BTreeMap<usize, f32>,
    pub max_cpi: Option<f32>,
    pub median_baseline_gap_pt: Option<f32>,
    /// Median baseline gap over dominant body size (~1 single, ~2 double)
    pub line_spacing_ratio: Option<f32>,
    pub page_profiles: Vec<PageFontProfile>,
    pub body_chars: usize,
    /// Body words outside cover, tables and addendum
    pub word_count: usize,
    pub readable_pages: usize,
    pub unreadable_pages: Vec<usize>,
}

impl DocumentMetrics {
    pub fn zone(&self, zone: Zone) -> Option<&ZoneFontStats> {
        self.zone_stats.get(&zone)
    }
}

pub struct MetricClassifier<'a> {
    config: &'a ComplianceConfig,
}

impl<'a> MetricClassifier<'a> {
    pub fn new(config: &'a ComplianceConfig) -> Self {
        Self { config }
    }

    /// Aggregate over the full page set. Unreadable pages contribute nothing
    /// except their index.
    pub fn measure(&self, pages: &[Page]) -> DocumentMetrics {
        let readable: Vec<&Page> = pages.iter().filter(|p| p.has_text()).collect();
        let all_runs = || readable.iter().flat_map(|p| p.runs.iter());

        let zone_stats = zone_stats(all_runs());
        let body_runs = || all_runs().filter(|r| r.zone == Zone::Body);

        let dominant_body_size = weighted_mode(body_runs().map(|r| (r.font_size, r.char_count())));
        let predominant_font = predominant_font(body_runs());

        let mut metrics = DocumentMetrics {
            body_min_font: zone_stats.get(&Zone::Body).map(|s| s.min_size),
            overall_min_font: zone_stats
                .values()
                .map(|s| s.min_size)
                .min_by(|a, b| a.total_cmp(b)),
            footnote_min_font: zone_stats.get(&Zone::Footnote).map(|s| s.min_size),
            body_chars: zone_stats.get(&Zone::Body).map(|s| s.chars).unwrap_or(0),
            zone_stats,
            dominant_body_size,
            predominant_font,
            readable_pages: pages.iter().filter(|p| p.is_readable()).count(),
            unreadable_pages: pages.iter().filter(|p| !p.is_readable()).map(|p| p.index).collect(),
            ..DocumentMetrics::default()
        };

        let measured = || readable.iter().copied().filter(|p| !p.is_cover());
        for page in measured() {
            for run in page.runs.iter().filter(|r| r.zone == Zone::Body) {
                let chars = run.char_count();
                match (run.flags.bold, run.flags.italic) {
                    (false, false) => metrics.style.roman += chars,
                    (true, false) => metrics.style.bold += chars,
                    (false, true) => metrics.style.italic += chars,
                    (true, true) => metrics.style.bold_italic += chars,
                }
            }
            if !page.is_table_page {
                if let Some(cpi) = self.page_density(page) {
                    metrics.page_cpi.insert(page.index, cpi);
                }
            }
        }
        metrics.max_cpi = metrics.page_cpi.values().copied().max_by(|a, b| a.total_cmp(b));

        if let Some(dominant) = dominant_body_size {
            let gaps: Vec<f32> = measured()
                .filter(|p| !p.is_table_page && !p.is_addendum)
                .flat_map(|p| baseline_gaps(p, dominant))
                .collect();
            metrics.median_baseline_gap_pt = median(gaps);
            metrics.line_spacing_ratio = metrics.median_baseline_gap_pt.map(|gap| gap / dominant);
        }

        metrics.word_count = measured()
            .filter(|p| !p.is_table_page && !p.is_addendum)
            .map(|p| {
                p.lines
                    .iter()
                    .map(|line| p.line_text_in_zone(line, Zone::Body).split_whitespace().count())
                    .sum::<usize>()
            })
            .sum();

        metrics.page_profiles = readable
            .iter()
            .filter_map(|p| self.font_profile(p, dominant_body_size))
            .collect();

        tracing::debug!(
            body_min = ?metrics.body_min_font,
            overall_min = ?metrics.overall_min_font,
            dominant = ?metrics.dominant_body_size,
            max_cpi = ?metrics.max_cpi,
            spacing = ?metrics.line_spacing_ratio,
            words = metrics.word_count,
            "document metrics"
        );

        metrics
    }

    /// Median characters per inch over body lines long enough to measure
    fn page_density(&self, page: &Page) -> Option<f32> {
        let min_chars = self.config.typography.min_line_chars;
        let per_line: Vec<f32> = page
            .lines
            .iter()
            .filter_map(|line| {
                let text = page.line_text_in_zone(line, Zone::Body);
                if text.chars().filter(|c| !c.is_whitespace()).count() < min_chars {
                    return None;
                }
                let body = || line.runs.iter().map(|&r| &page.runs[r]).filter(|r| r.zone == Zone::Body);
                let left = body().map(|r| r.bbox.left).min_by(|a, b| a.total_cmp(b))?;
                let right = body().map(|r| r.bbox.right).max_by(|a, b| a.total_cmp(b))?;
                let span_in = (right - left) / POINTS_PER_INCH;
                (span_in > 0.0).then(|| text.chars().count() as f32 / span_in)
            })
            .collect();
        median(per_line)
    }

    fn font_profile(&self, page: &Page, dominant: Option<f32>) -> Option<PageFontProfile> {
        let typography = &self.config.typography;
        let floor = typography.font_floor();
        let conventional = page.is_cover() || page.is_table_page || CONVENTIONAL_PAGE_REGEX.is_match(&page.text());

        let mut profile = PageFontProfile {
            page: page.index,
            total_chars: 0,
            min_size: None,
            undersized: UndersizedChars::default(),
            conventional,
        };

        for run in &page.runs {
            let chars = run.char_count();
            profile.total_chars += chars;
            if run.font_size >= floor {
                continue;
            }
            profile.min_size = Some(profile.min_size.map_or(run.font_size, |m: f32| m.min(run.font_size)));
            let bucket = &mut profile.undersized;
            match run.zone {
                Zone::HeaderFooter => bucket.header_footer += chars,
                Zone::Superscript => bucket.superscript += chars,
                Zone::Footnote => bucket.footnote += chars,
                Zone::Body if is_small_caps(run, dominant, typography.small_caps_ratio_min, typography.small_caps_ratio_max) => {
                    bucket.small_caps += chars
                }
                Zone::Body => bucket.body += chars,
            }
        }

        // Whole passages in small caps are undersized text, not styling
        if !conventional && profile.undersized.small_caps > 0 && profile.total_chars > 0 {
            let pct = profile.undersized.small_caps as f32 / profile.total_chars as f32 * 100.0;
            if pct > typography.small_caps_suspicious_page_pct {
                profile.undersized.body += profile.undersized.small_caps;
                profile.undersized.small_caps = 0;
            }
        }

        (profile.undersized.total() > 0).then_some(profile)
    }
}

fn zone_stats<'r>(runs: impl Iterator<Item = &'r TextRun>) -> BTreeMap<Zone, ZoneFontStats> {
    let mut grouped: BTreeMap<Zone, Vec<&TextRun>> = BTreeMap::new();
    for run in runs {
        grouped.entry(run.zone).or_default().push(run);
    }
    grouped
        .into_iter()
        .filter_map(|(zone, runs)| {
            let sizes: Vec<f32> = runs.iter().map(|r| r.font_size).collect();
            let stats = ZoneFontStats {
                min_size: sizes.iter().copied().min_by(|a, b| a.total_cmp(b))?,
                median_size: median(sizes)?,
                chars: runs.iter().map(|r| r.char_count()).sum(),
                runs: runs.len(),
            };
            Some((zone, stats))
        })
        .collect()
}

fn predominant_font<'r>(runs: impl Iterator<Item = &'r TextRun>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for run in runs.filter(|r| !r.font_name.is_empty()) {
        *counts.entry(run.font_name.as_str()).or_insert(0) += run.char_count();
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(name, _)| name.to_string())
}

/// Gaps between consecutive body-line baselines within the plausible range
fn baseline_gaps(page: &Page, dominant: f32) -> Vec<f32> {
    let baselines: Vec<f32> = page
        .lines
        .iter()
        .filter_map(|line| {
            line.runs
                .iter()
                .map(|&r| &page.runs[r])
                .filter(|r| r.zone == Zone::Body)
                .max_by(|a, b| a.font_size.total_cmp(&b.font_size))
                .map(|r| r.baseline)
        })
        .collect();
    let (lo, hi) = (SPACING_GAP_RANGE.0 * dominant, SPACING_GAP_RANGE.1 * dominant);
    baselines
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|gap| *gap >= lo && *gap <= hi)
        .collect()
}

/// All-uppercase text at the reduced size small caps are set in
fn is_small_caps(run: &TextRun, dominant: Option<f32>, ratio_min: f32, ratio_max: f32) -> bool {
    let Some(dominant) = dominant.filter(|d| *d > 0.0) else {
        return false;
    };
    let mut letters = run.text.chars().filter(|c| c.is_alphabetic()).peekable();
    if letters.peek().is_none() || !letters.all(|c| c.is_uppercase()) {
        return false;
    }
    let ratio = run.font_size / dominant;
    (ratio_min..=ratio_max).contains(&ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutExtractor;
    use pretty_assertions::assert_eq;

    const LINE: &str = "The district court erred when it granted summary judgment to the respondent.";

    fn raw_run(text: &str, left: f32, baseline: f32, size: f32) -> RawTextRun {
        RawTextRun {
            text: text.to_string(),
            font_name: "Century Schoolbook".to_string(),
            font_size: size,
            flags: StyleFlags::default(),
            bbox: BoundingBox::new(left, baseline - size, left + text.chars().count() as f32 * size * 0.45, baseline + size * 0.2),
            baseline: Some(baseline),
        }
    }

    fn body_page(size: f32, spacing: f32, lines: usize) -> RawPage {
        let mut runs: Vec<RawTextRun> = (0..lines)
            .map(|i| raw_run(LINE, 108.0, 84.0 + spacing * i as f32, size))
            .collect();
        runs.push(raw_run("2", 303.0, 756.0, 12.0));
        RawPage {
            width: 612.0,
            height: 792.0,
            units_per_inch: 72.0,
            runs,
            separators: Vec::new(),
            error: None,
        }
    }

    fn measure(pages: Vec<RawPage>) -> DocumentMetrics {
        let config = ComplianceConfig::default();
        let raw = RawDocument {
            pages,
            metadata: DocumentMetadata::default(),
        };
        let pages = LayoutExtractor::new(&config).extract(&raw);
        MetricClassifier::new(&config).measure(&pages)
    }

    #[test]
    fn test_double_spacing_ratio() {
        let metrics = measure(vec![body_page(12.0, 24.0, 20), body_page(12.0, 24.0, 20)]);
        assert_eq!(metrics.dominant_body_size, Some(12.0));
        assert_eq!(metrics.line_spacing_ratio, Some(2.0));
    }

    #[test]
    fn test_single_spacing_ratio() {
        let metrics = measure(vec![body_page(12.0, 24.0, 5), body_page(12.0, 14.0, 30)]);
        let ratio = metrics.line_spacing_ratio.unwrap();
        assert!(ratio < 1.3, "ratio {ratio}");
    }

    #[test]
    fn test_density_and_words_skip_cover() {
        let metrics = measure(vec![body_page(12.0, 24.0, 3), body_page(12.0, 24.0, 10)]);
        // LINE is 77 chars over 77 * 5.4pt
        let expected = 72.0 / 5.4;
        assert!((metrics.max_cpi.unwrap() - expected).abs() < 0.01);
        assert_eq!(metrics.page_cpi.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(metrics.word_count, 10 * LINE.split_whitespace().count());
    }

    #[test]
    fn test_undersized_body_is_profiled() {
        let metrics = measure(vec![body_page(12.0, 24.0, 3), body_page(11.0, 24.0, 10)]);
        assert_eq!(metrics.body_min_font, Some(11.0));
        assert_eq!(metrics.page_profiles.len(), 1);
        let profile = &metrics.page_profiles[0];
        assert_eq!(profile.page, 2);
        assert_eq!(profile.undersized.body, 10 * LINE.chars().filter(|c| !c.is_whitespace()).count());
        assert_eq!(profile.undersized.benign(), 0);
    }

    #[test]
    fn test_unreadable_pages_are_listed() {
        let mut bad = body_page(12.0, 24.0, 3);
        bad.error = Some("stream error".to_string());
        let metrics = measure(vec![body_page(12.0, 24.0, 3), bad]);
        assert_eq!(metrics.unreadable_pages, vec![2]);
        assert_eq!(metrics.readable_pages, 1);
    }

    #[test]
    fn test_small_caps_detection() {
        let run = TextRun {
            text: "STATEMENT OF THE CASE".to_string(),
            font_name: "Times".to_string(),
            font_size: 8.5,
            flags: StyleFlags::default(),
            bbox: BoundingBox::default(),
            baseline: 0.0,
            zone: Zone::Body,
            line: 0,
        };
        assert!(is_small_caps(&run, Some(12.0), 0.55, 0.85));
        assert!(!is_small_caps(&run, None, 0.55, 0.85));
        let lower = TextRun {
            text: "Statement".to_string(),
            ..run
        };
        assert!(!is_small_caps(&lower, Some(12.0), 0.55, 0.85));
    }
}
