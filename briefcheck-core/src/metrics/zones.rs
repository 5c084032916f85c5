use super::stats::{median, weighted_median};
use crate::config::ZoneConfig;
use crate::types::{Page, TextLine, Zone};

/// Labels every run on a page. First matching rule wins:
/// header/footer band, then superscript, then footnote block, then body.
pub struct ZoneClassifier<'a> {
    config: &'a ZoneConfig,
}

impl<'a> ZoneClassifier<'a> {
    pub fn new(config: &'a ZoneConfig) -> Self {
        Self { config }
    }

    /// Requires `page.lines` to be grouped already
    pub fn label(&self, page: &mut Page) {
        let top_limit = page.height_pt * self.config.header_band;
        let bottom_limit = page.height_pt * (1.0 - self.config.footer_band);
        for run in &mut page.runs {
            let center = run.bbox.center_y();
            run.zone = if center <= top_limit || center >= bottom_limit {
                Zone::HeaderFooter
            } else {
                Zone::Body
            };
        }

        let Some(page_median) = weighted_median(
            page.runs
                .iter()
                .filter(|r| r.zone != Zone::HeaderFooter)
                .map(|r| (r.font_size, r.char_count())),
        ) else {
            return;
        };

        let raised: Vec<usize> = (0..page.runs.len())
            .filter(|&i| self.is_superscript(page, i, page_median))
            .collect();
        for i in raised {
            page.runs[i].zone = Zone::Superscript;
        }

        if let Some(start) = self.footnote_start(page, page_median) {
            let footnote_runs: Vec<usize> = page.lines[start..]
                .iter()
                .flat_map(|line| line.runs.iter().copied())
                .filter(|&r| page.runs[r].zone == Zone::Body)
                .collect();
            for r in footnote_runs {
                page.runs[r].zone = Zone::Footnote;
            }
        }

        tracing::trace!(
            page = page.index,
            median = page_median,
            superscripts = page.runs.iter().filter(|r| r.zone == Zone::Superscript).count(),
            footnote_runs = page.runs.iter().filter(|r| r.zone == Zone::Footnote).count(),
            "zones labelled"
        );
    }

    fn is_superscript(&self, page: &Page, index: usize, page_median: f32) -> bool {
        let run = &page.runs[index];
        if run.zone != Zone::Body || run.font_size >= self.config.superscript_size_ratio * page_median {
            return false;
        }
        let line = &page.lines[run.line];
        let mut larger = line
            .runs
            .iter()
            .map(|&j| &page.runs[j])
            .filter(|n| n.zone != Zone::HeaderFooter && n.font_size > run.font_size);

        let mut has_larger = false;
        let shifted = larger.any(|n| {
            has_larger = true;
            (n.baseline - run.baseline).abs() > self.config.superscript_baseline_shift * n.font_size
        });
        if shifted {
            return true;
        }

        // Readers that flatten baselines still leave short markers beside
        // full-size text, or a bare numeral opening a footnote line.
        let short = run.char_count() <= self.config.superscript_max_chars;
        let opens_line = line.runs.first() == Some(&index)
            && run.text.chars().all(|c| !c.is_alphabetic());
        short && (has_larger || opens_line)
    }

    /// Index of the first line of the footnote block, if the page has one
    fn footnote_start(&self, page: &Page, page_median: f32) -> Option<usize> {
        let band_top = page.height_pt * (1.0 - self.config.footnote_band);
        let main: Vec<usize> = page.main_lines().map(|(i, _)| i).collect();
        if main.len() < 2 {
            return None;
        }

        let gap = |a: &TextLine, b: &TextLine| (b.bbox.top - a.bbox.bottom).max(0.0);
        let typical_gap = median(
            main.windows(2)
                .map(|w| gap(&page.lines[w[0]], &page.lines[w[1]]))
                .collect(),
        )
        .unwrap_or(0.0);
        let threshold = self
            .config
            .footnote_min_gap_pt
            .max(self.config.footnote_gap_ratio * typical_gap);

        main.windows(2).find_map(|w| {
            let (prev, cur) = (&page.lines[w[0]], &page.lines[w[1]]);
            if cur.bbox.top < band_top {
                return None;
            }
            let ruled = page.separators.iter().any(|s| {
                let y = s.center_y();
                y >= prev.bbox.bottom - 1.0 && y <= cur.bbox.top + 1.0
            });
            let smaller = self.line_text_size(page, cur).is_some_and(|size| size < page_median);
            (ruled || (gap(prev, cur) > threshold && smaller)).then_some(w[1])
        })
    }

    /// Largest non-superscript size on a line
    fn line_text_size(&self, page: &Page, line: &TextLine) -> Option<f32> {
        line.runs
            .iter()
            .map(|&r| &page.runs[r])
            .filter(|r| r.zone == Zone::Body)
            .map(|r| r.font_size)
            .max_by(|a, b| a.total_cmp(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ComplianceConfig;
    use crate::layout::lines::group_lines;
    use crate::types::{BoundingBox, PageStatus, StyleFlags, TextRun};

    fn run(text: &str, left: f32, baseline: f32, size: f32) -> TextRun {
        TextRun {
            text: text.to_string(),
            font_name: "Times".to_string(),
            font_size: size,
            flags: StyleFlags::default(),
            bbox: BoundingBox::new(left, baseline - size, left + text.len() as f32 * size * 0.45, baseline + size * 0.2),
            baseline,
            zone: Zone::Body,
            line: 0,
        }
    }

    fn labelled(runs: Vec<TextRun>, separators: Vec<BoundingBox>) -> Page {
        let config = ComplianceConfig::default();
        let mut page = Page {
            index: 2,
            width_pt: 612.0,
            height_pt: 792.0,
            runs,
            lines: Vec::new(),
            separators,
            margins: None,
            page_number: None,
            status: PageStatus::Readable,
            is_addendum: false,
            is_table_page: false,
        };
        group_lines(&mut page, config.zones.line_grouping_tolerance);
        ZoneClassifier::new(&config.zones).label(&mut page);
        page
    }

    fn body_lines(from: f32, count: usize) -> Vec<TextRun> {
        (0..count)
            .map(|i| run("The district court erred in granting summary judgment", 108.0, from + 24.0 * i as f32, 12.0))
            .collect()
    }

    #[test]
    fn test_header_and_footer_bands() {
        let mut runs = body_lines(120.0, 3);
        runs.push(run("Smith v. Jones", 108.0, 40.0, 9.0));
        runs.push(run("4", 300.0, 756.0, 10.0));
        let page = labelled(runs, vec![]);
        assert_eq!(page.runs[3].zone, Zone::HeaderFooter);
        assert_eq!(page.runs[4].zone, Zone::HeaderFooter);
        assert!(page.runs[..3].iter().all(|r| r.zone == Zone::Body));
    }

    #[test]
    fn test_raised_marker_is_superscript() {
        let mut runs = body_lines(120.0, 3);
        runs.push(run("12", 540.0, 116.0, 8.0));
        let page = labelled(runs, vec![]);
        assert_eq!(page.runs[3].zone, Zone::Superscript);
    }

    #[test]
    fn test_small_word_without_neighbour_stays_body() {
        let mut runs = body_lines(120.0, 3);
        runs.push(run("see id", 108.0, 300.0, 7.0));
        let page = labelled(runs, vec![]);
        assert_eq!(page.runs[3].zone, Zone::Body);
    }

    #[test]
    fn test_footnote_block_after_separator() {
        let mut runs = body_lines(120.0, 12);
        runs.push(run("1", 108.0, 640.0, 7.0));
        runs.push(run("See Minn. R. Civ. App. P. 132.01.", 114.0, 644.0, 10.0));
        runs.push(run("The rule was amended in 2024.", 108.0, 656.0, 10.0));
        let page = labelled(runs, vec![BoundingBox::new(108.0, 622.0, 252.0, 622.5)]);
        assert_eq!(page.runs[12].zone, Zone::Superscript);
        assert_eq!(page.runs[13].zone, Zone::Footnote);
        assert_eq!(page.runs[14].zone, Zone::Footnote);
        assert!(page.runs[..12].iter().all(|r| r.zone == Zone::Body));
    }

    #[test]
    fn test_footnote_block_after_wide_gap() {
        let mut runs = body_lines(120.0, 10);
        runs.push(run("Footnote text set smaller than the body.", 108.0, 620.0, 10.0));
        runs.push(run("Second footnote line continues here.", 108.0, 632.0, 10.0));
        let page = labelled(runs, vec![]);
        assert_eq!(page.runs[10].zone, Zone::Footnote);
        assert_eq!(page.runs[11].zone, Zone::Footnote);
    }

    #[test]
    fn test_double_spaced_body_in_band_is_not_footnote() {
        let page = labelled(body_lines(120.0, 25), vec![]);
        assert!(page.runs.iter().all(|r| r.zone == Zone::Body));
    }
}
