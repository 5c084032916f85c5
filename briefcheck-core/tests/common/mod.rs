//! Synthetic brief builder shared by the integration tests.
//!
//! Produces collaborator output for letter-size pages: 12pt text from
//! x=108 (1.5") with baselines every 24pt from y=84 to y=708, and a page
//! number centred at the bottom.

#![allow(dead_code)]

use briefcheck_core::semantic::SemanticRecord;
use briefcheck_core::*;
use std::path::PathBuf;

pub const BODY_LINE: &str = "[1] The district court erred in granting summary judgment (R12:3).";
pub const LINES_PER_PAGE: usize = 27;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_fixtures")
}

/// Run with the geometry a PDF reader reports for a simple serif face
pub fn run(text: &str, left: f32, baseline: f32, size: f32) -> RawTextRun {
    RawTextRun {
        text: text.to_string(),
        font_name: "Century Schoolbook".to_string(),
        font_size: size,
        flags: StyleFlags::default(),
        bbox: BoundingBox::new(
            left,
            baseline - size,
            left + text.chars().count() as f32 * size * 0.45,
            baseline + size * 0.2,
        ),
        baseline: Some(baseline),
    }
}

#[derive(Debug, Clone)]
pub struct BriefBuilder {
    cover: Vec<String>,
    body_pages: usize,
    addendum_pages: usize,
    left_in: f32,
    body_size: f32,
    marker_size: Option<f32>,
    numbers: Option<Vec<String>>,
    unreadable: Vec<usize>,
    certificate: bool,
}

impl BriefBuilder {
    /// Cover + `pages - 2` argument pages + certificate page
    pub fn appellant(pages: usize) -> Self {
        Self {
            cover: vec![
                "IN THE SUPREME COURT".to_string(),
                "STATE OF NORTH DAKOTA".to_string(),
                "Supreme Court No. 20250123".to_string(),
                "BRIEF OF APPELLANT".to_string(),
                "ORAL ARGUMENT REQUESTED".to_string(),
            ],
            body_pages: pages.saturating_sub(2),
            addendum_pages: 0,
            left_in: 1.5,
            body_size: 12.0,
            marker_size: None,
            numbers: None,
            unreadable: Vec::new(),
            certificate: true,
        }
    }

    pub fn cover(mut self, lines: &[&str]) -> Self {
        self.cover = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn addendum(mut self, pages: usize) -> Self {
        self.addendum_pages = pages;
        self
    }

    pub fn left_margin(mut self, inches: f32) -> Self {
        self.left_in = inches;
        self
    }

    pub fn body_size(mut self, size: f32) -> Self {
        self.body_size = size;
        self
    }

    /// Raised footnote reference after every body line
    pub fn footnote_markers(mut self, size: f32) -> Self {
        self.marker_size = Some(size);
        self
    }

    pub fn numbered(mut self, numbers: &[&str]) -> Self {
        self.numbers = Some(numbers.iter().map(|n| n.to_string()).collect());
        self
    }

    /// 1-based page index the reader fails on
    pub fn unreadable(mut self, page: usize) -> Self {
        self.unreadable.push(page);
        self
    }

    pub fn without_certificate(mut self) -> Self {
        self.certificate = false;
        self
    }

    fn number(&self, index: usize) -> Option<String> {
        match &self.numbers {
            Some(numbers) => numbers.get(index - 1).cloned(),
            None => Some(index.to_string()),
        }
    }

    fn lines_page(&self, index: usize, lines: &[String], size: f32, markers: bool) -> RawPage {
        let left = self.left_in * 72.0;
        let mut runs = Vec::new();
        for (i, text) in lines.iter().enumerate() {
            let baseline = 84.0 + 24.0 * i as f32;
            let line = run(text, left, baseline, size);
            let right = line.bbox.right;
            runs.push(line);
            if let (true, Some(marker)) = (markers, self.marker_size) {
                runs.push(run("1", right + 1.0, baseline - 4.0, marker));
            }
        }
        if let Some(number) = self.number(index) {
            let width = number.chars().count() as f32 * 12.0 * 0.45;
            runs.push(run(&number, 306.0 - width / 2.0, 756.0, 12.0));
        }

        RawPage {
            width: 612.0,
            height: 792.0,
            units_per_inch: 72.0,
            runs,
            separators: Vec::new(),
            error: self
                .unreadable
                .contains(&index)
                .then(|| "content stream could not be decoded".to_string()),
        }
    }

    pub fn build(&self) -> RawDocument {
        let body: Vec<String> = (0..LINES_PER_PAGE).map(|_| BODY_LINE.to_string()).collect();
        let certificate: Vec<String> = [
            "CERTIFICATE OF COMPLIANCE",
            "[2] This brief complies with the page limitation of Rule 32(a)(8).",
            "[3] It was prepared in 12 point Century Schoolbook type.",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let addendum: Vec<String> = std::iter::once("ADDENDUM".to_string())
            .chain((0..10).map(|_| "N.D.C.C. 28-01-46 Expert opinion required.".to_string()))
            .collect();

        let mut pages = vec![self.lines_page(1, &self.cover, 12.0, false)];
        for _ in 0..self.body_pages {
            pages.push(self.lines_page(pages.len() + 1, &body, self.body_size, true));
        }
        if self.certificate {
            pages.push(self.lines_page(pages.len() + 1, &certificate, 12.0, false));
        }
        for _ in 0..self.addendum_pages {
            pages.push(self.lines_page(pages.len() + 1, &addendum, 12.0, false));
        }

        RawDocument {
            metadata: DocumentMetadata {
                page_count: pages.len() as u32,
                producer: Some("synthetic".to_string()),
                ..Default::default()
            },
            pages,
        }
    }
}

pub fn result<'a>(results: &'a [CheckResult], check_id: &str) -> &'a CheckResult {
    results
        .iter()
        .find(|r| r.check_id == check_id)
        .unwrap_or_else(|| panic!("no result for {check_id}"))
}

/// A semantic artifact answering every requested check with a pass
pub fn passing_semantics(run: &AnalysisRun) -> SemanticArtifact {
    SemanticArtifact {
        results: run
            .semantic
            .request
            .checks
            .iter()
            .map(|spec| SemanticRecord {
                check_id: spec.check_id.clone(),
                name: None,
                rule: None,
                passed: true,
                severity: spec.severity,
                message: format!("{} satisfied.", spec.name),
                details: None,
                applicable: true,
            })
            .collect(),
        assessment: None,
    }
}
