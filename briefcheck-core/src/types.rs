use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Points per inch. Every normalized coordinate in this crate is in points.
pub const POINTS_PER_INCH: f32 = 72.0;

// ===== GEOMETRY =====

/// Axis-aligned box in page coordinates: origin top-left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            left: self.left * factor,
            top: self.top * factor,
            right: self.right * factor,
            bottom: self.bottom * factor,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.left.is_finite() && self.top.is_finite() && self.right.is_finite() && self.bottom.is_finite()
    }

    /// Vertical overlap with another box, in the boxes' units (0 when disjoint)
    pub fn vertical_overlap(&self, other: &BoundingBox) -> f32 {
        (self.bottom.min(other.bottom) - self.top.max(other.top)).max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleFlags {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl StyleFlags {
    /// Plain roman: neither bold nor italic
    pub fn is_roman(&self) -> bool {
        !self.bold && !self.italic
    }
}

// ===== COLLABORATOR INPUT =====
// Shape of the page data handed over by the external PDF reader.
// Coordinates are in the page's own units; `units_per_inch` converts them.

fn default_units_per_inch() -> f32 {
    POINTS_PER_INCH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTextRun {
    pub text: String,
    #[serde(default)]
    pub font_name: String,
    pub font_size: f32,
    #[serde(default)]
    pub flags: StyleFlags,
    pub bbox: BoundingBox,
    /// Falls back to `bbox.bottom` when the reader does not report one
    #[serde(default)]
    pub baseline: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_units_per_inch")]
    pub units_per_inch: f32,
    #[serde(default)]
    pub runs: Vec<RawTextRun>,
    /// Horizontal rules drawn on the page (footnote separators)
    #[serde(default)]
    pub separators: Vec<BoundingBox>,
    /// Set when the reader raised while processing this page
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub producer: Option<String>,
    #[serde(default)]
    pub creator_tool: Option<String>,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub encrypted: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    pub pages: Vec<RawPage>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

// ===== NORMALIZED LAYOUT =====

/// Zone label derived per run by the metric classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    #[default]
    Body,
    HeaderFooter,
    Footnote,
    Superscript,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Body => "body",
            Zone::HeaderFooter => "header_footer",
            Zone::Footnote => "footnote",
            Zone::Superscript => "superscript",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub font_name: String,
    /// Points
    pub font_size: f32,
    pub flags: StyleFlags,
    pub bbox: BoundingBox,
    pub baseline: f32,
    pub zone: Zone,
    /// Index into `Page::lines`
    pub line: usize,
}

impl TextRun {
    /// Printable characters, whitespace excluded
    pub fn char_count(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}

/// A visual line: runs sharing a vertical band, ordered left to right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub runs: Vec<usize>,
    pub bbox: BoundingBox,
    /// Baseline of the largest run on the line
    pub baseline: f32,
    pub text: String,
}

/// Margins in inches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNumberToken {
    pub text: String,
    /// None for roman numerals and other non-arabic tokens
    pub value: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    #[default]
    Readable,
    /// Readable but carries no text runs
    Empty,
    Unreadable {
        cause: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based
    pub index: usize,
    pub width_pt: f32,
    pub height_pt: f32,
    pub runs: Vec<TextRun>,
    pub lines: Vec<TextLine>,
    pub separators: Vec<BoundingBox>,
    /// None when unknown (no measurable text)
    pub margins: Option<Margins>,
    pub page_number: Option<PageNumberToken>,
    pub status: PageStatus,
    pub is_addendum: bool,
    /// Table of contents / table of authorities page
    pub is_table_page: bool,
}

impl Page {
    pub fn unreadable(index: usize, cause: impl Into<String>) -> Self {
        Self {
            index,
            width_pt: 0.0,
            height_pt: 0.0,
            runs: Vec::new(),
            lines: Vec::new(),
            separators: Vec::new(),
            margins: None,
            page_number: None,
            status: PageStatus::Unreadable {
                cause: cause.into(),
            },
            is_addendum: false,
            is_table_page: false,
        }
    }

    pub fn width_in(&self) -> f32 {
        self.width_pt / POINTS_PER_INCH
    }

    pub fn height_in(&self) -> f32 {
        self.height_pt / POINTS_PER_INCH
    }

    pub fn is_readable(&self) -> bool {
        !matches!(self.status, PageStatus::Unreadable { .. })
    }

    pub fn has_text(&self) -> bool {
        self.is_readable() && !self.runs.is_empty()
    }

    pub fn is_cover(&self) -> bool {
        self.index == 1
    }

    /// Page text, one visual line per row
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Lines carrying at least one run outside the header/footer bands
    pub fn main_lines(&self) -> impl Iterator<Item = (usize, &TextLine)> {
        self.lines.iter().enumerate().filter(|(_, line)| {
            line.runs
                .iter()
                .any(|&r| self.runs[r].zone != Zone::HeaderFooter)
        })
    }

    /// Text of `line` restricted to runs in `zone`, joined the way the line text is
    pub fn line_text_in_zone(&self, line: &TextLine, zone: Zone) -> String {
        join_runs(line.runs.iter().map(|&r| &self.runs[r]).filter(|run| run.zone == zone))
    }
}

/// Joins runs left to right, inserting a space only where the gap between
/// neighbours is wider than a fraction of the font size.
pub fn join_runs<'a>(runs: impl Iterator<Item = &'a TextRun>) -> String {
    let mut text = String::new();
    let mut prev: Option<&TextRun> = None;
    for run in runs {
        if let Some(p) = prev {
            let gap = run.bbox.left - p.bbox.right;
            if gap > 0.15 * p.font_size.min(run.font_size)
                && !text.ends_with(' ')
                && !run.text.starts_with(' ')
            {
                text.push(' ');
            }
        }
        text.push_str(&run.text);
        prev = Some(run);
    }
    text.trim().to_string()
}

// ===== DOCUMENT =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BriefType {
    Appellant,
    Appellee,
    Reply,
    CrossAppeal,
    Amicus,
    #[default]
    Unknown,
}

impl BriefType {
    pub const ALL: [BriefType; 6] = [
        BriefType::Appellant,
        BriefType::Appellee,
        BriefType::Reply,
        BriefType::CrossAppeal,
        BriefType::Amicus,
        BriefType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BriefType::Appellant => "appellant",
            BriefType::Appellee => "appellee",
            BriefType::Reply => "reply",
            BriefType::CrossAppeal => "cross_appeal",
            BriefType::Amicus => "amicus",
            BriefType::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BriefType::Appellant => "Appellant",
            BriefType::Appellee => "Appellee",
            BriefType::Reply => "Reply",
            BriefType::CrossAppeal => "Cross-appeal",
            BriefType::Amicus => "Amicus",
            BriefType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for BriefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BriefType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "appellant" => Ok(BriefType::Appellant),
            "appellee" => Ok(BriefType::Appellee),
            "reply" => Ok(BriefType::Reply),
            "cross_appeal" => Ok(BriefType::CrossAppeal),
            "amicus" => Ok(BriefType::Amicus),
            "unknown" => Ok(BriefType::Unknown),
            other => Err(format!("unrecognized brief type `{other}`")),
        }
    }
}

/// The whole brief after extraction. Built once per run and not mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
    pub brief_type: BriefType,
    /// Petition for rehearing (switches amicus briefs to a word limit)
    pub rehearing: bool,
    pub full_text: String,
    pub cover_text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    /// Pages counted toward page limits (everything before the addendum)
    pub fn body_pages(&self) -> usize {
        self.pages.iter().filter(|p| !p.is_addendum).count()
    }

    pub fn addendum_start(&self) -> Option<usize> {
        self.pages.iter().find(|p| p.is_addendum).map(|p| p.index)
    }

    pub fn unreadable_pages(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| !p.is_readable())
            .map(|p| p.index)
            .collect()
    }

    pub fn cover(&self) -> Option<&Page> {
        self.pages.first()
    }
}

// ===== RESULTS =====

/// Ordered by weight: note < correction < reject
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Correction,
    Reject,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Correction => "correction",
            Severity::Reject => "reject",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note" => Ok(Severity::Note),
            "correction" => Ok(Severity::Correction),
            "reject" => Ok(Severity::Reject),
            other => Err(format!("unrecognized severity `{other}`")),
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: String,
    pub name: String,
    pub rule: String,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// False when the check was skipped for this brief
    #[serde(default = "default_true")]
    pub applicable: bool,
    /// The input the check needed was unavailable
    #[serde(default)]
    pub indeterminate: bool,
}

impl CheckResult {
    pub fn failed(&self) -> bool {
        !self.passed && self.applicable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    CorrectionLetter,
    Reject,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Accept => "accept",
            Recommendation::CorrectionLetter => "correction_letter",
            Recommendation::Reject => "reject",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final payload handed to report renderers and front ends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub report_id: String,
    pub created_at: DateTime<Utc>,
    pub brief_type: BriefType,
    pub recommendation: Recommendation,
    pub reasoning: String,
    pub results: Vec<CheckResult>,
    #[serde(default)]
    pub version_stamp: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ComplianceReport {
    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.results.iter().filter(|r| r.failed()).collect()
    }

    pub fn passed_checks(&self) -> Vec<&CheckResult> {
        self.results.iter().filter(|r| r.passed && r.applicable).collect()
    }

    pub fn inapplicable_checks(&self) -> Vec<&CheckResult> {
        self.results.iter().filter(|r| !r.applicable).collect()
    }

    pub fn failures_with(&self, severity: Severity) -> Vec<&CheckResult> {
        self.results
            .iter()
            .filter(|r| r.failed() && r.severity == severity)
            .collect()
    }

    pub fn reject_failures(&self) -> Vec<&CheckResult> {
        self.failures_with(Severity::Reject)
    }

    pub fn correction_failures(&self) -> Vec<&CheckResult> {
        self.failures_with(Severity::Correction)
    }

    pub fn note_failures(&self) -> Vec<&CheckResult> {
        self.failures_with(Severity::Note)
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            recommendation: self.recommendation,
            total: self.results.len(),
            passed: self.passed_checks().len(),
            not_applicable: self.inapplicable_checks().len(),
            reject_failures: ids(&self.reject_failures()),
            correction_failures: ids(&self.correction_failures()),
            note_failures: ids(&self.note_failures()),
        }
    }
}

fn ids(results: &[&CheckResult]) -> Vec<String> {
    results.iter().map(|r| r.check_id.clone()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub recommendation: Recommendation,
    pub total: usize,
    pub passed: usize,
    pub not_applicable: usize,
    pub reject_failures: Vec<String>,
    pub correction_failures: Vec<String>,
    pub note_failures: Vec<String>,
}
