use crate::types::BriefType;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// Default value functions for serde
fn default_true() -> bool {
    true
}

/// Every threshold the extractor, classifier and check engine read.
/// Partial YAML files are fine: missing sections fall back to defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComplianceConfig {
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub margins: MarginConfig,
    #[serde(default)]
    pub typography: TypographyConfig,
    /// Zone classification heuristics
    #[serde(default)]
    pub zones: ZoneConfig,
    #[serde(default)]
    pub limits: LimitConfig,
    #[serde(default)]
    pub cover_colors: CoverColorConfig,
    /// Per-check toggles; checks not listed stay enabled
    #[serde(default)]
    pub checks: Vec<CheckToggle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperConfig {
    pub width_in: f32,
    pub height_in: f32,
    pub tolerance_in: f32,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            width_in: 8.5,
            height_in: 11.0,
            tolerance_in: 0.06,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginConfig {
    pub left_in: f32,
    pub right_in: f32,
    pub top_in: f32,
    pub bottom_in: f32,
    /// Absorbs extraction noise around each minimum
    pub tolerance_in: f32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            left_in: 1.5,
            right_in: 1.0,
            top_in: 1.0,
            bottom_in: 1.0,
            tolerance_in: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypographyConfig {
    pub min_font_size_pt: f32,
    pub font_size_tolerance_pt: f32,
    pub max_chars_per_inch: f32,
    /// Lines shorter than this (non-space chars) are not measured for density
    pub min_line_chars: usize,
    /// Sub-minimum body characters on a page at or above this count reject
    pub noncompliant_char_threshold: usize,
    /// Median baseline gap divided by body size
    pub min_double_spacing_ratio: f32,
    pub small_caps_ratio_min: f32,
    pub small_caps_ratio_max: f32,
    /// Small caps above this share of a page (percent) count as body text,
    /// except on cover, table and certificate pages
    pub small_caps_suspicious_page_pct: f32,
    pub min_roman_share: f32,
}

impl Default for TypographyConfig {
    fn default() -> Self {
        Self {
            min_font_size_pt: 12.0,
            font_size_tolerance_pt: 0.3,
            max_chars_per_inch: 16.0,
            min_line_chars: 10,
            noncompliant_char_threshold: 10,
            min_double_spacing_ratio: 1.65,
            small_caps_ratio_min: 0.55,
            small_caps_ratio_max: 0.85,
            small_caps_suspicious_page_pct: 20.0,
            min_roman_share: 0.5,
        }
    }
}

impl TypographyConfig {
    /// Sizes strictly below this are undersized
    pub fn font_floor(&self) -> f32 {
        self.min_font_size_pt - self.font_size_tolerance_pt
    }
}

/// Heuristic zone thresholds. Tunable defaults, not normative constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Fraction of page height treated as running header
    pub header_band: f32,
    /// Fraction of page height treated as footer / page-number area
    pub footer_band: f32,
    /// Runs smaller than this share of the page median may be superscripts
    pub superscript_size_ratio: f32,
    /// Baseline shift, as a share of the neighbour's size, that marks a raised glyph
    pub superscript_baseline_shift: f32,
    /// Runs this short at reduced size are markers even without a shifted neighbour
    pub superscript_max_chars: usize,
    /// Fraction of page height, from the bottom, where footnotes may start
    pub footnote_band: f32,
    /// Gap multiple over the page's median line gap that opens a footnote block
    pub footnote_gap_ratio: f32,
    pub footnote_min_gap_pt: f32,
    /// Minimum vertical overlap, as a share of the shorter run, for two runs
    /// to sit on one visual line
    pub line_grouping_tolerance: f32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            header_band: 0.08,
            footer_band: 0.10,
            superscript_size_ratio: 0.70,
            superscript_baseline_shift: 0.15,
            superscript_max_chars: 4,
            footnote_band: 0.45,
            footnote_gap_ratio: 2.0,
            footnote_min_gap_pt: 14.0,
            line_grouping_tolerance: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    pub pages: BTreeMap<BriefType, usize>,
    pub amicus_rehearing_words: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        let pages = BTreeMap::from([
            (BriefType::Appellant, 38),
            (BriefType::Appellee, 38),
            (BriefType::CrossAppeal, 38),
            (BriefType::Reply, 12),
            (BriefType::Amicus, 19),
        ]);
        Self {
            pages,
            amicus_rehearing_words: 2600,
        }
    }
}

impl LimitConfig {
    /// Page limit for a type. Unknown briefs get the most permissive limit.
    pub fn page_limit(&self, brief_type: BriefType) -> Option<usize> {
        match brief_type {
            BriefType::Unknown => self.pages.values().copied().max(),
            other => self.pages.get(&other).copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoverColorConfig(pub BTreeMap<BriefType, String>);

impl Default for CoverColorConfig {
    fn default() -> Self {
        Self(BTreeMap::from([
            (BriefType::Appellant, "blue".to_string()),
            (BriefType::Appellee, "red".to_string()),
            (BriefType::Reply, "gray".to_string()),
            (BriefType::CrossAppeal, "gray".to_string()),
            (BriefType::Amicus, "green".to_string()),
        ]))
    }
}

impl CoverColorConfig {
    pub fn expected(&self, brief_type: BriefType) -> Option<&str> {
        self.0.get(&brief_type).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckToggle {
    pub check_id: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ComplianceConfig {
    /// Load config from file path
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: ComplianceConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!(path = p, error = %e, "failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn is_enabled(&self, check_id: &str) -> bool {
        self.checks
            .iter()
            .rev()
            .find(|t| t.check_id == check_id)
            .map(|t| t.enabled)
            .unwrap_or(true)
    }
}
