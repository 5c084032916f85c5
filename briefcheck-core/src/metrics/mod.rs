//! Metric classification: zone labels per run and zone-aware aggregates.
//!
//! Headers, footers, footnote markers and footnote text dominate any naive
//! global minimum; separating them is what keeps the font, density and
//! spacing checks from flagging compliant briefs.

pub mod aggregates;
pub mod stats;
pub mod zones;

pub use aggregates::{DocumentMetrics, MetricClassifier, PageFontProfile, StyleDistribution, UndersizedChars, ZoneFontStats};
pub use zones::ZoneClassifier;
