// Briefcheck Core Library
//
// Mechanical compliance checking for appellate briefs. Turns the page model
// produced by an external PDF reader into a per-check result set and a
// disposition (accept / correction letter / reject).

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod preprocessors;
pub mod layout;
pub mod metrics;
pub mod classifier;
pub mod rules;
pub mod semantic;
pub mod recommender;
pub mod cache;
pub mod storage;
pub mod version;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use config::ComplianceConfig;
pub use error::{ExtractionError, IntegrityError};
pub use preprocessors::{JsonRunPreprocessor, Preprocessor, XhtmlPreprocessor};
pub use processor::{AnalysisRun, BriefAnalyzer, PipelineStages};
pub use rules::CheckCatalog;
pub use semantic::{SemanticArtifact, SemanticRequest};
pub use cache::IntermediateArtifact;
pub use version::RulebookManifest;
