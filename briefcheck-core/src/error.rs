use crate::types::Severity;
use std::path::PathBuf;
use thiserror::Error;

/// Violations of the one-result-per-check contract or of the semantic
/// artifact schema. Fatal for a run: an incomplete result set could
/// otherwise reduce to a false accept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrityError {
    #[error("check {0} produced no result")]
    MissingCheck(String),

    #[error("check {0} produced more than one result")]
    DuplicateCheck(String),

    #[error("result references unknown check id `{0}`")]
    UnknownCheck(String),

    #[error("check {0} is evaluated mechanically and cannot be supplied by the semantic step")]
    NotSemanticCheck(String),

    #[error("semantic results artifact is missing")]
    MissingSemanticArtifact,

    #[error("semantic results artifact is malformed: {0}")]
    MalformedSemanticArtifact(String),

    #[error("semantic record {index}: field `{field}` {reason}")]
    InvalidSemanticRecord {
        index: usize,
        field: String,
        reason: String,
    },

    #[error("check {check_id} reported severity {found}, catalog declares {expected}")]
    SeverityMismatch {
        check_id: String,
        expected: Severity,
        found: Severity,
    },
}

/// Collaborator output that cannot be read at all. Per-page problems never
/// surface here; they mark the page unreadable instead.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no preprocessor handles {0}")]
    UnsupportedFileType(PathBuf),

    #[error("malformed collaborator output: {0}")]
    MalformedMarkup(String),
}
