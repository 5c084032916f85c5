//! Contract with the external semantic reviewer.
//!
//! The core publishes a [`SemanticRequest`] naming the semantic checks that
//! apply to the brief, and later accepts a [`SemanticArtifact`] back. The
//! artifact is untrusted: every record is validated field by field and any
//! defect is an [`IntegrityError`], never a default.

use crate::config::ComplianceConfig;
use crate::error::IntegrityError;
use crate::metrics::DocumentMetrics;
use crate::rules::{CatalogEntry, CheckCatalog, CheckKind, Evaluation};
use crate::types::{BriefType, CheckResult, Document, Recommendation, Severity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticCheckSpec {
    pub check_id: String,
    pub name: String,
    pub rule: String,
    pub severity: Severity,
    pub description: String,
}

/// What the reviewer needs to evaluate the applicable semantic checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRequest {
    pub brief_type: BriefType,
    #[serde(default)]
    pub rehearing: bool,
    pub word_count: usize,
    pub total_pages: usize,
    pub cover_text: String,
    pub full_text: String,
    pub checks: Vec<SemanticCheckSpec>,
}

/// The request plus the semantic checks the core already resolved as not applicable
#[derive(Debug, Clone)]
pub struct SemanticPlan {
    pub request: SemanticRequest,
    pub resolved: Vec<CheckResult>,
}

pub fn plan_semantic_checks(
    catalog: &CheckCatalog,
    config: &ComplianceConfig,
    document: &Document,
    metrics: &DocumentMetrics,
) -> SemanticPlan {
    let brief_type = document.brief_type;
    let mut checks = Vec::new();
    let mut resolved = Vec::new();

    for entry in catalog.semantic() {
        let CheckKind::Semantic { description } = entry.kind else {
            continue;
        };
        if !config.is_enabled(entry.check_id) {
            resolved.push(entry.resolve(Evaluation::not_applicable("Disabled by configuration.")));
        } else if !entry.applies_to.includes(brief_type) {
            resolved.push(entry.resolve(Evaluation::not_applicable(format!(
                "Not applicable to {brief_type} briefs."
            ))));
        } else {
            checks.push(SemanticCheckSpec {
                check_id: entry.check_id.to_string(),
                name: entry.name.to_string(),
                rule: entry.rule.to_string(),
                severity: entry.severity,
                description: description.to_string(),
            });
        }
    }

    tracing::debug!(
        requested = checks.len(),
        not_applicable = resolved.len(),
        "semantic checks planned"
    );

    SemanticPlan {
        request: SemanticRequest {
            brief_type,
            rehearing: document.rehearing,
            word_count: metrics.word_count,
            total_pages: document.total_pages(),
            cover_text: document.cover_text.clone(),
            full_text: document.full_text.clone(),
            checks,
        },
        resolved,
    }
}

/// One reviewer finding, validated but not yet matched to the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticRecord {
    pub check_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    pub passed: bool,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default = "default_true")]
    pub applicable: bool,
}

fn default_true() -> bool {
    true
}

impl SemanticRecord {
    /// Stamp with catalog metadata. The severity must match the catalog.
    pub fn into_result(self, entry: &CatalogEntry) -> Result<CheckResult, IntegrityError> {
        if self.severity != entry.severity {
            return Err(IntegrityError::SeverityMismatch {
                check_id: self.check_id,
                expected: entry.severity,
                found: self.severity,
            });
        }
        Ok(CheckResult {
            check_id: self.check_id,
            name: self.name.unwrap_or_else(|| entry.name.to_string()),
            rule: self.rule.unwrap_or_else(|| entry.rule.to_string()),
            passed: self.passed,
            severity: self.severity,
            message: self.message,
            details: self.details,
            applicable: self.applicable,
            indeterminate: false,
        })
    }
}

/// Optional overall judgement from the reviewer. May escalate the
/// recommendation, never lower it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerAssessment {
    pub recommendation: Recommendation,
    #[serde(default)]
    pub reasoning: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticArtifact {
    pub results: Vec<SemanticRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<ReviewerAssessment>,
}

impl SemanticArtifact {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, IntegrityError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(IntegrityError::MissingSemanticArtifact);
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| IntegrityError::MalformedSemanticArtifact(format!("{}: {e}", path.display())))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, IntegrityError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| IntegrityError::MalformedSemanticArtifact(e.to_string()))?;
        Self::from_value(value)
    }

    /// Accepts `{"results": [...], "assessment": {...}}` or a bare array of records
    pub fn from_value(value: Value) -> Result<Self, IntegrityError> {
        let (records, assessment) = match value {
            Value::Array(records) => (records, None),
            Value::Object(mut map) => {
                let records = match map.remove("results") {
                    Some(Value::Array(records)) => records,
                    Some(_) => {
                        return Err(IntegrityError::MalformedSemanticArtifact(
                            "`results` is not an array".to_string(),
                        ))
                    }
                    None => {
                        return Err(IntegrityError::MalformedSemanticArtifact(
                            "missing `results` array".to_string(),
                        ))
                    }
                };
                let assessment = match map.remove("assessment") {
                    None | Some(Value::Null) => None,
                    Some(raw) => Some(parse_assessment(raw)?),
                };
                (records, assessment)
            }
            _ => {
                return Err(IntegrityError::MalformedSemanticArtifact(
                    "expected an object or an array".to_string(),
                ))
            }
        };

        let results = records
            .into_iter()
            .enumerate()
            .map(|(index, raw)| parse_record(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { results, assessment })
    }
}

fn invalid(index: usize, field: &str, reason: impl Into<String>) -> IntegrityError {
    IntegrityError::InvalidSemanticRecord {
        index,
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn required_str(index: usize, record: &Map<String, Value>, field: &str) -> Result<String, IntegrityError> {
    match record.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(invalid(index, field, "is empty")),
        Some(_) => Err(invalid(index, field, "is not a string")),
        None => Err(invalid(index, field, "is missing")),
    }
}

fn optional_str(index: usize, record: &Map<String, Value>, field: &str) -> Result<Option<String>, IntegrityError> {
    match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(index, field, "is not a string")),
    }
}

fn parse_record(index: usize, raw: Value) -> Result<SemanticRecord, IntegrityError> {
    let Value::Object(record) = raw else {
        return Err(invalid(index, "record", "is not an object"));
    };

    let check_id = required_str(index, &record, "check_id")?;
    let passed = match record.get("passed") {
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(invalid(index, "passed", "is not a boolean")),
        None => return Err(invalid(index, "passed", "is missing")),
    };
    let severity = required_str(index, &record, "severity")?
        .parse::<Severity>()
        .map_err(|reason| invalid(index, "severity", reason))?;
    let message = required_str(index, &record, "message")?;
    let applicable = match record.get("applicable") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(invalid(index, "applicable", "is not a boolean")),
    };

    Ok(SemanticRecord {
        check_id,
        name: optional_str(index, &record, "name")?,
        rule: optional_str(index, &record, "rule")?,
        passed,
        severity,
        message,
        details: record.get("details").filter(|d| !d.is_null()).cloned(),
        applicable,
    })
}

fn parse_assessment(raw: Value) -> Result<ReviewerAssessment, IntegrityError> {
    serde_json::from_value(raw)
        .map_err(|e| IntegrityError::MalformedSemanticArtifact(format!("assessment: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentMetadata;
    use pretty_assertions::assert_eq;

    fn document(brief_type: BriefType) -> Document {
        Document {
            pages: Vec::new(),
            brief_type,
            rehearing: false,
            full_text: "BRIEF OF AMICUS CURIAE\n\nARGUMENT".to_string(),
            cover_text: "BRIEF OF AMICUS CURIAE".to_string(),
            metadata: DocumentMetadata::default(),
        }
    }

    #[test]
    fn test_plan_splits_applicable_and_resolved() {
        let catalog = CheckCatalog::standard();
        let plan = plan_semantic_checks(
            &catalog,
            &ComplianceConfig::default(),
            &document(BriefType::Amicus),
            &DocumentMetrics::default(),
        );
        let requested: Vec<&str> = plan.request.checks.iter().map(|c| c.check_id.as_str()).collect();
        assert_eq!(
            requested,
            vec!["SEC-001", "SEC-002", "SEC-003", "SEC-004", "SEC-009", "SEC-014", "SEC-015", "CNT-001", "CNT-002", "CNT-003"]
        );
        assert_eq!(plan.resolved.len() + requested.len(), catalog.semantic().count());
        assert!(plan.resolved.iter().all(|r| !r.applicable));
    }

    #[test]
    fn test_parses_records_and_assessment() {
        let artifact = SemanticArtifact::from_json(
            r#"{
                "results": [
                    {"check_id": "SEC-001", "passed": true, "severity": "reject", "message": "Table of contents found."},
                    {"check_id": "CNT-002", "name": "Concise", "passed": false, "severity": "note",
                     "message": "Argument repeats facts.", "details": "paragraphs 12-19"}
                ],
                "assessment": {"recommendation": "correction_letter", "reasoning": "Repetition is excessive."}
            }"#,
        )
        .unwrap();
        assert_eq!(artifact.results.len(), 2);
        assert_eq!(artifact.results[1].name.as_deref(), Some("Concise"));
        assert_eq!(artifact.results[1].details, Some(Value::String("paragraphs 12-19".to_string())));
        assert_eq!(
            artifact.assessment.unwrap().recommendation,
            Recommendation::CorrectionLetter
        );
    }

    #[test]
    fn test_invalid_severity_is_rejected() {
        let err = SemanticArtifact::from_json(
            r#"[{"check_id": "SEC-001", "passed": false, "severity": "critical", "message": "x"}]"#,
        )
        .unwrap_err();
        assert_eq!(
            err,
            IntegrityError::InvalidSemanticRecord {
                index: 0,
                field: "severity".to_string(),
                reason: "unrecognized severity `critical`".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = SemanticArtifact::from_json(r#"{"results": [{"check_id": "SEC-001", "severity": "reject", "message": "x"}]}"#)
            .unwrap_err();
        assert!(matches!(err, IntegrityError::InvalidSemanticRecord { ref field, .. } if field == "passed"));
    }

    #[test]
    fn test_malformed_and_missing_artifacts() {
        assert!(matches!(
            SemanticArtifact::from_json("not json"),
            Err(IntegrityError::MalformedSemanticArtifact(_))
        ));
        assert!(matches!(
            SemanticArtifact::from_json(r#"{"assessment": null}"#),
            Err(IntegrityError::MalformedSemanticArtifact(_))
        ));
        assert_eq!(
            SemanticArtifact::load_from_file("/nonexistent/semantic.json"),
            Err(IntegrityError::MissingSemanticArtifact)
        );
    }

    #[test]
    fn test_severity_must_match_catalog() {
        let catalog = CheckCatalog::standard();
        let record = SemanticRecord {
            check_id: "SEC-006".to_string(),
            name: None,
            rule: None,
            passed: false,
            severity: Severity::Note,
            message: "Issues statement is thin.".to_string(),
            details: None,
            applicable: true,
        };
        let err = record.into_result(catalog.get("SEC-006").unwrap()).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::SeverityMismatch {
                check_id: "SEC-006".to_string(),
                expected: Severity::Reject,
                found: Severity::Note,
            }
        );
    }
}
