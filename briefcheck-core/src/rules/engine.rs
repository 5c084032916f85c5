use super::catalog::{CatalogEntry, CheckCatalog, CheckKind};
use crate::config::ComplianceConfig;
use crate::metrics::DocumentMetrics;
use crate::types::{CheckResult, Document, Severity};
use serde_json::Value;

/// Everything a predicate may read. Predicates are pure over this.
pub struct CheckContext<'a> {
    pub document: &'a Document,
    pub metrics: &'a DocumentMetrics,
    pub config: &'a ComplianceConfig,
}

/// Outcome of one predicate, before it is stamped with catalog metadata
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Pass {
        message: String,
        severity: Option<Severity>,
        details: Option<Value>,
    },
    Fail {
        message: String,
        severity: Option<Severity>,
        details: Option<Value>,
    },
    /// Input the check needs is unavailable
    Indeterminate { cause: String },
    NotApplicable { reason: String },
}

impl Evaluation {
    pub fn pass(message: impl Into<String>) -> Self {
        Evaluation::Pass {
            message: message.into(),
            severity: None,
            details: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Evaluation::Fail {
            message: message.into(),
            severity: None,
            details: None,
        }
    }

    pub fn indeterminate(cause: impl Into<String>) -> Self {
        Evaluation::Indeterminate { cause: cause.into() }
    }

    pub fn not_applicable(reason: impl Into<String>) -> Self {
        Evaluation::NotApplicable { reason: reason.into() }
    }

    pub fn with_details(mut self, value: Value) -> Self {
        if let Evaluation::Pass { details, .. } | Evaluation::Fail { details, .. } = &mut self {
            *details = Some(value);
        }
        self
    }

    /// Override the catalog severity (graduated checks such as FMT-006)
    pub fn with_severity(mut self, value: Severity) -> Self {
        if let Evaluation::Pass { severity, .. } | Evaluation::Fail { severity, .. } = &mut self {
            *severity = Some(value);
        }
        self
    }
}

/// Runs every mechanical catalog entry, in catalog order
pub struct RuleEngine<'a> {
    catalog: &'a CheckCatalog,
    config: &'a ComplianceConfig,
}

impl<'a> RuleEngine<'a> {
    pub fn new(catalog: &'a CheckCatalog, config: &'a ComplianceConfig) -> Self {
        Self { catalog, config }
    }

    /// One result per mechanical entry: evaluated, disabled or not applicable
    pub fn evaluate(&self, document: &Document, metrics: &DocumentMetrics) -> Vec<CheckResult> {
        let ctx = CheckContext {
            document,
            metrics,
            config: self.config,
        };

        let results: Vec<CheckResult> = self
            .catalog
            .mechanical()
            .map(|entry| self.evaluate_entry(entry, &ctx))
            .collect();

        for result in results.iter().filter(|r| r.failed()) {
            tracing::info!(
                check = %result.check_id,
                severity = %result.severity,
                indeterminate = result.indeterminate,
                "{}",
                result.message
            );
        }
        tracing::debug!(
            evaluated = results.len(),
            failed = results.iter().filter(|r| r.failed()).count(),
            "mechanical checks complete"
        );

        results
    }

    fn evaluate_entry(&self, entry: &CatalogEntry, ctx: &CheckContext<'_>) -> CheckResult {
        let CheckKind::Mechanical(predicate) = entry.kind else {
            return entry.resolve(Evaluation::not_applicable("Evaluated by the semantic reviewer."));
        };
        if !self.config.is_enabled(entry.check_id) {
            return entry.resolve(Evaluation::not_applicable("Disabled by configuration."));
        }
        let brief_type = ctx.document.brief_type;
        if !entry.applies_to.includes(brief_type) {
            return entry.resolve(Evaluation::not_applicable(format!(
                "Not applicable to {brief_type} briefs."
            )));
        }
        entry.resolve(predicate(ctx))
    }
}

/// "1, 2, 3" with at most ten pages shown
pub fn page_list(pages: &[usize]) -> String {
    const MAX_SHOWN: usize = 10;
    let shown = pages
        .iter()
        .take(MAX_SHOWN)
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    if pages.len() > MAX_SHOWN {
        format!("{shown} (and {} more)", pages.len() - MAX_SHOWN)
    } else {
        shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CheckToggle;
    use crate::types::{BriefType, DocumentMetadata};

    fn empty_document(brief_type: BriefType) -> Document {
        Document {
            pages: Vec::new(),
            brief_type,
            rehearing: false,
            full_text: String::new(),
            cover_text: String::new(),
            metadata: DocumentMetadata::default(),
        }
    }

    #[test]
    fn test_page_list_truncates() {
        assert_eq!(page_list(&[1, 2, 3]), "1, 2, 3");
        let many: Vec<usize> = (1..=13).collect();
        assert_eq!(page_list(&many), "1, 2, 3, 4, 5, 6, 7, 8, 9, 10 (and 3 more)");
    }

    #[test]
    fn test_every_mechanical_check_reports_once() {
        let catalog = CheckCatalog::standard();
        let config = ComplianceConfig::default();
        let results = RuleEngine::new(&catalog, &config)
            .evaluate(&empty_document(BriefType::Reply), &DocumentMetrics::default());
        let ids: Vec<&str> = results.iter().map(|r| r.check_id.as_str()).collect();
        let expected: Vec<&str> = catalog.mechanical().map(|e| e.check_id).collect();
        assert_eq!(ids, expected);

        let pg1 = results.iter().find(|r| r.check_id == "PG-001").unwrap();
        assert!(!pg1.applicable);
        assert_eq!(pg1.message, "Not applicable to reply briefs.");
    }

    #[test]
    fn test_missing_measurements_never_pass() {
        let catalog = CheckCatalog::standard();
        let config = ComplianceConfig::default();
        let results = RuleEngine::new(&catalog, &config)
            .evaluate(&empty_document(BriefType::Appellant), &DocumentMetrics::default());
        for id in ["FMT-001", "FMT-002", "FMT-006", "FMT-007", "FMT-009", "SEC-013"] {
            let result = results.iter().find(|r| r.check_id == id).unwrap();
            assert!(result.indeterminate, "{id} should be indeterminate");
            assert!(!result.passed);
        }
    }

    #[test]
    fn test_disabled_check_is_not_applicable() {
        let catalog = CheckCatalog::standard();
        let config = ComplianceConfig {
            checks: vec![CheckToggle {
                check_id: "COV-002".to_string(),
                enabled: false,
            }],
            ..ComplianceConfig::default()
        };
        let results = RuleEngine::new(&catalog, &config)
            .evaluate(&empty_document(BriefType::Appellant), &DocumentMetrics::default());
        let cov = results.iter().find(|r| r.check_id == "COV-002").unwrap();
        assert!(!cov.applicable);
        assert!(!cov.failed());
    }
}
