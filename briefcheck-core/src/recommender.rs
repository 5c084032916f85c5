use crate::error::IntegrityError;
use crate::rules::CheckCatalog;
use crate::semantic::{ReviewerAssessment, SemanticArtifact};
use crate::types::{BriefType, CheckResult, ComplianceReport, Recommendation, Severity};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Hard-rule reduction: any failing reject -> reject, else any failing
/// correction -> correction letter, else accept. Order-independent.
pub fn recommend(results: &[CheckResult]) -> Recommendation {
    let worst = results
        .iter()
        .filter(|r| r.failed())
        .map(|r| r.severity)
        .max();
    match worst {
        Some(Severity::Reject) => Recommendation::Reject,
        Some(Severity::Correction) => Recommendation::CorrectionLetter,
        Some(Severity::Note) | None => Recommendation::Accept,
    }
}

fn failure_list(results: &[CheckResult], severity: Severity) -> (usize, String) {
    let failing: Vec<String> = results
        .iter()
        .filter(|r| r.failed() && r.severity == severity)
        .map(|r| format!("{} ({})", r.check_id, r.name))
        .collect();
    (failing.len(), failing.join("; "))
}

pub fn build_reasoning(results: &[CheckResult], recommendation: Recommendation) -> String {
    match recommendation {
        Recommendation::Reject => {
            let (count, list) = failure_list(results, Severity::Reject);
            format!("Automatic REJECT due to {count} critical failure(s): {list}")
        }
        Recommendation::CorrectionLetter => {
            let (count, list) = failure_list(results, Severity::Correction);
            format!("Correction letter recommended due to {count} issue(s): {list}")
        }
        Recommendation::Accept => "All checks passed.".to_string(),
    }
}

/// Reviewer judgement can raise the hard-rule outcome, never lower it
pub fn apply_assessment(
    hard: Recommendation,
    reasoning: String,
    assessment: Option<&ReviewerAssessment>,
) -> (Recommendation, String) {
    let Some(assessment) = assessment else {
        return (hard, reasoning);
    };
    if assessment.recommendation > hard {
        tracing::info!(from = %hard, to = %assessment.recommendation, "reviewer escalated recommendation");
        return (assessment.recommendation, assessment.reasoning.clone());
    }
    if assessment.recommendation < hard {
        tracing::warn!(
            hard = %hard,
            reviewer = %assessment.recommendation,
            "reviewer attempted to downgrade; hard rules kept"
        );
    }
    if hard == Recommendation::Reject || assessment.reasoning.trim().is_empty() {
        (hard, reasoning)
    } else {
        (hard, format!("{reasoning} {}", assessment.reasoning.trim()))
    }
}

/// Merges mechanical and semantic results and enforces the
/// one-result-per-check contract against the catalog.
pub struct ResultAggregator<'a> {
    catalog: &'a CheckCatalog,
}

impl<'a> ResultAggregator<'a> {
    pub fn new(catalog: &'a CheckCatalog) -> Self {
        Self { catalog }
    }

    /// `core` holds everything the analyzer produced itself (mechanical
    /// results plus semantic checks it resolved as not applicable).
    /// Returns results in catalog order.
    pub fn merge(
        &self,
        core: Vec<CheckResult>,
        artifact: &SemanticArtifact,
    ) -> Result<Vec<CheckResult>, IntegrityError> {
        let mut merged: Vec<CheckResult> = Vec::with_capacity(self.catalog.len());
        for result in core {
            if self.catalog.get(&result.check_id).is_none() {
                return Err(IntegrityError::UnknownCheck(result.check_id));
            }
            merged.push(result);
        }

        for (index, record) in artifact.results.iter().enumerate() {
            let entry = self
                .catalog
                .get(&record.check_id)
                .ok_or_else(|| IntegrityError::UnknownCheck(record.check_id.clone()))?;
            if entry.is_mechanical() {
                return Err(IntegrityError::NotSemanticCheck(record.check_id.clone()));
            }
            // Applicability is decided before hand-off; the reviewer only answers
            if !record.applicable {
                return Err(IntegrityError::InvalidSemanticRecord {
                    index,
                    field: "applicable".to_string(),
                    reason: format!("is false for requested check {}", record.check_id),
                });
            }
            merged.push(record.clone().into_result(entry)?);
        }

        self.verify_complete(&merged)?;
        merged.sort_by_key(|r| self.catalog.position(&r.check_id));
        Ok(merged)
    }

    /// Every catalog id exactly once, nothing else
    pub fn verify_complete(&self, results: &[CheckResult]) -> Result<(), IntegrityError> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for result in results {
            if self.catalog.get(&result.check_id).is_none() {
                return Err(IntegrityError::UnknownCheck(result.check_id.clone()));
            }
            let count = seen.entry(result.check_id.as_str()).or_insert(0);
            *count += 1;
            if *count > 1 {
                return Err(IntegrityError::DuplicateCheck(result.check_id.clone()));
            }
        }
        match self
            .catalog
            .required_check_ids()
            .into_iter()
            .find(|id| !seen.contains_key(id))
        {
            Some(missing) => Err(IntegrityError::MissingCheck(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Merge, recommend and package the final report
    pub fn build_report(
        &self,
        brief_type: BriefType,
        core: Vec<CheckResult>,
        artifact: &SemanticArtifact,
    ) -> Result<ComplianceReport, IntegrityError> {
        let results = self.merge(core, artifact)?;
        let hard = recommend(&results);
        let (recommendation, reasoning) =
            apply_assessment(hard, build_reasoning(&results, hard), artifact.assessment.as_ref());

        tracing::info!(
            recommendation = %recommendation,
            checks = results.len(),
            failed = results.iter().filter(|r| r.failed()).count(),
            "recommendation computed"
        );

        Ok(ComplianceReport {
            report_id: new_report_id(),
            created_at: Utc::now(),
            brief_type,
            recommendation,
            reasoning,
            results,
            version_stamp: None,
            warnings: Vec::new(),
        })
    }
}

fn new_report_id() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}
