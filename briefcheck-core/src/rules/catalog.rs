use super::engine::{CheckContext, Evaluation};
use super::{content, format, pagination};
use crate::error::IntegrityError;
use crate::types::{BriefType, CheckResult, Severity};
use std::fmt;

/// Evaluation predicate registered for a mechanical check
pub type Predicate = fn(&CheckContext<'_>) -> Evaluation;

/// Brief types a check applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    All,
    Only(&'static [BriefType]),
}

impl Applicability {
    pub fn includes(&self, brief_type: BriefType) -> bool {
        match self {
            Applicability::All => true,
            Applicability::Only(types) => types.contains(&brief_type),
        }
    }
}

#[derive(Clone, Copy)]
pub enum CheckKind {
    /// Evaluated in-process against layout measurements
    Mechanical(Predicate),
    /// Evaluated by the external semantic collaborator
    Semantic { description: &'static str },
}

impl fmt::Debug for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckKind::Mechanical(_) => f.write_str("Mechanical"),
            CheckKind::Semantic { description } => {
                f.debug_struct("Semantic").field("description", description).finish()
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub check_id: &'static str,
    pub name: &'static str,
    pub rule: &'static str,
    pub severity: Severity,
    pub applies_to: Applicability,
    pub kind: CheckKind,
}

impl CatalogEntry {
    pub fn is_mechanical(&self) -> bool {
        matches!(self.kind, CheckKind::Mechanical(_))
    }

    /// Turn an evaluation outcome into this check's result record
    pub fn resolve(&self, evaluation: Evaluation) -> CheckResult {
        let mut result = CheckResult {
            check_id: self.check_id.to_string(),
            name: self.name.to_string(),
            rule: self.rule.to_string(),
            passed: true,
            severity: self.severity,
            message: String::new(),
            details: None,
            applicable: true,
            indeterminate: false,
        };
        match evaluation {
            Evaluation::Pass { message, severity, details } => {
                result.message = message;
                result.severity = severity.unwrap_or(self.severity);
                result.details = details;
            }
            Evaluation::Fail { message, severity, details } => {
                result.passed = false;
                result.message = message;
                result.severity = severity.unwrap_or(self.severity);
                result.details = details;
            }
            Evaluation::Indeterminate { cause } => {
                result.passed = false;
                result.severity = Severity::Note;
                result.indeterminate = true;
                result.message = format!("Could not be evaluated: {cause}.");
            }
            Evaluation::NotApplicable { reason } => {
                result.applicable = false;
                result.message = reason;
            }
        }
        result
    }
}

const fn mechanical(
    check_id: &'static str,
    name: &'static str,
    rule: &'static str,
    severity: Severity,
    applies_to: Applicability,
    predicate: Predicate,
) -> CatalogEntry {
    CatalogEntry {
        check_id,
        name,
        rule,
        severity,
        applies_to,
        kind: CheckKind::Mechanical(predicate),
    }
}

const fn semantic(
    check_id: &'static str,
    name: &'static str,
    rule: &'static str,
    severity: Severity,
    applies_to: Applicability,
    description: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        check_id,
        name,
        rule,
        severity,
        applies_to,
        kind: CheckKind::Semantic { description },
    }
}

use Applicability::{All, Only};
use BriefType::*;
use Severity::{Correction, Note, Reject};

const PRINCIPAL: &[BriefType] = &[Appellant, Appellee, CrossAppeal];
const PRINCIPAL_OR_UNKNOWN: &[BriefType] = &[Appellant, Appellee, CrossAppeal, Unknown];
const KNOWN: &[BriefType] = &[Appellant, Appellee, Reply, CrossAppeal, Amicus];

const MECHANICAL_CHECKS: &[CatalogEntry] = &[
    mechanical("FMT-001", "Paper Size", "32(a)(4)", Reject, All, format::paper_size),
    mechanical("FMT-002", "Left Margin", "32(a)(4)", Reject, All, format::left_margin),
    mechanical("FMT-003", "Right Margin", "32(a)(4)", Correction, All, format::right_margin),
    mechanical("FMT-004", "Top Margin", "32(a)(4)", Correction, All, format::top_margin),
    mechanical("FMT-005", "Bottom Margin", "32(a)(4)", Correction, All, format::bottom_margin),
    mechanical("FMT-006", "Minimum Font Size", "32(a)(5)", Reject, All, format::font_size),
    mechanical("FMT-007", "Character Density", "32(a)(5)", Correction, All, format::char_density),
    mechanical("FMT-008", "Font Style", "32(a)(6)", Note, All, format::font_style),
    mechanical("FMT-009", "Double Spacing", "32(a)(5)", Correction, All, format::double_spacing),
    mechanical("FMT-010", "Footnote Typeface", "32(a)(5)", Note, All, format::footnote_typeface),
    mechanical("FMT-011", "Page Numbers at Bottom", "32(a)(4)", Correction, All, pagination::page_numbers_present),
    mechanical("FMT-012", "Page Numbering Sequence", "32(a)(4)", Correction, All, pagination::numbering_sequence),
    mechanical("PG-001", "Page Limit", "32(a)(8)", Reject, Only(PRINCIPAL_OR_UNKNOWN), pagination::page_limit),
    mechanical("PG-002", "Reply Page Limit", "32(a)(8)", Reject, Only(&[Reply]), pagination::page_limit),
    mechanical("PG-003", "Amicus Page Limit", "29(a)(5)", Reject, Only(&[Amicus]), pagination::amicus_page_limit),
    mechanical("PG-004", "Amicus Rehearing Word Limit", "29(b)(4)", Reject, Only(&[Amicus]), pagination::amicus_word_limit),
    mechanical("COV-001", "Cover Color", "32(a)(2)", Correction, Only(KNOWN), content::cover_color),
    mechanical("COV-002", "Oral Argument Notation", "28(h)/34(a)(1)(C)", Note, All, content::oral_argument),
    mechanical("CNT-004", "Paragraph Numbering", "32(a)(7)", Correction, All, content::paragraph_numbering),
    mechanical("SEC-013", "Certificate of Compliance", "32(d)", Correction, All, content::certificate_of_compliance),
    mechanical("REC-001", "Record Citations Present", "30(a)", Note, Only(PRINCIPAL), content::record_citations),
    mechanical("TYP-001", "Brief Type Identified", "28", Note, All, content::brief_type_identified),
];

const SEMANTIC_CHECKS: &[CatalogEntry] = &[
    semantic("SEC-001", "Table of Contents Present", "28(b)(1)", Reject, All,
        "Brief must contain a table of contents."),
    semantic("SEC-002", "TOC Uses Paragraph References", "28(b)(1)", Correction, All,
        "Table of contents entries must reference paragraphs, not page numbers alone."),
    semantic("SEC-003", "Table of Authorities Present", "28(b)(2)", Reject, All,
        "Brief must contain a table of authorities."),
    semantic("SEC-004", "TOA: Cases Alphabetical, Paragraph Refs", "28(b)(2)", Correction, All,
        "Table of authorities lists cases alphabetically with paragraph references."),
    semantic("SEC-005", "Jurisdictional Statement", "28(b)(3)", Correction, Only(&[Appellant]),
        "In an original jurisdiction application the appellant includes a jurisdictional statement."),
    semantic("SEC-006", "Statement of Issues", "28(b)(4)", Reject, Only(&[Appellant]),
        "Appellant brief states the issues presented for review."),
    semantic("SEC-007", "Statement of the Case", "28(b)(5)", Correction, Only(&[Appellant]),
        "Appellant brief includes a statement of the case (nature of the case and disposition below)."),
    semantic("SEC-008", "Statement of Facts with Record References", "28(b)(6)", Reject, Only(&[Appellant]),
        "Appellant brief includes a statement of facts with references to the record."),
    semantic("SEC-009", "Argument Section Present", "28(b)(7)", Reject, Only(&[Appellant, Appellee, Amicus]),
        "Brief contains an argument section."),
    semantic("SEC-010", "Standard of Review Stated", "28(b)(7)(B)(i)", Correction, Only(&[Appellant]),
        "Each issue states the applicable standard of review."),
    semantic("SEC-011", "Preservation Citations", "28(b)(7)(B)(ii)", Note, Only(&[Appellant]),
        "Each issue cites where it was preserved for review in the record."),
    semantic("SEC-012", "Conclusion with Precise Relief", "28(b)(7)(D)", Correction, Only(&[Appellant, Appellee]),
        "A short conclusion states the precise relief sought."),
    semantic("SEC-014", "Amicus: Identity/Interest Statement", "29(a)(4)(C)", Reject, Only(&[Amicus]),
        "Amicus brief states the identity of the amicus and its interest in the case."),
    semantic("SEC-015", "Amicus: Disclosure Statement", "29(a)(4)(D)", Correction, Only(&[Amicus]),
        "Amicus brief discloses party or counsel authorship and funding."),
    semantic("CNT-001", "Party References Use Actual Names", "28(e)", Correction, All,
        "Parties are referred to by actual names or lower-court designations, not procedural labels."),
    semantic("CNT-002", "Brief Is Concise, No Irrelevant Matter", "28(l)", Note, All,
        "Brief is concise and free of irrelevant, immaterial or scandalous matter."),
    semantic("CNT-003", "Statutes/Rules in Brief or Addendum", "28(g)", Note, All,
        "Pertinent statutes and rules are set out in the brief or an addendum."),
    semantic("REC-002", "Record Citation Format", "30(b)(1)", Correction, Only(PRINCIPAL),
        "Record citations use the (R<index>:<page>) format."),
    semantic("REC-003", "Record Citations Identify Items", "30(a)", Note, Only(PRINCIPAL),
        "Record references identify the item cited."),
];

/// The rulebook as data: every check the analyzer must account for, in
/// report order. Adding a rule means adding an entry, not touching the
/// engine or the aggregator.
#[derive(Debug, Clone)]
pub struct CheckCatalog {
    entries: Vec<CatalogEntry>,
}

impl Default for CheckCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl CheckCatalog {
    pub fn standard() -> Self {
        Self {
            entries: MECHANICAL_CHECKS.iter().chain(SEMANTIC_CHECKS).copied().collect(),
        }
    }

    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn register(&mut self, entry: CatalogEntry) -> Result<(), IntegrityError> {
        if self.get(entry.check_id).is_some() {
            return Err(IntegrityError::DuplicateCheck(entry.check_id.to_string()));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, check_id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.check_id == check_id)
    }

    pub fn position(&self, check_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.check_id == check_id)
    }

    /// Ids every complete run must report, in report order
    pub fn required_check_ids(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.check_id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn mechanical(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.is_mechanical())
    }

    pub fn semantic(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| !e.is_mechanical())
    }
}
