//! Mechanical check engine.
//!
//! ```text
//! CheckCatalog (data)          RuleEngine
//! ┌──────────────────────┐     ┌──────────────────────────────┐
//! │ id, name, rule,      │────▶│ for each mechanical entry:   │
//! │ severity, applies_to │     │   disabled?   -> n/a         │
//! │ predicate | semantic │     │   wrong type? -> n/a         │
//! └──────────────────────┘     │   predicate(ctx) -> result   │
//!                              └──────────────────────────────┘
//! ```
//!
//! Predicates live in `format`, `pagination` and `content`; semantic
//! entries only carry a description for the external reviewer.

pub mod catalog;
mod content;
pub mod engine;
mod format;
mod pagination;

pub use catalog::{Applicability, CatalogEntry, CheckCatalog, CheckKind, Predicate};
pub use engine::{page_list, CheckContext, Evaluation, RuleEngine};
