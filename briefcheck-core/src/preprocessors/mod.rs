//! Collaborator adapters
//!
//! ```text
//! PDF bytes
//!     ↓  (external reader)
//! JSON run dump / positioned XHTML
//!     ↓  [Preprocessor]
//! RawDocument
//!     ↓  [LayoutExtractor]
//! Vec<Page>
//! ```

pub mod json_runs;
pub mod preprocessor;
pub mod xhtml_parser;

pub use json_runs::JsonRunPreprocessor;
pub use preprocessor::Preprocessor;
pub use xhtml_parser::XhtmlPreprocessor;

use crate::error::ExtractionError;
use std::path::Path;

/// Pick the adapter for a collaborator output file by extension
pub fn preprocessor_for_path(
    path: &Path,
) -> Result<Box<dyn Preprocessor + Send + Sync>, ExtractionError> {
    let candidates: Vec<Box<dyn Preprocessor + Send + Sync>> =
        vec![Box::new(JsonRunPreprocessor), Box::new(XhtmlPreprocessor)];
    candidates
        .into_iter()
        .find(|p| p.supports_file_type(path))
        .ok_or_else(|| ExtractionError::UnsupportedFileType(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_extension() {
        assert_eq!(
            preprocessor_for_path(Path::new("a/brief.json")).unwrap().name(),
            "JsonRunPreprocessor"
        );
        assert_eq!(
            preprocessor_for_path(Path::new("brief.html")).unwrap().name(),
            "XhtmlPreprocessor"
        );
        assert!(preprocessor_for_path(Path::new("brief.pdf")).is_err());
    }
}
