use super::preprocessor::{has_extension, Preprocessor};
use crate::error::ExtractionError;
use crate::types::RawDocument;
use anyhow::Result;
use std::path::Path;

/// Reads the reader's page model serialized as JSON (`RawDocument` shape)
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRunPreprocessor;

impl Preprocessor for JsonRunPreprocessor {
    fn parse_markup(&self, markup: &str) -> Result<RawDocument> {
        let document: RawDocument = serde_json::from_str(markup)
            .map_err(|e| ExtractionError::MalformedMarkup(e.to_string()))?;
        tracing::debug!(pages = document.pages.len(), "parsed JSON run dump");
        Ok(document)
    }

    fn name(&self) -> &str {
        "JsonRunPreprocessor"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }
}
