// Preprocessor abstraction for collaborator output
//
// The PDF reader runs outside this crate and hands over a serialized page
// model (JSON run dump or positioned XHTML). A preprocessor turns that
// serialization into a RawDocument; everything after this boundary is
// format-agnostic.

use crate::types::RawDocument;
use anyhow::{Context, Result};
use std::path::Path;

/// Converts collaborator output into the raw page model
///
/// Preprocessing happens in two steps:
/// 1. Bytes -> markup text (decoding only; the reader already did the PDF work)
/// 2. Markup -> RawDocument
pub trait Preprocessor {
    /// Step 1: decode the collaborator's bytes
    fn decode_markup(&self, bytes: &[u8]) -> Result<String> {
        let markup = std::str::from_utf8(bytes).context("collaborator output is not UTF-8")?;
        Ok(markup.to_string())
    }

    /// Step 2: parse markup into pages and runs
    fn parse_markup(&self, markup: &str) -> Result<RawDocument>;

    /// Both steps in sequence
    fn process(&self, bytes: &[u8]) -> Result<RawDocument> {
        let markup = self.decode_markup(bytes)?;
        self.parse_markup(&markup)
    }

    fn process_file(&self, input: &Path) -> Result<RawDocument> {
        let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        self.process(&bytes)
    }

    /// Preprocessor name for logging
    fn name(&self) -> &str;

    fn supports_file_type(&self, path: &Path) -> bool;
}

pub(crate) fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| wanted.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}
