use crate::cache::{AnalysisCacheKey, IntermediateArtifact};
use crate::types::RawDocument;
use anyhow::{anyhow, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Storage abstraction for the two cache levels:
/// input hash -> RawDocument, and input + config -> IntermediateArtifact
pub trait ArtifactStorage {
    /// Level 1: parsed collaborator output for an input hash
    fn get_raw_document(&self, input_hash: &str) -> Result<Option<RawDocument>>;
    fn store_raw_document(&self, input_hash: &str, raw: &RawDocument) -> Result<()>;

    /// Level 2: intermediate artifact for input + config
    fn get_intermediate(&self, key: &AnalysisCacheKey) -> Result<Option<IntermediateArtifact>>;
    fn store_intermediate(&self, key: &AnalysisCacheKey, artifact: &IntermediateArtifact) -> Result<()>;
}

/// File-based storage under a cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: impl Into<String>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        fs::create_dir_all(format!("{}/raw", cache_dir))?;
        fs::create_dir_all(format!("{}/intermediate", cache_dir))?;

        Ok(Self { cache_dir })
    }

    fn raw_document_path(&self, input_hash: &str) -> String {
        format!("{}/raw/{}.json", self.cache_dir, input_hash)
    }

    fn intermediate_path(&self, key: &AnalysisCacheKey) -> String {
        format!("{}/intermediate/{}.json", self.cache_dir, key.to_cache_hash())
    }
}

impl ArtifactStorage for FileStorage {
    fn get_raw_document(&self, input_hash: &str) -> Result<Option<RawDocument>> {
        let path = self.raw_document_path(input_hash);
        if Path::new(&path).exists() {
            let content = fs::read_to_string(&path)?;
            let raw: RawDocument = serde_json::from_str(&content)
                .map_err(|e| anyhow!("Failed to deserialize cached raw document: {}", e))?;
            Ok(Some(raw))
        } else {
            Ok(None)
        }
    }

    fn store_raw_document(&self, input_hash: &str, raw: &RawDocument) -> Result<()> {
        let path = self.raw_document_path(input_hash);
        let content = serde_json::to_string(raw)
            .map_err(|e| anyhow!("Failed to serialize raw document: {}", e))?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn get_intermediate(&self, key: &AnalysisCacheKey) -> Result<Option<IntermediateArtifact>> {
        let path = self.intermediate_path(key);
        if Path::new(&path).exists() {
            let content = fs::read_to_string(&path)?;
            Ok(Some(IntermediateArtifact::from_json(&content)?))
        } else {
            Ok(None)
        }
    }

    fn store_intermediate(&self, key: &AnalysisCacheKey, artifact: &IntermediateArtifact) -> Result<()> {
        let path = self.intermediate_path(key);
        fs::write(&path, artifact.to_json()?)?;
        Ok(())
    }
}

/// Fingerprint of collaborator output, length plus every byte
pub fn calculate_input_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes.len().to_le_bytes());
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn calculate_config_hash<T: Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;
    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// No-op storage for tests and one-shot runs
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStorage for NoOpStorage {
    fn get_raw_document(&self, _input_hash: &str) -> Result<Option<RawDocument>> {
        Ok(None) // Always cache miss
    }

    fn store_raw_document(&self, _input_hash: &str, _raw: &RawDocument) -> Result<()> {
        Ok(()) // No-op
    }

    fn get_intermediate(&self, _key: &AnalysisCacheKey) -> Result<Option<IntermediateArtifact>> {
        Ok(None)
    }

    fn store_intermediate(&self, _key: &AnalysisCacheKey, _artifact: &IntermediateArtifact) -> Result<()> {
        Ok(())
    }
}
