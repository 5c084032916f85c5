use crate::semantic::SemanticRequest;
use crate::types::*;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version constants for cache invalidation
pub mod versions {
    pub const ENGINE_VERSION: &str = "0.1.0";
    pub const RULEBOOK_VERSION: &str = "1.2.0";
    pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;
}

/// Cache key for an analysis (input + config -> intermediate artifact)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AnalysisCacheKey {
    pub input_hash: String,
    pub config_hash: String,
    pub engine_version: String,
    pub rulebook_version: String,
}

impl AnalysisCacheKey {
    pub fn new(input_hash: String, config_hash: String) -> Self {
        Self {
            input_hash,
            config_hash,
            engine_version: versions::ENGINE_VERSION.to_string(),
            rulebook_version: versions::RULEBOOK_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.input_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.engine_version);
        hasher.update(&self.rulebook_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Hand-off between the deterministic stages and the external semantic
/// step. Holds everything `finalize` needs, so the two halves of a run
/// can happen in different processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediateArtifact {
    pub schema_version: u32,
    pub input_hash: String,
    pub brief_type: BriefType,
    #[serde(default)]
    pub rehearing: bool,
    pub total_pages: usize,
    pub body_pages: usize,
    pub word_count: usize,
    pub cover_text: String,
    pub full_text: String,
    pub mechanical_results: Vec<CheckResult>,
    /// Semantic checks resolved as not applicable before the hand-off
    #[serde(default)]
    pub resolved_semantic_results: Vec<CheckResult>,
    pub semantic_request: SemanticRequest,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl IntermediateArtifact {
    /// Results the core produced itself, mechanical first
    pub fn core_results(&self) -> Vec<CheckResult> {
        self.mechanical_results
            .iter()
            .chain(&self.resolved_semantic_results)
            .cloned()
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| anyhow!("Failed to serialize IntermediateArtifact: {}", e))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: IntermediateArtifact = serde_json::from_str(json)
            .map_err(|e| anyhow!("Failed to deserialize IntermediateArtifact: {}", e))?;
        if artifact.schema_version != versions::ARTIFACT_SCHEMA_VERSION {
            return Err(anyhow!(
                "Unsupported intermediate artifact schema {} (expected {})",
                artifact.schema_version,
                versions::ARTIFACT_SCHEMA_VERSION
            ));
        }
        Ok(artifact)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).with_context(|| format!("writing {}", path.display()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hash_depends_on_config() {
        let a = AnalysisCacheKey::new("input".to_string(), "config-a".to_string());
        let b = AnalysisCacheKey::new("input".to_string(), "config-b".to_string());
        assert_eq!(a.to_cache_hash(), a.clone().to_cache_hash());
        assert_ne!(a.to_cache_hash(), b.to_cache_hash());
        assert_eq!(a.to_cache_hash().len(), 64);
    }

    #[test]
    fn test_rejects_unknown_schema_version() {
        let artifact = IntermediateArtifact {
            schema_version: versions::ARTIFACT_SCHEMA_VERSION,
            input_hash: "abc".to_string(),
            brief_type: BriefType::Reply,
            rehearing: false,
            total_pages: 3,
            body_pages: 3,
            word_count: 900,
            cover_text: "REPLY BRIEF OF APPELLANT".to_string(),
            full_text: "REPLY BRIEF OF APPELLANT\n\nARGUMENT".to_string(),
            mechanical_results: Vec::new(),
            resolved_semantic_results: Vec::new(),
            semantic_request: SemanticRequest {
                brief_type: BriefType::Reply,
                rehearing: false,
                word_count: 900,
                total_pages: 3,
                cover_text: String::new(),
                full_text: String::new(),
                checks: Vec::new(),
            },
            created_at: Utc::now(),
            processing_time_ms: 4,
        };
        let json = artifact.to_json().unwrap();
        assert_eq!(IntermediateArtifact::from_json(&json).unwrap(), artifact);

        let future = json.replacen("\"schema_version\": 1", "\"schema_version\": 2", 1);
        assert!(IntermediateArtifact::from_json(&future).is_err());
    }
}
