//! Rulebook manifest: which release of the bundled rules a report was
//! produced against, and whether those rules can still be trusted.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

fn default_freshness_days() -> i64 {
    90
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulebookManifest {
    #[serde(default)]
    pub version: Option<String>,
    /// YYYY-MM-DD
    #[serde(default)]
    pub rules_verified: Option<String>,
    #[serde(default = "default_freshness_days")]
    pub rules_freshness_days: i64,
    /// file name -> "sha256:<hex>"
    #[serde(default)]
    pub rule_hashes: BTreeMap<String, String>,
}

impl Default for RulebookManifest {
    fn default() -> Self {
        Self {
            version: None,
            rules_verified: None,
            rules_freshness_days: default_freshness_days(),
            rule_hashes: BTreeMap::new(),
        }
    }
}

impl RulebookManifest {
    /// Missing or unreadable manifests load as empty
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::debug!(path = %path.display(), "no rulebook manifest");
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "invalid rulebook manifest, ignoring");
            Self::default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.version.is_none() && self.rules_verified.is_none() && self.rule_hashes.is_empty()
    }

    fn verified_date(&self) -> Option<NaiveDate> {
        let verified = self.rules_verified.as_deref()?;
        NaiveDate::parse_from_str(verified, "%Y-%m-%d").ok()
    }

    /// Compare the rule files on disk with the recorded hashes
    pub fn check_rule_hashes(&self, rules_dir: impl AsRef<Path>) -> Vec<String> {
        if self.rule_hashes.is_empty() {
            return Vec::new();
        }
        let actual = compute_rule_hashes(rules_dir.as_ref());

        self.rule_hashes
            .iter()
            .filter_map(|(filename, expected)| match actual.get(filename) {
                None => Some(format!("Rule file missing: {filename}")),
                Some(hash) if hash != expected => Some(format!(
                    "Rule file {filename} has been modified since last release (hash mismatch)"
                )),
                Some(_) => None,
            })
            .collect()
    }

    pub fn check_rule_staleness(&self, today: NaiveDate) -> Option<String> {
        let verified = self.verified_date()?;
        let age_days = (today - verified).num_days();
        (age_days > self.rules_freshness_days).then(|| {
            format!(
                "Bundled rules were last verified {age_days} days ago ({}). Consider checking \
                 ndcourts.gov for amendments to Rules 28, 29, 30, 32, 34, and 3.4.",
                verified.format("%Y-%m-%d")
            )
        })
    }

    /// All integrity and freshness warnings, hashes first
    pub fn warnings(&self, rules_dir: impl AsRef<Path>, today: NaiveDate) -> Vec<String> {
        let mut warnings = self.check_rule_hashes(rules_dir);
        warnings.extend(self.check_rule_staleness(today));
        warnings
    }

    /// Footer stamp, e.g. "v1.2.0 | Rules verified 2026-02-17"
    pub fn version_stamp(&self) -> Option<String> {
        let parts: Vec<String> = [
            self.version.as_ref().map(|v| format!("v{v}")),
            self.rules_verified.as_ref().map(|d| format!("Rules verified {d}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        (!parts.is_empty()).then(|| parts.join(" | "))
    }
}

pub fn compute_rule_hash(bytes: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(bytes))
}

/// Hashes of every `*.md` file directly inside `rules_dir`
pub fn compute_rule_hashes(rules_dir: &Path) -> BTreeMap<String, String> {
    let Ok(entries) = std::fs::read_dir(rules_dir) else {
        return BTreeMap::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("md"))
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?.to_string();
            let bytes = std::fs::read(&path).ok()?;
            Some((name, compute_rule_hash(&bytes)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(verified: &str) -> RulebookManifest {
        RulebookManifest {
            version: Some("1.2.0".to_string()),
            rules_verified: Some(verified.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_version_stamp() {
        assert_eq!(
            manifest("2026-02-17").version_stamp().as_deref(),
            Some("v1.2.0 | Rules verified 2026-02-17")
        );
        assert_eq!(RulebookManifest::default().version_stamp(), None);
    }

    #[test]
    fn test_staleness_window() {
        let m = manifest("2026-02-17");
        let fresh = NaiveDate::from_ymd_opt(2026, 5, 18).unwrap();
        let stale = NaiveDate::from_ymd_opt(2026, 5, 19).unwrap();
        assert_eq!(m.check_rule_staleness(fresh), None);
        let warning = m.check_rule_staleness(stale).unwrap();
        assert!(warning.starts_with("Bundled rules were last verified 91 days ago (2026-02-17)."));

        assert_eq!(manifest("17/02/2026").check_rule_staleness(stale), None);
    }

    #[test]
    fn test_rule_hash_mismatch_and_missing() {
        let dir = std::env::temp_dir().join("briefcheck_rulebook_test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("rule32.md"), "Rule 32. Form of briefs.").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut m = manifest("2026-02-17");
        m.rule_hashes
            .insert("rule32.md".to_string(), compute_rule_hash(b"Rule 32. Form of briefs."));
        assert!(m.check_rule_hashes(&dir).is_empty());

        m.rule_hashes.insert("rule29.md".to_string(), "sha256:00".to_string());
        m.rule_hashes.insert("rule32.md".to_string(), "sha256:ff".to_string());
        assert_eq!(
            m.check_rule_hashes(&dir),
            vec![
                "Rule file missing: rule29.md".to_string(),
                "Rule file rule32.md has been modified since last release (hash mismatch)".to_string(),
            ]
        );

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_manifest_is_empty() {
        let m = RulebookManifest::load("/nonexistent/version.json");
        assert!(m.is_empty());
        assert_eq!(m.rules_freshness_days, 90);
    }
}
