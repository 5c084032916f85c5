use crate::cache::{versions, AnalysisCacheKey, IntermediateArtifact};
use crate::classifier::BriefTypeClassifier;
use crate::config::ComplianceConfig;
use crate::error::IntegrityError;
use crate::layout::{self, LayoutExtractor};
use crate::metrics::{DocumentMetrics, MetricClassifier};
use crate::preprocessors::preprocessor_for_path;
use crate::recommender::ResultAggregator;
use crate::rules::{CheckCatalog, RuleEngine};
use crate::semantic::{plan_semantic_checks, SemanticArtifact, SemanticPlan};
use crate::storage::{calculate_config_hash, calculate_input_hash, ArtifactStorage, NoOpStorage};
use crate::types::*;
use crate::version::RulebookManifest;
use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used for testing and diagnostics
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub raw: RawDocument,
    pub pages: Vec<Page>,
    pub metrics: DocumentMetrics,
    pub brief_type: BriefType,
    pub results: Vec<CheckResult>,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        tracing::debug!(step = step_name, ms = elapsed.as_millis() as u64, "step finished");
        self.timings.push((step_name.to_string(), elapsed));

        result
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn log_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();
        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            tracing::info!(
                step = step.as_str(),
                ms = duration.as_millis() as u64,
                share_pct = (percentage * 10.0).round() / 10.0,
                "profile"
            );
        }
        tracing::info!(ms = total.as_millis() as u64, "profile total");
    }
}

/// Everything the deterministic half of a run produced
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub input_hash: String,
    pub document: Document,
    pub metrics: DocumentMetrics,
    pub mechanical_results: Vec<CheckResult>,
    pub semantic: SemanticPlan,
    pub processing_time_ms: u64,
}

impl AnalysisRun {
    /// Hand-off record for the external semantic step
    pub fn intermediate(&self) -> IntermediateArtifact {
        IntermediateArtifact {
            schema_version: versions::ARTIFACT_SCHEMA_VERSION,
            input_hash: self.input_hash.clone(),
            brief_type: self.document.brief_type,
            rehearing: self.document.rehearing,
            total_pages: self.document.total_pages(),
            body_pages: self.document.body_pages(),
            word_count: self.metrics.word_count,
            cover_text: self.document.cover_text.clone(),
            full_text: self.document.full_text.clone(),
            mechanical_results: self.mechanical_results.clone(),
            resolved_semantic_results: self.semantic.resolved.clone(),
            semantic_request: self.semantic.request.clone(),
            created_at: Utc::now(),
            processing_time_ms: self.processing_time_ms,
        }
    }
}

struct Rulebook {
    manifest: RulebookManifest,
    rules_dir: PathBuf,
}

/// Pipeline driver: collaborator output -> intermediate artifact -> report.
/// Holds no per-run state, so one analyzer can serve concurrent runs.
pub struct BriefAnalyzer {
    config: ComplianceConfig,
    catalog: CheckCatalog,
    classifier: BriefTypeClassifier,
    storage: Box<dyn ArtifactStorage + Send + Sync>,
    rulebook: Option<Rulebook>,
    profiling: bool,
}

impl BriefAnalyzer {
    pub fn new(config: ComplianceConfig) -> Self {
        Self::with_storage(config, Box::new(NoOpStorage::new()))
    }

    /// Create BriefAnalyzer with injected storage
    pub fn with_storage(config: ComplianceConfig, storage: Box<dyn ArtifactStorage + Send + Sync>) -> Self {
        Self {
            config,
            catalog: CheckCatalog::standard(),
            classifier: BriefTypeClassifier::new(),
            storage,
            rulebook: None,
            profiling: false,
        }
    }

    pub fn with_catalog(mut self, catalog: CheckCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Stamp reports with the rulebook release and its integrity warnings
    pub fn with_rulebook(mut self, manifest: RulebookManifest, rules_dir: impl Into<PathBuf>) -> Self {
        self.rulebook = Some(Rulebook {
            manifest,
            rules_dir: rules_dir.into(),
        });
        self
    }

    pub fn with_profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CheckCatalog {
        &self.catalog
    }

    /// Extraction -> metrics -> classification -> mechanical checks ->
    /// semantic request. Page-level problems never fail the run.
    pub fn analyze(&self, raw: &RawDocument, declared: Option<BriefType>) -> AnalysisRun {
        let input_hash = serde_json::to_vec(raw)
            .map(|bytes| calculate_input_hash(&bytes))
            .unwrap_or_default();
        self.analyze_with_hash(raw, declared, input_hash)
    }

    fn analyze_with_hash(&self, raw: &RawDocument, declared: Option<BriefType>, input_hash: String) -> AnalysisRun {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(self.profiling);

        let pages = profiler.time_step("1. Layout Extraction", || LayoutExtractor::new(&self.config).extract(raw));
        let metrics = profiler.time_step("2. Metrics", || MetricClassifier::new(&self.config).measure(&pages));

        let (brief_type, rehearing) = profiler.time_step("3. Brief Type", || {
            let cover = layout::cover_text(&pages);
            let brief_type = declared.unwrap_or_else(|| self.classifier.classify(&cover));
            (brief_type, self.classifier.detect_rehearing(&cover))
        });
        if declared.is_some() {
            tracing::info!(brief_type = %brief_type, "brief type declared by caller");
        }

        let document = layout::assemble_document(pages, raw.metadata.clone(), brief_type, rehearing);

        let mechanical_results = profiler.time_step("4. Mechanical Checks", || {
            RuleEngine::new(&self.catalog, &self.config).evaluate(&document, &metrics)
        });
        let semantic = profiler.time_step("5. Semantic Request", || {
            plan_semantic_checks(&self.catalog, &self.config, &document, &metrics)
        });

        profiler.log_summary();
        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            brief_type = %brief_type,
            pages = document.total_pages(),
            failed = mechanical_results.iter().filter(|r| r.failed()).count(),
            semantic_requested = semantic.request.checks.len(),
            ms = processing_time_ms,
            "analysis complete"
        );

        AnalysisRun {
            input_hash,
            document,
            metrics,
            mechanical_results,
            semantic,
            processing_time_ms,
        }
    }

    fn cache_key(&self, input_hash: &str, declared: Option<BriefType>) -> Result<AnalysisCacheKey> {
        let config_hash = calculate_config_hash(&(&self.config, declared))?;
        Ok(AnalysisCacheKey::new(input_hash.to_string(), config_hash))
    }

    fn load_raw(&self, input_path: &Path, bytes: &[u8], input_hash: &str) -> Result<RawDocument> {
        if let Some(raw) = self.storage.get_raw_document(input_hash)? {
            tracing::debug!(input = %input_path.display(), "raw document cache hit");
            return Ok(raw);
        }
        let preprocessor = preprocessor_for_path(input_path)?;
        tracing::info!(input = %input_path.display(), preprocessor = preprocessor.name(), "reading collaborator output");
        let raw = preprocessor.process(bytes)?;
        self.storage.store_raw_document(input_hash, &raw)?;
        Ok(raw)
    }

    /// Analyze a collaborator output file; the adapter is chosen by
    /// extension. Both cache levels are written through storage.
    pub fn analyze_file(&self, input_path: impl AsRef<Path>, declared: Option<BriefType>) -> Result<AnalysisRun> {
        let input_path = input_path.as_ref();
        let bytes = std::fs::read(input_path)?;
        let input_hash = calculate_input_hash(&bytes);
        let raw = self.load_raw(input_path, &bytes, &input_hash)?;

        let run = self.analyze_with_hash(&raw, declared, input_hash);
        let key = self.cache_key(&run.input_hash, declared)?;
        self.storage.store_intermediate(&key, &run.intermediate())?;
        Ok(run)
    }

    /// Hand-off artifact for a collaborator output file. A stored artifact
    /// for the same input and config is returned without re-analysis.
    pub fn prepare_file(
        &self,
        input_path: impl AsRef<Path>,
        declared: Option<BriefType>,
    ) -> Result<IntermediateArtifact> {
        let input_path = input_path.as_ref();
        let bytes = std::fs::read(input_path)?;
        let input_hash = calculate_input_hash(&bytes);
        let key = self.cache_key(&input_hash, declared)?;

        if let Some(cached) = self.storage.get_intermediate(&key)? {
            tracing::info!(input = %input_path.display(), "intermediate artifact cache hit");
            return Ok(cached);
        }

        let raw = self.load_raw(input_path, &bytes, &input_hash)?;
        let artifact = self.analyze_with_hash(&raw, declared, input_hash).intermediate();
        self.storage.store_intermediate(&key, &artifact)?;
        Ok(artifact)
    }

    /// Previously stored intermediate artifact for this input and config
    pub fn cached_intermediate(
        &self,
        input_path: impl AsRef<Path>,
        declared: Option<BriefType>,
    ) -> Result<Option<IntermediateArtifact>> {
        let bytes = std::fs::read(input_path.as_ref())?;
        let key = self.cache_key(&calculate_input_hash(&bytes), declared)?;
        self.storage.get_intermediate(&key)
    }

    /// Merge with the semantic artifact and produce the report. Without an
    /// artifact the run fails closed.
    pub fn finalize(
        &self,
        run: &AnalysisRun,
        semantic: Option<&SemanticArtifact>,
    ) -> Result<ComplianceReport, IntegrityError> {
        self.finalize_intermediate(&run.intermediate(), semantic)
    }

    pub fn finalize_intermediate(
        &self,
        artifact: &IntermediateArtifact,
        semantic: Option<&SemanticArtifact>,
    ) -> Result<ComplianceReport, IntegrityError> {
        let semantic = semantic.ok_or(IntegrityError::MissingSemanticArtifact)?;
        let mut report =
            ResultAggregator::new(&self.catalog).build_report(artifact.brief_type, artifact.core_results(), semantic)?;

        if let Some(rulebook) = &self.rulebook {
            report.version_stamp = rulebook.manifest.version_stamp();
            report.warnings = rulebook
                .manifest
                .warnings(&rulebook.rules_dir, Utc::now().date_naive());
            for warning in &report.warnings {
                tracing::warn!(warning = warning.as_str(), "rulebook");
            }
        }
        Ok(report)
    }

    /// Run every stage and keep each boundary for inspection
    pub fn capture_stages(&self, raw: &RawDocument, declared: Option<BriefType>) -> PipelineStages {
        let run = self.analyze(raw, declared);
        PipelineStages {
            raw: raw.clone(),
            pages: run.document.pages,
            metrics: run.metrics,
            brief_type: run.document.brief_type,
            results: run.mechanical_results,
        }
    }
}
