// Corpus builder
// Walks a split's performances: read annotation -> corrupt -> clean & score -> store -> catalog

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use super::metadata::{MetadataError, MetadataTable, PerformanceJob};
use crate::beats::{read_annotation_file, AnnotationError, BeatSequence};
use crate::catalog::{
    self, DbConnection, DbError, PerformanceRecord, RunStatus, StorageError,
};
use crate::config::{BuildConfig, ConfigError};
use crate::corruption::{corrupt_with_stats, CorruptionError, CorruptionStats, SeverityConfig};
use crate::evaluation::{clean_and_score, EvaluationConfig, EvaluationError, EvaluationResult};
use crate::pipeline::{TraceBuilder, TraceError, TraceEntry, TraceWriter};
use crate::rng::create_performance_rng;

/// Errors that stop a whole build
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Catalog error: {0}")]
    Db(#[from] DbError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Trace error: {0}")]
    Trace(#[from] TraceError),
}

/// Errors that only skip the performance they happen on
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Failed to read annotation: {0}")]
    Annotation(#[from] AnnotationError),

    #[error("Corruption failed: {0}")]
    Corruption(#[from] CorruptionError),

    #[error("Scoring failed: {0}")]
    Evaluation(#[from] EvaluationError),
}

/// Corrupt one annotation, then clean and score the result
pub fn generate_prediction<R: Rng + ?Sized>(
    annotation: &BeatSequence,
    severity: &SeverityConfig,
    evaluation: &EvaluationConfig,
    rng: &mut R,
) -> Result<(EvaluationResult, CorruptionStats), SampleError> {
    let (candidate, stats) = corrupt_with_stats(annotation, severity, rng)?;
    let result = clean_and_score(candidate, annotation, severity, evaluation)?;
    Ok((result, stats))
}

/// Outcome of a finished build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub run_id: Uuid,
    pub split: String,
    pub processed: usize,
    pub skipped: usize,
    /// Arithmetic mean F1 over processed performances
    pub mean_f1: Option<f64>,
    pub output_dir: PathBuf,
}

/// Builds the imperfect-prediction corpus for one split
pub struct CorpusBuilder {
    config: BuildConfig,
    db: DbConnection,
    trace: Option<TraceWriter>,
}

impl CorpusBuilder {
    pub fn new(config: BuildConfig, db: DbConnection) -> Self {
        CorpusBuilder {
            config,
            db,
            trace: None,
        }
    }

    /// Open the catalog (and trace, if configured) named by the config
    pub fn open(config: BuildConfig) -> Result<Self, BuildError> {
        config.validate()?;
        let db = catalog::init_db(&config.catalog_path())?;
        let trace = config.trace_path.clone().map(TraceWriter::new);

        Ok(CorpusBuilder { config, db, trace })
    }

    pub fn with_trace(mut self, writer: TraceWriter) -> Self {
        self.trace = Some(writer);
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn db(&self) -> &DbConnection {
        &self.db
    }

    fn emit(&self, entry: TraceEntry) -> Result<(), TraceError> {
        match &self.trace {
            Some(writer) => writer.write(&entry),
            None => Ok(()),
        }
    }

    /// Build from the split's metadata file
    pub fn build(&self) -> Result<BuildSummary, BuildError> {
        let metadata = MetadataTable::load(&self.config.metadata_path())?;
        self.build_from_metadata(&metadata)
    }

    /// Build from an already-loaded metadata table
    pub fn build_from_metadata(&self, metadata: &MetadataTable) -> Result<BuildSummary, BuildError> {
        self.config.validate()?;

        let (jobs, unresolved) = metadata.resolve(&self.config.annotation_root);
        for performance_id in &unresolved {
            log::warn!("No metadata row for short id of {}, skipping", performance_id);
        }

        let run = catalog::create_run(
            &self.db,
            self.config.split.clone(),
            self.config.base_seed,
            &self.config.severity,
        )?;

        match self.run_jobs(run.id, &jobs, unresolved.len()) {
            Ok(summary) => Ok(summary),
            Err(e) => {
                if let Err(status_err) =
                    catalog::update_run_status(&self.db, &run.id, RunStatus::Failed)
                {
                    log::error!("Failed to mark run {} as failed: {}", run.id, status_err);
                }
                Err(e)
            }
        }
    }

    fn run_jobs(
        &self,
        run_id: Uuid,
        jobs: &[PerformanceJob],
        unresolved: usize,
    ) -> Result<BuildSummary, BuildError> {
        let split = &self.config.split;
        let split_dir = catalog::split_output_dir(&self.config.output_dir, split)?;

        catalog::update_run_status(&self.db, &run_id, RunStatus::Processing)?;
        log::info!(
            "Building {} split: {} performances, base seed {}",
            split,
            jobs.len(),
            self.config.base_seed
        );
        self.emit(
            TraceBuilder::stage("build")
                .data(serde_json::json!({
                    "run_id": run_id.to_string(),
                    "performances": jobs.len(),
                    "unresolved": unresolved,
                }))
                .start(format!("Building {} split", split)),
        )?;

        let total = jobs.len().max(1) as f32;
        let mut processed = 0usize;
        let mut skipped = unresolved;
        let mut f1_sum = 0.0;

        for (idx, job) in jobs.iter().enumerate() {
            let progress = (idx + 1) as f32 / total;

            match self.process_job(run_id, job, &split_dir, progress)? {
                Some(f1) => {
                    processed += 1;
                    f1_sum += f1;
                }
                None => skipped += 1,
            }
        }

        let mean_f1 = if processed > 0 {
            Some(f1_sum / processed as f64)
        } else {
            None
        };

        catalog::complete_run(&self.db, &run_id, processed as i64, skipped as i64, mean_f1)?;

        match mean_f1 {
            Some(mean) => log::info!("Mean F1 score: {:.4} ({} processed, {} skipped)", mean, processed, skipped),
            None => log::warn!("No performances processed for {} split ({} skipped)", split, skipped),
        }
        self.emit(
            TraceBuilder::stage("build")
                .data(serde_json::json!({
                    "processed": processed,
                    "skipped": skipped,
                    "mean_f1": mean_f1,
                }))
                .complete("Build complete"),
        )?;

        Ok(BuildSummary {
            run_id,
            split: split.clone(),
            processed,
            skipped,
            mean_f1,
            output_dir: split_dir,
        })
    }

    /// Process one performance; Ok(None) means it was skipped
    fn process_job(
        &self,
        run_id: Uuid,
        job: &PerformanceJob,
        split_dir: &Path,
        progress: f32,
    ) -> Result<Option<f64>, BuildError> {
        let performance_id = job.performance_id.as_str();

        let outcome = read_annotation_file(&job.annotation_path)
            .map_err(SampleError::from)
            .and_then(|annotation| {
                let mut rng = create_performance_rng(self.config.base_seed, performance_id);
                generate_prediction(
                    &annotation,
                    &self.config.severity,
                    &self.config.evaluation,
                    &mut rng,
                )
            });

        let (result, stats) = match outcome {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!(
                    "Skipping {} ({}): {}",
                    performance_id,
                    job.annotation_path.display(),
                    e
                );
                self.emit(
                    TraceBuilder::stage("skip")
                        .performance(performance_id)
                        .at(progress, e.to_string()),
                )?;
                return Ok(None);
            }
        };

        log::debug!(
            "{}: deleted {}, inserted {}, offset {}, noisy {}, f1 {:.4}",
            performance_id,
            stats.deleted,
            stats.inserted,
            stats.offset,
            stats.noisy,
            result.f1
        );

        let stored = catalog::store_prediction(split_dir, performance_id, &result.prediction)?;

        let record = PerformanceRecord {
            id: Uuid::new_v4(),
            run_id,
            performance_id: performance_id.to_string(),
            annotation_path: job.annotation_path.to_string_lossy().to_string(),
            output_path: stored.path.to_string_lossy().to_string(),
            output_sha256: stored.sha256,
            bytes: stored.bytes,
            beat_count: result.prediction.len() as i64,
            f1: result.f1,
            stats,
        };
        catalog::record_performance(&self.db, &record)?;

        self.emit(
            TraceBuilder::stage("store")
                .performance(performance_id)
                .data(serde_json::json!({
                    "f1": result.f1,
                    "beats": record.beat_count,
                    "stats": stats,
                    "output_path": record.output_path,
                }))
                .at(progress, "Stored prediction"),
        )?;

        Ok(Some(result.f1))
    }
}
