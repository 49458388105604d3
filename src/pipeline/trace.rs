// Corpus build tracing
// Append-only JSONL log of run and per-performance progress

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during trace operations
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A single line in the build trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    /// RFC 3339 timestamp of when this entry was created
    pub timestamp: String,

    /// Build stage ("build", "store", "skip")
    pub stage: String,

    /// Performance this entry is about; None for run-level entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_id: Option<String>,

    /// Fraction of the split processed so far [0.0, 1.0]
    pub progress: f32,

    pub message: String,

    /// Stage-specific payload (corruption counts, F1, output path)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl TraceEntry {
    pub fn new(stage: String, progress: f32, message: String) -> Self {
        TraceEntry {
            timestamp: Utc::now().to_rfc3339(),
            stage,
            performance_id: None,
            progress: progress.clamp(0.0, 1.0),
            message,
            data: None,
        }
    }

    /// Serialize to JSON line (with newline)
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(format!("{}\n", json))
    }
}

/// Appends trace entries to a JSONL file, creating it on first write
pub struct TraceWriter {
    file_path: PathBuf,
}

impl TraceWriter {
    pub fn new(file_path: PathBuf) -> Self {
        TraceWriter { file_path }
    }

    pub fn write(&self, entry: &TraceEntry) -> Result<(), TraceError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)?;

        let json_line = entry.to_json_line()?;
        file.write_all(json_line.as_bytes())?;
        file.flush()?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Builder for trace entries
pub struct TraceBuilder {
    stage: String,
    performance_id: Option<String>,
    data: Option<serde_json::Value>,
}

impl TraceBuilder {
    pub fn stage(stage: impl Into<String>) -> Self {
        TraceBuilder {
            stage: stage.into(),
            performance_id: None,
            data: None,
        }
    }

    /// Attach the performance this entry is about
    pub fn performance(mut self, performance_id: impl Into<String>) -> Self {
        self.performance_id = Some(performance_id.into());
        self
    }

    /// Attach a structured payload
    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Finish the entry at the given progress
    pub fn at(self, progress: f32, message: impl Into<String>) -> TraceEntry {
        let mut entry = TraceEntry::new(self.stage, progress, message.into());
        entry.performance_id = self.performance_id;
        entry.data = self.data;
        entry
    }

    /// Finish the entry at progress 0.0
    pub fn start(self, message: impl Into<String>) -> TraceEntry {
        self.at(0.0, message)
    }

    /// Finish the entry at progress 1.0
    pub fn complete(self, message: impl Into<String>) -> TraceEntry {
        self.at(1.0, message)
    }
}

/// Read trace entries from a JSONL file
pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEntry>, TraceError> {
    let contents = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let entry: TraceEntry = serde_json::from_str(line)?;
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_progress_clamping() {
        let entry = TraceEntry::new("score".to_string(), -0.5, "x".to_string());
        assert_eq!(entry.progress, 0.0);

        let entry = TraceEntry::new("score".to_string(), 1.5, "x".to_string());
        assert_eq!(entry.progress, 1.0);
    }

    #[test]
    fn test_builder_attaches_performance_and_data() {
        let entry = TraceBuilder::stage("score")
            .performance("MAPS_ENSTDkCl_01")
            .data(serde_json::json!({ "f1": 0.82 }))
            .at(0.25, "Scored prediction");

        assert_eq!(entry.stage, "score");
        assert_eq!(entry.performance_id.as_deref(), Some("MAPS_ENSTDkCl_01"));
        assert_eq!(entry.progress, 0.25);
        assert_eq!(entry.data.unwrap()["f1"], 0.82);
    }

    #[test]
    fn test_run_level_entry_omits_performance() {
        let entry = TraceBuilder::stage("build").start("Building split test");
        let line = entry.to_json_line().unwrap();

        assert!(line.ends_with('\n'));
        assert!(!line.contains("performance_id"));
        assert!(!line.contains("\"data\""));
    }

    #[test]
    fn test_writer_appends_and_reads_back() {
        let temp_dir = TempDir::new().unwrap();
        let trace_path = temp_dir.path().join("build.jsonl");
        let writer = TraceWriter::new(trace_path.clone());

        writer
            .write(&TraceBuilder::stage("build").start("Start"))
            .unwrap();
        writer
            .write(&TraceBuilder::stage("store").performance("p1").at(0.5, "Stored"))
            .unwrap();
        writer
            .write(&TraceBuilder::stage("build").complete("Done"))
            .unwrap();

        let entries = read_trace_file(&trace_path).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].performance_id.as_deref(), Some("p1"));
        assert_eq!(entries[2].progress, 1.0);
        assert_eq!(writer.path(), trace_path.as_path());
    }
}
