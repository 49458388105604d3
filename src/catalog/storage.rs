// File system operations for generated predictions
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::beats::{format_beats, BeatSequence};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid performance id for a file name: {0:?}")]
    InvalidPerformanceId(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A prediction written to disk
#[derive(Debug, Clone)]
pub struct StoredPrediction {
    pub path: PathBuf,
    pub sha256: String,
    pub bytes: i64,
}

/// Get (and create) the output directory for a split
pub fn split_output_dir(output_dir: &Path, split: &str) -> StorageResult<PathBuf> {
    let dir = output_dir.join(split);
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Where the prediction for `performance_id` lives inside a split directory
pub fn prediction_path(split_dir: &Path, performance_id: &str) -> StorageResult<PathBuf> {
    if performance_id.is_empty()
        || performance_id.contains(&['/', '\\'][..])
        || performance_id == "."
        || performance_id == ".."
    {
        return Err(StorageError::InvalidPerformanceId(
            performance_id.to_string(),
        ));
    }
    Ok(split_dir.join(format!("{}.txt", performance_id)))
}

/// Write a cleaned prediction, one beat per line, and return its path and SHA256 hash
pub fn store_prediction(
    split_dir: &Path,
    performance_id: &str,
    beats: &BeatSequence,
) -> StorageResult<StoredPrediction> {
    let path = prediction_path(split_dir, performance_id)?;
    let data = format_beats(beats);

    let mut file = fs::File::create(&path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;

    Ok(StoredPrediction {
        path,
        sha256: calculate_sha256(data.as_bytes()),
        bytes: data.len() as i64,
    })
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
