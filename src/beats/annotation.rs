// Beat annotation files
// Reads tab-delimited annotation text (first column = beat time) and writes beat lists

use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use super::types::BeatSequence;

#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid beat time on line {line}: {content:?}")]
    InvalidLine { line: usize, content: String },

    #[error("Non-finite beat time on line {line}")]
    NonFinite { line: usize },
}

pub type AnnotationResult<T> = Result<T, AnnotationError>;

/// Parse annotation text into a beat sequence
///
/// One beat per line. Only the first tab-separated column is read; any
/// auxiliary columns (downbeat flags, bar numbers) are ignored. Blank lines
/// are skipped. The file order is kept as-is.
pub fn parse_annotation(text: &str) -> AnnotationResult<BeatSequence> {
    let mut times = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let first = trimmed.split('\t').next().unwrap_or("").trim();
        let time: f64 = first.parse().map_err(|_| AnnotationError::InvalidLine {
            line: idx + 1,
            content: line.to_string(),
        })?;

        if !time.is_finite() {
            return Err(AnnotationError::NonFinite { line: idx + 1 });
        }

        times.push(time);
    }

    Ok(BeatSequence::new(times))
}

/// Read and parse an annotation file from disk
pub fn read_annotation_file(path: &Path) -> AnnotationResult<BeatSequence> {
    let contents = fs::read_to_string(path)?;
    parse_annotation(&contents)
}

/// Render beats as text, one timestamp per line
pub fn format_beats(beats: &BeatSequence) -> String {
    let mut out = String::with_capacity(beats.len() * 12);
    for t in beats {
        out.push_str(&t.to_string());
        out.push('\n');
    }
    out
}

/// Write beats to a file in the same one-per-line layout the parser reads
pub fn write_beats_file(path: &Path, beats: &BeatSequence) -> AnnotationResult<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(format_beats(beats).as_bytes())?;
    file.flush()?;
    Ok(())
}
