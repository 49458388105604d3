// Split metadata
// Reads <split>_metadata.csv and resolves each performance to its annotation file

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PERFORMANCE_ID_COLUMN: &str = "performance_id";
pub const FOLDER_COLUMN: &str = "folder";
pub const ANNOTATION_COLUMN: &str = "performance_annotation";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("IO error reading metadata: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata file has no header row")]
    Empty,

    #[error("Metadata is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("Metadata line {line} has {found} fields, expected at least {expected}")]
    ShortRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unterminated quoted field on metadata line {line}")]
    UnterminatedQuote { line: usize },
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// One row of the metadata table
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRow {
    pub performance_id: String,
    pub folder: String,
    pub performance_annotation: String,
}

/// A performance whose annotation file has been located
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceJob {
    /// Full id; output files are keyed by this
    pub performance_id: String,
    pub annotation_path: PathBuf,
}

/// Parsed metadata table for one split
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    rows: Vec<MetadataRow>,
}

/// Shorten a performance id to its first two `_`-separated parts
///
/// Several recordings of a piece share the annotation of their short id.
pub fn short_performance_id(performance_id: &str) -> String {
    performance_id
        .split('_')
        .take(2)
        .collect::<Vec<_>>()
        .join("_")
}

/// Split one CSV line, honouring double-quoted fields and `""` escapes
fn split_csv_line(line: &str, line_no: usize) -> MetadataResult<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    if in_quotes {
        return Err(MetadataError::UnterminatedQuote { line: line_no });
    }
    fields.push(current);
    Ok(fields)
}

impl MetadataTable {
    pub fn new(rows: Vec<MetadataRow>) -> Self {
        MetadataTable { rows }
    }

    /// Parse metadata CSV text; extra columns are ignored
    pub fn parse(text: &str) -> MetadataResult<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let (header_idx, header_line) = lines.next().ok_or(MetadataError::Empty)?;
        let header = split_csv_line(header_line.trim_end_matches('\r'), header_idx + 1)?;

        let column = |name: &'static str| {
            header
                .iter()
                .position(|h| h.trim() == name)
                .ok_or(MetadataError::MissingColumn(name))
        };
        let id_col = column(PERFORMANCE_ID_COLUMN)?;
        let folder_col = column(FOLDER_COLUMN)?;
        let annotation_col = column(ANNOTATION_COLUMN)?;
        let needed = id_col.max(folder_col).max(annotation_col) + 1;

        let mut rows = Vec::new();
        for (idx, line) in lines {
            let fields = split_csv_line(line.trim_end_matches('\r'), idx + 1)?;
            if fields.len() < needed {
                return Err(MetadataError::ShortRow {
                    line: idx + 1,
                    expected: needed,
                    found: fields.len(),
                });
            }

            rows.push(MetadataRow {
                performance_id: fields[id_col].trim().to_string(),
                folder: fields[folder_col].trim().to_string(),
                performance_annotation: fields[annotation_col].trim().to_string(),
            });
        }

        Ok(MetadataTable { rows })
    }

    pub fn load(path: &Path) -> MetadataResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn rows(&self) -> &[MetadataRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Locate the annotation file for every performance in the table
    ///
    /// Each performance is looked up by its short id; the matching row gives
    /// the folder and annotation file under `annotation_root`. Returns the
    /// resolved jobs (in table order) and the ids that had no matching row.
    /// A performance listed more than once yields a single job.
    pub fn resolve(&self, annotation_root: &Path) -> (Vec<PerformanceJob>, Vec<String>) {
        let by_id: HashMap<&str, &MetadataRow> = self
            .rows
            .iter()
            .map(|row| (row.performance_id.as_str(), row))
            .collect();

        let mut jobs = Vec::with_capacity(self.rows.len());
        let mut unresolved = Vec::new();
        let mut seen = HashSet::new();

        for row in &self.rows {
            if !seen.insert(row.performance_id.as_str()) {
                log::warn!("Duplicate metadata row for {}, ignoring", row.performance_id);
                continue;
            }

            let short_id = short_performance_id(&row.performance_id);
            match by_id.get(short_id.as_str()) {
                Some(source) => jobs.push(PerformanceJob {
                    performance_id: row.performance_id.clone(),
                    annotation_path: annotation_root
                        .join(&source.folder)
                        .join(&source.performance_annotation),
                }),
                None => unresolved.push(row.performance_id.clone()),
            }
        }

        (jobs, unresolved)
    }
}
