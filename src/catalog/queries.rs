// Catalog CRUD operations
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::db::{DbConnection, DbResult};
use super::models::{BuildRun, PerformanceRecord, RunStatus, RunWithPerformances};
use crate::corruption::{CorruptionStats, SeverityConfig};

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| conversion_error(idx, e))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| conversion_error(idx, e))
}

fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<usize> {
    let value: i64 = row.get(idx)?;
    Ok(value.max(0) as usize)
}

// ==================== RUN QUERIES ====================

const RUN_COLUMNS: &str =
    "id, created_at, split, base_seed, severity_json, status, mean_f1, processed, skipped";

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<BuildRun> {
    let base_seed: String = row.get(3)?;
    let severity_json: String = row.get(4)?;

    Ok(BuildRun {
        id: uuid_column(row, 0)?,
        created_at: timestamp_column(row, 1)?,
        split: row.get(2)?,
        base_seed: base_seed.parse().map_err(|e| conversion_error(3, e))?,
        severity: serde_json::from_str(&severity_json).map_err(|e| conversion_error(4, e))?,
        status: RunStatus::from_string(&row.get::<_, String>(5)?),
        mean_f1: row.get(6)?,
        processed: row.get(7)?,
        skipped: row.get(8)?,
    })
}

/// Create a new build run in the pending state
pub fn create_run(
    db: &DbConnection,
    split: String,
    base_seed: u64,
    severity: &SeverityConfig,
) -> DbResult<BuildRun> {
    let run = BuildRun {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        split,
        base_seed,
        severity: severity.clone(),
        status: RunStatus::Pending,
        mean_f1: None,
        processed: 0,
        skipped: 0,
    };

    let severity_json = serde_json::to_string(&run.severity)?;

    let conn = db.lock();
    conn.execute(
        "INSERT INTO build_runs (id, created_at, split, base_seed, severity_json, status, mean_f1, processed, skipped)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            run.id.to_string(),
            run.created_at.to_rfc3339(),
            run.split,
            run.base_seed.to_string(),
            severity_json,
            run.status.as_str(),
            run.mean_f1,
            run.processed,
            run.skipped,
        ],
    )?;

    Ok(run)
}

/// Get a run by ID
pub fn get_run(db: &DbConnection, id: &Uuid) -> DbResult<Option<BuildRun>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM build_runs WHERE id = ?1",
        RUN_COLUMNS
    ))?;

    match stmt.query_row([id.to_string()], run_from_row) {
        Ok(run) => Ok(Some(run)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// List all runs, newest first
pub fn list_runs(db: &DbConnection) -> DbResult<Vec<BuildRun>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM build_runs ORDER BY created_at DESC",
        RUN_COLUMNS
    ))?;

    let runs = stmt
        .query_map([], run_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(runs)
}

/// Update run status
pub fn update_run_status(db: &DbConnection, run_id: &Uuid, status: RunStatus) -> DbResult<()> {
    let conn = db.lock();
    conn.execute(
        "UPDATE build_runs SET status = ?1 WHERE id = ?2",
        params![status.as_str(), run_id.to_string()],
    )?;
    Ok(())
}

/// Mark a run complete with its final tallies
pub fn complete_run(
    db: &DbConnection,
    run_id: &Uuid,
    processed: i64,
    skipped: i64,
    mean_f1: Option<f64>,
) -> DbResult<()> {
    let conn = db.lock();
    conn.execute(
        "UPDATE build_runs SET status = ?1, processed = ?2, skipped = ?3, mean_f1 = ?4 WHERE id = ?5",
        params![
            RunStatus::Complete.as_str(),
            processed,
            skipped,
            mean_f1,
            run_id.to_string(),
        ],
    )?;
    Ok(())
}

// ==================== PERFORMANCE QUERIES ====================

fn performance_from_row(row: &Row<'_>) -> rusqlite::Result<PerformanceRecord> {
    Ok(PerformanceRecord {
        id: uuid_column(row, 0)?,
        run_id: uuid_column(row, 1)?,
        performance_id: row.get(2)?,
        annotation_path: row.get(3)?,
        output_path: row.get(4)?,
        output_sha256: row.get(5)?,
        bytes: row.get(6)?,
        beat_count: row.get(7)?,
        f1: row.get(8)?,
        stats: CorruptionStats {
            deleted: count_column(row, 9)?,
            inserted: count_column(row, 10)?,
            offset: count_column(row, 11)?,
            noisy: count_column(row, 12)?,
        },
    })
}

/// Record one generated prediction
pub fn record_performance(db: &DbConnection, record: &PerformanceRecord) -> DbResult<()> {
    let conn = db.lock();
    conn.execute(
        "INSERT INTO performances (id, run_id, performance_id, annotation_path, output_path, output_sha256,
                                   bytes, beat_count, f1, deleted, inserted, offset_count, noisy)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            record.id.to_string(),
            record.run_id.to_string(),
            record.performance_id,
            record.annotation_path,
            record.output_path,
            record.output_sha256,
            record.bytes,
            record.beat_count,
            record.f1,
            record.stats.deleted as i64,
            record.stats.inserted as i64,
            record.stats.offset as i64,
            record.stats.noisy as i64,
        ],
    )?;
    Ok(())
}

/// All performances recorded for a run, ordered by performance id
pub fn list_performances(db: &DbConnection, run_id: &Uuid) -> DbResult<Vec<PerformanceRecord>> {
    let conn = db.lock();
    let mut stmt = conn.prepare(
        "SELECT id, run_id, performance_id, annotation_path, output_path, output_sha256,
                bytes, beat_count, f1, deleted, inserted, offset_count, noisy
         FROM performances WHERE run_id = ?1
         ORDER BY performance_id",
    )?;

    let records = stmt
        .query_map([run_id.to_string()], performance_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

/// Get a run with all its performances
pub fn get_run_with_performances(
    db: &DbConnection,
    run_id: &Uuid,
) -> DbResult<Option<RunWithPerformances>> {
    let run = match get_run(db, run_id)? {
        Some(r) => r,
        None => return Ok(None),
    };

    let performances = list_performances(db, run_id)?;

    Ok(Some(RunWithPerformances { run, performances }))
}

/// Mean F1 across a run's recorded performances, None if there are none
pub fn mean_f1_for_run(db: &DbConnection, run_id: &Uuid) -> DbResult<Option<f64>> {
    let conn = db.lock();
    let mean = conn.query_row(
        "SELECT AVG(f1) FROM performances WHERE run_id = ?1",
        [run_id.to_string()],
        |row| row.get::<_, Option<f64>>(0),
    )?;
    Ok(mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::db::open_in_memory;

    fn record(run_id: Uuid, performance_id: &str, f1: f64) -> PerformanceRecord {
        PerformanceRecord {
            id: Uuid::new_v4(),
            run_id,
            performance_id: performance_id.to_string(),
            annotation_path: format!("/data/{}.txt", performance_id),
            output_path: format!("/out/test/{}.txt", performance_id),
            output_sha256: "00".repeat(32),
            bytes: 128,
            beat_count: 40,
            f1,
            stats: CorruptionStats {
                deleted: 3,
                inserted: 4,
                offset: 3,
                noisy: 16,
            },
        }
    }

    #[test]
    fn test_create_and_get_run() {
        let db = open_in_memory().unwrap();
        let severity = SeverityConfig::default();

        let run = create_run(&db, "test".to_string(), u64::MAX, &severity).unwrap();
        let fetched = get_run(&db, &run.id).unwrap().unwrap();

        assert_eq!(fetched.split, "test");
        assert_eq!(fetched.base_seed, u64::MAX);
        assert_eq!(fetched.severity, severity);
        assert_eq!(fetched.status, RunStatus::Pending);
        assert!(fetched.mean_f1.is_none());
    }

    #[test]
    fn test_get_missing_run() {
        let db = open_in_memory().unwrap();
        assert!(get_run(&db, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_complete_run_updates_tallies() {
        let db = open_in_memory().unwrap();
        let run = create_run(&db, "train".to_string(), 1, &SeverityConfig::default()).unwrap();

        update_run_status(&db, &run.id, RunStatus::Processing).unwrap();
        assert_eq!(
            get_run(&db, &run.id).unwrap().unwrap().status,
            RunStatus::Processing
        );

        complete_run(&db, &run.id, 10, 2, Some(0.75)).unwrap();
        let fetched = get_run(&db, &run.id).unwrap().unwrap();

        assert_eq!(fetched.status, RunStatus::Complete);
        assert_eq!(fetched.processed, 10);
        assert_eq!(fetched.skipped, 2);
        assert_eq!(fetched.mean_f1, Some(0.75));
        assert_eq!(list_runs(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_record_and_list_performances() {
        let db = open_in_memory().unwrap();
        let run = create_run(&db, "test".to_string(), 0, &SeverityConfig::default()).unwrap();

        record_performance(&db, &record(run.id, "perf_b", 0.5)).unwrap();
        record_performance(&db, &record(run.id, "perf_a", 1.0)).unwrap();

        let records = list_performances(&db, &run.id).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].performance_id, "perf_a");
        assert_eq!(records[0].stats.inserted, 4);

        let mean = mean_f1_for_run(&db, &run.id).unwrap().unwrap();
        assert!((mean - 0.75).abs() < 1e-12);

        let full = get_run_with_performances(&db, &run.id).unwrap().unwrap();
        assert_eq!(full.performances.len(), 2);
    }

    #[test]
    fn test_duplicate_performance_in_run_is_rejected() {
        let db = open_in_memory().unwrap();
        let run = create_run(&db, "test".to_string(), 0, &SeverityConfig::default()).unwrap();

        record_performance(&db, &record(run.id, "perf_a", 1.0)).unwrap();
        assert!(record_performance(&db, &record(run.id, "perf_a", 0.9)).is_err());
    }

    #[test]
    fn test_mean_f1_empty_run() {
        let db = open_in_memory().unwrap();
        let run = create_run(&db, "test".to_string(), 0, &SeverityConfig::default()).unwrap();
        assert!(mean_f1_for_run(&db, &run.id).unwrap().is_none());
    }

    #[test]
    fn test_performance_requires_existing_run() {
        let db = open_in_memory().unwrap();
        assert!(record_performance(&db, &record(Uuid::new_v4(), "orphan", 0.1)).is_err());
    }
}
