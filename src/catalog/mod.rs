// Catalog module
// SQLite record of build runs and the predictions they produced, plus output files

pub mod db;
pub mod models;
pub mod queries;
pub mod storage;

pub use db::{init_db, open_in_memory, DbConnection, DbError, DbResult};
pub use models::{BuildRun, PerformanceRecord, RunStatus, RunWithPerformances};
pub use queries::{
    complete_run, create_run, get_run, get_run_with_performances, list_performances, list_runs,
    mean_f1_for_run, record_performance, update_run_status,
};
pub use storage::{
    calculate_sha256, prediction_path, split_output_dir, store_prediction, StorageError,
    StorageResult, StoredPrediction,
};
