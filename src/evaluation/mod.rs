// Evaluation module
// Cleanup of corrupted predictions and beat F-measure scoring

pub mod cleanup;
pub mod config;
pub mod metrics;
pub mod scorer;

pub use cleanup::{clean_prediction, drop_negative_beats, remove_dense_beats};
pub use config::EvaluationConfig;
pub use metrics::{
    f_measure, f_score, match_events, trim_beats, validate_beats, validate_sorted, EvalResult,
    EvaluationError,
};
pub use scorer::{clean_and_score, score, EvaluationResult};
