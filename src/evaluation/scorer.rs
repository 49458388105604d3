// Cleanup and scoring
// Turns a corrupted prediction into a clean beat list plus its F-measure

use serde::{Deserialize, Serialize};

use super::cleanup::clean_prediction;
use super::config::EvaluationConfig;
use super::metrics::{
    f_measure, trim_beats, validate_beats, validate_sorted, EvalResult, EvaluationError,
};
use crate::beats::BeatSequence;
use crate::corruption::SeverityConfig;

/// Cleaned prediction and its score against the annotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Prediction after cleanup (not trimmed; trimming only affects scoring)
    pub prediction: BeatSequence,

    /// Beat F-measure [0.0, 1.0]
    pub f1: f64,
}

/// Score a prediction against an annotation after boundary trimming
///
/// Does no cleanup; use [`clean_and_score`] for corrupted predictions. Both
/// sequences must already be in increasing order.
pub fn score(
    prediction: &BeatSequence,
    annotation: &BeatSequence,
    config: &EvaluationConfig,
) -> EvalResult<f64> {
    config.validate()?;
    if annotation.is_empty() {
        return Err(EvaluationError::EmptyAnnotation);
    }
    validate_beats(annotation, "annotation")?;
    validate_beats(prediction, "prediction")?;
    validate_sorted(annotation, "annotation")?;
    validate_sorted(prediction, "prediction")?;

    let trimmed_annotation = trim_beats(annotation, config);
    let trimmed_prediction = trim_beats(prediction, config);

    Ok(f_measure(
        &trimmed_annotation,
        &trimmed_prediction,
        config.tolerance,
    ))
}

/// Repair a corrupted prediction and score it
///
/// 1. Remove beats closer than `60 / max_bpm` to their predecessor
/// 2. Drop negative beats
/// 3. Trim boundary beats from both sequences (scoring only)
/// 4. Compute the F-measure
///
/// An empty prediction after cleanup scores 0.0; an empty annotation is an error.
pub fn clean_and_score(
    prediction: BeatSequence,
    annotation: &BeatSequence,
    severity: &SeverityConfig,
    config: &EvaluationConfig,
) -> EvalResult<EvaluationResult> {
    severity
        .validate()
        .map_err(|e| EvaluationError::InvalidConfig(e.to_string()))?;
    if annotation.is_empty() {
        return Err(EvaluationError::EmptyAnnotation);
    }
    validate_beats(&prediction, "prediction")?;

    let cleaned = clean_prediction(prediction, severity.min_interval());
    let f1 = score(&cleaned, annotation, config)?;

    Ok(EvaluationResult {
        prediction: cleaned,
        f1,
    })
}
