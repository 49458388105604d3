// Evaluation configuration
// Matching tolerance and boundary trimming for beat F-measure

use serde::{Deserialize, Serialize};

use super::metrics::EvaluationError;

/// Settings for scoring a prediction against its annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Half-width of the matching window in seconds
    pub tolerance: f64,

    /// Beats earlier than this time (seconds) are ignored when scoring
    pub min_beat_time: f64,

    /// Beats within this many seconds of the sequence's own last beat are ignored
    /// 0.0 disables end trimming
    pub tail_window: f64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            tolerance: 0.07,
            min_beat_time: 5.0,
            tail_window: 0.0,
        }
    }
}

impl EvaluationConfig {
    /// Score every beat, with no boundary trimming
    pub fn untrimmed() -> Self {
        EvaluationConfig {
            min_beat_time: 0.0,
            tail_window: 0.0,
            ..EvaluationConfig::default()
        }
    }

    pub fn validate(&self) -> Result<(), EvaluationError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(EvaluationError::InvalidConfig(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if !self.min_beat_time.is_finite() {
            return Err(EvaluationError::InvalidConfig(
                "min_beat_time must be finite".to_string(),
            ));
        }
        if !self.tail_window.is_finite() || self.tail_window < 0.0 {
            return Err(EvaluationError::InvalidConfig(format!(
                "tail_window must be finite and non-negative, got {}",
                self.tail_window
            )));
        }
        Ok(())
    }
}
