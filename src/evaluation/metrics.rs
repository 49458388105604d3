// Beat tracking metrics
// Boundary trimming, tolerance-window matching and F-measure

use thiserror::Error;

use super::config::EvaluationConfig;
use crate::beats::BeatSequence;

/// Beat times above this are almost certainly milliseconds, not seconds
pub const MAX_BEAT_TIME_SECS: f64 = 30000.0;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Annotation is empty; recall is undefined")]
    EmptyAnnotation,

    #[error("{which} contains a non-finite beat time")]
    NonFinite { which: &'static str },

    #[error("{which} has a beat at {time}s; beat times should be in seconds")]
    NotInSeconds { which: &'static str, time: f64 },

    #[error("{which} beat times are not in increasing order")]
    Unsorted { which: &'static str },

    #[error("Invalid evaluation config: {0}")]
    InvalidConfig(String),
}

pub type EvalResult<T> = Result<T, EvaluationError>;

/// Check that a beat sequence is finite and plausibly measured in seconds
pub fn validate_beats(beats: &BeatSequence, which: &'static str) -> EvalResult<()> {
    if !beats.all_finite() {
        return Err(EvaluationError::NonFinite { which });
    }
    if let Some(max) = beats.max_time() {
        if max > MAX_BEAT_TIME_SECS {
            return Err(EvaluationError::NotInSeconds { which, time: max });
        }
    }
    Ok(())
}

/// Check that beat times never decrease; equal neighbours are allowed
pub fn validate_sorted(beats: &BeatSequence, which: &'static str) -> EvalResult<()> {
    if !beats.is_sorted() {
        return Err(EvaluationError::Unsorted { which });
    }
    Ok(())
}

/// Drop beats near the boundaries of a sequence before scoring
///
/// Beats before `min_beat_time` are removed. When `tail_window` is positive,
/// beats later than `last - tail_window` are removed too, where `last` is the
/// sequence's own final beat.
pub fn trim_beats(beats: &BeatSequence, config: &EvaluationConfig) -> BeatSequence {
    let tail_cutoff = match beats.max_time() {
        Some(last) if config.tail_window > 0.0 => last - config.tail_window,
        _ => f64::INFINITY,
    };

    beats
        .iter()
        .copied()
        .filter(|&t| t >= config.min_beat_time && t <= tail_cutoff)
        .collect()
}

/// Match reference and estimated beats one-to-one within `tolerance`
///
/// Both slices must be sorted ascending. A single forward sweep pairs the
/// earliest unmatched beats whenever they fall within the window, which gives
/// a maximum-size matching because every window has the same width.
/// Returns `(reference_index, estimated_index)` pairs in time order.
pub fn match_events(reference: &[f64], estimated: &[f64], tolerance: f64) -> Vec<(usize, usize)> {
    let mut matches = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < reference.len() && j < estimated.len() {
        let diff = estimated[j] - reference[i];
        if diff.abs() <= tolerance {
            matches.push((i, j));
            i += 1;
            j += 1;
        } else if diff < 0.0 {
            // Estimate is too early for this and every later reference beat
            j += 1;
        } else {
            i += 1;
        }
    }

    matches
}

/// Harmonic mean of precision and recall, 0 when both are 0
pub fn f_score(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / (precision + recall)
}

/// Beat-tracking F-measure of `estimated` against `reference`
///
/// Inputs are sorted internally. Returns 0.0 when either side is empty.
pub fn f_measure(reference: &BeatSequence, estimated: &BeatSequence, tolerance: f64) -> f64 {
    if reference.is_empty() || estimated.is_empty() {
        return 0.0;
    }

    let reference = reference.clone().sorted();
    let estimated = estimated.clone().sorted();

    let matched = match_events(reference.as_slice(), estimated.as_slice(), tolerance).len();
    let precision = matched as f64 / estimated.len() as f64;
    let recall = matched as f64 / reference.len() as f64;

    f_score(precision, recall)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn beats(times: &[f64]) -> BeatSequence {
        BeatSequence::new(times.to_vec())
    }

    #[test]
    fn test_trim_drops_leading_beats() {
        let config = EvaluationConfig::default();
        let trimmed = trim_beats(&beats(&[1.0, 4.99, 5.0, 6.0, 7.0]), &config);
        assert_eq!(trimmed.as_slice(), &[5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_trim_tail_window_relative_to_last_beat() {
        let config = EvaluationConfig {
            min_beat_time: 0.0,
            tail_window: 1.5,
            ..EvaluationConfig::default()
        };
        let trimmed = trim_beats(&beats(&[1.0, 2.0, 3.0, 4.0, 5.0]), &config);
        assert_eq!(trimmed.as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_match_events_within_tolerance() {
        let reference = [1.0, 2.0, 3.0, 4.0];
        let estimated = [1.05, 2.5, 2.95, 4.06];

        let matches = match_events(&reference, &estimated, 0.07);

        assert_eq!(matches, vec![(0, 0), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_match_events_is_one_to_one() {
        // Two estimates near the same reference beat only count once
        let matches = match_events(&[1.0], &[0.98, 1.02], 0.07);
        assert_eq!(matches.len(), 1);

        let matches = match_events(&[0.98, 1.02], &[1.0], 0.07);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_match_events_skips_early_estimate() {
        // The first estimate is too early for anything; the sweep must not stall
        let matches = match_events(&[1.0, 2.0], &[0.5, 1.0, 2.0], 0.07);
        assert_eq!(matches, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_f_measure_identical() {
        let reference = beats(&[1.0, 2.0, 3.0]);
        assert_eq!(f_measure(&reference, &reference, 0.07), 1.0);
    }

    #[test]
    fn test_f_measure_partial() {
        let reference = beats(&[1.0, 2.0, 3.0, 4.0]);
        let estimated = beats(&[1.0, 2.0]);

        // precision 1.0, recall 0.5 -> 2/3
        let f = f_measure(&reference, &estimated, 0.07);
        assert!((f - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_f_measure_empty_is_zero() {
        let reference = beats(&[1.0, 2.0]);
        assert_eq!(f_measure(&reference, &BeatSequence::empty(), 0.07), 0.0);
        assert_eq!(f_measure(&BeatSequence::empty(), &reference, 0.07), 0.0);
    }

    #[test]
    fn test_f_measure_no_matches_is_zero() {
        let f = f_measure(&beats(&[1.0, 2.0]), &beats(&[1.5, 2.5]), 0.07);
        assert_eq!(f, 0.0);
    }

    #[test]
    fn test_validate_beats_catches_milliseconds() {
        let result = validate_beats(&beats(&[500.0, 31000.0]), "annotation");
        assert!(matches!(
            result,
            Err(EvaluationError::NotInSeconds { which: "annotation", .. })
        ));
        assert!(validate_beats(&beats(&[0.5, 1.0]), "annotation").is_ok());
    }

    #[test]
    fn test_validate_sorted() {
        assert!(validate_sorted(&beats(&[1.0, 1.0, 2.0]), "annotation").is_ok());
        assert!(matches!(
            validate_sorted(&beats(&[1.0, 3.0, 2.0]), "estimate"),
            Err(EvaluationError::Unsorted { which: "estimate" })
        ));
    }
}
