// Corruption stages
// Deletion, midpoint insertion, large offsets and small jitter, each applied in place

use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::config::SeverityConfig;
use crate::beats::BeatSequence;

/// The four corruption stages, in the order the pipeline applies them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorruptionStage {
    Delete,
    Insert,
    Offset,
    Noise,
}

impl CorruptionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            CorruptionStage::Delete => "delete",
            CorruptionStage::Insert => "insert",
            CorruptionStage::Offset => "offset",
            CorruptionStage::Noise => "noise",
        }
    }
}

impl fmt::Display for CorruptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CorruptionError {
    #[error("Annotation needs at least 2 beats to corrupt, got {len}")]
    TooShort { len: usize },

    #[error("Annotation contains a non-finite beat time")]
    NonFinite,

    #[error("{stage} stage wants {requested} distinct indices but only {available} are available")]
    SelectionExceedsAvailable {
        stage: CorruptionStage,
        requested: usize,
        available: usize,
    },

    #[error("Invalid severity config: {0}")]
    InvalidConfig(String),
}

pub type CorruptionResult<T> = Result<T, CorruptionError>;

/// Pick `count` distinct indices from `0..available`, uniformly, without replacement
///
/// Fails instead of clamping when the request cannot be satisfied.
pub fn choose_indices<R: Rng + ?Sized>(
    rng: &mut R,
    stage: CorruptionStage,
    available: usize,
    count: usize,
) -> CorruptionResult<Vec<usize>> {
    if count > available {
        return Err(CorruptionError::SelectionExceedsAvailable {
            stage,
            requested: count,
            available,
        });
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    Ok(index::sample(rng, available, count).into_vec())
}

/// Remove `floor(len * error_ratio * delete_ratio)` randomly chosen beats
/// Returns the number of beats removed
pub fn delete_beats<R: Rng + ?Sized>(
    beats: &mut BeatSequence,
    config: &SeverityConfig,
    rng: &mut R,
) -> CorruptionResult<usize> {
    let len = beats.len();
    let count = config.delete_count(len);
    let picked = choose_indices(rng, CorruptionStage::Delete, len, count)?;
    if picked.is_empty() {
        return Ok(0);
    }

    let mut doomed = vec![false; len];
    for idx in picked {
        doomed[idx] = true;
    }

    let times = beats.as_mut_vec();
    let mut position = 0;
    times.retain(|_| {
        let keep = !doomed[position];
        position += 1;
        keep
    });

    Ok(count)
}

/// Insert midpoint beats after randomly chosen adjacent pairs
///
/// Pairs are chosen from `[0, len - 2]`. Each new beat sits halfway between
/// the pair it was made from, using the timestamps from before this stage.
/// Returns the number of beats inserted.
pub fn insert_beats<R: Rng + ?Sized>(
    beats: &mut BeatSequence,
    config: &SeverityConfig,
    rng: &mut R,
) -> CorruptionResult<usize> {
    let len = beats.len();
    let count = config.insert_count(len);
    let pairs = len.saturating_sub(1);
    let picked = choose_indices(rng, CorruptionStage::Insert, pairs, count)?;
    if picked.is_empty() {
        return Ok(0);
    }

    let mut split_after = vec![false; pairs];
    for idx in picked {
        split_after[idx] = true;
    }

    let original = beats.as_slice();
    let mut expanded = Vec::with_capacity(len + count);
    for i in 0..len {
        expanded.push(original[i]);
        if i < pairs && split_after[i] {
            expanded.push((original[i] + original[i + 1]) / 2.0);
        }
    }

    *beats.as_mut_vec() = expanded;
    Ok(count)
}

/// Shift randomly chosen beats by a large signed offset
///
/// Magnitudes are uniform in `[offset_min, offset_min + offset_span)`, and
/// the sign is a fair coin flip.
/// Returns the number of beats shifted.
pub fn apply_offset_errors<R: Rng + ?Sized>(
    beats: &mut BeatSequence,
    config: &SeverityConfig,
    rng: &mut R,
) -> CorruptionResult<usize> {
    let len = beats.len();
    let count = config.offset_count(len);
    let picked = choose_indices(rng, CorruptionStage::Offset, len, count)?;

    let times = beats.as_mut_vec();
    for idx in picked {
        let magnitude = rng.gen::<f64>() * config.offset_span + config.offset_min;
        let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        times[idx] += magnitude * sign;
    }

    Ok(count)
}

/// Add small uniform jitter to randomly chosen beats
///
/// The count is `floor(len * noise_ratio)`; it is not scaled by the error
/// budget. Values are uniform in `[-noise_amplitude, noise_amplitude)`.
/// Returns the number of beats jittered.
pub fn add_noise<R: Rng + ?Sized>(
    beats: &mut BeatSequence,
    config: &SeverityConfig,
    rng: &mut R,
) -> CorruptionResult<usize> {
    let len = beats.len();
    let count = config.noise_count(len);
    let picked = choose_indices(rng, CorruptionStage::Noise, len, count)?;

    let width = config.noise_amplitude * 2.0;
    let times = beats.as_mut_vec();
    for idx in picked {
        times[idx] += rng.gen::<f64>() * width - config.noise_amplitude;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_rng;
    use std::collections::HashSet;

    fn only(stage: CorruptionStage, ratio: f64) -> SeverityConfig {
        let mut config = SeverityConfig::disabled();
        config.error_ratio = 1.0;
        match stage {
            CorruptionStage::Delete => config.delete_ratio = ratio,
            CorruptionStage::Insert => config.insert_ratio = ratio,
            CorruptionStage::Offset => config.offset_ratio = ratio,
            CorruptionStage::Noise => config.noise_ratio = ratio,
        }
        config
    }

    fn grid(n: usize) -> BeatSequence {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_choose_indices_distinct_and_in_range() {
        let mut rng = create_rng(1);
        let picked = choose_indices(&mut rng, CorruptionStage::Delete, 20, 15).unwrap();

        assert_eq!(picked.len(), 15);
        let unique: HashSet<usize> = picked.iter().copied().collect();
        assert_eq!(unique.len(), 15);
        assert!(picked.iter().all(|&i| i < 20));
    }

    #[test]
    fn test_choose_indices_rejects_over_budget() {
        let mut rng = create_rng(1);
        let result = choose_indices(&mut rng, CorruptionStage::Insert, 3, 4);

        match result {
            Err(CorruptionError::SelectionExceedsAvailable {
                stage,
                requested,
                available,
            }) => {
                assert_eq!(stage, CorruptionStage::Insert);
                assert_eq!(requested, 4);
                assert_eq!(available, 3);
            }
            other => panic!("expected SelectionExceedsAvailable, got {:?}", other),
        }
    }

    #[test]
    fn test_choose_all_indices() {
        let mut rng = create_rng(9);
        let mut picked = choose_indices(&mut rng, CorruptionStage::Noise, 5, 5).unwrap();
        picked.sort_unstable();
        assert_eq!(picked, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_delete_beats_removes_exact_count() {
        let mut rng = create_rng(3);
        let mut beats = grid(10);
        let config = only(CorruptionStage::Delete, 0.2);

        let removed = delete_beats(&mut beats, &config, &mut rng).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(beats.len(), 8);
        assert!(beats.is_sorted());
        let original: Vec<f64> = grid(10).into_vec();
        assert!(beats.iter().all(|t| original.contains(t)));
    }

    #[test]
    fn test_insert_beats_places_midpoints() {
        let mut rng = create_rng(5);
        let mut beats = grid(10);
        let config = only(CorruptionStage::Insert, 0.5);

        let inserted = insert_beats(&mut beats, &config, &mut rng).unwrap();

        assert_eq!(inserted, 5);
        assert_eq!(beats.len(), 15);
        // Midpoints land between their neighbours, so order is preserved
        assert!(beats.is_sorted());
        let halves = beats.iter().filter(|t| t.fract() == 0.5).count();
        assert_eq!(halves, 5);
    }

    #[test]
    fn test_insert_never_picks_last_beat() {
        // 2 beats -> 1 pair; every insertion must land between them
        let config = only(CorruptionStage::Insert, 0.5);
        for seed in 0..20 {
            let mut rng = create_rng(seed);
            let mut beats = BeatSequence::new(vec![1.0, 2.0]);
            insert_beats(&mut beats, &config, &mut rng).unwrap();
            assert_eq!(beats.as_slice(), &[1.0, 1.5, 2.0]);
        }
    }

    #[test]
    fn test_insert_over_budget_fails() {
        // 3 beats -> 2 pairs, ratio 1.0 asks for 3
        let mut rng = create_rng(5);
        let mut beats = grid(3);
        let config = only(CorruptionStage::Insert, 1.0);

        assert!(matches!(
            insert_beats(&mut beats, &config, &mut rng),
            Err(CorruptionError::SelectionExceedsAvailable { available: 2, .. })
        ));
    }

    #[test]
    fn test_offset_magnitudes_within_band() {
        let mut rng = create_rng(11);
        let original = grid(50);
        let mut beats = original.clone();
        let config = only(CorruptionStage::Offset, 1.0);

        let shifted = apply_offset_errors(&mut beats, &config, &mut rng).unwrap();
        assert_eq!(shifted, 50);

        let mut saw_positive = false;
        let mut saw_negative = false;
        for (before, after) in original.iter().zip(beats.iter()) {
            let delta = after - before;
            assert!(delta.abs() >= 0.07 - 1e-9 && delta.abs() < 0.27 + 1e-9);
            saw_positive |= delta > 0.0;
            saw_negative |= delta < 0.0;
        }
        assert!(saw_positive && saw_negative);
    }

    #[test]
    fn test_noise_within_band_and_count() {
        let mut rng = create_rng(13);
        let original = grid(40);
        let mut beats = original.clone();
        let mut config = SeverityConfig::disabled();
        config.noise_ratio = 0.5;

        let jittered = add_noise(&mut beats, &config, &mut rng).unwrap();
        assert_eq!(jittered, 20);

        let mut touched = 0;
        for (before, after) in original.iter().zip(beats.iter()) {
            let delta = after - before;
            assert!(delta.abs() <= 0.07 + 1e-9);
            if delta != 0.0 {
                touched += 1;
            }
        }
        assert!(touched <= 20);
    }

    #[test]
    fn test_zero_counts_leave_sequence_unchanged() {
        let mut rng = create_rng(17);
        let original = grid(12);
        let mut beats = original.clone();
        let config = SeverityConfig::disabled();

        assert_eq!(delete_beats(&mut beats, &config, &mut rng).unwrap(), 0);
        assert_eq!(insert_beats(&mut beats, &config, &mut rng).unwrap(), 0);
        assert_eq!(apply_offset_errors(&mut beats, &config, &mut rng).unwrap(), 0);
        assert_eq!(add_noise(&mut beats, &config, &mut rng).unwrap(), 0);
        assert_eq!(beats, original);
    }
}
