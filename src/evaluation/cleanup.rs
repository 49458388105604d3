// Prediction cleanup
// Repairs implausibly dense beats and negative timestamps left behind by corruption

use crate::beats::BeatSequence;

/// Remove every beat that sits closer than `min_interval` to its predecessor
///
/// Decisions are made against the input as given and applied in one pass, so
/// a removed beat still counts as the predecessor of the beat after it. A run
/// of beats that are each too close to the previous one collapses to its
/// first beat. Expects sorted input.
pub fn remove_dense_beats(beats: &BeatSequence, min_interval: f64) -> BeatSequence {
    let times = beats.as_slice();

    times
        .iter()
        .enumerate()
        .filter(|&(i, &t)| i == 0 || t - times[i - 1] >= min_interval)
        .map(|(_, &t)| t)
        .collect()
}

/// Drop beats with negative timestamps
pub fn drop_negative_beats(beats: &BeatSequence) -> BeatSequence {
    beats.iter().copied().filter(|&t| t >= 0.0).collect()
}

/// Full cleanup: sort, thin out dense beats, then drop negatives
///
/// Every consecutive pair in the result is at least `min_interval` apart and
/// no beat is negative. Beats are only ever removed, never moved or added.
pub fn clean_prediction(prediction: BeatSequence, min_interval: f64) -> BeatSequence {
    let sorted = prediction.sorted();
    let sparse = remove_dense_beats(&sorted, min_interval);
    drop_negative_beats(&sparse)
}
