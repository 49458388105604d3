// Corruption pipeline
// delete -> insert -> offset -> noise -> sort, on a private copy of the annotation

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::config::SeverityConfig;
use super::stages::{
    add_noise, apply_offset_errors, delete_beats, insert_beats, CorruptionError,
    CorruptionResult,
};
use crate::beats::BeatSequence;

/// How many beats each stage touched during one corruption
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorruptionStats {
    pub deleted: usize,
    pub inserted: usize,
    pub offset: usize,
    pub noisy: usize,
}

/// Build a degraded prediction from a ground-truth annotation
///
/// The stage order is fixed: later stages see the beats earlier stages
/// created, so inserted beats can be offset or jittered. The result is
/// sorted ascending.
pub fn corrupt<R: Rng + ?Sized>(
    annotation: &BeatSequence,
    config: &SeverityConfig,
    rng: &mut R,
) -> CorruptionResult<BeatSequence> {
    corrupt_with_stats(annotation, config, rng).map(|(beats, _)| beats)
}

/// Same as [`corrupt`], also reporting how many beats each stage touched
pub fn corrupt_with_stats<R: Rng + ?Sized>(
    annotation: &BeatSequence,
    config: &SeverityConfig,
    rng: &mut R,
) -> CorruptionResult<(BeatSequence, CorruptionStats)> {
    config.validate()?;

    if annotation.len() < 2 {
        return Err(CorruptionError::TooShort {
            len: annotation.len(),
        });
    }
    if !annotation.all_finite() {
        return Err(CorruptionError::NonFinite);
    }

    let mut prediction = annotation.clone();

    let stats = CorruptionStats {
        deleted: delete_beats(&mut prediction, config, rng)?,
        inserted: insert_beats(&mut prediction, config, rng)?,
        offset: apply_offset_errors(&mut prediction, config, rng)?,
        noisy: add_noise(&mut prediction, config, rng)?,
    };

    prediction.sort();
    Ok((prediction, stats))
}
