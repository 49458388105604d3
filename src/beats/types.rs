// Beat sequence types
// Ordered beat onset times in seconds, shared by annotations and predictions

use serde::{Deserialize, Serialize};

/// An ordered sequence of beat onset timestamps in seconds
///
/// Annotations are treated as read-only. Predictions are built fresh for each
/// run, mutated by the corruption stages, then sorted before cleanup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BeatSequence {
    times: Vec<f64>,
}

impl BeatSequence {
    /// Wrap a vector of timestamps without reordering it
    pub fn new(times: Vec<f64>) -> Self {
        BeatSequence { times }
    }

    /// Create an empty sequence
    pub fn empty() -> Self {
        BeatSequence { times: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Borrow the raw timestamps
    pub fn as_slice(&self) -> &[f64] {
        &self.times
    }

    /// Mutable access for in-place corruption stages
    pub fn as_mut_vec(&mut self) -> &mut Vec<f64> {
        &mut self.times
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.times
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.times.iter()
    }

    /// First beat, if any
    pub fn first(&self) -> Option<f64> {
        self.times.first().copied()
    }

    /// Last beat, if any
    pub fn last(&self) -> Option<f64> {
        self.times.last().copied()
    }

    /// Sort ascending using the IEEE total order
    pub fn sort(&mut self) {
        self.times.sort_by(|a, b| a.total_cmp(b));
    }

    /// Consume and return a sorted copy
    pub fn sorted(mut self) -> Self {
        self.sort();
        self
    }

    /// True when timestamps are non-decreasing
    pub fn is_sorted(&self) -> bool {
        self.times.windows(2).all(|w| w[0] <= w[1])
    }

    /// Smallest gap between consecutive beats
    /// Returns None for sequences with fewer than two beats
    pub fn min_gap(&self) -> Option<f64> {
        self.times
            .windows(2)
            .map(|w| w[1] - w[0])
            .reduce(f64::min)
    }

    /// True when every timestamp is finite
    pub fn all_finite(&self) -> bool {
        self.times.iter().all(|t| t.is_finite())
    }

    /// Largest timestamp, ignoring order
    pub fn max_time(&self) -> Option<f64> {
        self.times.iter().copied().reduce(f64::max)
    }
}

impl From<Vec<f64>> for BeatSequence {
    fn from(times: Vec<f64>) -> Self {
        BeatSequence::new(times)
    }
}

impl FromIterator<f64> for BeatSequence {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        BeatSequence::new(iter.into_iter().collect())
    }
}

impl AsRef<[f64]> for BeatSequence {
    fn as_ref(&self) -> &[f64] {
        &self.times
    }
}

impl<'a> IntoIterator for &'a BeatSequence {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.times.iter()
    }
}
