//! Random, weighted and sequential pickers.

use log::debug;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::Stats;
use crate::error::{Result, XueError};
use crate::store::Collection;

use super::Picker;

/// Laplace-smoothed weight: `(times_incorrect + 1) / (times_played + 1)`.
///
/// Never zero, so no item is starved.
pub fn weight(stats: &Stats) -> f64 {
    (f64::from(stats.times_incorrect) + 1.0) / (f64::from(stats.times_played) + 1.0)
}

/// Normalized weighted-selection probabilities, in collection order
pub fn selection_probabilities(collection: &Collection) -> Result<Vec<f64>> {
    if collection.is_empty() {
        return Err(XueError::EmptyCollection);
    }
    let weights: Vec<f64> = collection.iter().map(|o| weight(&o.stats)).collect();
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// Uniform choice, no state
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Picker for RandomPicker {
    fn select_next(&mut self, collection: &Collection) -> Result<usize> {
        if collection.is_empty() {
            return Err(XueError::EmptyCollection);
        }
        Ok(self.rng.random_range(0..collection.len()))
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Favors items with errors or few plays; reads live stats on every draw
pub struct WeightedPicker {
    rng: StdRng,
}

impl WeightedPicker {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for WeightedPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Picker for WeightedPicker {
    fn select_next(&mut self, collection: &Collection) -> Result<usize> {
        let probabilities = selection_probabilities(collection)?;
        let dist = WeightedIndex::new(&probabilities).map_err(|_| XueError::EmptyCollection)?;
        let index = dist.sample(&mut self.rng);
        debug!("Weighted pick {} (p={:.3})", index, probabilities[index]);
        Ok(index)
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// Round-robin over load order.
///
/// The cursor belongs to the collection it was built for; build a new one per
/// session.
pub struct SequentialPicker {
    cursor: usize,
    len: usize,
}

impl SequentialPicker {
    pub fn new(collection: &Collection) -> Self {
        Self {
            cursor: 0,
            len: collection.len(),
        }
    }

    /// Position the next call will return
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl Picker for SequentialPicker {
    fn select_next(&mut self, collection: &Collection) -> Result<usize> {
        if collection.is_empty() {
            return Err(XueError::EmptyCollection);
        }
        if collection.len() != self.len {
            debug!(
                "Sequential picker built for {} items, collection has {}",
                self.len,
                collection.len()
            );
            self.len = collection.len();
        }
        let index = self.cursor % self.len;
        self.cursor = (index + 1) % self.len;
        Ok(index)
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}
