//! Selection policies: which learning object plays next.
//!
//! Every policy implements [`Picker`]. Stateless policies ignore their own
//! state; `SequentialPicker` owns a cursor and is built fresh per session.

mod pickers;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::Collection;

pub use pickers::{RandomPicker, SequentialPicker, WeightedPicker, selection_probabilities, weight};

/// A selection strategy over a collection.
pub trait Picker: Send {
    /// Index of the next object to play.
    ///
    /// Returns `EmptyCollection` when there is nothing to choose from.
    fn select_next(&mut self, collection: &Collection) -> Result<usize>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Policy selector persisted in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PickerMode {
    #[default]
    Random,
    Weighted,
    Sequential,
}

impl PickerMode {
    /// Build the policy for a session over `collection`
    pub fn build(&self, collection: &Collection) -> Box<dyn Picker> {
        match self {
            Self::Random => Box::new(RandomPicker::new()),
            Self::Weighted => Box::new(WeightedPicker::new()),
            Self::Sequential => Box::new(SequentialPicker::new(collection)),
        }
    }

    /// Next mode in the settings cycle
    pub fn cycle(&self) -> Self {
        match self {
            Self::Random => Self::Weighted,
            Self::Weighted => Self::Sequential,
            Self::Sequential => Self::Random,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Weighted => "Weighted",
            Self::Sequential => "Sequential",
        }
    }
}

impl fmt::Display for PickerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickerMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "weighted" => Ok(Self::Weighted),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!("unknown picker mode: {}", other)),
        }
    }
}
