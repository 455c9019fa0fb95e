//! Playback engine module - runs a practice session as a background task.
//!
//! - PlaybackEngine builds and spawns a session
//! - SessionHandle controls it and collects the SessionReport
//! - EngineTiming holds the poll and tick cadences

mod engine;
mod handle;

pub use engine::{EngineTiming, PlaybackEngine};
pub use handle::{SessionHandle, SessionReport};
