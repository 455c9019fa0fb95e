//! Xue - a spaced-practice flashcard player
//!
//! Learning objects live in `.xue` zip containers holding a JSON metadata
//! record and audio clips. A session picks objects with a selection policy,
//! plays a two-phase prompt/answer sequence for each, and writes usage stats
//! back into the container.

pub mod audio;
pub mod coordination;
pub mod domain;
pub mod error;
pub mod runner;
pub mod scratch;
pub mod selection;
pub mod settings;
pub mod store;

pub use error::{Result, XueError};
