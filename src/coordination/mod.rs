//! Session coordination
//!
//! Latched command signals shared between the control surface and the
//! playback engine task.

pub mod signals;

pub use signals::*;
