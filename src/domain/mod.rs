//! Domain types for xue
//!
//! - LearningObject: one practice item with its stats
//! - Session types: modes, phases, engine states
//! - EngineEvent: progress and notifications sent to the control surface

pub mod event;
pub mod learning_object;
pub mod session;

pub use event::EngineEvent;
pub use learning_object::{CURRENT_SCHEMA_VERSION, Language, LearningObject, Stats};
pub use session::{EngineState, ItemOutcome, LanguageLabel, Phase, SessionMode};
