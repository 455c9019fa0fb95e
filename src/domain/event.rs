//! Events emitted by the playback engine to the control surface.

use std::path::PathBuf;
use std::sync::Arc;

use super::learning_object::LearningObject;
use super::session::{ItemOutcome, LanguageLabel, Phase};

/// Progress and notification events for the control surface.
///
/// `Progress` is advisory and emitted at the hold cadence; everything else is
/// emitted once per occurrence.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A new item was picked and its play counted in memory
    ItemStarted {
        object: Arc<LearningObject>,
        direction: &'static str,
    },
    /// A phase began (audio may or may not follow)
    PhaseStarted {
        object: Arc<LearningObject>,
        phase: Phase,
        language: LanguageLabel,
    },
    /// Hold countdown tick; `fraction_remaining` runs 1.0 → 0.0
    Progress {
        object: Arc<LearningObject>,
        fraction_remaining: f64,
        phase: Phase,
        language: LanguageLabel,
    },
    /// The current item's flag was flipped and persisted
    FlagToggled { path: PathBuf, flagged: bool },
    /// Flag toggle could not be persisted
    FlagSaveFailed { path: PathBuf, error: String },
    /// The item was abandoned; no stats were written
    ItemFailed { path: PathBuf, error: String },
    /// Stats could not be persisted; practice continues
    WriteBackFailed { path: PathBuf, error: String },
    /// Item reached write-back
    ItemFinished { path: PathBuf, outcome: ItemOutcome },
    /// The engine left its loop
    Stopped,
}

impl EngineEvent {
    /// Path of the item the event concerns, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::ItemStarted { object, .. }
            | Self::PhaseStarted { object, .. }
            | Self::Progress { object, .. } => Some(&object.path),
            Self::FlagToggled { path, .. }
            | Self::FlagSaveFailed { path, .. }
            | Self::ItemFailed { path, .. }
            | Self::WriteBackFailed { path, .. }
            | Self::ItemFinished { path, .. } => Some(path),
            Self::Stopped => None,
        }
    }

    /// Whether this is a non-fatal failure notification
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ItemFailed { .. } | Self::WriteBackFailed { .. } | Self::FlagSaveFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_path() {
        let object = Arc::new(LearningObject::new("a", "b", "c").at_path("x.xue"));
        let event = EngineEvent::Progress {
            object,
            fraction_remaining: 0.5,
            phase: Phase::Learning,
            language: LanguageLabel::English,
        };
        assert_eq!(event.path(), Some(&PathBuf::from("x.xue")));
        assert!(EngineEvent::Stopped.path().is_none());
    }

    #[test]
    fn test_is_failure() {
        let failed = EngineEvent::WriteBackFailed {
            path: PathBuf::from("x.xue"),
            error: "disk full".to_string(),
        };
        assert!(failed.is_failure());
        assert!(!EngineEvent::Stopped.is_failure());
    }
}
