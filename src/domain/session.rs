//! Session-level types: modes, phases, engine states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a practice session orders and times its phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Instruction clip first, then native
    #[default]
    Normal,
    /// Native clip first, then instruction
    ChineseFirst,
    /// Fixed phase-one hold from `instruction_delay`
    Pinyin,
    /// Normal ordering over flagged items only
    Focused,
}

impl SessionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::ChineseFirst => "chinese_first",
            Self::Pinyin => "pinyin",
            Self::Focused => "focused",
        }
    }

    /// Whether the native clip leads
    pub fn native_first(&self) -> bool {
        matches!(self, Self::ChineseFirst)
    }

    /// Direction label shown to the learner
    pub fn direction_label(&self) -> &'static str {
        if self.native_first() {
            "native→english"
        } else {
            "english→native"
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "normal" => Ok(Self::Normal),
            "chinese_first" => Ok(Self::ChineseFirst),
            "pinyin" => Ok(Self::Pinyin),
            "focused" => Ok(Self::Focused),
            other => Err(format!("unknown session mode: {}", other)),
        }
    }
}

/// One half of the two-part play sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Learning,
    Reviewing,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Reviewing => "reviewing",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the card is active during a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLabel {
    English,
    Native,
}

impl fmt::Display for LanguageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => f.write_str("english"),
            Self::Native => f.write_str("native"),
        }
    }
}

/// Playback engine state.
///
/// `Paused` is orthogonal and tracked separately by the command flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EngineState {
    Idle = 0,
    PickingNext = 1,
    PhaseOne = 2,
    HoldOne = 3,
    PhaseTwo = 4,
    HoldTwo = 5,
    Stopped = 6,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::PickingNext,
            2 => Self::PhaseOne,
            3 => Self::HoldOne,
            4 => Self::PhaseTwo,
            5 => Self::HoldTwo,
            _ => Self::Stopped,
        }
    }
}

/// How an item that reached write-back ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemOutcome {
    Completed,
    Skipped,
    Stopped,
}
