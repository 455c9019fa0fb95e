//! The learning object record and its usage statistics.
//!
//! Field names on disk follow the `.xue` metadata layout (`english`, `pinyin`,
//! `native`, ...). Keys this version doesn't know about are carried in
//! `extra` so a write-back never drops them.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Schema version written by current tooling
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

fn legacy_schema_version() -> u32 {
    1
}

/// Language of the native text; affects rendering only
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    #[default]
    Chinese,
    French,
    /// Any other language tag, kept verbatim
    Other(String),
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        match value.as_str() {
            "chinese" => Self::Chinese,
            "french" => Self::French,
            _ => Self::Other(value),
        }
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        match value {
            Language::Chinese => "chinese".to_string(),
            Language::French => "french".to_string(),
            Language::Other(s) => s,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chinese => write!(f, "chinese"),
            Self::French => write!(f, "french"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Aggregate usage counters for one learning object
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub times_played: u32,
    pub times_correct: u32,
    /// Nothing in the player increments this yet; a quiz-scoring front end owns it
    pub times_incorrect: u32,
    #[serde(deserialize_with = "deserialize_last_played")]
    pub last_played: Option<DateTime<Utc>>,
}

/// Accepts RFC 3339 as well as the naive local ISO stamps older tooling wrote.
fn deserialize_last_played<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| serde::de::Error::custom(format!("invalid last_played '{}': {}", raw, e)))?;

    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive));
    Ok(Some(local))
}

/// One practice item: prompt, answer, native text and stats.
///
/// The container path is the identity and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningObject {
    #[serde(skip)]
    pub path: PathBuf,

    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,

    /// Shown during the first phase
    #[serde(rename = "english", default)]
    pub prompt_text: String,

    /// Romanized answer
    #[serde(rename = "pinyin", default)]
    pub answer_text: String,

    /// Answer in native script
    #[serde(rename = "native", default)]
    pub native_text: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub flagged: bool,

    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub stats: Stats,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LearningObject {
    /// Create a fresh record at the current schema version
    pub fn new(
        prompt_text: impl Into<String>,
        answer_text: impl Into<String>,
        native_text: impl Into<String>,
    ) -> Self {
        Self {
            path: PathBuf::new(),
            schema_version: CURRENT_SCHEMA_VERSION,
            prompt_text: prompt_text.into(),
            answer_text: answer_text.into(),
            native_text: native_text.into(),
            tags: Vec::new(),
            flagged: false,
            language: Language::default(),
            stats: Stats::default(),
            extra: Map::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn at_path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Count one play and stamp the time
    pub fn record_play(&mut self, now: DateTime<Utc>) {
        self.stats.times_played = self.stats.times_played.saturating_add(1);
        self.stats.last_played = Some(now);
    }

    /// Flip the user flag, returning the new value
    pub fn toggle_flag(&mut self) -> bool {
        self.flagged = !self.flagged;
        self.flagged
    }

    /// Character count of the trimmed native text; drives phase-one hold time
    pub fn native_len(&self) -> usize {
        self.native_text.trim().chars().count()
    }

    /// Short label for logs and listings
    pub fn display_name(&self) -> String {
        if !self.prompt_text.is_empty() {
            self.prompt_text.clone()
        } else {
            self.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        }
    }

    /// Semantic equality ignoring the storage path
    pub fn same_content(&self, other: &Self) -> bool {
        let mut a = self.clone();
        a.path = PathBuf::new();
        let mut b = other.clone();
        b.path = PathBuf::new();
        a == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_record() {
        let value = json!({
            "schema_version": 2,
            "english": "hello",
            "pinyin": "nǐ hǎo",
            "native": "你好",
            "tags": ["greeting", "hsk1"],
            "flagged": true,
            "language": "chinese",
            "stats": {
                "times_played": 4,
                "times_correct": 1,
                "times_incorrect": 2,
                "last_played": "2025-03-01T08:30:00Z"
            }
        });

        let lo: LearningObject = serde_json::from_value(value).unwrap();
        assert_eq!(lo.prompt_text, "hello");
        assert_eq!(lo.answer_text, "nǐ hǎo");
        assert_eq!(lo.native_text, "你好");
        assert_eq!(lo.tags, vec!["greeting", "hsk1"]);
        assert!(lo.flagged);
        assert_eq!(lo.stats.times_played, 4);
        assert_eq!(lo.stats.times_incorrect, 2);
        assert!(lo.stats.last_played.is_some());
        assert!(lo.extra.is_empty());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let lo: LearningObject = serde_json::from_value(json!({ "english": "cat" })).unwrap();
        assert_eq!(lo.schema_version, 1);
        assert_eq!(lo.native_text, "");
        assert!(lo.tags.is_empty());
        assert!(!lo.flagged);
        assert_eq!(lo.language, Language::Chinese);
        assert_eq!(lo.stats, Stats::default());
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let value = json!({
            "english": "dog",
            "delay_between_instruction_and_native": 2,
            "stats": { "times_played": 1 }
        });
        let lo: LearningObject = serde_json::from_value(value).unwrap();
        assert_eq!(lo.extra.get("delay_between_instruction_and_native"), Some(&json!(2)));

        let back = serde_json::to_value(&lo).unwrap();
        assert_eq!(back["delay_between_instruction_and_native"], json!(2));
        assert_eq!(back["english"], json!("dog"));
        assert!(back.get("path").is_none());
    }

    #[test]
    fn test_legacy_naive_last_played() {
        let value = json!({ "stats": { "times_played": 3, "last_played": "2024-05-01T10:00:00.123456" } });
        let lo: LearningObject = serde_json::from_value(value).unwrap();
        assert!(lo.stats.last_played.is_some());
    }

    #[test]
    fn test_garbage_last_played_is_rejected() {
        let value = json!({ "stats": { "last_played": "yesterday-ish" } });
        assert!(serde_json::from_value::<LearningObject>(value).is_err());
    }

    #[test]
    fn test_language_roundtrip_keeps_unknown() {
        let lo: LearningObject = serde_json::from_value(json!({ "language": "japanese" })).unwrap();
        assert_eq!(lo.language, Language::Other("japanese".to_string()));
        let back = serde_json::to_value(&lo).unwrap();
        assert_eq!(back["language"], json!("japanese"));

        let fr: LearningObject = serde_json::from_value(json!({ "language": "french" })).unwrap();
        assert_eq!(fr.language, Language::French);
        assert_eq!(fr.language.to_string(), "french");
    }

    #[test]
    fn test_record_play() {
        let mut lo = LearningObject::new("hello", "ni hao", "你好");
        let now = Utc::now();
        lo.record_play(now);
        lo.record_play(now);
        assert_eq!(lo.stats.times_played, 2);
        assert_eq!(lo.stats.last_played, Some(now));
        assert_eq!(lo.stats.times_incorrect, 0);
    }

    #[test]
    fn test_toggle_flag() {
        let mut lo = LearningObject::new("a", "b", "c");
        assert!(lo.toggle_flag());
        assert!(!lo.toggle_flag());
    }

    #[test]
    fn test_native_len_counts_chars() {
        let lo = LearningObject::new("thank you", "xiè xie", "  谢谢  ");
        assert_eq!(lo.native_len(), 2);
    }

    #[test]
    fn test_same_content_ignores_path() {
        let a = LearningObject::new("a", "b", "c").at_path("x.xue");
        let b = LearningObject::new("a", "b", "c").at_path("y.xue");
        assert!(a.same_content(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_name_falls_back_to_file_stem() {
        let lo = LearningObject::new("", "", "").at_path("objects/tone_ma3.xue");
        assert_eq!(lo.display_name(), "tone_ma3");
    }
}
