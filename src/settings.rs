//! Runtime practice settings shared by the control surface and the engine.
//!
//! `Settings` is the persisted record; `SettingsHandle` is the thread-safe
//! handle passed to both sides. Every mutation rewrites the whole file. The
//! engine takes a snapshot at the start of each hold, so edits land on the
//! next hold rather than mid-countdown.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, XueError};
use crate::selection::PickerMode;

const MAX_INSTRUCTION_DELAY: u32 = 20;
const MAX_QUIZ_INTERVAL: u32 = 59;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub picker_mode: PickerMode,
    /// Phase-one hold in pinyin practice, seconds
    pub instruction_delay: u32,
    /// Phase-two hold, seconds
    pub quiz_interval: u32,
    /// Display toggle for native script; the engine ignores it
    pub show_native: bool,
    /// Phase-one hold per native character outside pinyin practice
    pub seconds_per_char: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            picker_mode: PickerMode::Random,
            instruction_delay: 6,
            quiz_interval: 10,
            show_native: true,
            seconds_per_char: 1.0,
        }
    }
}

/// Shared, persisted settings.
///
/// Cloning is cheap and all clones see the same values.
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    path: Option<PathBuf>,
    inner: Arc<RwLock<Settings>>,
}

impl SettingsHandle {
    /// Settings that are never written to disk
    pub fn in_memory(settings: Settings) -> Self {
        Self {
            path: None,
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Load from `path`, falling back to defaults.
    ///
    /// A missing file is created with defaults; an unreadable one is logged
    /// and replaced in memory by defaults (the file is left alone until the
    /// next mutation).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let settings = if path.exists() {
            match fs::read_to_string(&path)
                .map_err(XueError::from)
                .and_then(|s| serde_json::from_str::<Settings>(&s).map_err(XueError::from))
            {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Failed to load settings from {}: {}. Using defaults.", path.display(), e);
                    Settings::default()
                }
            }
        } else {
            let settings = Settings::default();
            write_settings(&path, &settings)?;
            info!("Created default settings at {}", path.display());
            settings
        };

        Ok(Self {
            path: Some(path),
            inner: Arc::new(RwLock::new(settings)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> Settings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Apply `f`, then persist the whole record
    pub fn update<F>(&self, f: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let updated = {
            let mut guard = self
                .inner
                .write()
                .map_err(|e| XueError::Settings(e.to_string()))?;
            f(&mut *guard);
            guard.clone()
        };
        if let Some(path) = &self.path {
            write_settings(path, &updated)?;
        }
        Ok(updated)
    }

    /// Random → Weighted → Sequential → Random
    pub fn cycle_picker(&self) -> Result<PickerMode> {
        self.update(|s| s.picker_mode = s.picker_mode.cycle())
            .map(|s| s.picker_mode)
    }

    /// +1 second, wrapping back to 1 past the maximum
    pub fn bump_instruction_delay(&self) -> Result<u32> {
        self.update(|s| s.instruction_delay = bump(s.instruction_delay, MAX_INSTRUCTION_DELAY))
            .map(|s| s.instruction_delay)
    }

    /// +1 second, wrapping back to 1 past the maximum
    pub fn bump_quiz_interval(&self) -> Result<u32> {
        self.update(|s| s.quiz_interval = bump(s.quiz_interval, MAX_QUIZ_INTERVAL))
            .map(|s| s.quiz_interval)
    }

    pub fn toggle_show_native(&self) -> Result<bool> {
        self.update(|s| s.show_native = !s.show_native)
            .map(|s| s.show_native)
    }

    pub fn set_seconds_per_char(&self, value: f64) -> Result<f64> {
        if !(value.is_finite() && value > 0.0) {
            return Err(XueError::Settings(format!(
                "seconds_per_char must be positive, got {}",
                value
            )));
        }
        self.update(|s| s.seconds_per_char = value)
            .map(|s| s.seconds_per_char)
    }
}

fn bump(value: u32, max: u32) -> u32 {
    let next = value.saturating_add(1).max(1);
    if next > max { 1 } else { next }
}

fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}
