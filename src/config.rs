use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use xue::audio::AudioBackend;
use xue::domain::SessionMode;
use xue::runner::EngineTiming;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub library: LibraryConfig,
    pub engine: EngineConfig,
    pub audio: AudioConfig,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Containers for normal, chinese-first and focused practice
    pub objects_dir: PathBuf,
    /// Containers for pinyin practice
    pub pinyin_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub settings_file: PathBuf,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let data = data_dir();
        Self {
            objects_dir: data.join("learning_objects"),
            pinyin_dir: data.join("pinyin_practice"),
            scratch_dir: data.join("scratch"),
            settings_file: dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(env!("CARGO_PKG_NAME"))
                .join("settings.json"),
        }
    }
}

impl LibraryConfig {
    /// Directory a session in `mode` draws from
    pub fn dir_for(&self, mode: SessionMode) -> &Path {
        match mode {
            SessionMode::Pinyin => &self.pinyin_dir,
            _ => &self.objects_dir,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub audio_poll_ms: u64,
    pub progress_tick_ms: u64,
    pub min_hold_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let timing = EngineTiming::default();
        Self {
            audio_poll_ms: timing.audio_poll.as_millis() as u64,
            progress_tick_ms: timing.progress_tick.as_millis() as u64,
            min_hold_ms: timing.min_hold.as_millis() as u64,
        }
    }
}

impl EngineConfig {
    pub fn timing(&self) -> EngineTiming {
        EngineTiming {
            audio_poll: Duration::from_millis(self.audio_poll_ms.max(1)),
            progress_tick: Duration::from_millis(self.progress_tick_ms.max(1)),
            min_hold: Duration::from_millis(self.min_hold_ms),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub backend: AudioBackend,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            library: LibraryConfig::default(),
            engine: EngineConfig::default(),
            audio: AudioConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_engine() {
        let config = Config::default();
        assert_eq!(config.engine.timing(), EngineTiming::default());
        assert_eq!(config.audio.backend, AudioBackend::Rodio);
        assert!(config.library.settings_file.ends_with("settings.json"));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("xue.yml");
        fs::write(
            &path,
            "library:\n  objects_dir: /srv/cards\naudio:\n  backend: silent\nengine:\n  min_hold_ms: 500\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.library.objects_dir, PathBuf::from("/srv/cards"));
        assert_eq!(config.audio.backend, AudioBackend::Silent);
        assert_eq!(config.engine.timing().min_hold, Duration::from_millis(500));
        assert_eq!(config.engine.audio_poll_ms, 100);
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let temp = TempDir::new().unwrap();
        assert!(Config::load(Some(&temp.path().join("absent.yml"))).is_err());
    }

    #[test]
    fn test_dir_for_mode() {
        let library = LibraryConfig {
            objects_dir: PathBuf::from("objects"),
            pinyin_dir: PathBuf::from("pinyin"),
            ..LibraryConfig::default()
        };
        assert_eq!(library.dir_for(SessionMode::Pinyin), Path::new("pinyin"));
        assert_eq!(library.dir_for(SessionMode::Focused), Path::new("objects"));
    }
}
