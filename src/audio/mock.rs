//! Scriptable output for tests and dry runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use super::AudioOutput;
use crate::error::{Result, XueError};

/// One call made against a `MockOutput`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    Load(PathBuf),
    Play,
    Pause,
    Resume,
    Stop,
    Unload,
}

/// Shared record of calls; survives the output being moved into an engine
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<AudioCall>>>);

impl CallLog {
    fn push(&self, call: AudioCall) {
        match self.0.lock() {
            Ok(mut calls) => calls.push(call),
            Err(poisoned) => poisoned.into_inner().push(call),
        }
    }

    pub fn snapshot(&self) -> Vec<AudioCall> {
        match self.0.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Asset file names in load order, scratch prefix removed
    pub fn loaded_assets(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .filter_map(|call| match call {
                AudioCall::Load(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
                _ => None,
            })
            .map(|name| match name.split_once('_') {
                Some((_, rest)) => rest.to_string(),
                None => name,
            })
            .collect()
    }

    pub fn count(&self, call: &AudioCall) -> usize {
        self.snapshot().iter().filter(|c| *c == call).count()
    }
}

/// Records calls and reports busy for a simulated clip length.
///
/// Time is measured with `tokio::time::Instant`, so tests running on a paused
/// clock advance clips deterministically.
#[derive(Debug, Clone)]
pub struct MockOutput {
    log: CallLog,
    default_length: Duration,
    lengths: HashMap<String, Duration>,
    failing: Vec<String>,
    loaded: Option<PathBuf>,
    playing_until: Option<Instant>,
    paused_remaining: Option<Duration>,
}

impl MockOutput {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            default_length: Duration::from_secs(1),
            lengths: HashMap::new(),
            failing: Vec::new(),
            loaded: None,
            playing_until: None,
            paused_remaining: None,
        }
    }

    /// Length of every clip without an override
    pub fn with_clip_length(mut self, length: Duration) -> Self {
        self.default_length = length;
        self
    }

    /// Length for clips whose file name ends with `suffix`
    pub fn with_clip(mut self, suffix: impl Into<String>, length: Duration) -> Self {
        self.lengths.insert(suffix.into(), length);
        self
    }

    /// Make `load` fail for clips whose file name ends with `suffix`
    pub fn failing_on(mut self, suffix: impl Into<String>) -> Self {
        self.failing.push(suffix.into());
        self
    }

    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    fn matches(path: &Path, suffix: &str) -> bool {
        path.file_name()
            .map(|n| n.to_string_lossy().ends_with(suffix))
            .unwrap_or(false)
    }

    fn length_of(&self, path: &Path) -> Duration {
        self.lengths
            .iter()
            .find(|(suffix, _)| Self::matches(path, suffix))
            .map(|(_, length)| *length)
            .unwrap_or(self.default_length)
    }
}

impl Default for MockOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for MockOutput {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.log.push(AudioCall::Load(path.to_path_buf()));
        if self.failing.iter().any(|s| Self::matches(path, s)) {
            return Err(XueError::PlaybackDevice(format!("cannot decode {}", path.display())));
        }
        self.loaded = Some(path.to_path_buf());
        self.playing_until = None;
        self.paused_remaining = None;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.log.push(AudioCall::Play);
        let Some(path) = &self.loaded else {
            return Err(XueError::PlaybackDevice("nothing loaded".to_string()));
        };
        self.playing_until = Some(Instant::now() + self.length_of(path));
        self.paused_remaining = None;
        Ok(())
    }

    fn is_busy(&self) -> bool {
        if self.paused_remaining.is_some() {
            return true;
        }
        self.playing_until.map(|t| Instant::now() < t).unwrap_or(false)
    }

    fn pause(&mut self) -> Result<()> {
        self.log.push(AudioCall::Pause);
        if let Some(until) = self.playing_until.take() {
            self.paused_remaining = Some(until.saturating_duration_since(Instant::now()));
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.log.push(AudioCall::Resume);
        if let Some(remaining) = self.paused_remaining.take() {
            self.playing_until = Some(Instant::now() + remaining);
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.log.push(AudioCall::Stop);
        self.playing_until = None;
        self.paused_remaining = None;
    }

    fn unload(&mut self) {
        self.log.push(AudioCall::Unload);
        self.loaded = None;
        self.playing_until = None;
        self.paused_remaining = None;
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
