//! Playback engine implementation.
//!
//! Each item runs the same sequence:
//!
//! 1. Pick an item and count the play in memory
//! 2. Phase one: play the leading clip (if any), then hold
//! 3. Phase two: play the trailing clip (if any), then hold
//! 4. Write the record back to its container and sweep the scratch directory
//!
//! Commands are observed at every audio poll and every progress tick. Skip
//! and stop jump straight to write-back; a failed item skips it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::audio::AudioOutput;
use crate::coordination::ControlSignals;
use crate::domain::{EngineEvent, EngineState, ItemOutcome, LanguageLabel, LearningObject, Phase, SessionMode, Stats};
use crate::error::{Result, XueError};
use crate::scratch;
use crate::selection::Picker;
use crate::settings::{Settings, SettingsHandle};
use crate::store::{self, Collection, assets};

use super::handle::{SessionHandle, SessionReport};

/// Poll and tick cadences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineTiming {
    /// How often a playing clip is checked for completion and commands
    pub audio_poll: Duration,
    /// Progress cadence during holds
    pub progress_tick: Duration,
    /// Floor for the length-based phase-one hold
    pub min_hold: Duration,
}

impl Default for EngineTiming {
    fn default() -> Self {
        Self {
            audio_poll: Duration::from_millis(100),
            progress_tick: Duration::from_millis(50),
            min_hold: Duration::from_secs(2),
        }
    }
}

/// Builder for a practice session.
///
/// Nothing runs until [`PlaybackEngine::spawn`].
pub struct PlaybackEngine<A: AudioOutput> {
    collection: Collection,
    audio: A,
    settings: SettingsHandle,
    mode: SessionMode,
    timing: EngineTiming,
    scratch_dir: PathBuf,
    picker: Option<Box<dyn Picker>>,
}

impl<A: AudioOutput + 'static> PlaybackEngine<A> {
    pub fn new(collection: Collection, audio: A, settings: SettingsHandle, mode: SessionMode) -> Self {
        Self {
            collection,
            audio,
            settings,
            mode,
            timing: EngineTiming::default(),
            scratch_dir: std::env::temp_dir().join("xue-scratch"),
            picker: None,
        }
    }

    pub fn with_timing(mut self, timing: EngineTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Override the policy chosen by settings
    pub fn with_picker(mut self, picker: Box<dyn Picker>) -> Self {
        self.picker = Some(picker);
        self
    }

    /// Start the session on the current tokio runtime.
    ///
    /// Fails with `EmptyCollection` before spawning anything when there is
    /// nothing to play (in focused mode: nothing flagged).
    pub fn spawn(self) -> Result<(SessionHandle, mpsc::UnboundedReceiver<EngineEvent>)> {
        let PlaybackEngine {
            collection,
            audio,
            settings,
            mode,
            timing,
            scratch_dir,
            picker,
        } = self;

        let collection = match mode {
            SessionMode::Focused => collection.flagged_only(),
            _ => collection,
        };
        if collection.is_empty() {
            return Err(XueError::EmptyCollection);
        }

        std::fs::create_dir_all(&scratch_dir)?;

        let picker = match picker {
            Some(picker) => picker,
            None => settings.snapshot().picker_mode.build(&collection),
        };

        let signals = Arc::new(ControlSignals::new());
        let (events, rx) = mpsc::unbounded_channel();

        let runner = SessionRunner {
            collection,
            picker,
            audio,
            settings,
            mode,
            timing,
            scratch_dir,
            signals: Arc::clone(&signals),
            events,
            current_files: Vec::new(),
            committed_stats: Stats::default(),
            items_played: 0,
            items_failed: 0,
            write_failures: 0,
        };
        let task = tokio::spawn(runner.run());

        Ok((SessionHandle::new(signals, task), rx))
    }
}

/// State owned by the session task
struct SessionRunner<A: AudioOutput> {
    collection: Collection,
    picker: Box<dyn Picker>,
    audio: A,
    settings: SettingsHandle,
    mode: SessionMode,
    timing: EngineTiming,
    scratch_dir: PathBuf,
    signals: Arc<ControlSignals>,
    events: mpsc::UnboundedSender<EngineEvent>,
    /// Scratch files extracted for the item in flight
    current_files: Vec<PathBuf>,
    /// On-disk stats of the item in flight; flag saves must not leak the pending play
    committed_stats: Stats,
    items_played: usize,
    items_failed: usize,
    write_failures: usize,
}

impl<A: AudioOutput> SessionRunner<A> {
    async fn run(mut self) -> SessionReport {
        info!(
            "Session started: {} item(s), mode {}, picker {}, audio {}",
            self.collection.len(),
            self.mode,
            self.picker.name(),
            self.audio.name()
        );

        while !self.signals.should_stop() {
            if self.signals.is_paused() {
                sleep(self.timing.audio_poll).await;
                continue;
            }

            self.signals.set_state(EngineState::PickingNext);
            let index = match self.picker.select_next(&self.collection) {
                Ok(index) => index,
                Err(e) => {
                    warn!("Selection failed, ending session: {}", e);
                    break;
                }
            };
            self.play_item(index).await;
        }

        self.audio.unload();
        if let Err(e) = scratch::clean(&self.scratch_dir, &[]) {
            warn!("Scratch cleanup failed: {}", e);
        }
        self.signals.set_state(EngineState::Stopped);
        self.emit(EngineEvent::Stopped);
        info!(
            "Session stopped: {} played, {} failed, {} write failure(s)",
            self.items_played, self.items_failed, self.write_failures
        );

        SessionReport {
            collection: self.collection,
            items_played: self.items_played,
            items_failed: self.items_failed,
            write_failures: self.write_failures,
        }
    }

    async fn play_item(&mut self, index: usize) {
        self.signals.clear_skip();
        // A toggle with no item in flight has nothing to apply to
        self.signals.take_flag_toggle();
        self.current_files.clear();

        let Some(object) = self.collection.get_mut(index) else {
            warn!("Picker returned index {} outside the collection", index);
            return;
        };
        let previous_stats = object.stats.clone();
        self.committed_stats = previous_stats.clone();
        object.record_play(Utc::now());
        let path = object.path.clone();
        let snapshot = Arc::new(object.clone());

        debug!("Now playing: {}", snapshot.display_name());
        self.emit(EngineEvent::ItemStarted {
            object: snapshot,
            direction: self.mode.direction_label(),
        });

        let result = self.run_item(index, &path).await;
        self.audio.unload();
        // A toggle that landed after the last poll still belongs to this item
        if self.signals.take_flag_toggle() {
            self.apply_flag_toggle(index);
        }

        match result {
            Ok(outcome) => {
                self.items_played += 1;
                self.write_back(index, &path);
                self.emit(EngineEvent::ItemFinished {
                    path: path.clone(),
                    outcome,
                });
            }
            Err(e) => {
                warn!("Abandoning {}: {}", path.display(), e);
                if let Some(object) = self.collection.get_mut(index) {
                    object.stats = previous_stats;
                }
                self.items_failed += 1;
                self.emit(EngineEvent::ItemFailed {
                    path: path.clone(),
                    error: e.to_string(),
                });
                sleep(self.timing.audio_poll).await;
            }
        }

        if let Err(e) = scratch::clean(&self.scratch_dir, &self.current_files) {
            warn!("Scratch cleanup failed: {}", e);
        }
    }

    /// Both phases of one item. `Err` abandons the item without write-back.
    async fn run_item(&mut self, index: usize, path: &Path) -> Result<ItemOutcome> {
        let instruction = self.extract_optional(path, assets::INSTRUCTION);
        let native = store::extract_asset(path, assets::NATIVE, &self.scratch_dir)?;
        self.current_files.push(native.clone());

        let (first, second, first_language, second_language) = if self.mode.native_first() {
            (Some(native), instruction, LanguageLabel::Native, LanguageLabel::English)
        } else {
            (instruction, Some(native), LanguageLabel::English, LanguageLabel::Native)
        };

        self.signals.set_state(EngineState::PhaseOne);
        self.emit_phase(index, Phase::Learning, first_language);
        if let Some(clip) = first {
            if let Some(outcome) = self.play_clip(&clip, index).await? {
                return Ok(outcome);
            }
        }

        self.signals.set_state(EngineState::HoldOne);
        let hold = self.first_hold(index, &self.settings.snapshot());
        if let Some(outcome) = self.hold(hold, index, Phase::Learning, first_language).await? {
            return Ok(outcome);
        }

        self.signals.set_state(EngineState::PhaseTwo);
        self.emit_phase(index, Phase::Reviewing, second_language);
        if let Some(clip) = second {
            if let Some(outcome) = self.play_clip(&clip, index).await? {
                return Ok(outcome);
            }
        }

        self.signals.set_state(EngineState::HoldTwo);
        let hold = Duration::from_secs(u64::from(self.settings.snapshot().quiz_interval));
        if let Some(outcome) = self.hold(hold, index, Phase::Reviewing, second_language).await? {
            return Ok(outcome);
        }

        Ok(ItemOutcome::Completed)
    }

    fn extract_optional(&mut self, path: &Path, asset: &str) -> Option<PathBuf> {
        match store::extract_asset(path, asset, &self.scratch_dir) {
            Ok(clip) => {
                self.current_files.push(clip.clone());
                Some(clip)
            }
            Err(e) if e.is_asset_missing() => None,
            Err(e) => {
                warn!("Could not extract {} from {}: {}", asset, path.display(), e);
                None
            }
        }
    }

    /// Phase-one hold: fixed in pinyin practice, otherwise scaled by the
    /// native text length with a floor.
    fn first_hold(&self, index: usize, settings: &Settings) -> Duration {
        if self.mode == SessionMode::Pinyin {
            return Duration::from_secs(u64::from(settings.instruction_delay));
        }
        let chars = self.collection.get(index).map(LearningObject::native_len).unwrap_or(0);
        let by_length = Duration::try_from_secs_f64(settings.seconds_per_char.max(0.0) * chars as f64)
            .unwrap_or(self.timing.min_hold);
        by_length.max(self.timing.min_hold)
    }

    /// Play one clip to completion unless interrupted
    async fn play_clip(&mut self, clip: &Path, index: usize) -> Result<Option<ItemOutcome>> {
        self.audio.load(clip)?;
        self.audio.play()?;

        loop {
            if let Some(outcome) = self.poll(index) {
                self.audio.stop();
                return Ok(Some(outcome));
            }
            if let Some(outcome) = self.wait_while_paused(index).await? {
                self.audio.stop();
                return Ok(Some(outcome));
            }
            if !self.audio.is_busy() {
                return Ok(None);
            }
            sleep(self.timing.audio_poll).await;
        }
    }

    /// Count down `duration`, reporting progress each tick.
    ///
    /// Only ticks spent unpaused count toward the hold.
    async fn hold(
        &mut self,
        duration: Duration,
        index: usize,
        phase: Phase,
        language: LanguageLabel,
    ) -> Result<Option<ItemOutcome>> {
        let mut elapsed = Duration::ZERO;

        while elapsed < duration {
            if let Some(outcome) = self.poll(index) {
                return Ok(Some(outcome));
            }
            if let Some(outcome) = self.wait_while_paused(index).await? {
                return Ok(Some(outcome));
            }

            let step = self.timing.progress_tick.min(duration - elapsed);
            sleep(step).await;
            elapsed += step;

            let fraction_remaining = 1.0 - elapsed.as_secs_f64() / duration.as_secs_f64();
            if let Some(object) = self.collection.get(index) {
                self.emit(EngineEvent::Progress {
                    object: Arc::new(object.clone()),
                    fraction_remaining: fraction_remaining.max(0.0),
                    phase,
                    language,
                });
            }
        }

        Ok(None)
    }

    /// Sit out a pause with the device paused. Stop and skip still apply.
    async fn wait_while_paused(&mut self, index: usize) -> Result<Option<ItemOutcome>> {
        if !self.signals.is_paused() {
            return Ok(None);
        }

        debug!("Paused");
        self.audio.pause()?;
        while self.signals.is_paused() {
            if let Some(outcome) = self.poll(index) {
                return Ok(Some(outcome));
            }
            sleep(self.timing.audio_poll).await;
        }
        debug!("Resumed");
        self.audio.resume()?;

        Ok(None)
    }

    /// Apply pending flag toggles and report stop or skip
    fn poll(&mut self, index: usize) -> Option<ItemOutcome> {
        if self.signals.take_flag_toggle() {
            self.apply_flag_toggle(index);
        }
        if self.signals.should_stop() {
            Some(ItemOutcome::Stopped)
        } else if self.signals.skip_requested() {
            Some(ItemOutcome::Skipped)
        } else {
            None
        }
    }

    fn apply_flag_toggle(&mut self, index: usize) {
        let Some(object) = self.collection.get_mut(index) else {
            return;
        };
        let flagged = object.toggle_flag();
        let path = object.path.clone();
        let mut on_disk = object.clone();
        on_disk.stats = self.committed_stats.clone();

        match store::save_metadata(&path, &on_disk) {
            Ok(()) => {
                info!("{} {}", if flagged { "Flagged" } else { "Unflagged" }, path.display());
                self.emit(EngineEvent::FlagToggled { path, flagged });
            }
            Err(e) => {
                warn!("Failed to persist flag for {}: {}", path.display(), e);
                self.emit(EngineEvent::FlagSaveFailed {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    fn write_back(&mut self, index: usize, path: &Path) {
        let Some(object) = self.collection.get(index) else {
            return;
        };
        if let Err(e) = store::save_metadata(path, object) {
            warn!("Failed to save stats for {}: {}", path.display(), e);
            self.write_failures += 1;
            self.emit(EngineEvent::WriteBackFailed {
                path: path.to_path_buf(),
                error: e.to_string(),
            });
        }
    }

    fn emit_phase(&self, index: usize, phase: Phase, language: LanguageLabel) {
        if let Some(object) = self.collection.get(index) {
            debug!("{} phase ({})", phase, language);
            self.emit(EngineEvent::PhaseStarted {
                object: Arc::new(object.clone()),
                phase,
                language,
            });
        }
    }

    fn emit(&self, event: EngineEvent) {
        // Nobody listening is fine; the session still runs
        let _ = self.events.send(event);
    }
}
