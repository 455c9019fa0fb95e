//! Command signals for a running session
//!
//! The control surface raises signals; the engine observes them at its poll
//! points. All signals are latched, so a command issued between two polls is
//! never lost. Stop dominates everything else.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::domain::EngineState;

/// Lock-free command latches plus the engine's published state
#[derive(Debug)]
pub struct ControlSignals {
    stop: AtomicBool,
    skip: AtomicBool,
    paused: AtomicBool,
    flag_toggles: AtomicU32,
    state: AtomicU8,
}

impl Default for ControlSignals {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSignals {
    pub fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            skip: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            flag_toggles: AtomicU32::new(0),
            state: AtomicU8::new(EngineState::Idle as u8),
        }
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn request_skip(&self) {
        self.skip.store(true, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// Flip the current item's flag at the next poll point.
    ///
    /// Toggles requested between two polls cancel in pairs.
    pub fn request_flag_toggle(&self) {
        self.flag_toggles.fetch_add(1, Ordering::SeqCst);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn skip_requested(&self) -> bool {
        self.skip.load(Ordering::SeqCst)
    }

    /// Drop any skip left over from the previous item
    pub fn clear_skip(&self) {
        self.skip.store(false, Ordering::SeqCst);
    }

    /// Consume pending toggles; true when an odd number were requested
    pub fn take_flag_toggle(&self) -> bool {
        self.flag_toggles.swap(0, Ordering::SeqCst) % 2 == 1
    }

    pub fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::SeqCst))
    }
}
