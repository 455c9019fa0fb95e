use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::coordination::ControlSignals;
use crate::domain::EngineState;
use crate::error::Result;
use crate::store::Collection;

/// What a finished session leaves behind
#[derive(Debug)]
pub struct SessionReport {
    /// In-memory collection with every stat and flag change applied
    pub collection: Collection,
    /// Items that reached write-back (completed, skipped or stopped)
    pub items_played: usize,
    /// Items abandoned before write-back
    pub items_failed: usize,
    /// Write-backs that could not be persisted
    pub write_failures: usize,
}

/// Control surface for a running session.
///
/// Commands are latched and observed by the engine at its next poll point.
pub struct SessionHandle {
    signals: Arc<ControlSignals>,
    task: JoinHandle<SessionReport>,
}

impl SessionHandle {
    pub(crate) fn new(signals: Arc<ControlSignals>, task: JoinHandle<SessionReport>) -> Self {
        Self { signals, task }
    }

    pub fn pause(&self) {
        self.signals.pause();
    }

    pub fn resume(&self) {
        self.signals.resume();
    }

    /// Abandon the current item after write-back and pick the next one
    pub fn skip(&self) {
        self.signals.request_skip();
    }

    /// End the session after the current item's write-back
    pub fn stop(&self) {
        self.signals.request_stop();
    }

    /// Flip and persist the current item's flag
    pub fn toggle_flag(&self) {
        self.signals.request_flag_toggle();
    }

    pub fn state(&self) -> EngineState {
        self.signals.state()
    }

    pub fn is_paused(&self) -> bool {
        self.signals.is_paused()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Shared signals, for control surfaces that outlive a borrow of the handle
    pub fn signals(&self) -> Arc<ControlSignals> {
        Arc::clone(&self.signals)
    }

    /// Wait for the engine to leave its loop
    pub async fn join(self) -> Result<SessionReport> {
        Ok(self.task.await?)
    }

    /// Request stop and wait for the engine to unwind
    pub async fn stop_and_join(self) -> Result<SessionReport> {
        self.stop();
        self.join().await
    }
}
