//! Audio output backends.
//!
//! The engine talks to a single [`AudioOutput`] and only ever needs one clip
//! loaded at a time. Backends:
//!
//! - `NullOutput`: silent, never busy
//! - `MockOutput`: records calls and simulates clip length on the tokio clock
//! - `RodioOutput`: real device, behind the `rodio` feature

mod mock;
mod null;
#[cfg(feature = "rodio")]
mod rodio_output;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, XueError};

pub use mock::{AudioCall, CallLog, MockOutput};
pub use null::NullOutput;
#[cfg(feature = "rodio")]
pub use rodio_output::RodioOutput;

/// Capability the playback engine needs from an audio device.
///
/// Calls are made from the engine task only; implementations must not block
/// for longer than it takes to hand a command to the device.
pub trait AudioOutput: Send {
    /// Replace whatever is loaded with the clip at `path`. Does not start it.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Start the loaded clip
    fn play(&mut self) -> Result<()>;

    /// True while a clip is playing or paused mid-clip
    fn is_busy(&self) -> bool;

    fn pause(&mut self) -> Result<()>;

    fn resume(&mut self) -> Result<()>;

    /// Halt playback; the clip stays loaded
    fn stop(&mut self);

    /// Release the loaded clip so its file can be deleted
    fn unload(&mut self) {
        self.stop();
    }

    /// Short name for logs
    fn name(&self) -> &'static str;
}

impl<A: AudioOutput + ?Sized> AudioOutput for Box<A> {
    fn load(&mut self, path: &Path) -> Result<()> {
        (**self).load(path)
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }

    fn pause(&mut self) -> Result<()> {
        (**self).pause()
    }

    fn resume(&mut self) -> Result<()> {
        (**self).resume()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn unload(&mut self) {
        (**self).unload()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Backend selector used by the application config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioBackend {
    Silent,
    #[default]
    Rodio,
}

impl AudioBackend {
    /// Open the selected backend.
    ///
    /// Without the `rodio` feature, `Rodio` falls back to `NullOutput` with a
    /// warning so sessions still run (silently).
    pub fn open(&self) -> Result<Box<dyn AudioOutput>> {
        match self {
            Self::Silent => Ok(Box::new(NullOutput)),
            #[cfg(feature = "rodio")]
            Self::Rodio => Ok(Box::new(RodioOutput::open()?)),
            #[cfg(not(feature = "rodio"))]
            Self::Rodio => {
                log::warn!("Built without the rodio feature, using silent output");
                Ok(Box::new(NullOutput))
            }
        }
    }
}

impl fmt::Display for AudioBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Silent => f.write_str("silent"),
            Self::Rodio => f.write_str("rodio"),
        }
    }
}

impl FromStr for AudioBackend {
    type Err = XueError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "silent" | "null" | "none" => Ok(Self::Silent),
            "rodio" => Ok(Self::Rodio),
            other => Err(XueError::PlaybackDevice(format!("unknown audio backend: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parse() {
        assert_eq!("silent".parse::<AudioBackend>().unwrap(), AudioBackend::Silent);
        assert_eq!("none".parse::<AudioBackend>().unwrap(), AudioBackend::Silent);
        assert_eq!("Rodio".parse::<AudioBackend>().unwrap(), AudioBackend::Rodio);
        assert!("alsa".parse::<AudioBackend>().is_err());
    }

    #[test]
    fn test_silent_backend_opens() {
        let output = AudioBackend::Silent.open().unwrap();
        assert_eq!(output.name(), "null");
        assert!(!output.is_busy());
    }

    #[test]
    fn test_boxed_output_delegates() {
        let mock = MockOutput::new();
        let log = mock.call_log();
        let mut boxed: Box<dyn AudioOutput> = Box::new(mock);

        boxed.load(Path::new("clip.mp3")).unwrap();
        boxed.unload();

        assert_eq!(
            log.snapshot(),
            vec![AudioCall::Load("clip.mp3".into()), AudioCall::Unload]
        );
    }
}
