//! Real device output via rodio.
//!
//! `OutputStream` is not `Send`, so a dedicated thread owns it for the life
//! of the output and hands back the (sendable) stream handle. A fresh `Sink`
//! is built per clip; dropping it releases the decoder and its file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::thread;

use log::{debug, info};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

use super::AudioOutput;
use crate::error::{Result, XueError};

pub struct RodioOutput {
    handle: OutputStreamHandle,
    sink: Option<Sink>,
    _shutdown: Sender<()>,
}

impl RodioOutput {
    /// Open the default output device
    pub fn open() -> Result<Self> {
        let (handle_tx, handle_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("xue-audio".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, handle)) => {
                    let _ = handle_tx.send(Ok(handle));
                    // Park until the output is dropped
                    let _ = shutdown_rx.recv();
                    debug!("audio thread exiting");
                }
                Err(e) => {
                    let _ = handle_tx.send(Err(format!("Failed to create audio output stream: {}", e)));
                }
            })?;

        let handle = handle_rx
            .recv()
            .map_err(|e| XueError::PlaybackDevice(e.to_string()))?
            .map_err(XueError::PlaybackDevice)?;

        info!("Opened default audio device");
        Ok(Self {
            handle,
            sink: None,
            _shutdown: shutdown_tx,
        })
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.unload();

        let file = File::open(path)?;
        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| XueError::PlaybackDevice(format!("{}: {}", path.display(), e)))?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| XueError::PlaybackDevice(format!("Failed to create audio sink: {}", e)))?;
        sink.pause();
        sink.append(source);
        self.sink = Some(sink);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        match &self.sink {
            Some(sink) => {
                sink.play();
                Ok(())
            }
            None => Err(XueError::PlaybackDevice("nothing loaded".to_string())),
        }
    }

    fn is_busy(&self) -> bool {
        self.sink.as_ref().map(|s| !s.empty()).unwrap_or(false)
    }

    fn pause(&mut self) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if let Some(sink) = &self.sink {
            sink.play();
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.stop();
        }
    }

    fn unload(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn name(&self) -> &'static str {
        "rodio"
    }
}
