use std::path::Path;

use log::trace;

use super::AudioOutput;
use crate::error::Result;

/// Silent output. Every clip finishes instantly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn load(&mut self, path: &Path) -> Result<()> {
        trace!("null output: load {}", path.display());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        Ok(())
    }

    fn is_busy(&self) -> bool {
        false
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}

    fn name(&self) -> &'static str {
        "null"
    }
}
