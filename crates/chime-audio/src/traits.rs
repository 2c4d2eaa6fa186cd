//! Audio output trait and error types.

use chime_engine::Frame;
use thiserror::Error;

/// Error type for audio device operations.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio output device available")]
    NoDevice,
}

/// A sink for rendered frames.
pub trait AudioOutput {
    fn sample_rate(&self) -> u32;

    /// Queue frames for playback. Frames that do not fit are dropped.
    fn write(&mut self, frames: &[Frame]) -> Result<(), AudioError>;

    fn start(&mut self) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;
}
