//! The audio backend seam.

use chime_audio::AudioError;
use chime_ir::Clip;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;

/// Error type for backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Device(#[from] AudioError),
    /// A handle that this backend never issued.
    #[error("unknown {0} handle")]
    UnknownHandle(&'static str),
    #[error("{0}")]
    Other(String),
}

/// Everything the feedback controller needs from an audio graph.
///
/// Handles are opaque, cheap to copy, and only meaningful to the backend
/// that issued them. The controller moves the backend onto its worker
/// thread, so implementations must be `Send`; no method is ever called
/// from two threads at once.
pub trait AudioBackend: Send + 'static {
    type Mixer: Copy + Debug + Send;
    type Tone: Copy + Debug + Send;
    type Player: Copy + Debug + Send;

    // --- Graph construction (called once, before start) ---

    fn create_mixer(&mut self, volume: f32) -> Result<Self::Mixer, BackendError>;

    /// A polyphonic tone generator whose notes fade out over `release`
    /// after note-off.
    fn create_tone_generator(&mut self, release: Duration) -> Result<Self::Tone, BackendError>;

    /// A player for a decoded clip, stopped at position zero.
    fn create_player(&mut self, clip: Clip, volume: f32) -> Result<Self::Player, BackendError>;

    fn connect_tone(&mut self, tone: Self::Tone, mixer: Self::Mixer) -> Result<(), BackendError>;

    fn connect_player(&mut self, player: Self::Player, mixer: Self::Mixer)
        -> Result<(), BackendError>;

    /// Route `player` to the output device at its own volume, outside every
    /// mixer. Such a player should sound even if [`AudioBackend::start`]
    /// failed, where the backend can manage that.
    fn connect_player_to_output(&mut self, player: Self::Player) -> Result<(), BackendError>;

    /// Make `mixer` the node that reaches the output device.
    fn set_output(&mut self, mixer: Self::Mixer) -> Result<(), BackendError>;

    // --- Runtime ---

    /// Start the output graph.
    fn start(&mut self) -> Result<(), BackendError>;

    fn note_on(&mut self, tone: Self::Tone, note: u8, velocity: u8);

    fn note_off(&mut self, tone: Self::Tone, note: u8);

    /// Play from the current position.
    fn play(&mut self, player: Self::Player);

    /// Halt without moving the position.
    fn stop(&mut self, player: Self::Player);

    fn rewind(&mut self, player: Self::Player);

    /// Reload the clip so the next play starts from the beginning.
    fn reload(&mut self, player: Self::Player) -> Result<(), BackendError>;

    fn is_playing(&self, player: Self::Player) -> bool;
}
