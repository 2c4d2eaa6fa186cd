//! Software audio graph for chime.
//!
//! Renders an FM oscillator bank and one-shot clip players through a mixer
//! into 16-bit stereo frames.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod clip_player;
mod envelope;
mod frame;
mod frequency;
mod graph;
mod tone_bank;

pub use clip_player::ClipPlayer;
pub use envelope::{EnvelopeStage, ToneEnvelope};
pub use frame::Frame;
pub use frequency::{note_to_hz, rate_to_increment};
pub use graph::{FeedbackEngine, MixerKey, MixerNode, PlayerKey, Source, ToneKey};
pub use tone_bank::{FmParams, ToneBank, MAX_TONE_VOICES};
