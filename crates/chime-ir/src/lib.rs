//! Core value types for chime.
//!
//! Decoded clip audio, planar audio buffers and note ranges shared by the
//! engine, the format decoders and the feedback controller.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod audio_buffer;
mod clip;
mod note_range;

pub use audio_buffer::{AudioBuffer, BLOCK_SIZE, MAX_CHANNELS};
pub use clip::{Clip, ClipData};
pub use note_range::NoteRange;
