//! Audio output backends for chime.

mod cpal_backend;
mod traits;

pub use cpal_backend::{default_output_rate, CpalOutput};
pub use traits::{AudioError, AudioOutput};
