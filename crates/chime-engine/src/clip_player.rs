//! One-shot clip playback.

use chime_ir::{AudioBuffer, Clip};

use crate::frequency::rate_to_increment;

/// Plays a decoded clip once at a fixed volume.
///
/// Position is fixed-point with 16 fractional bits so clips recorded at a
/// different rate are resampled on the fly. Reaching the end of the clip
/// stops the player and rewinds it.
#[derive(Clone, Debug)]
pub struct ClipPlayer {
    clip: Clip,
    position: u64,
    increment: u32,
    volume: f32,
    playing: bool,
}

impl ClipPlayer {
    pub fn new(clip: Clip, volume: f32, output_rate: u32) -> Self {
        let increment = rate_to_increment(clip.sample_rate, output_rate);
        Self {
            clip,
            position: 0,
            increment,
            volume: volume.clamp(0.0, 1.0),
            playing: false,
        }
    }

    pub fn clip(&self) -> &Clip {
        &self.clip
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current position in whole clip frames.
    pub fn position_frames(&self) -> usize {
        (self.position >> 16) as usize
    }

    /// Resume from the current position. Empty clips never start.
    pub fn play(&mut self) {
        self.playing = !self.clip.is_empty() && self.increment > 0;
    }

    /// Halt without moving the position.
    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Stop and return to the first frame.
    pub fn reset(&mut self) {
        self.stop();
        self.rewind();
    }

    /// Render into `output`, summing with what is already there.
    pub fn render(&mut self, output: &mut AudioBuffer) {
        if !self.playing {
            return;
        }
        let len = self.clip.len() as u64;
        for frame in 0..output.frames() as usize {
            let (left, right) = self.clip.data.frame_interpolated(self.position);
            output.add_frame(frame, left * self.volume, right * self.volume);

            self.position += self.increment as u64;
            if self.position >> 16 >= len {
                self.reset();
                return;
            }
        }
    }
}
