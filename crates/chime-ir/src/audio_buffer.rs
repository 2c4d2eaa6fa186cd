//! Planar f32 block buffer used between engine nodes.

use alloc::vec;
use alloc::vec::Vec;

/// Maximum number of channels a node may render.
pub const MAX_CHANNELS: u16 = 2;

/// Frames rendered per engine block.
pub const BLOCK_SIZE: usize = 256;

/// A block of f32 audio in planar layout.
///
/// `data[ch * frames + frame]` holds channel `ch` at `frame`. Buffers are
/// allocated once when a node is created and reused for every block.
#[derive(Clone, Debug)]
pub struct AudioBuffer {
    data: Vec<f32>,
    channels: u16,
    frames: u16,
}

impl AudioBuffer {
    /// Create a silent buffer. `channels` is clamped to [`MAX_CHANNELS`].
    pub fn new(channels: u16, frames: u16) -> Self {
        let channels = channels.clamp(1, MAX_CHANNELS);
        Self {
            data: vec![0.0; channels as usize * frames as usize],
            channels,
            frames,
        }
    }

    /// A stereo buffer of one engine block.
    pub fn stereo_block() -> Self {
        Self::new(2, BLOCK_SIZE as u16)
    }

    pub fn silence(&mut self) {
        self.data.fill(0.0);
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn frames(&self) -> u16 {
        self.frames
    }

    pub fn channel(&self, ch: u16) -> &[f32] {
        let start = ch as usize * self.frames as usize;
        &self.data[start..start + self.frames as usize]
    }

    pub fn channel_mut(&mut self, ch: u16) -> &mut [f32] {
        let start = ch as usize * self.frames as usize;
        let len = self.frames as usize;
        &mut self.data[start..start + len]
    }

    /// Add `value` to both sides of a stereo frame (or the only side of mono).
    pub fn add_frame(&mut self, frame: usize, left: f32, right: f32) {
        let frames = self.frames as usize;
        if frame >= frames {
            return;
        }
        self.data[frame] += left;
        if self.channels > 1 {
            self.data[frames + frame] += right;
        }
    }

    /// Sum `source` into this buffer with `gain`, over the overlapping region.
    pub fn mix_from_scaled(&mut self, source: &AudioBuffer, gain: f32) {
        let chs = self.channels.min(source.channels);
        let frs = self.frames.min(source.frames) as usize;
        for ch in 0..chs {
            let src = source.channel(ch);
            let dst = self.channel_mut(ch);
            for (d, s) in dst[..frs].iter_mut().zip(&src[..frs]) {
                *d += s * gain;
            }
        }
    }

    /// Largest absolute sample value in the buffer.
    pub fn peak(&self) -> f32 {
        self.data.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_silent() {
        let buf = AudioBuffer::new(2, 4);
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.frames(), 4);
        assert_eq!(buf.peak(), 0.0);
    }

    #[test]
    fn channels_are_clamped() {
        assert_eq!(AudioBuffer::new(6, 4).channels(), MAX_CHANNELS);
        assert_eq!(AudioBuffer::new(0, 4).channels(), 1);
    }

    #[test]
    fn add_frame_writes_both_sides() {
        let mut buf = AudioBuffer::new(2, 2);
        buf.add_frame(1, 0.25, -0.5);
        buf.add_frame(1, 0.25, 0.0);
        assert_eq!(buf.channel(0), &[0.0, 0.5]);
        assert_eq!(buf.channel(1), &[0.0, -0.5]);
    }

    #[test]
    fn add_frame_past_end_is_ignored() {
        let mut buf = AudioBuffer::new(2, 2);
        buf.add_frame(5, 1.0, 1.0);
        assert_eq!(buf.peak(), 0.0);
    }

    #[test]
    fn mix_from_scaled_applies_gain() {
        let mut dst = AudioBuffer::new(2, 2);
        let mut src = AudioBuffer::new(2, 2);
        src.channel_mut(0)[0] = 1.0;
        src.channel_mut(1)[1] = -1.0;

        dst.mix_from_scaled(&src, 0.5);
        assert!((dst.channel(0)[0] - 0.5).abs() < 1e-6);
        assert!((dst.channel(1)[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn mix_from_mono_into_stereo_touches_left_only() {
        let mut dst = AudioBuffer::new(2, 4);
        let mut src = AudioBuffer::new(1, 2);
        src.channel_mut(0)[0] = 1.0;

        dst.mix_from_scaled(&src, 1.0);
        assert_eq!(dst.channel(0)[0], 1.0);
        assert_eq!(dst.channel(1)[0], 0.0);
        assert_eq!(dst.channel(0)[2], 0.0);
    }

    #[test]
    fn silence_clears() {
        let mut buf = AudioBuffer::new(1, 2);
        buf.channel_mut(0)[1] = 0.3;
        buf.silence();
        assert_eq!(buf.peak(), 0.0);
    }
}
