//! Decoded short audio clips.

use alloc::vec::Vec;
use arrayvec::ArrayString;

/// A decoded clip, ready to be handed to a player.
#[derive(Clone, Debug)]
pub struct Clip {
    /// Logical asset name (truncated to 32 bytes).
    pub name: ArrayString<32>,
    /// PCM frames.
    pub data: ClipData,
    /// Native sample rate in Hz.
    pub sample_rate: u32,
}

impl Clip {
    pub fn new(name: &str, data: ClipData, sample_rate: u32) -> Self {
        let mut clip_name = ArrayString::new();
        for ch in name.chars() {
            if clip_name.try_push(ch).is_err() {
                break;
            }
        }
        Self {
            name: clip_name,
            data,
            sample_rate,
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Length in seconds at the clip's native rate.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f32 / self.sample_rate as f32
    }
}

/// Clip PCM data, planar for stereo.
#[derive(Clone, Debug)]
pub enum ClipData {
    Mono8(Vec<i8>),
    Mono16(Vec<i16>),
    Stereo8(Vec<i8>, Vec<i8>),
    Stereo16(Vec<i16>, Vec<i16>),
}

impl ClipData {
    pub fn len(&self) -> usize {
        match self {
            ClipData::Mono8(v) => v.len(),
            ClipData::Mono16(v) => v.len(),
            ClipData::Stereo8(l, _) => l.len(),
            ClipData::Stereo16(l, _) => l.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn num_channels(&self) -> u16 {
        match self {
            ClipData::Mono8(_) | ClipData::Mono16(_) => 1,
            ClipData::Stereo8(_, _) | ClipData::Stereo16(_, _) => 2,
        }
    }

    /// Left channel value at `pos` scaled to i16; 0 past the end.
    pub fn left(&self, pos: usize) -> i16 {
        match self {
            ClipData::Mono8(v) | ClipData::Stereo8(v, _) => {
                v.get(pos).copied().unwrap_or(0) as i16 * 256
            }
            ClipData::Mono16(v) | ClipData::Stereo16(v, _) => v.get(pos).copied().unwrap_or(0),
        }
    }

    /// Right channel value at `pos`; mono clips return the left channel.
    pub fn right(&self, pos: usize) -> i16 {
        match self {
            ClipData::Mono8(_) | ClipData::Mono16(_) => self.left(pos),
            ClipData::Stereo8(_, r) => r.get(pos).copied().unwrap_or(0) as i16 * 256,
            ClipData::Stereo16(_, r) => r.get(pos).copied().unwrap_or(0),
        }
    }

    /// Linearly interpolated stereo pair at a fixed-point position with 16
    /// fractional bits, as f32 in -1.0..1.0.
    pub fn frame_interpolated(&self, pos_fixed: u64) -> (f32, f32) {
        let idx = (pos_fixed >> 16) as usize;
        let frac = (pos_fixed & 0xFFFF) as i64;

        let lerp = |a: i16, b: i16| {
            let (a, b) = (a as i64, b as i64);
            (a + (((b - a) * frac) >> 16)) as f32 / 32768.0
        };

        (
            lerp(self.left(idx), self.left(idx + 1)),
            lerp(self.right(idx), self.right(idx + 1)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn long_names_are_truncated() {
        let name = "a-very-long-asset-name-that-does-not-fit-in-thirty-two";
        let clip = Clip::new(name, ClipData::Mono8(vec![]), 44100);
        assert_eq!(clip.name.len(), 32);
        assert!(name.starts_with(clip.name.as_str()));
    }

    #[test]
    fn duration_uses_native_rate() {
        let clip = Clip::new("snd1", ClipData::Mono16(vec![0; 22050]), 44100);
        assert!((clip.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        let clip = Clip::new("snd1", ClipData::Mono16(vec![0; 10]), 0);
        assert_eq!(clip.duration_secs(), 0.0);
    }

    #[test]
    fn mono_right_mirrors_left() {
        let data = ClipData::Mono8(vec![10, -20]);
        assert_eq!(data.left(1), -20 * 256);
        assert_eq!(data.right(1), -20 * 256);
    }

    #[test]
    fn stereo_channels_are_independent() {
        let data = ClipData::Stereo16(vec![100, 200], vec![-100, -200]);
        assert_eq!(data.num_channels(), 2);
        assert_eq!(data.left(1), 200);
        assert_eq!(data.right(1), -200);
        assert_eq!(data.right(9), 0);
    }

    #[test]
    fn interpolated_midpoint_averages_neighbors() {
        let data = ClipData::Mono16(vec![0, 16384]);
        let (l, r) = data.frame_interpolated(32768);
        assert!((l - 0.25).abs() < 1e-3);
        assert_eq!(l, r);
    }

    #[test]
    fn interpolated_at_integer_matches_sample() {
        let data = ClipData::Mono16(vec![0, 16384, -16384]);
        let (l, _) = data.frame_interpolated(2 << 16);
        assert!((l + 0.5).abs() < 1e-6);
    }
}
