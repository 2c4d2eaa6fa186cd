//! Pitch and resampling helpers.

/// MIDI note of concert A.
const A4_NOTE: f32 = 69.0;

/// Frequency of concert A in Hz.
const A4_HZ: f32 = 440.0;

/// Equal-tempered frequency of a MIDI note, A4 (69) = 440 Hz.
pub fn note_to_hz(note: u8) -> f32 {
    A4_HZ * libm::powf(2.0, (note as f32 - A4_NOTE) / 12.0)
}

/// 16.16 fixed-point step through a clip recorded at `source_rate` when
/// rendering at `output_rate`. Returns 0 if either rate is 0.
pub fn rate_to_increment(source_rate: u32, output_rate: u32) -> u32 {
    if source_rate == 0 || output_rate == 0 {
        return 0;
    }
    ((source_rate as u64 * 65536) / output_rate as u64).min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((note_to_hz(69) - 440.0).abs() < 1e-3);
    }

    #[test]
    fn octave_doubles_frequency() {
        let c3 = note_to_hz(48);
        let c4 = note_to_hz(60);
        assert!((c4 / c3 - 2.0).abs() < 1e-4);
    }

    #[test]
    fn default_range_bounds_are_audible() {
        // C1 and C6
        assert!((note_to_hz(24) - 32.703).abs() < 0.01);
        assert!((note_to_hz(84) - 1046.5).abs() < 0.1);
    }

    #[test]
    fn same_rate_steps_one_frame() {
        assert_eq!(rate_to_increment(44100, 44100), 1 << 16);
    }

    #[test]
    fn half_rate_steps_half_frame() {
        assert_eq!(rate_to_increment(22050, 44100), 1 << 15);
    }

    #[test]
    fn extreme_ratio_saturates() {
        assert_eq!(rate_to_increment(u32::MAX, 1), u32::MAX);
    }

    #[test]
    fn zero_rate_gives_zero_increment() {
        assert_eq!(rate_to_increment(0, 44100), 0);
        assert_eq!(rate_to_increment(44100, 0), 0);
    }
}
