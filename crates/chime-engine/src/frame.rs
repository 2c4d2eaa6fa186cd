//! Output frame type.

/// A stereo output frame (16-bit integer).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    /// Convert a float stereo pair, hard-clipping to the i16 range.
    pub fn from_f32(left: f32, right: f32) -> Self {
        Self {
            left: to_i16(left),
            right: to_i16(right),
        }
    }

    pub fn is_silent(&self) -> bool {
        self.left == 0 && self.right == 0
    }

    /// Larger absolute value of the two sides.
    pub fn amplitude(&self) -> i16 {
        self.left.saturating_abs().max(self.right.saturating_abs())
    }
}

fn to_i16(value: f32) -> i16 {
    (value * 32768.0).clamp(-32768.0, 32767.0) as i16
}
