//! Closed range of MIDI note numbers.

use core::ops::RangeInclusive;

/// A closed interval of MIDI notes, `low..=high`, both within 0..=127.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoteRange {
    low: u8,
    high: u8,
}

impl NoteRange {
    /// Notes 24 (C1) through 84 (C6).
    pub const DEFAULT: NoteRange = NoteRange { low: 24, high: 84 };

    /// Returns `None` if `low > high` or either bound is above 127.
    pub const fn new(low: u8, high: u8) -> Option<Self> {
        if low > high || high > 127 {
            None
        } else {
            Some(Self { low, high })
        }
    }

    pub const fn low(&self) -> u8 {
        self.low
    }

    pub const fn high(&self) -> u8 {
        self.high
    }

    pub const fn contains(&self, note: u8) -> bool {
        note >= self.low && note <= self.high
    }

    /// Number of notes in the range (never zero).
    pub const fn len(&self) -> usize {
        (self.high - self.low) as usize + 1
    }

    pub fn notes(&self) -> RangeInclusive<u8> {
        self.low..=self.high
    }
}

impl Default for NoteRange {
    fn default() -> Self {
        Self::DEFAULT
    }
}
