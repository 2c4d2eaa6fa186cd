//! Controller-side views of the backend nodes.

use chime_ir::NoteRange;
use rand::Rng;

use crate::backend::{AudioBackend, BackendError};

/// The shared output sink.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Mixer<H> {
    pub handle: H,
}

/// The tone generator and the notes it may sound.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Voice<H> {
    pub handle: H,
    pub range: NoteRange,
    pub velocity: u8,
}

impl<H: Copy> Voice<H> {
    /// Sound a uniformly random note from the range. Returns the note.
    pub fn trigger<B, R>(&self, backend: &mut B, rng: &mut R) -> u8
    where
        B: AudioBackend<Tone = H>,
        R: Rng + ?Sized,
    {
        let note = rng.gen_range(self.range.low()..=self.range.high());
        backend.note_on(self.handle, note, self.velocity);
        note
    }

    /// Note-off for every note in the range, sounding or not.
    pub fn silence<B: AudioBackend<Tone = H>>(&self, backend: &mut B) {
        for note in self.range.notes() {
            backend.note_off(self.handle, note);
        }
    }
}

/// One of the numbered sound-effect players.
#[derive(Clone, Debug)]
pub(crate) struct SamplePlayer<H> {
    pub handle: H,
    pub name: String,
}

impl<H: Copy> SamplePlayer<H> {
    pub fn play<B: AudioBackend<Player = H>>(&self, backend: &mut B) {
        backend.play(self.handle);
    }

    pub fn is_playing<B: AudioBackend<Player = H>>(&self, backend: &B) -> bool {
        backend.is_playing(self.handle)
    }

    /// Stop and reload to the start. The player is stopped even if the
    /// reload fails.
    pub fn stop_and_reload<B: AudioBackend<Player = H>>(
        &self,
        backend: &mut B,
    ) -> Result<(), BackendError> {
        backend.stop(self.handle);
        backend.reload(self.handle)
    }
}

/// The confirmation click. Never overlaps itself.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ConfirmationPlayer<H> {
    pub handle: H,
}

impl<H: Copy> ConfirmationPlayer<H> {
    /// Stop, rewind, play.
    pub fn restart<B: AudioBackend<Player = H>>(&self, backend: &mut B) {
        backend.stop(self.handle);
        backend.rewind(self.handle);
        backend.play(self.handle);
    }
}
