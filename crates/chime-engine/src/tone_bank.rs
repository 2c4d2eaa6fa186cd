//! Polyphonic FM oscillator bank.
//!
//! Each sounding note owns one voice slot. A note-on for a note that is
//! already sounding retriggers that voice instead of stacking a second one.
//! When every slot is busy the oldest releasing voice is stolen, then the
//! oldest held one.

use core::f32::consts::TAU;
use heapless::Vec;
use chime_ir::AudioBuffer;

use crate::envelope::{EnvelopeStage, ToneEnvelope};
use crate::frequency::note_to_hz;

/// Maximum number of simultaneously sounding notes.
pub const MAX_TONE_VOICES: usize = 16;

/// Per-voice peak level at velocity 127, leaving headroom for polyphony.
const VOICE_GAIN: f32 = 0.25;

/// Two-operator FM settings shared by all voices in a bank.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FmParams {
    pub carrier_multiplier: f32,
    pub modulating_multiplier: f32,
    pub modulation_index: f32,
}

impl Default for FmParams {
    fn default() -> Self {
        Self {
            carrier_multiplier: 1.0,
            modulating_multiplier: 1.0,
            modulation_index: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
struct ToneVoice {
    note: u8,
    gain: f32,
    carrier_phase: f32,
    carrier_step: f32,
    modulator_phase: f32,
    modulator_step: f32,
    envelope: ToneEnvelope,
    age: u64,
}

impl ToneVoice {
    fn next_sample(&mut self, index: f32) -> f32 {
        let modulator = libm::sinf(TAU * self.modulator_phase);
        let out = libm::sinf(TAU * self.carrier_phase + index * modulator);

        self.carrier_phase = wrap_phase(self.carrier_phase + self.carrier_step);
        self.modulator_phase = wrap_phase(self.modulator_phase + self.modulator_step);

        out * self.gain * self.envelope.advance()
    }
}

fn wrap_phase(phase: f32) -> f32 {
    if phase >= 1.0 {
        phase - libm::floorf(phase)
    } else {
        phase
    }
}

/// A bank of FM voices with a fixed release time.
#[derive(Clone, Debug)]
pub struct ToneBank {
    voices: Vec<ToneVoice, MAX_TONE_VOICES>,
    params: FmParams,
    sample_rate: u32,
    release_secs: f32,
    clock: u64,
}

impl ToneBank {
    pub fn new(sample_rate: u32, release_secs: f32) -> Self {
        Self::with_params(sample_rate, release_secs, FmParams::default())
    }

    pub fn with_params(sample_rate: u32, release_secs: f32, params: FmParams) -> Self {
        Self {
            voices: Vec::new(),
            params,
            sample_rate: sample_rate.max(1),
            release_secs: release_secs.max(0.0),
            clock: 0,
        }
    }

    pub fn release_secs(&self) -> f32 {
        self.release_secs
    }

    /// Start (or retrigger) `note`. Velocity 0 is treated as a note-off.
    pub fn note_on(&mut self, note: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(note);
            return;
        }
        self.clock += 1;
        let voice = self.voice_for(note, velocity);

        if let Some(existing) = self.voices.iter_mut().find(|v| v.note == note) {
            *existing = voice;
            return;
        }
        if self.voices.is_full() {
            let victim = self.steal_candidate();
            self.voices[victim] = voice;
            return;
        }
        // Not full, so push cannot fail.
        let _ = self.voices.push(voice);
    }

    /// Release every voice playing `note`. A no-op for silent notes.
    pub fn note_off(&mut self, note: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.note == note) {
            voice.envelope.release();
        }
    }

    /// Whether `note` is in its attack or sustain stage.
    pub fn is_held(&self, note: u8) -> bool {
        self.voices.iter().any(|v| {
            v.note == note
                && matches!(v.envelope.stage(), EnvelopeStage::Attack | EnvelopeStage::Sustain)
        })
    }

    /// Number of voices still producing sound, including releasing ones.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Render `output.frames()` frames, summing into `output`.
    pub fn render(&mut self, output: &mut AudioBuffer) {
        if self.voices.is_empty() {
            return;
        }
        let index = self.params.modulation_index;
        for frame in 0..output.frames() as usize {
            let mut mixed = 0.0;
            for voice in self.voices.iter_mut() {
                mixed += voice.next_sample(index);
            }
            output.add_frame(frame, mixed, mixed);
        }
        self.voices.retain(|v| !v.envelope.is_done());
    }

    fn voice_for(&self, note: u8, velocity: u8) -> ToneVoice {
        let hz = note_to_hz(note);
        let rate = self.sample_rate as f32;
        ToneVoice {
            note,
            gain: VOICE_GAIN * velocity.min(127) as f32 / 127.0,
            carrier_phase: 0.0,
            carrier_step: hz * self.params.carrier_multiplier / rate,
            modulator_phase: 0.0,
            modulator_step: hz * self.params.modulating_multiplier / rate,
            envelope: ToneEnvelope::new(self.sample_rate, self.release_secs),
            age: self.clock,
        }
    }

    fn steal_candidate(&self) -> usize {
        let priority = |stage: EnvelopeStage| match stage {
            EnvelopeStage::Done => 0,
            EnvelopeStage::Release => 1,
            EnvelopeStage::Attack | EnvelopeStage::Sustain => 2,
        };
        self.voices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| (priority(v.envelope.stage()), v.age))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }
}
