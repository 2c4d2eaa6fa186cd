//! Attack/sustain/release envelope for tone voices.

/// Time for a tone to reach full level after note-on.
const ATTACK_SECS: f32 = 0.002;

/// Envelope stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Rising towards full level.
    #[default]
    Attack,
    /// Holding full level until note-off.
    Sustain,
    /// Falling linearly to zero.
    Release,
    /// Silent; the voice can be reclaimed.
    Done,
}

/// Per-voice envelope state, advanced one frame at a time.
#[derive(Clone, Debug)]
pub struct ToneEnvelope {
    stage: EnvelopeStage,
    level: f32,
    attack_step: f32,
    release_frames: f32,
    release_step: f32,
}

impl ToneEnvelope {
    pub fn new(sample_rate: u32, release_secs: f32) -> Self {
        let rate = sample_rate.max(1) as f32;
        Self {
            stage: EnvelopeStage::Attack,
            level: 0.0,
            attack_step: 1.0 / (ATTACK_SECS * rate).max(1.0),
            release_frames: (release_secs.max(0.0) * rate).max(1.0),
            release_step: 0.0,
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_done(&self) -> bool {
        self.stage == EnvelopeStage::Done
    }

    /// Restart from silence.
    pub fn retrigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
        self.level = 0.0;
    }

    /// Gate off: fall from the current level to zero over the release time.
    pub fn release(&mut self) {
        if matches!(self.stage, EnvelopeStage::Attack | EnvelopeStage::Sustain) {
            self.stage = EnvelopeStage::Release;
            self.release_step = self.level / self.release_frames;
        }
    }

    /// Advance one frame and return the new level.
    pub fn advance(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Attack => {
                self.level += self.attack_step;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {}
            EnvelopeStage::Release => {
                self.level -= self.release_step;
                if self.level <= 0.0 || self.release_step <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Done;
                }
            }
            EnvelopeStage::Done => self.level = 0.0,
        }
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(env: &mut ToneEnvelope, frames: usize) {
        for _ in 0..frames {
            env.advance();
        }
    }

    #[test]
    fn attack_reaches_sustain() {
        let mut env = ToneEnvelope::new(1000, 0.1);
        run(&mut env, 2);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert_eq!(env.level(), 1.0);
    }

    #[test]
    fn sustain_holds_until_release() {
        let mut env = ToneEnvelope::new(1000, 0.1);
        run(&mut env, 500);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert_eq!(env.level(), 1.0);
    }

    #[test]
    fn release_finishes_within_release_time() {
        let mut env = ToneEnvelope::new(1000, 0.1);
        run(&mut env, 10);
        env.release();
        run(&mut env, 50);
        assert_eq!(env.stage(), EnvelopeStage::Release);
        assert!((env.level() - 0.5).abs() < 0.02);
        run(&mut env, 51);
        assert!(env.is_done());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn release_during_attack_starts_from_current_level() {
        let mut env = ToneEnvelope::new(10_000, 0.01);
        run(&mut env, 5);
        let level = env.level();
        assert!(level > 0.0 && level < 1.0);
        env.release();
        assert_eq!(env.stage(), EnvelopeStage::Release);
        run(&mut env, 101);
        assert!(env.is_done());
    }

    #[test]
    fn release_before_any_frame_finishes_immediately() {
        let mut env = ToneEnvelope::new(1000, 0.1);
        env.release();
        env.advance();
        assert!(env.is_done());
    }

    #[test]
    fn retrigger_restarts_attack() {
        let mut env = ToneEnvelope::new(1000, 0.1);
        run(&mut env, 10);
        env.release();
        run(&mut env, 200);
        env.retrigger();
        assert_eq!(env.stage(), EnvelopeStage::Attack);
        env.advance();
        assert!(env.level() > 0.0);
    }

    #[test]
    fn second_release_is_ignored() {
        let mut env = ToneEnvelope::new(1000, 0.1);
        run(&mut env, 10);
        env.release();
        run(&mut env, 50);
        let level = env.level();
        env.release();
        assert_eq!(env.level(), level);
        assert_eq!(env.stage(), EnvelopeStage::Release);
    }
}
