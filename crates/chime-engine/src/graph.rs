//! The feedback engine: tone banks and clip players routed into mixers.

use alloc::vec::Vec;
use chime_ir::{AudioBuffer, Clip, BLOCK_SIZE};
use slotmap::SlotMap;

use crate::clip_player::ClipPlayer;
use crate::frame::Frame;
use crate::tone_bank::ToneBank;

slotmap::new_key_type! {
    /// Key of a mixer node.
    pub struct MixerKey;
    /// Key of a tone bank.
    pub struct ToneKey;
    /// Key of a clip player.
    pub struct PlayerKey;
}

/// Something that can be connected into a mixer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Tone(ToneKey),
    Player(PlayerKey),
}

/// A summing node with a master volume.
#[derive(Clone, Debug)]
pub struct MixerNode {
    pub volume: f32,
    inputs: Vec<Source>,
}

impl MixerNode {
    pub fn inputs(&self) -> &[Source] {
        &self.inputs
    }
}

/// Owns every node and renders the output mixer into frames.
///
/// Only sources connected to the output mixer advance; everything else is
/// frozen. Rendering happens in blocks of [`BLOCK_SIZE`] frames and never
/// allocates once the graph is built.
pub struct FeedbackEngine {
    sample_rate: u32,
    mixers: SlotMap<MixerKey, MixerNode>,
    tones: SlotMap<ToneKey, ToneBank>,
    players: SlotMap<PlayerKey, ClipPlayer>,
    output: Option<MixerKey>,
    /// Players summed into the output at unit gain, bypassing every mixer.
    direct: Vec<PlayerKey>,
    /// Mixed block awaiting conversion to frames.
    block: AudioBuffer,
    /// Per-source scratch.
    scratch: AudioBuffer,
    /// Next frame of `block` to hand out.
    cursor: usize,
}

impl FeedbackEngine {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            mixers: SlotMap::with_key(),
            tones: SlotMap::with_key(),
            players: SlotMap::with_key(),
            output: None,
            direct: Vec::new(),
            block: AudioBuffer::stereo_block(),
            scratch: AudioBuffer::stereo_block(),
            cursor: BLOCK_SIZE,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // --- Graph construction ---

    pub fn add_mixer(&mut self, volume: f32) -> MixerKey {
        self.mixers.insert(MixerNode {
            volume: volume.clamp(0.0, 1.0),
            inputs: Vec::new(),
        })
    }

    pub fn add_tone_bank(&mut self, release_secs: f32) -> ToneKey {
        self.tones.insert(ToneBank::new(self.sample_rate, release_secs))
    }

    pub fn add_player(&mut self, clip: Clip, volume: f32) -> PlayerKey {
        self.players
            .insert(ClipPlayer::new(clip, volume, self.sample_rate))
    }

    /// Route `source` into `mixer`. Returns false if either end is unknown.
    /// Connecting the same source twice is a no-op.
    pub fn connect(&mut self, source: Source, mixer: MixerKey) -> bool {
        let exists = match source {
            Source::Tone(key) => self.tones.contains_key(key),
            Source::Player(key) => self.players.contains_key(key),
        };
        let Some(node) = self.mixers.get_mut(mixer) else {
            return false;
        };
        if !exists {
            return false;
        }
        if !node.inputs.contains(&source) {
            node.inputs.push(source);
        }
        true
    }

    /// Make `mixer` the node rendered to the output. Returns false if unknown.
    pub fn set_output(&mut self, mixer: MixerKey) -> bool {
        if !self.mixers.contains_key(mixer) {
            return false;
        }
        self.output = Some(mixer);
        true
    }

    pub fn output(&self) -> Option<MixerKey> {
        self.output
    }

    /// Route `player` straight to the output at its own volume, outside
    /// any mixer. Returns false if the player is unknown.
    pub fn connect_to_output(&mut self, player: PlayerKey) -> bool {
        if !self.players.contains_key(player) {
            return false;
        }
        if !self.direct.contains(&player) {
            self.direct.push(player);
        }
        true
    }

    pub fn direct_outputs(&self) -> &[PlayerKey] {
        &self.direct
    }

    // --- Node access ---

    pub fn mixer(&self, key: MixerKey) -> Option<&MixerNode> {
        self.mixers.get(key)
    }

    pub fn tone(&self, key: ToneKey) -> Option<&ToneBank> {
        self.tones.get(key)
    }

    pub fn tone_mut(&mut self, key: ToneKey) -> Option<&mut ToneBank> {
        self.tones.get_mut(key)
    }

    pub fn player(&self, key: PlayerKey) -> Option<&ClipPlayer> {
        self.players.get(key)
    }

    pub fn player_mut(&mut self, key: PlayerKey) -> Option<&mut ClipPlayer> {
        self.players.get_mut(key)
    }

    // --- Rendering ---

    /// Generate one frame of audio.
    pub fn render_frame(&mut self) -> Frame {
        if self.cursor >= BLOCK_SIZE {
            self.render_block();
            self.cursor = 0;
        }
        let frame = Frame::from_f32(
            self.block.channel(0)[self.cursor],
            self.block.channel(1)[self.cursor],
        );
        self.cursor += 1;
        frame
    }

    /// Fill `out` with consecutive frames.
    pub fn render_into(&mut self, out: &mut [Frame]) {
        for frame in out.iter_mut() {
            *frame = self.render_frame();
        }
    }

    /// Render `count` frames into a new vector (allocates; offline use).
    pub fn render_frames(&mut self, count: usize) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(count);
        for _ in 0..count {
            frames.push(self.render_frame());
        }
        frames
    }

    fn render_block(&mut self) {
        self.block.silence();

        if let Some(mixer) = self.output.and_then(|key| self.mixers.get(key)) {
            for source in &mixer.inputs {
                self.scratch.silence();
                match *source {
                    Source::Tone(key) => {
                        if let Some(tone) = self.tones.get_mut(key) {
                            tone.render(&mut self.scratch);
                        }
                    }
                    Source::Player(key) => {
                        if let Some(player) = self.players.get_mut(key) {
                            player.render(&mut self.scratch);
                        }
                    }
                }
                self.block.mix_from_scaled(&self.scratch, mixer.volume);
            }
        }

        for key in &self.direct {
            if let Some(player) = self.players.get_mut(*key) {
                self.scratch.silence();
                player.render(&mut self.scratch);
                self.block.mix_from_scaled(&self.scratch, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_ir::ClipData;

    fn square_clip(frames: usize) -> Clip {
        let data = (0..frames).map(|i| if i % 2 == 0 { 16384 } else { -16384 }).collect();
        Clip::new("sq", ClipData::Mono16(data), 8000)
    }

    fn peak(frames: &[Frame]) -> i16 {
        frames.iter().map(Frame::amplitude).max().unwrap_or(0)
    }

    #[test]
    fn empty_engine_renders_silence() {
        let mut engine = FeedbackEngine::new(8000);
        let frames = engine.render_frames(1000);
        assert_eq!(frames.len(), 1000);
        assert_eq!(peak(&frames), 0);
    }

    #[test]
    fn connected_tone_is_audible() {
        let mut engine = FeedbackEngine::new(8000);
        let mixer = engine.add_mixer(0.7);
        let tone = engine.add_tone_bank(0.1);
        assert!(engine.connect(Source::Tone(tone), mixer));
        assert!(engine.set_output(mixer));

        engine.tone_mut(tone).unwrap().note_on(60, 127);
        assert!(peak(&engine.render_frames(1000)) > 1000);
    }

    #[test]
    fn unrouted_source_is_frozen() {
        let mut engine = FeedbackEngine::new(8000);
        let mixer = engine.add_mixer(1.0);
        engine.set_output(mixer);
        let player = engine.add_player(square_clip(4000), 1.0);

        engine.player_mut(player).unwrap().play();
        assert_eq!(peak(&engine.render_frames(512)), 0);
        assert_eq!(engine.player(player).unwrap().position_frames(), 0);
    }

    #[test]
    fn mixer_volume_scales_output() {
        let mut engine = FeedbackEngine::new(8000);
        let mixer = engine.add_mixer(0.5);
        let player = engine.add_player(square_clip(4000), 1.0);
        engine.connect(Source::Player(player), mixer);
        engine.set_output(mixer);

        engine.player_mut(player).unwrap().play();
        let frames = engine.render_frames(256);
        assert_eq!(frames[0].left, 8192);
        assert_eq!(frames[1].left, -8192);
    }

    #[test]
    fn connect_rejects_unknown_nodes() {
        let mut engine = FeedbackEngine::new(8000);
        let mixer = engine.add_mixer(1.0);
        let tone = engine.add_tone_bank(0.1);

        assert!(!engine.connect(Source::Tone(tone), MixerKey::default()));
        assert!(!engine.connect(Source::Player(PlayerKey::default()), mixer));
        assert!(!engine.set_output(MixerKey::default()));
        assert!(engine.mixer(mixer).unwrap().inputs().is_empty());
    }

    #[test]
    fn double_connect_is_single_input() {
        let mut engine = FeedbackEngine::new(8000);
        let mixer = engine.add_mixer(1.0);
        let tone = engine.add_tone_bank(0.1);
        engine.connect(Source::Tone(tone), mixer);
        engine.connect(Source::Tone(tone), mixer);
        assert_eq!(engine.mixer(mixer).unwrap().inputs().len(), 1);
    }

    #[test]
    fn direct_player_bypasses_mixer_volume() {
        let mut engine = FeedbackEngine::new(8000);
        let mixer = engine.add_mixer(0.7);
        engine.set_output(mixer);
        let player = engine.add_player(square_clip(4000), 0.1);
        assert!(engine.connect_to_output(player));
        assert!(engine.connect_to_output(player));
        assert_eq!(engine.direct_outputs(), &[player]);

        engine.player_mut(player).unwrap().play();
        let frames = engine.render_frames(256);
        // 0.5 * 0.1 of full scale, untouched by the 0.7 mixer.
        assert_eq!(frames[0].left, 1638);
        assert_eq!(frames[1].left, -1638);
    }

    #[test]
    fn direct_player_sounds_without_output_mixer() {
        let mut engine = FeedbackEngine::new(8000);
        let player = engine.add_player(square_clip(4000), 1.0);
        engine.connect_to_output(player);
        engine.player_mut(player).unwrap().play();
        assert!(peak(&engine.render_frames(256)) > 0);
        assert!(!engine.connect_to_output(PlayerKey::default()));
    }

    #[test]
    fn render_into_matches_render_frames() {
        let build = || {
            let mut engine = FeedbackEngine::new(8000);
            let mixer = engine.add_mixer(0.7);
            let tone = engine.add_tone_bank(0.1);
            engine.connect(Source::Tone(tone), mixer);
            engine.set_output(mixer);
            engine.tone_mut(tone).unwrap().note_on(72, 127);
            engine
        };
        let mut a = build();
        let mut b = build();
        let mut buf = [Frame::silence(); 600];
        a.render_into(&mut buf);
        assert_eq!(buf.to_vec(), b.render_frames(600));
    }
}
