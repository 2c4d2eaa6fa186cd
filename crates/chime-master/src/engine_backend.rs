//! [`AudioBackend`] over the software engine and the default cpal device.

use chime_audio::{AudioError, AudioOutput, CpalOutput};
use chime_engine::{FeedbackEngine, Frame, MixerKey, PlayerKey, Source, ToneKey};
use chime_ir::{Clip, BLOCK_SIZE};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::backend::{AudioBackend, BackendError};

/// Sample rate used when the device cannot be queried.
const FALLBACK_RATE: u32 = 44100;

/// How long the render thread sleeps when the device ring is full.
const RENDER_IDLE: Duration = Duration::from_millis(2);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Output {
    Device,
    Offline,
}

struct RenderThread {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Drives a [`FeedbackEngine`].
///
/// In device mode `start` spawns a render thread that opens the default
/// output and keeps its ring topped up. In offline mode nothing is opened;
/// the caller pulls frames through [`EngineBackend::shared_engine`].
pub struct EngineBackend {
    engine: Arc<Mutex<FeedbackEngine>>,
    output: Output,
    render: Option<RenderThread>,
}

impl EngineBackend {
    /// Render to the default output device, at its preferred rate if it can
    /// be queried. An unusable device surfaces as a `start` failure.
    pub fn for_default_device() -> Self {
        let rate = chime_audio::default_output_rate().unwrap_or_else(|e| {
            tracing::debug!(%e, fallback = FALLBACK_RATE, "could not query output rate");
            FALLBACK_RATE
        });
        Self::with_output(rate, Output::Device)
    }

    /// Never touches a device; frames are pulled by the caller.
    pub fn offline(sample_rate: u32) -> Self {
        Self::with_output(sample_rate, Output::Offline)
    }

    fn with_output(sample_rate: u32, output: Output) -> Self {
        Self {
            engine: Arc::new(Mutex::new(FeedbackEngine::new(sample_rate))),
            output,
            render: None,
        }
    }

    /// The engine, for offline rendering or inspection.
    pub fn shared_engine(&self) -> Arc<Mutex<FeedbackEngine>> {
        self.engine.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.engine.lock().sample_rate()
    }

    fn spawn_render_thread(&mut self) -> Result<(), BackendError> {
        let engine = self.engine.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("chime-render".into())
            .spawn(move || render_loop(engine, stop_flag, ready_tx))
            .map_err(|e| BackendError::Other(format!("failed to spawn render thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.render = Some(RenderThread { stop, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e.into())
            }
            Err(_) => {
                let _ = handle.join();
                Err(BackendError::Other("render thread exited during start".into()))
            }
        }
    }
}

impl Drop for EngineBackend {
    fn drop(&mut self) {
        if let Some(render) = self.render.take() {
            render.stop.store(true, Ordering::Relaxed);
            let _ = render.handle.join();
        }
    }
}

fn render_loop(
    engine: Arc<Mutex<FeedbackEngine>>,
    stop: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(), AudioError>>,
) {
    let mut output = match open_device() {
        Ok(output) => output,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let engine_rate = engine.lock().sample_rate();
    if output.sample_rate() != engine_rate {
        tracing::warn!(
            device = output.sample_rate(),
            engine = engine_rate,
            "device rate differs from engine rate; pitch will be off"
        );
    }
    let _ = ready.send(Ok(()));

    let mut block = [Frame::silence(); BLOCK_SIZE];
    while !stop.load(Ordering::Relaxed) {
        if output.vacant() < BLOCK_SIZE {
            std::thread::sleep(RENDER_IDLE);
            continue;
        }
        engine.lock().render_into(&mut block);
        let _ = output.write(&block);
    }

    let _ = output.stop();
}

fn open_device() -> Result<CpalOutput, AudioError> {
    let (mut output, consumer) = CpalOutput::new()?;
    output.build_stream(consumer)?;
    output.start()?;
    Ok(output)
}

impl AudioBackend for EngineBackend {
    type Mixer = MixerKey;
    type Tone = ToneKey;
    type Player = PlayerKey;

    fn create_mixer(&mut self, volume: f32) -> Result<MixerKey, BackendError> {
        Ok(self.engine.lock().add_mixer(volume))
    }

    fn create_tone_generator(&mut self, release: Duration) -> Result<ToneKey, BackendError> {
        Ok(self.engine.lock().add_tone_bank(release.as_secs_f32()))
    }

    fn create_player(&mut self, clip: Clip, volume: f32) -> Result<PlayerKey, BackendError> {
        if clip.is_empty() {
            return Err(BackendError::Other(format!("clip `{}` has no audio", clip.name)));
        }
        Ok(self.engine.lock().add_player(clip, volume))
    }

    fn connect_tone(&mut self, tone: ToneKey, mixer: MixerKey) -> Result<(), BackendError> {
        if self.engine.lock().connect(Source::Tone(tone), mixer) {
            Ok(())
        } else {
            Err(BackendError::UnknownHandle("tone or mixer"))
        }
    }

    fn connect_player(&mut self, player: PlayerKey, mixer: MixerKey) -> Result<(), BackendError> {
        if self.engine.lock().connect(Source::Player(player), mixer) {
            Ok(())
        } else {
            Err(BackendError::UnknownHandle("player or mixer"))
        }
    }

    fn connect_player_to_output(&mut self, player: PlayerKey) -> Result<(), BackendError> {
        if self.engine.lock().connect_to_output(player) {
            Ok(())
        } else {
            Err(BackendError::UnknownHandle("player"))
        }
    }

    fn set_output(&mut self, mixer: MixerKey) -> Result<(), BackendError> {
        if self.engine.lock().set_output(mixer) {
            Ok(())
        } else {
            Err(BackendError::UnknownHandle("mixer"))
        }
    }

    fn start(&mut self) -> Result<(), BackendError> {
        match self.output {
            Output::Offline => Ok(()),
            Output::Device if self.render.is_some() => Ok(()),
            Output::Device => self.spawn_render_thread(),
        }
    }

    fn note_on(&mut self, tone: ToneKey, note: u8, velocity: u8) {
        if let Some(bank) = self.engine.lock().tone_mut(tone) {
            bank.note_on(note, velocity);
        }
    }

    fn note_off(&mut self, tone: ToneKey, note: u8) {
        if let Some(bank) = self.engine.lock().tone_mut(tone) {
            bank.note_off(note);
        }
    }

    fn play(&mut self, player: PlayerKey) {
        let direct = {
            let mut engine = self.engine.lock();
            if let Some(p) = engine.player_mut(player) {
                p.play();
            }
            engine.direct_outputs().contains(&player)
        };
        // Direct players do not wait for `start`.
        if direct && self.output == Output::Device && self.render.is_none() {
            if let Err(e) = self.spawn_render_thread() {
                tracing::debug!(%e, "output still unavailable for direct player");
            }
        }
    }

    fn stop(&mut self, player: PlayerKey) {
        if let Some(p) = self.engine.lock().player_mut(player) {
            p.stop();
        }
    }

    fn rewind(&mut self, player: PlayerKey) {
        if let Some(p) = self.engine.lock().player_mut(player) {
            p.rewind();
        }
    }

    fn reload(&mut self, player: PlayerKey) -> Result<(), BackendError> {
        match self.engine.lock().player_mut(player) {
            Some(p) => {
                p.reset();
                Ok(())
            }
            None => Err(BackendError::UnknownHandle("player")),
        }
    }

    fn is_playing(&self, player: PlayerKey) -> bool {
        self.engine
            .lock()
            .player(player)
            .is_some_and(|p| p.is_playing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_ir::ClipData;

    fn clip(frames: usize) -> Clip {
        Clip::new("c", ClipData::Mono16(vec![8000; frames]), 8000)
    }

    fn peak(frames: &[Frame]) -> i16 {
        frames.iter().map(Frame::amplitude).max().unwrap_or(0)
    }

    #[test]
    fn offline_start_succeeds_without_device() {
        let mut backend = EngineBackend::offline(8000);
        assert!(backend.start().is_ok());
        assert_eq!(backend.sample_rate(), 8000);
    }

    #[test]
    fn wired_graph_renders_tone_and_player() {
        let mut backend = EngineBackend::offline(8000);
        let mixer = backend.create_mixer(0.7).unwrap();
        backend.set_output(mixer).unwrap();
        let tone = backend.create_tone_generator(Duration::from_millis(100)).unwrap();
        backend.connect_tone(tone, mixer).unwrap();
        let player = backend.create_player(clip(400), 1.0).unwrap();
        backend.connect_player(player, mixer).unwrap();

        let engine = backend.shared_engine();
        backend.note_on(tone, 60, 127);
        assert!(peak(&engine.lock().render_frames(256)) > 0);

        backend.note_off(tone, 60);
        engine.lock().render_frames(2048);
        assert_eq!(peak(&engine.lock().render_frames(256)), 0);

        backend.play(player);
        assert!(backend.is_playing(player));
        assert!(peak(&engine.lock().render_frames(256)) > 0);
    }

    #[test]
    fn reload_stops_and_rewinds() {
        let mut backend = EngineBackend::offline(8000);
        let mixer = backend.create_mixer(1.0).unwrap();
        backend.set_output(mixer).unwrap();
        let player = backend.create_player(clip(4000), 1.0).unwrap();
        backend.connect_player(player, mixer).unwrap();

        backend.play(player);
        backend.shared_engine().lock().render_frames(512);
        backend.stop(player);
        backend.reload(player).unwrap();

        let engine = backend.shared_engine();
        let guard = engine.lock();
        let p = guard.player(player).unwrap();
        assert!(!p.is_playing());
        assert_eq!(p.position_frames(), 0);
    }

    #[test]
    fn direct_player_ignores_mixer_volume() {
        let mut backend = EngineBackend::offline(8000);
        let mixer = backend.create_mixer(0.7).unwrap();
        backend.set_output(mixer).unwrap();
        let player = backend.create_player(clip(400), 0.1).unwrap();
        backend.connect_player_to_output(player).unwrap();

        backend.play(player);
        let frames = backend.shared_engine().lock().render_frames(256);
        // 8000 * 0.1; through the mixer it would be 560.
        assert!((795..=800).contains(&peak(&frames)), "peak {}", peak(&frames));
        assert!(backend.connect_player_to_output(PlayerKey::default()).is_err());
    }

    #[test]
    fn empty_clip_is_rejected() {
        let mut backend = EngineBackend::offline(8000);
        assert!(backend.create_player(clip(0), 1.0).is_err());
    }

    #[test]
    fn foreign_handles_are_errors_or_noops() {
        let mut backend = EngineBackend::offline(8000);
        assert!(backend.reload(PlayerKey::default()).is_err());
        assert!(backend.set_output(MixerKey::default()).is_err());
        assert!(!backend.is_playing(PlayerKey::default()));
        backend.play(PlayerKey::default());
        backend.note_on(ToneKey::default(), 60, 127);
    }
}
