//! End-to-end offline sessions: controller, engine backend and WAV codec.

use chime_formats::{frames_to_wav, load_clip};
use chime_ir::ClipData;
use chime_master::{
    EngineBackend, FeedbackConfig, FeedbackController, FeedbackEngine, Frame, MemoryAssets,
};
use std::sync::Arc;

const RATE: u32 = 22050;

fn peak(frames: &[Frame]) -> i16 {
    frames.iter().map(Frame::amplitude).max().unwrap_or(0)
}

/// A short square-ish burst, encoded to WAV so assets go through the decoder.
fn encoded_burst(frames: usize, level: i16) -> Vec<u8> {
    let burst: Vec<Frame> = (0..frames)
        .map(|i| {
            let s = if (i / 20) % 2 == 0 { level } else { -level };
            Frame { left: s, right: s }
        })
        .collect();
    frames_to_wav(&burst, 11025)
}

fn session_assets(samples: usize) -> MemoryAssets {
    let mut assets = MemoryAssets::new();
    assets.insert_encoded("push", &encoded_burst(400, 12000)).unwrap();
    for i in 1..=samples {
        assets
            .insert_encoded(&format!("snd{i}"), &encoded_burst(2000, 8000))
            .unwrap();
    }
    assets
}

struct Session {
    controller: FeedbackController,
    engine: Arc<parking_lot::Mutex<FeedbackEngine>>,
}

impl Session {
    fn new(samples: usize, seed: u64) -> Self {
        let backend = EngineBackend::offline(RATE);
        let engine = backend.shared_engine();
        let controller = FeedbackController::builder(FeedbackConfig::default())
            .seed(seed)
            .build(backend, &session_assets(samples))
            .unwrap();
        controller.start();
        Self { controller, engine }
    }

    fn render_ms(&self, ms: u32) -> Vec<Frame> {
        self.controller.flush();
        self.engine
            .lock()
            .render_frames((RATE * ms / 1000) as usize)
    }
}

#[test]
fn idle_session_is_silent() {
    let session = Session::new(4, 1);
    assert_eq!(peak(&session.render_ms(200)), 0);
}

#[test]
fn tone_sounds_then_fades_after_stop() {
    let session = Session::new(0, 1);

    session.controller.play(false);
    assert!(peak(&session.render_ms(100)) > 0);

    session.controller.stop(false);
    // Release is 0.1 s; allow a block of slack.
    session.render_ms(150);
    assert_eq!(peak(&session.render_ms(100)), 0);
}

#[test]
fn confirmation_plays_once_and_ends() {
    let session = Session::new(0, 1);

    session.controller.play_confirmation();
    let burst = session.render_ms(20);
    assert!(peak(&burst) > 0);

    // 400 frames at 11025 Hz is about 36 ms.
    session.render_ms(100);
    assert_eq!(peak(&session.render_ms(50)), 0);
}

#[test]
fn confirmation_plays_at_its_own_volume() {
    let session = Session::new(0, 1);

    session.controller.play_confirmation();
    let level = peak(&session.render_ms(20));
    // 12000 at volume 0.1, not further scaled by the 0.7 mixer (840).
    assert!((1150..=1200).contains(&level), "peak {level}");
}

#[test]
fn stop_with_samples_silences_running_clips() {
    let session = Session::new(4, 9);

    // Enough coin flips that at least one sample starts.
    for _ in 0..16 {
        session.controller.play(true);
    }
    assert!(peak(&session.render_ms(30)) > 0);

    session.controller.stop(true);
    session.render_ms(150);
    assert_eq!(peak(&session.render_ms(100)), 0);
}

#[test]
fn rendered_session_round_trips_through_wav() {
    let session = Session::new(4, 3);
    let mut frames = Vec::new();

    session.controller.play(true);
    frames.extend(session.render_ms(50));
    session.controller.play_confirmation();
    frames.extend(session.render_ms(50));
    session.controller.stop(true);
    frames.extend(session.render_ms(200));

    let wav = frames_to_wav(&frames, RATE);
    let clip = load_clip(&wav, "session").unwrap();
    assert_eq!(clip.sample_rate, RATE);
    assert_eq!(clip.len(), frames.len());
    match &clip.data {
        ClipData::Stereo16(left, right) => {
            assert_eq!(left[100], frames[100].left);
            assert_eq!(right[100], frames[100].right);
        }
        other => panic!("expected stereo 16-bit, got {} channels", other.num_channels()),
    }
}

#[test]
fn same_seed_renders_identically() {
    let render = |seed| {
        let session = Session::new(4, seed);
        let mut frames = Vec::new();
        for _ in 0..6 {
            session.controller.play(true);
            frames.extend(session.render_ms(40));
        }
        frames
    };
    assert_eq!(render(11), render(11));
}
