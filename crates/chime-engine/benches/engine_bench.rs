use chime_engine::{FeedbackEngine, Frame, Source};
use chime_ir::{Clip, ClipData};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn busy_engine() -> FeedbackEngine {
    let mut engine = FeedbackEngine::new(44100);
    let mixer = engine.add_mixer(0.7);
    let tone = engine.add_tone_bank(0.1);
    engine.connect(Source::Tone(tone), mixer);

    let clip = Clip::new("noise", ClipData::Mono16((0..44100).map(|i| (i % 512) as i16 * 64).collect()), 22050);
    let player = engine.add_player(clip, 1.0);
    engine.connect(Source::Player(player), mixer);
    engine.set_output(mixer);

    if let Some(bank) = engine.tone_mut(tone) {
        for note in (24..84).step_by(4) {
            bank.note_on(note, 127);
        }
    }
    if let Some(p) = engine.player_mut(player) {
        p.play();
    }
    engine
}

fn render_second(c: &mut Criterion) {
    let mut engine = busy_engine();
    let mut out = vec![Frame::silence(); 44100];
    c.bench_function("render 1s, 15 tones + clip", |b| {
        b.iter(|| engine.render_into(black_box(&mut out)))
    });
}

criterion_group!(benches, render_second);
criterion_main!(benches);
