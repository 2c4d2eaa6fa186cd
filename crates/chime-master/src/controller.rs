//! The feedback controller and its worker.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;

use crate::assets::{AssetError, AssetSource};
use crate::backend::{AudioBackend, BackendError};
use crate::config::{ConfigError, FeedbackConfig};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::nodes::{ConfirmationPlayer, Mixer, SamplePlayer, Voice};

/// Error type for building a controller. Once built, a controller never
/// reports errors.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("confirmation clip `{name}` could not be loaded")]
    MissingConfirmation {
        name: String,
        #[source]
        source: AssetError,
    },
    #[error("audio backend setup failed")]
    Backend(#[from] BackendError),
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("failed to spawn feedback worker")]
    Spawn(#[source] std::io::Error),
}

enum Command {
    Start,
    Play { include_samples: bool },
    PlayConfirmation,
    Stop { include_samples: bool },
    Flush(Sender<()>),
}

/// Handle to the feedback worker.
///
/// Every command returns immediately; the worker runs them one at a time in
/// submission order. Dropping the handle lets the worker finish what was
/// already submitted, then joins it.
pub struct FeedbackController {
    tx: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    sample_players: usize,
}

impl FeedbackController {
    /// Build with default diagnostics ([`TracingSink`]) and an entropy-seeded RNG.
    pub fn new<B: AudioBackend>(
        backend: B,
        assets: &dyn AssetSource,
        config: FeedbackConfig,
    ) -> Result<Self, ControllerError> {
        Self::builder(config).build(backend, assets)
    }

    pub fn builder(config: FeedbackConfig) -> ControllerBuilder {
        ControllerBuilder {
            config,
            sink: Arc::new(TracingSink),
            rng: None,
        }
    }

    /// Start the backend output. Failure leaves the controller running but
    /// silent.
    pub fn start(&self) {
        self.submit(Command::Start);
    }

    /// Sound a random note, or, if `include_samples`, flip a coin between a
    /// random note and a random sound effect.
    pub fn play(&self, include_samples: bool) {
        self.submit(Command::Play { include_samples });
    }

    /// Restart the confirmation click from the beginning.
    pub fn play_confirmation(&self) {
        self.submit(Command::PlayConfirmation);
    }

    /// Release every note in the range and, if `include_samples`, stop and
    /// rewind every playing sound effect.
    pub fn stop(&self, include_samples: bool) {
        self.submit(Command::Stop { include_samples });
    }

    /// Block until everything submitted so far has run.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.try_submit(Command::Flush(ack_tx)) {
            // An error means the worker is gone, which also means it is idle.
            let _ = ack_rx.recv();
        }
    }

    /// How many numbered clips loaded successfully.
    pub fn sample_player_count(&self) -> usize {
        self.sample_players
    }

    fn submit(&self, command: Command) {
        if !self.try_submit(command) {
            tracing::warn!("feedback worker has exited; command dropped");
        }
    }

    fn try_submit(&self, command: Command) -> bool {
        self.tx.as_ref().is_some_and(|tx| tx.send(command).is_ok())
    }
}

impl Drop for FeedbackController {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop after it drains.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Configures diagnostics and randomness before building a controller.
pub struct ControllerBuilder {
    config: FeedbackConfig,
    sink: Arc<dyn DiagnosticSink>,
    rng: Option<StdRng>,
}

impl ControllerBuilder {
    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Deterministic note and sample choices.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    /// Load clips, wire the graph and spawn the worker.
    ///
    /// Numbered clips that fail to load are skipped and reported. A missing
    /// confirmation clip is fatal.
    pub fn build<B: AudioBackend>(
        self,
        mut backend: B,
        assets: &dyn AssetSource,
    ) -> Result<FeedbackController, ControllerError> {
        let config = self.config;
        config.validate()?;
        let sink = self.sink;

        let confirmation_clip =
            assets
                .load(&config.confirmation_name)
                .map_err(|source| ControllerError::MissingConfirmation {
                    name: config.confirmation_name.clone(),
                    source,
                })?;

        let mixer = Mixer {
            handle: backend.create_mixer(config.mixer_volume)?,
        };
        backend.set_output(mixer.handle)?;

        let voice = Voice {
            handle: backend.create_tone_generator(config.release())?,
            range: config.note_range()?,
            velocity: config.velocity,
        };
        backend.connect_tone(voice.handle, mixer.handle)?;

        let samples: Vec<_> = config
            .sample_names()
            .filter_map(|name| {
                match attach_sample(&mut backend, assets, &name, config.sample_volume, mixer.handle) {
                    Ok(handle) => Some(SamplePlayer { handle, name }),
                    Err(reason) => {
                        sink.report(&Diagnostic::SampleSkipped { name, reason });
                        None
                    }
                }
            })
            .collect();

        let confirmation = ConfirmationPlayer {
            handle: backend.create_player(confirmation_clip, config.confirmation_volume)?,
        };
        backend.connect_player_to_output(confirmation.handle)?;

        tracing::info!(
            mixer = ?mixer.handle,
            samples = samples.len(),
            note_low = voice.range.low(),
            note_high = voice.range.high(),
            "feedback graph ready"
        );

        let sample_players = samples.len();
        let worker = Worker {
            backend,
            voice,
            samples,
            confirmation,
            rng: self.rng.unwrap_or_else(StdRng::from_entropy),
            sink,
        };

        let (tx, rx) = mpsc::channel();
        let handle = std::thread::Builder::new()
            .name("chime-feedback".into())
            .spawn(move || worker.run(rx))
            .map_err(ControllerError::Spawn)?;

        Ok(FeedbackController {
            tx: Some(tx),
            worker: Some(handle),
            sample_players,
        })
    }
}

fn attach_sample<B: AudioBackend>(
    backend: &mut B,
    assets: &dyn AssetSource,
    name: &str,
    volume: f32,
    mixer: B::Mixer,
) -> Result<B::Player, String> {
    let clip = assets.load(name).map_err(|e| e.to_string())?;
    let player = backend.create_player(clip, volume).map_err(|e| e.to_string())?;
    backend.connect_player(player, mixer).map_err(|e| e.to_string())?;
    Ok(player)
}

/// State owned by the worker thread.
struct Worker<B: AudioBackend> {
    backend: B,
    voice: Voice<B::Tone>,
    samples: Vec<SamplePlayer<B::Player>>,
    confirmation: ConfirmationPlayer<B::Player>,
    rng: StdRng,
    sink: Arc<dyn DiagnosticSink>,
}

impl<B: AudioBackend> Worker<B> {
    fn run(mut self, rx: Receiver<Command>) {
        for command in rx {
            self.execute(command);
        }
        tracing::debug!("feedback worker exiting");
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Play { include_samples } => self.play(include_samples),
            Command::PlayConfirmation => {
                self.confirmation.restart(&mut self.backend);
                tracing::debug!("confirmation restarted");
            }
            Command::Stop { include_samples } => self.stop(include_samples),
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    fn start(&mut self) {
        match self.backend.start() {
            Ok(()) => tracing::info!("audio backend started"),
            Err(e) => self.sink.report(&Diagnostic::BackendStartFailed {
                reason: e.to_string(),
            }),
        }
    }

    fn play(&mut self, include_samples: bool) {
        if !include_samples || self.rng.gen_bool(0.5) {
            let note = self.voice.trigger(&mut self.backend, &mut self.rng);
            tracing::debug!(note, "tone triggered");
        } else if let Some(sample) = self.samples.choose(&mut self.rng) {
            sample.play(&mut self.backend);
            tracing::debug!(sample = %sample.name, "sample triggered");
        } else {
            // No fallback to the tone branch.
            self.sink.report(&Diagnostic::NoSamplePlayers);
        }
    }

    fn stop(&mut self, include_samples: bool) {
        if include_samples {
            for sample in &self.samples {
                if !sample.is_playing(&self.backend) {
                    continue;
                }
                if let Err(e) = sample.stop_and_reload(&mut self.backend) {
                    self.sink.report(&Diagnostic::ReloadFailed {
                        name: sample.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        self.voice.silence(&mut self.backend);
        tracing::debug!(include_samples, "stopped");
    }
}
