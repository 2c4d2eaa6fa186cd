//! chime CLI: live feedback on the default device, or a scripted offline
//! render to WAV.
//!
//! Usage:
//!   chime-cli live --assets sounds/
//!   chime-cli render --out session.wav --assets sounds/ ps wait:300 c wait:200 ss wait:200

use anyhow::{bail, Context, Result};
use chime_master::{DirAssets, EngineBackend, FeedbackConfig, FeedbackController, Frame};
use clap::{Args, Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chime-cli", version, about = "Audible interaction feedback")]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Play feedback on the default output device, driven by stdin lines:
    /// p, ps, c, s, ss, q.
    Live {
        #[command(flatten)]
        setup: Setup,
    },
    /// Run a script offline and write the result to a WAV file.
    Render {
        #[command(flatten)]
        setup: Setup,
        /// Output WAV path.
        #[arg(long)]
        out: PathBuf,
        /// Seed for note and sample choices.
        #[arg(long)]
        seed: Option<u64>,
        /// Render sample rate in Hz.
        #[arg(long, default_value_t = 44100)]
        rate: u32,
        /// Steps: p, ps, c, s, ss, or wait:<ms>.
        #[arg(required = true)]
        script: Vec<Step>,
    },
}

#[derive(Args)]
struct Setup {
    /// Directory holding push and snd1..sndN clips (.aiff, .aif or .wav).
    #[arg(long, default_value = ".")]
    assets: PathBuf,
    /// TOML file overriding the default tunables.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Setup {
    fn load_config(&self) -> Result<FeedbackConfig> {
        match &self.config {
            Some(path) => FeedbackConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display())),
            None => Ok(FeedbackConfig::default()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Play { include_samples: bool },
    Confirm,
    Stop { include_samples: bool },
    Quit,
}

impl Command {
    fn apply(self, controller: &FeedbackController) {
        match self {
            Command::Play { include_samples } => controller.play(include_samples),
            Command::Confirm => controller.play_confirmation(),
            Command::Stop { include_samples } => controller.stop(include_samples),
            Command::Quit => {}
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "p" => Command::Play { include_samples: false },
            "ps" => Command::Play { include_samples: true },
            "c" => Command::Confirm,
            "s" => Command::Stop { include_samples: false },
            "ss" => Command::Stop { include_samples: true },
            "q" => Command::Quit,
            other => return Err(format!("unknown command `{other}`")),
        })
    }
}

#[derive(Clone, Copy, Debug)]
enum Step {
    Run(Command),
    Wait(Duration),
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(ms) = s.strip_prefix("wait:") {
            let ms: u64 = ms.parse().map_err(|_| format!("bad wait `{s}`"))?;
            return Ok(Step::Wait(Duration::from_millis(ms)));
        }
        s.parse().map(Step::Run)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Mode::Live { setup } => live(&setup),
        Mode::Render {
            setup,
            out,
            seed,
            rate,
            script,
        } => render(&setup, &out, seed, rate, &script),
    }
}

fn live(setup: &Setup) -> Result<()> {
    let config = setup.load_config()?;
    let assets = DirAssets::new(&setup.assets);
    let controller = FeedbackController::new(EngineBackend::for_default_device(), &assets, config)
        .context("failed to build feedback controller")?;
    controller.start();
    println!("p = play, ps = play with samples, c = confirm, s = stop, ss = stop all, q = quit");

    for line in std::io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(command) => command.apply(&controller),
            Err(e) => eprintln!("{e}"),
        }
    }

    controller.stop(true);
    controller.flush();
    Ok(())
}

fn render(
    setup: &Setup,
    out: &Path,
    seed: Option<u64>,
    rate: u32,
    script: &[Step],
) -> Result<()> {
    if rate == 0 {
        bail!("sample rate must be positive");
    }
    let config = setup.load_config()?;
    let assets = DirAssets::new(&setup.assets);
    let backend = EngineBackend::offline(rate);
    let engine = backend.shared_engine();

    let mut builder = FeedbackController::builder(config);
    if let Some(seed) = seed {
        builder = builder.seed(seed);
    }
    let controller = builder
        .build(backend, &assets)
        .context("failed to build feedback controller")?;
    controller.start();

    let mut frames: Vec<Frame> = Vec::new();
    for step in script {
        match *step {
            Step::Run(Command::Quit) => break,
            Step::Run(command) => command.apply(&controller),
            Step::Wait(duration) => {
                controller.flush();
                let count = (duration.as_secs_f64() * rate as f64).round() as usize;
                frames.extend(engine.lock().render_frames(count));
            }
        }
    }
    drop(controller);

    let wav = chime_master::frames_to_wav(&frames, rate);
    std::fs::write(out, &wav).with_context(|| format!("failed to write {}", out.display()))?;
    tracing::info!(
        path = %out.display(),
        frames = frames.len(),
        bytes = wav.len(),
        "rendered"
    );
    Ok(())
}
