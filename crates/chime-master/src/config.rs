//! Controller configuration.

use chime_ir::NoteRange;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Longest accepted note release, in seconds.
pub const MAX_RELEASE_SECS: f32 = 60.0;

/// Error type for loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
    #[error("note range {low}..={high} is empty or outside MIDI 0..=127")]
    NoteRange { low: u8, high: u8 },
    #[error("velocity {0} must be within 1..=127")]
    Velocity(u8),
    #[error("{field} {value} must be within 0.0..=1.0")]
    Volume { field: &'static str, value: f32 },
    #[error("release time {0}s must be within 0..=60")]
    Release(f32),
    #[error("asset name `{0}` must not be empty")]
    EmptyName(&'static str),
}

/// Tunables for the feedback controller. Every field has a default, so a
/// config file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedbackConfig {
    /// Lowest note the voice may pick.
    pub note_low: u8,
    /// Highest note the voice may pick (inclusive).
    pub note_high: u8,
    pub velocity: u8,
    /// Note fade-out after note-off, in seconds.
    pub release_secs: f32,
    pub mixer_volume: f32,
    pub confirmation_volume: f32,
    pub sample_volume: f32,
    /// Numbered clips are `<sample_prefix>1` ..= `<sample_prefix><sample_count>`.
    pub sample_prefix: String,
    pub sample_count: u32,
    pub confirmation_name: String,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            note_low: NoteRange::DEFAULT.low(),
            note_high: NoteRange::DEFAULT.high(),
            velocity: 127,
            release_secs: 0.1,
            mixer_volume: 0.7,
            confirmation_volume: 0.1,
            sample_volume: 1.0,
            sample_prefix: "snd".to_string(),
            sample_count: 4,
            confirmation_name: "push".to_string(),
        }
    }
}

impl FeedbackConfig {
    /// Parse and validate TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.note_range()?;
        if !(1..=127).contains(&self.velocity) {
            return Err(ConfigError::Velocity(self.velocity));
        }
        if !(0.0..=MAX_RELEASE_SECS).contains(&self.release_secs) {
            return Err(ConfigError::Release(self.release_secs));
        }
        for (field, value) in [
            ("mixer_volume", self.mixer_volume),
            ("confirmation_volume", self.confirmation_volume),
            ("sample_volume", self.sample_volume),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Volume { field, value });
            }
        }
        if self.confirmation_name.is_empty() {
            return Err(ConfigError::EmptyName("confirmation_name"));
        }
        if self.sample_prefix.is_empty() && self.sample_count > 0 {
            return Err(ConfigError::EmptyName("sample_prefix"));
        }
        Ok(())
    }

    pub fn note_range(&self) -> Result<NoteRange, ConfigError> {
        NoteRange::new(self.note_low, self.note_high).ok_or(ConfigError::NoteRange {
            low: self.note_low,
            high: self.note_high,
        })
    }

    pub fn release(&self) -> Duration {
        // `clamp` passes NaN through.
        let secs = if self.release_secs.is_nan() { 0.0 } else { self.release_secs };
        Duration::from_secs_f32(secs.clamp(0.0, MAX_RELEASE_SECS))
    }

    /// Names of the numbered clips, starting at 1.
    pub fn sample_names(&self) -> impl Iterator<Item = String> + '_ {
        (1..=self.sample_count).map(move |i| format!("{}{}", self.sample_prefix, i))
    }
}
