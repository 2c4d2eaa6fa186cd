//! Where clips come from.

use chime_formats::{load_clip, FormatError};
use chime_ir::Clip;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for asset lookup and decoding.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset `{0}` not found")]
    NotFound(String),
    #[error("failed to read asset `{name}`")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode asset `{name}`")]
    Decode {
        name: String,
        #[source]
        source: FormatError,
    },
}

/// Resolves a logical clip name (`push`, `snd3`, ...) to decoded audio.
pub trait AssetSource {
    fn load(&self, name: &str) -> Result<Clip, AssetError>;
}

/// Clips stored as `<root>/<name>.<ext>`, trying each extension in order.
#[derive(Clone, Debug)]
pub struct DirAssets {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirAssets {
    /// Looks for `.aiff`, `.aif` and `.wav` files, in that order.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: ["aiff", "aif", "wav"].map(String::from).to_vec(),
        }
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn find(&self, name: &str) -> Option<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| self.root.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
    }
}

impl AssetSource for DirAssets {
    fn load(&self, name: &str) -> Result<Clip, AssetError> {
        let path = self
            .find(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;
        let bytes = std::fs::read(&path).map_err(|source| AssetError::Io {
            name: name.to_string(),
            source,
        })?;
        load_clip(&bytes, name).map_err(|source| AssetError::Decode {
            name: name.to_string(),
            source,
        })
    }
}

/// Already-decoded clips keyed by name.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssets {
    clips: HashMap<String, Clip>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, clip: Clip) -> &mut Self {
        self.clips.insert(name.into(), clip);
        self
    }

    pub fn with(mut self, name: impl Into<String>, clip: Clip) -> Self {
        self.insert(name, clip);
        self
    }

    /// Decode `bytes` (WAV or AIFF) and store the clip under `name`.
    pub fn insert_encoded(&mut self, name: &str, bytes: &[u8]) -> Result<&mut Self, AssetError> {
        let clip = load_clip(bytes, name).map_err(|source| AssetError::Decode {
            name: name.to_string(),
            source,
        })?;
        Ok(self.insert(name, clip))
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

impl AssetSource for MemoryAssets {
    fn load(&self, name: &str) -> Result<Clip, AssetError> {
        self.clips
            .get(name)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(name.to_string()))
    }
}
