//! Audio feedback controller for chime.
//!
//! [`FeedbackController`] plays a random synth note or a random sound effect
//! on each interaction, a distinguished confirmation click on commit, and
//! silences everything on request. Commands are fire-and-forget and run in
//! submission order on a dedicated worker thread that owns the
//! [`AudioBackend`].
//!
//! Nothing the controller does at runtime can fail from the caller's point
//! of view: backend start, clip load and clip reload failures are reported
//! to a [`DiagnosticSink`] and otherwise ignored. The one fatal condition is
//! a missing confirmation clip, reported by [`FeedbackController::builder`]'s
//! `build`.

mod assets;
mod backend;
mod config;
mod controller;
mod diagnostics;
mod engine_backend;
mod nodes;

pub use assets::{AssetError, AssetSource, DirAssets, MemoryAssets};
pub use backend::{AudioBackend, BackendError};
pub use config::{ConfigError, FeedbackConfig};
pub use controller::{ControllerBuilder, ControllerError, FeedbackController};
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use engine_backend::EngineBackend;

// Re-export common types so callers don't need chime-ir/chime-engine directly.
pub use chime_engine::{FeedbackEngine, Frame};
pub use chime_formats::{frames_to_wav, write_wav, FormatError};
pub use chime_ir::{Clip, ClipData, NoteRange};
