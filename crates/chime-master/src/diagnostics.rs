//! Observable record of failures the controller swallows.

use std::fmt;

/// Something went wrong, or nothing played, but the caller was not told.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// The backend refused to start; later commands run but stay silent.
    BackendStartFailed { reason: String },
    /// A numbered clip could not be loaded or attached and has no player.
    SampleSkipped { name: String, reason: String },
    /// A stopped clip could not be reloaded; it may not restart from zero.
    ReloadFailed { name: String, reason: String },
    /// `play(true)` chose the sample branch but there are no sample players.
    NoSamplePlayers,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::BackendStartFailed { reason } => {
                write!(f, "audio backend failed to start: {reason}")
            }
            Diagnostic::SampleSkipped { name, reason } => {
                write!(f, "skipped sample `{name}`: {reason}")
            }
            Diagnostic::ReloadFailed { name, reason } => {
                write!(f, "failed to reload sample `{name}`: {reason}")
            }
            Diagnostic::NoSamplePlayers => write!(f, "sample branch chosen with no sample players"),
        }
    }
}

/// Receives [`Diagnostic`]s. Called from the worker thread and, during
/// construction, from the thread that builds the controller.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&Diagnostic) + Send + Sync,
{
    fn report(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

/// Forwards diagnostics to `tracing`. Failures are warnings; an empty
/// sample branch is only debug noise.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::NoSamplePlayers => tracing::debug!(%diagnostic),
            _ => tracing::warn!(%diagnostic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn closures_are_sinks() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink = move |d: &Diagnostic| captured.lock().unwrap().push(d.clone());

        sink.report(&Diagnostic::NoSamplePlayers);
        assert_eq!(*seen.lock().unwrap(), vec![Diagnostic::NoSamplePlayers]);
    }

    #[test]
    fn display_names_the_sample() {
        let d = Diagnostic::SampleSkipped {
            name: "snd3".into(),
            reason: "asset `snd3` not found".into(),
        };
        assert_eq!(d.to_string(), "skipped sample `snd3`: asset `snd3` not found");
    }

    #[test]
    fn tracing_sink_does_not_panic_without_subscriber() {
        TracingSink.report(&Diagnostic::BackendStartFailed { reason: "no device".into() });
        TracingSink.report(&Diagnostic::NoSamplePlayers);
    }
}
