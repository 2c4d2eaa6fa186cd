//! Clip decoders for chime.
//!
//! Decodes short PCM WAV and AIFF/AIFC files into [`Clip`]s and encodes
//! rendered frames back to WAV.

mod aiff_format;
mod wav_format;

use chime_ir::Clip;
use thiserror::Error;

pub use aiff_format::load_aiff;
pub use wav_format::{frames_to_wav, load_wav, write_wav};

/// Sample rates a decoded clip may declare, in Hz.
pub const SAMPLE_RATES: core::ops::RangeInclusive<u32> = 1..=384_000;

/// Error type for clip decoding.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Magic bytes or a mandatory chunk are missing.
    #[error("invalid file header")]
    InvalidHeader,
    #[error("unexpected end of file")]
    UnexpectedEof,
    /// Valid container, but an encoding we do not decode.
    #[error("unsupported encoding: {0}")]
    Unsupported(&'static str),
    /// The header declares a sample rate outside [`SAMPLE_RATES`].
    #[error("sample rate {0} Hz out of range")]
    SampleRate(f64),
    /// Neither RIFF/WAVE nor FORM/AIFF.
    #[error("unrecognized clip format")]
    UnknownFormat,
}

impl From<binrw::Error> for FormatError {
    fn from(err: binrw::Error) -> Self {
        if err.is_eof() {
            FormatError::UnexpectedEof
        } else {
            FormatError::InvalidHeader
        }
    }
}

fn checked_rate(rate: f64) -> Result<u32, FormatError> {
    let rounded = rate.round();
    if rounded >= *SAMPLE_RATES.start() as f64 && rounded <= *SAMPLE_RATES.end() as f64 {
        Ok(rounded as u32)
    } else {
        Err(FormatError::SampleRate(rate))
    }
}

/// Decode a clip, picking the decoder from the container magic.
pub fn load_clip(data: &[u8], name: &str) -> Result<Clip, FormatError> {
    match data.get(0..4) {
        Some(b"RIFF") => load_wav(data, name),
        Some(b"FORM") => load_aiff(data, name),
        Some(_) => Err(FormatError::UnknownFormat),
        None => Err(FormatError::UnexpectedEof),
    }
}
