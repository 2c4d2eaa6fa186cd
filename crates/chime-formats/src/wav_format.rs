//! WAV encoding and decoding for PCM audio.

use binrw::BinRead;
use chime_engine::Frame;
use chime_ir::{Clip, ClipData};
use std::io::{Cursor, Write};

use crate::{checked_rate, FormatError};

// --- Writing ---

/// Write 16-bit stereo PCM.
pub fn write_wav(w: &mut impl Write, frames: &[Frame], sample_rate: u32) -> std::io::Result<()> {
    let num_channels: u16 = 2;
    let bits_per_sample: u16 = 16;
    let block_align = num_channels * (bits_per_sample / 8);
    let data_size = frames.len() as u32 * block_align as u32;

    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")?;

    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * block_align as u32).to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&bits_per_sample.to_le_bytes())?;

    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for frame in frames {
        w.write_all(&frame.left.to_le_bytes())?;
        w.write_all(&frame.right.to_le_bytes())?;
    }
    Ok(())
}

pub fn frames_to_wav(frames: &[Frame], sample_rate: u32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(44 + frames.len() * 4);
    // Writing into a Vec cannot fail.
    let _ = write_wav(&mut buf, frames, sample_rate);
    buf
}

// --- Reading ---

#[derive(BinRead, Debug)]
#[br(little)]
struct ChunkHeader {
    id: [u8; 4],
    size: u32,
}

#[derive(BinRead, Debug)]
#[br(little)]
struct FmtChunk {
    format: u16,
    channels: u16,
    sample_rate: u32,
    _byte_rate: u32,
    _block_align: u16,
    bits_per_sample: u16,
}

/// Decode a PCM WAV file (8 or 16 bit, mono or stereo).
pub fn load_wav(data: &[u8], name: &str) -> Result<Clip, FormatError> {
    if data.len() < 12 {
        return Err(FormatError::UnexpectedEof);
    }
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err(FormatError::InvalidHeader);
    }

    let mut pos = 12;
    let mut fmt: Option<FmtChunk> = None;
    let mut pcm: Option<&[u8]> = None;

    while pos + 8 <= data.len() {
        let header = ChunkHeader::read(&mut Cursor::new(&data[pos..]))?;
        let body_start = pos + 8;
        let body_end = body_start.saturating_add(header.size as usize).min(data.len());

        match &header.id {
            b"fmt " => {
                if header.size < 16 {
                    return Err(FormatError::InvalidHeader);
                }
                fmt = Some(FmtChunk::read(&mut Cursor::new(&data[body_start..body_end]))?);
            }
            b"data" => pcm = Some(&data[body_start..body_end]),
            _ => {}
        }

        // Chunks are word aligned
        pos = body_start.saturating_add(header.size as usize + (header.size as usize & 1));
    }

    let fmt = fmt.ok_or(FormatError::InvalidHeader)?;
    let raw = pcm.ok_or(FormatError::InvalidHeader)?;

    if fmt.format != 1 {
        return Err(FormatError::Unsupported("compressed WAV"));
    }
    let data = match (fmt.bits_per_sample, fmt.channels) {
        (8, 1) => ClipData::Mono8(raw.iter().map(|&b| unsigned_to_i8(b)).collect()),
        (8, 2) => {
            let (l, r) = raw
                .chunks_exact(2)
                .map(|c| (unsigned_to_i8(c[0]), unsigned_to_i8(c[1])))
                .unzip();
            ClipData::Stereo8(l, r)
        }
        (16, 1) => ClipData::Mono16(
            raw.chunks_exact(2)
                .map(|c| i16::from_le_bytes([c[0], c[1]]))
                .collect(),
        ),
        (16, 2) => {
            let (l, r) = raw
                .chunks_exact(4)
                .map(|c| (i16::from_le_bytes([c[0], c[1]]), i16::from_le_bytes([c[2], c[3]])))
                .unzip();
            ClipData::Stereo16(l, r)
        }
        (8 | 16, _) => return Err(FormatError::Unsupported("more than two channels")),
        _ => return Err(FormatError::Unsupported("bit depth other than 8 or 16")),
    };

    let sample_rate = checked_rate(fmt.sample_rate as f64)?;
    Ok(Clip::new(name, data, sample_rate))
}

/// WAV 8-bit is unsigned with 128 as zero.
fn unsigned_to_i8(b: u8) -> i8 {
    (b as i16 - 128) as i8
}
