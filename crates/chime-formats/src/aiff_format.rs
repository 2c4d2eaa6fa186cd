//! AIFF / AIFC decoding.
//!
//! Only uncompressed PCM is supported: plain AIFF (big-endian), and AIFC
//! with compression type `NONE` or `sowt` (little-endian).

use binrw::BinRead;
use chime_ir::{Clip, ClipData};
use std::io::Cursor;

use crate::{checked_rate, FormatError};

#[derive(BinRead, Debug)]
#[br(big)]
struct ChunkHeader {
    id: [u8; 4],
    size: u32,
}

#[derive(BinRead, Debug)]
#[br(big)]
struct CommChunk {
    channels: u16,
    _frames: u32,
    bits_per_sample: u16,
    rate: [u8; 10],
}

#[derive(BinRead, Debug)]
#[br(big)]
struct SsndHeader {
    offset: u32,
    _block_size: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ByteOrder {
    Big,
    Little,
}

/// Decode an AIFF or AIFC file (8 or 16 bit, mono or stereo).
pub fn load_aiff(data: &[u8], name: &str) -> Result<Clip, FormatError> {
    if data.len() < 12 {
        return Err(FormatError::UnexpectedEof);
    }
    if &data[0..4] != b"FORM" {
        return Err(FormatError::InvalidHeader);
    }
    let is_aifc = match &data[8..12] {
        b"AIFF" => false,
        b"AIFC" => true,
        _ => return Err(FormatError::InvalidHeader),
    };

    let mut pos = 12;
    let mut comm: Option<(CommChunk, ByteOrder)> = None;
    let mut pcm: Option<&[u8]> = None;

    while pos + 8 <= data.len() {
        let header = ChunkHeader::read(&mut Cursor::new(&data[pos..]))?;
        let body_start = pos + 8;
        let body_end = body_start.saturating_add(header.size as usize).min(data.len());
        let body = &data[body_start..body_end];

        match &header.id {
            b"COMM" => {
                let chunk = CommChunk::read(&mut Cursor::new(body))?;
                let order = if is_aifc {
                    match body.get(18..22) {
                        Some(b"NONE") | Some(b"twos") => ByteOrder::Big,
                        Some(b"sowt") => ByteOrder::Little,
                        Some(_) => return Err(FormatError::Unsupported("compressed AIFC")),
                        None => return Err(FormatError::UnexpectedEof),
                    }
                } else {
                    ByteOrder::Big
                };
                comm = Some((chunk, order));
            }
            b"SSND" => {
                let ssnd = SsndHeader::read(&mut Cursor::new(body))?;
                let start = (8 + ssnd.offset as usize).min(body.len());
                pcm = Some(&body[start..]);
            }
            _ => {}
        }

        pos = body_start.saturating_add(header.size as usize + (header.size as usize & 1));
    }

    let (comm, order) = comm.ok_or(FormatError::InvalidHeader)?;
    let raw = pcm.ok_or(FormatError::InvalidHeader)?;
    let sample_rate = checked_rate(extended_to_f64(&comm.rate))?;

    let read16 = |c: &[u8]| match order {
        ByteOrder::Big => i16::from_be_bytes([c[0], c[1]]),
        ByteOrder::Little => i16::from_le_bytes([c[0], c[1]]),
    };

    let data = match (comm.bits_per_sample, comm.channels) {
        // AIFF 8-bit is signed
        (8, 1) => ClipData::Mono8(raw.iter().map(|&b| b as i8).collect()),
        (8, 2) => {
            let (l, r) = raw.chunks_exact(2).map(|c| (c[0] as i8, c[1] as i8)).unzip();
            ClipData::Stereo8(l, r)
        }
        (16, 1) => ClipData::Mono16(raw.chunks_exact(2).map(read16).collect()),
        (16, 2) => {
            let (l, r) = raw
                .chunks_exact(4)
                .map(|c| (read16(&c[0..2]), read16(&c[2..4])))
                .unzip();
            ClipData::Stereo16(l, r)
        }
        (8 | 16, _) => return Err(FormatError::Unsupported("more than two channels")),
        _ => return Err(FormatError::Unsupported("bit depth other than 8 or 16")),
    };

    Ok(Clip::new(name, data, sample_rate))
}

/// Decode an IEEE 754 80-bit extended float (big-endian), as used for the
/// AIFF sample rate.
fn extended_to_f64(bytes: &[u8; 10]) -> f64 {
    let sign = if bytes[0] & 0x80 != 0 { -1.0 } else { 1.0 };
    let exponent = (((bytes[0] & 0x7F) as i32) << 8) | bytes[1] as i32;
    let mut mantissa_bytes = [0u8; 8];
    mantissa_bytes.copy_from_slice(&bytes[2..10]);
    let mantissa = u64::from_be_bytes(mantissa_bytes);

    if exponent == 0 && mantissa == 0 {
        return 0.0;
    }
    sign * mantissa as f64 * 2f64.powi(exponent - 16383 - 63)
}
