//! Framing codec for the store file.
//!
//! Every entry is a self-checking frame:
//! ```text
//! [version: 1 byte][length: 4 bytes LE][data: N bytes JSON][crc32: 4 bytes LE]
//! ```
//! A frame cut short by a crash decodes as `UnexpectedEof`; any other damage
//! decodes as `InvalidData`.

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};

use crc32fast::Hasher;
use serde::{de::DeserializeOwned, Serialize};

/// Current frame version.
const CODEC_VERSION: u8 = 1;

/// Magic bytes at the start of every store file.
pub const MAGIC: [u8; 4] = *b"PHNC";

/// Length of the file header (magic + version).
pub const HEADER_LEN: u64 = 5;

/// Fixed bytes around the payload of each frame.
const FRAME_OVERHEAD: usize = 1 + 4 + 4;

/// Records are a handful of short strings; anything larger is damage.
const MAX_PAYLOAD: usize = 1024 * 1024;

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Encodes a value as one frame.
pub fn encode<T: Serialize>(value: &T) -> IoResult<Vec<u8>> {
    let data = serde_json::to_vec(value)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("serialization failed: {e}")))?;
    if data.len() > MAX_PAYLOAD {
        return Err(IoError::new(
            ErrorKind::InvalidInput,
            format!("entry of {} bytes exceeds maximum {MAX_PAYLOAD}", data.len()),
        ));
    }

    #[allow(clippy::cast_possible_truncation)]
    let len = data.len() as u32;

    let mut out = Vec::with_capacity(FRAME_OVERHEAD + data.len());
    out.push(CODEC_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&checksum(&data).to_le_bytes());
    Ok(out)
}

/// Decodes one frame, returning the value and the number of bytes consumed.
pub fn decode<T: DeserializeOwned>(reader: &mut impl Read) -> IoResult<(T, u64)> {
    let mut prefix = [0u8; 5];
    reader.read_exact(&mut prefix)?;

    if prefix[0] != CODEC_VERSION {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("unsupported frame version {} (expected {CODEC_VERSION})", prefix[0]),
        ));
    }

    let len = u32::from_le_bytes([prefix[1], prefix[2], prefix[3], prefix[4]]) as usize;
    if len > MAX_PAYLOAD {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("entry size {len} exceeds maximum {MAX_PAYLOAD}"),
        ));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    let mut crc_bytes = [0u8; 4];
    reader.read_exact(&mut crc_bytes)?;
    let stored = u32::from_le_bytes(crc_bytes);
    let computed = checksum(&data);
    if stored != computed {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("CRC mismatch: stored={stored:08x}, computed={computed:08x}"),
        ));
    }

    let value = serde_json::from_slice(&data)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("deserialization failed: {e}")))?;
    Ok((value, (FRAME_OVERHEAD + len) as u64))
}

/// Offset of the first complete, checksum-valid frame in `bytes`, if any.
///
/// Used during recovery to tell a torn tail from damage that hides later
/// entries.
pub fn find_frame(bytes: &[u8]) -> Option<usize> {
    (0..bytes.len()).find(|&at| is_frame(&bytes[at..]))
}

fn is_frame(bytes: &[u8]) -> bool {
    if bytes.len() < FRAME_OVERHEAD || bytes[0] != CODEC_VERSION {
        return false;
    }
    let len = u32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    // Encoded entries are never empty JSON.
    if len == 0 || len > MAX_PAYLOAD || bytes.len() < FRAME_OVERHEAD + len {
        return false;
    }
    let data = &bytes[5..5 + len];
    let crc = &bytes[5 + len..FRAME_OVERHEAD + len];
    u32::from_le_bytes([crc[0], crc[1], crc[2], crc[3]]) == checksum(data)
}

/// Writes the file header.
pub fn write_header(writer: &mut impl Write) -> IoResult<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[CODEC_VERSION])
}

/// Reads and validates the file header, returning its version byte.
pub fn read_header(reader: &mut impl Read) -> IoResult<u8> {
    let mut header = [0u8; 5];
    reader.read_exact(&mut header)?;

    if header[..4] != MAGIC {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("invalid magic bytes: expected {MAGIC:?}, got {:?}", &header[..4]),
        ));
    }
    if header[4] != CODEC_VERSION {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("unsupported store version {}", header[4]),
        ));
    }
    Ok(header[4])
}
