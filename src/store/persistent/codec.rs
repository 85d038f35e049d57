//! Framed, checksummed encoding of model documents.
//!
//! Every model file is a header followed by a single frame:
//! - JSON for data (same serde attributes as export)
//! - Length-prefixed format for framing
//! - CRC32 checksum for corruption detection
//! - Version byte for forward compatibility

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};

use crc32fast::Hasher;
use serde::{de::DeserializeOwned, Serialize};

/// Current codec version.
const CODEC_VERSION: u8 = 1;

/// Magic bytes identifying model files.
pub const MAGIC: [u8; 4] = *b"CEDM";

/// Largest frame accepted on read.
const MAX_FRAME_SIZE: usize = 256 * 1024 * 1024;

fn invalid(message: String) -> IoError {
    IoError::new(ErrorKind::InvalidData, message)
}

/// Serializes a value to one frame.
///
/// Format:
/// ```text
/// [version: 1 byte][length: 4 bytes LE][data: N bytes JSON][crc32: 4 bytes LE]
/// ```
///
/// # Errors
/// Fails if the value cannot be serialized or is larger than 4 GiB.
pub fn encode<T: Serialize>(value: &T) -> IoResult<Vec<u8>> {
    let data = serde_json::to_vec(value).map_err(|e| invalid(format!("serialization failed: {e}")))?;
    let len = u32::try_from(data.len()).map_err(|_| invalid(format!("frame too large: {} bytes", data.len())))?;

    let mut hasher = Hasher::new();
    hasher.update(&data);
    let crc = hasher.finalize();

    let mut out = Vec::with_capacity(1 + 4 + data.len() + 4);
    out.push(CODEC_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Reads one frame, verifying its checksum.
///
/// # Errors
/// - unsupported version
/// - oversized or truncated frame
/// - checksum mismatch (corruption)
/// - deserialization failure
pub fn decode<T: DeserializeOwned>(reader: &mut impl Read) -> IoResult<T> {
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != CODEC_VERSION {
        return Err(invalid(format!(
            "unsupported codec version: {} (expected {CODEC_VERSION})",
            version[0]
        )));
    }

    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(invalid(format!("frame size {len} exceeds maximum {MAX_FRAME_SIZE}")));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    let mut crc_bytes = [0u8; 4];
    reader.read_exact(&mut crc_bytes)?;
    let stored = u32::from_le_bytes(crc_bytes);

    let mut hasher = Hasher::new();
    hasher.update(&data);
    let computed = hasher.finalize();
    if stored != computed {
        return Err(invalid(format!(
            "CRC mismatch: stored={stored:08x}, computed={computed:08x} (data corrupted)"
        )));
    }

    serde_json::from_slice(&data).map_err(|e| invalid(format!("deserialization failed: {e}")))
}

/// Writes the file header (magic + version).
///
/// # Errors
/// Propagates write failures.
pub fn write_header(writer: &mut impl Write) -> IoResult<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[CODEC_VERSION])
}

/// Reads and validates the file header, returning its version.
///
/// # Errors
/// Fails on foreign magic bytes or a short read.
pub fn read_header(reader: &mut impl Read) -> IoResult<u8> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(invalid(format!("invalid magic bytes: expected {MAGIC:?}, got {magic:?}")));
    }
    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    Ok(version[0])
}
