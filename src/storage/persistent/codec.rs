//! Framing codec for journal entries.
//!
//! Every entry is serialized as:
//! - JSON payload (documents are JSON already)
//! - Length prefix for framing
//! - CRC32 checksum for corruption detection
//! - Version byte for forward compatibility

use std::io::{Error as IoError, ErrorKind, Read, Result as IoResult, Write};

use crc32fast::Hasher;
use serde::{de::DeserializeOwned, Serialize};

/// Current codec version.
const CODEC_VERSION: u8 = 1;

/// Magic bytes at the start of every journal file.
pub const MAGIC: [u8; 4] = *b"HHLJ";

/// Length of the file header in bytes.
pub const HEADER_LEN: u64 = 5;

/// Upper bound on a single frame (64 MB).
const MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

fn checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Serializes a value into one frame.
///
/// ```text
/// [version: 1 byte][length: 4 bytes LE][data: N bytes JSON][crc32: 4 bytes LE]
/// ```
pub fn encode<T: Serialize>(value: &T) -> IoResult<Vec<u8>> {
    let data = serde_json::to_vec(value)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("serialization failed: {e}")))?;
    if data.len() > MAX_FRAME_SIZE {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("entry size {} exceeds maximum {MAX_FRAME_SIZE}", data.len()),
        ));
    }
    let len = u32::try_from(data.len())
        .map_err(|_| IoError::new(ErrorKind::InvalidData, "entry length overflows u32"))?;

    let mut out = Vec::with_capacity(1 + 4 + data.len() + 4);
    out.push(CODEC_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&checksum(&data).to_le_bytes());
    Ok(out)
}

/// Reads the next frame.
///
/// Returns `Ok(None)` on a clean end of input (no bytes left before the
/// frame). A frame cut short returns `ErrorKind::UnexpectedEof`; a checksum
/// or version mismatch returns `ErrorKind::InvalidData`.
pub fn decode_next<T: DeserializeOwned>(reader: &mut impl Read) -> IoResult<Option<T>> {
    let mut version = [0u8; 1];
    match reader.read(&mut version)? {
        0 => return Ok(None),
        _ if version[0] != CODEC_VERSION => {
            return Err(IoError::new(
                ErrorKind::InvalidData,
                format!("unsupported codec version: {} (expected {CODEC_VERSION})", version[0]),
            ));
        }
        _ => {}
    }

    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("entry size {len} exceeds maximum {MAX_FRAME_SIZE}"),
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
            format!("CRC mismatch: stored={stored:08x}, computed={computed:08x} (data corrupted)"),
        ));
    }

    serde_json::from_slice(&data)
        .map(Some)
        .map_err(|e| IoError::new(ErrorKind::InvalidData, format!("deserialization failed: {e}")))
}

/// Write the file header (magic + version).
pub fn write_header(writer: &mut impl Write) -> IoResult<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&[CODEC_VERSION])?;
    Ok(())
}

/// Read and validate the file header, returning its version.
pub fn read_header(reader: &mut impl Read) -> IoResult<u8> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("invalid magic bytes: expected {MAGIC:?}, got {magic:?}"),
        ));
    }

    let mut version = [0u8; 1];
    reader.read_exact(&mut version)?;
    if version[0] != CODEC_VERSION {
        return Err(IoError::new(
            ErrorKind::InvalidData,
            format!("unsupported journal version: {} (expected {CODEC_VERSION})", version[0]),
        ));
    }
    Ok(version[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_frame_roundtrip() {
        let value = serde_json::json!({ "head": { "givenName": "Ann" } });
        let encoded = encode(&value).unwrap();

        let mut cursor = Cursor::new(encoded);
        let decoded: Option<serde_json::Value> = decode_next(&mut cursor).unwrap();
        assert_eq!(decoded, Some(value));

        let end: Option<serde_json::Value> = decode_next(&mut cursor).unwrap();
        assert!(end.is_none());
    }

    #[test]
    fn test_detects_corruption() {
        let mut encoded = encode(&"test data".to_string()).unwrap();
        encoded[7] ^= 0xFF;

        let mut cursor = Cursor::new(encoded);
        let err = decode_next::<String>(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_truncated_frame_is_unexpected_eof() {
        let encoded = encode(&"some payload".to_string()).unwrap();
        let mut cursor = Cursor::new(encoded[..encoded.len() - 3].to_vec());
        let err = decode_next::<String>(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_rejects_oversized_entry() {
        let mut bad = vec![CODEC_VERSION];
        bad.extend_from_slice(&(200_000_000u32).to_le_bytes());

        let mut cursor = Cursor::new(bad);
        let err = decode_next::<String>(&mut cursor).unwrap_err();
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_header_roundtrip() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, HEADER_LEN);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_header(&mut cursor).unwrap(), CODEC_VERSION);
    }

    #[test]
    fn test_header_rejects_foreign_file() {
        let mut cursor = Cursor::new(b"JSON\x01".to_vec());
        assert!(read_header(&mut cursor).is_err());
    }

    #[test]
    fn test_header_rejects_unknown_version() {
        let mut header = MAGIC.to_vec();
        header.push(CODEC_VERSION + 1);
        let err = read_header(&mut Cursor::new(header)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("unsupported journal version"));
    }
}
