//! `StdFile`-equivalent: plain/gzip transparent file I/O for scenario and
//! save-game sections. Save files below [`GZIP_THRESHOLD`] bytes are stored
//! gzip-compressed (§6); larger ones are left uncompressed since the ratio
//! rarely pays for the extra CPU during a lockstep tick.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

/// Below this size, `write_section` gzip-compresses its payload.
pub const GZIP_THRESHOLD: usize = 16 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum FileIoError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Writes `data`, gzip-compressing it first when it is small enough that
/// compression is worth the round trip. Returns whether the payload ended up
/// compressed, so the caller can record that in its section header.
pub fn write_section<W: Write>(mut out: W, data: &[u8]) -> Result<bool, FileIoError> {
    if data.len() < GZIP_THRESHOLD {
        let mut encoder = GzEncoder::new(Vec::with_capacity(data.len()), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;
        out.write_all(&compressed)?;
        Ok(true)
    } else {
        out.write_all(data)?;
        Ok(false)
    }
}

/// Reads a section previously written by [`write_section`].
pub fn read_section<R: Read>(mut input: R, compressed: bool) -> Result<Vec<u8>, FileIoError> {
    let mut raw = Vec::new();
    input.read_to_end(&mut raw)?;
    if compressed {
        let mut decoder = GzDecoder::new(&raw[..]);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out)?;
        Ok(out)
    } else {
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_payload_round_trips_compressed() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let mut buf = Vec::new();
        let compressed = write_section(&mut buf, &data).unwrap();
        assert!(compressed);
        let back = read_section(&buf[..], compressed).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn large_payload_stays_uncompressed() {
        let data = vec![7u8; GZIP_THRESHOLD + 1];
        let mut buf = Vec::new();
        let compressed = write_section(&mut buf, &data).unwrap();
        assert!(!compressed);
        assert_eq!(buf, data);
    }
}
