// db-tools/src/archive.rs
use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::info;

/// Streams `src` through a gzip encoder into `dst`.
///
/// Returns the number of uncompressed bytes written.
pub fn compress(src: &Path, dst: &Path) -> Result<u64> {
    let mut input =
        File::open(src).with_context(|| format!("Failed to open {} for compression", src.display()))?;
    let output = File::create(dst)
        .with_context(|| format!("Failed to create compressed file {}", dst.display()))?;

    let mut encoder = GzEncoder::new(output, Compression::default());
    let bytes = io::copy(&mut input, &mut encoder)
        .with_context(|| format!("Failed while compressing {}", src.display()))?;
    encoder
        .finish()
        .with_context(|| format!("Failed to finish gzip stream for {}", dst.display()))?;

    info!("compressed {} ({} bytes) to {}", src.display(), bytes, dst.display());
    Ok(bytes)
}

/// Streams gzip-compressed `src` into `dst` as plain bytes.
///
/// The input is not validated up front; a malformed stream surfaces as a
/// decode error from the copy.
pub fn decompress(src: &Path, dst: &Path) -> Result<u64> {
    let input = File::open(src)
        .with_context(|| format!("Failed to open {} for decompression", src.display()))?;
    let mut output = File::create(dst)
        .with_context(|| format!("Failed to create decompressed file {}", dst.display()))?;

    let mut decoder = GzDecoder::new(input);
    let bytes = io::copy(&mut decoder, &mut output)
        .with_context(|| format!("Failed while decompressing {}", src.display()))?;

    info!("decompressed {} to {} ({} bytes)", src.display(), dst.display(), bytes);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn round_trip_preserves_bytes_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("dump");
        let gz = dir.path().join("dump.gz");
        let back = dir.path().join("dump.out");

        // Mix of text, binary and repetition.
        let mut payload = b"pg_dump custom archive \x00\x01\x02\xff".to_vec();
        payload.extend(std::iter::repeat_n(b'z', 64 * 1024));
        fs::write(&plain, &payload).unwrap();

        let written = compress(&plain, &gz).unwrap();
        assert_eq!(written, payload.len() as u64);
        assert!(gz.metadata().unwrap().len() < payload.len() as u64);

        let read = decompress(&gz, &back).unwrap();
        assert_eq!(read, payload.len() as u64);
        assert_eq!(fs::read(&back).unwrap(), payload);
    }

    #[test]
    fn empty_input_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("empty");
        let gz = dir.path().join("empty.gz");
        let back = dir.path().join("empty.out");
        fs::write(&plain, b"").unwrap();

        compress(&plain, &gz).unwrap();
        assert_eq!(decompress(&gz, &back).unwrap(), 0);
        assert_eq!(fs::read(&back).unwrap(), b"");
    }

    #[test]
    fn malformed_input_fails_to_decompress() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not-gzip.gz");
        let out = dir.path().join("out");
        fs::write(&bogus, b"this is not a gzip stream").unwrap();

        assert!(decompress(&bogus, &out).is_err());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let out = dir.path().join("out.gz");
        assert!(compress(&missing, &out).is_err());
    }
}
