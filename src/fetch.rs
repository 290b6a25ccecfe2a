//! Loads survey input from a local file or an HTTP URL.
//!
//! Gzip-compressed payloads (detected by their magic bytes) are decompressed
//! before being handed to the CSV reader.

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Downloads the body at `url`, failing on non-success status codes.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}

/// Reads `source` (a path or an `http(s)://` URL) fully into memory.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the request fails, or a gzip
/// payload is corrupt.
#[tracing::instrument(fields(source = %source))]
pub fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(source).with_context(|| format!("failed to fetch '{source}'"))?
    } else {
        std::fs::read(source).with_context(|| format!("failed to read '{source}'"))?
    };

    if bytes.starts_with(&GZIP_MAGIC) {
        debug!(compressed_bytes = bytes.len(), "Decompressing gzip input");
        let mut decoded = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut decoded)
            .with_context(|| format!("failed to decompress '{source}'"))?;
        return Ok(decoded);
    }

    debug!(bytes = bytes.len(), "Input loaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::env;
    use std::fs;
    use std::io::Write;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    #[test]
    fn test_load_plain_file() {
        let path = temp_path("transod_fetch_plain.csv");
        fs::write(&path, "modeprimary\n1\n").unwrap();

        let bytes = load_source(&path).unwrap();
        assert_eq!(bytes, b"modeprimary\n1\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_gzip_file() {
        let path = temp_path("transod_fetch_gzip.csv.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"modeprimary\n2\n").unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        let bytes = load_source(&path).unwrap();
        assert_eq!(bytes, b"modeprimary\n2\n");

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_source(&temp_path("transod_fetch_does_not_exist.csv")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
