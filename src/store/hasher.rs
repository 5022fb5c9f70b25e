//! SHA-256 content identity. Record ids and catalog digests are derived from
//! these functions, so the algorithm and the lowercase hex rendering are fixed.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 1 << 20;
const SHORT_DIGEST_LEN: usize = 12;

pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn digest_str(value: &str) -> String {
    digest(value.as_bytes())
}

/// First 12 hex characters of the digest of `value`.
pub fn short_digest(value: &str) -> String {
    let mut full = digest_str(value);
    full.truncate(SHORT_DIGEST_LEN);
    full
}

/// Streams the file in 1 MiB chunks.
pub fn digest_file(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file
            .read(&mut buf)
            .with_context(|| format!("failed to read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn digest_of_empty_input_is_well_known() {
        assert_eq!(
            digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn file_digest_matches_in_memory_digest() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("big.bin");
        // Spans several chunks and ends mid-chunk.
        let bytes: Vec<u8> = (0..(CHUNK_SIZE * 2 + 4097))
            .map(|i| (i % 251) as u8)
            .collect();
        fs::write(&path, &bytes).expect("write");

        let streamed = digest_file(&path).expect("digest file");
        assert_eq!(streamed, digest(&bytes));
        assert_eq!(streamed.len(), 64);
    }

    #[test]
    fn short_digest_is_prefix() {
        let full = digest_str("2025-10-27_chat_full.txt");
        let short = short_digest("2025-10-27_chat_full.txt");
        assert_eq!(short.len(), 12);
        assert!(full.starts_with(&short));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempdir().expect("tempdir");
        assert!(digest_file(&tmp.path().join("absent")).is_err());
    }
}
