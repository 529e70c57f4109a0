//! Source document digests using SHA256
//!
//! The artifact records which document it was compiled from so a loader
//! can tell a stale tool set from a fresh one.

use sha2::{Digest, Sha256};

/// Calculate the digest of a source document
pub fn source_digest(source: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(source);
    hasher.finalize().into()
}

/// Convert a digest to a lowercase hex string
pub fn digest_to_hex(digest: &[u8; 32]) -> String {
    const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push(HEX_CHARS[(byte >> 4) as usize] as char);
        hex.push(HEX_CHARS[(byte & 0x0f) as usize] as char);
    }
    hex
}

/// Hex digest of a source document, as stored in [`crate::ToolSet`]
pub fn source_digest_hex(source: &[u8]) -> String {
    digest_to_hex(&source_digest(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_digest() {
        assert_eq!(
            source_digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_digest_to_hex() {
        let mut digest = [0u8; 32];
        digest[0] = 0x42;
        digest[31] = 0xc0;
        let hex = digest_to_hex(&digest);
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("42"));
        assert!(hex.ends_with("c0"));
    }

    #[test]
    fn test_digest_changes_with_source() {
        assert_ne!(source_digest(b"openapi: 3.0.0"), source_digest(b"openapi: 3.1.0"));
    }
}
