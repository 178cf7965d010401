use std::path::Path;

use base64::Engine;
use sha2::{Digest, Sha256};

use super::IngestError;

/// Compute the SHA-256 content hash of a file, base64-encoded.
/// This is the stable document identity used for dedupe.
pub fn compute_content_hash(path: &Path) -> Result<String, IngestError> {
    let content = std::fs::read(path)?;
    Ok(hash_bytes(&content))
}

/// Hash a byte slice the same way (used by tests and in-memory callers).
pub fn hash_bytes(content: &[u8]) -> String {
    let hash = Sha256::digest(content);
    base64::engine::general_purpose::STANDARD.encode(hash)
}
