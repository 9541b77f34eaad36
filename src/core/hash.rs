use sha3::{Digest, Sha3_256};

/// Number of hex characters of the content hash used in saved image names
pub const CONTENT_ID_LEN: usize = 12;

/// Computes SHA3-256 hash of byte data as lowercase hex
pub fn compute_sha3_256(data: &[u8]) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Short content identifier: the first [`CONTENT_ID_LEN`] hex chars of the SHA3-256 digest.
pub fn content_id(data: &[u8]) -> String {
    let mut digest = compute_sha3_256(data);
    digest.truncate(CONTENT_ID_LEN);
    digest
}
