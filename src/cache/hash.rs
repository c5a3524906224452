use sha2::{Digest, Sha256};

const KEY_DELIMITER: &str = "|";

pub fn compute_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Content key for one generation request. The theme is trimmed, case is kept.
pub fn derive_cache_key(reference_id: &str, top_id: &str, bottom_id: &str, theme: &str) -> String {
    let raw = [reference_id, top_id, bottom_id, theme.trim()].join(KEY_DELIMITER);
    compute_hash(&raw)
}
