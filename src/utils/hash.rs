//! Content hashing for change detection.

/// 64-bit digest of `bytes` (first 8 bytes of the blake3 hash).
pub fn compute(bytes: &[u8]) -> u64 {
    let hash = blake3::hash(bytes);
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}
