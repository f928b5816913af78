//! Deterministic sampling buckets for QA spot checks.
//!
//! The bucket of a run id is `fnv1a_32(id) % 100`. It depends on nothing but
//! the id bytes, so the same run lands in the same bucket across calls and
//! process restarts. Changing the hash family changes which runs get
//! sampled; treat that as a policy change.
//!
//! Not a security control.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over `bytes`.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in bytes {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Sampling bucket of `id` in `[0, 100)`.
pub fn deterministic_sample_percent(id: &str) -> u8 {
    // < 100, always fits.
    (fnv1a_32(id.as_bytes()) % 100) as u8
}
