//! Partition content digests.
//!
//! A simple, deterministic, non-cryptographic digest of a rendered partition:
//!
//! - algorithm: **FNV-1a 64-bit**
//! - input: the UTF-8 bytes of the partition as written
//! - output: `"fnv1a64:<16 lowercase hex digits>"`
//!
//! It makes run-to-run determinism observable in the CLI output; it is not a
//! security primitive.

/// Prefix used in serialized digests.
pub const DIGEST_PREFIX: &str = "fnv1a64:";

/// Compute the digest of arbitrary bytes.
pub fn fnv1a64_digest_bytes(bytes: &[u8]) -> String {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x00000100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for b in bytes {
        hash ^= (*b) as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    format!("{DIGEST_PREFIX}{hash:016x}")
}
