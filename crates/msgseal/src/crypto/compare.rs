//! Constant-time byte comparison.

use subtle::ConstantTimeEq;

/// Compare two byte strings without an early exit on the first mismatch.
///
/// Lengths are not secret (digests and tags have fixed sizes), so unequal
/// lengths return `false` immediately.
pub fn secure_compare(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}
