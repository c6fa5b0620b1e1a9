//! Bloom filter variants: flat, cache-line blocked, and the succinct
//! counting versions of both.
//!
//! All four share the probe scheme: the mixed hash is split into two
//! 32-bit halves `(a, b)` and probe `i` uses `a + i*b`, reduced into
//! the bit range (flat) or sliced to 9 bits inside one 512-bit block
//! (blocked). The counting variants store the same data bits as their
//! plain counterparts plus a per-word counter encoding, so lookups cost
//! exactly the same.

pub mod blocked;
pub mod counting;
pub mod counting_blocked;
pub mod standard;
mod succinct;

pub use blocked::BlockedBloom;
pub use counting::SuccinctCountingBloom;
pub use counting_blocked::SuccinctCountingBlockedBloom;
pub use standard::Bloom;

use crate::error::{FilterError, Result};

/// Words per 512-bit cache-line block.
pub(crate) const WORDS_PER_BLOCK: usize = 8;

/// Bits per cache-line block.
pub(crate) const BITS_PER_BLOCK: u64 = 512;

/// Probe count for a space budget: `k = max(1, round(bits_per_key * ln 2))`.
pub(crate) fn optimal_k(bits_per_key: u32) -> u32 {
    ((f64::from(bits_per_key) * std::f64::consts::LN_2).round() as u32).max(1)
}

pub(crate) fn check_bits_per_key(bits_per_key: u32) -> Result<()> {
    if bits_per_key == 0 || bits_per_key > 64 {
        return Err(FilterError::InvalidArgument(format!(
            "bits_per_key {bits_per_key} outside 1..=64"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_k() {
        assert_eq!(optimal_k(1), 1);
        assert_eq!(optimal_k(8), 6);
        assert_eq!(optimal_k(10), 7);
        assert_eq!(optimal_k(16), 11);
    }

    #[test]
    fn test_bits_per_key_bounds() {
        assert!(check_bits_per_key(0).is_err());
        assert!(check_bits_per_key(65).is_err());
        assert!(check_bits_per_key(1).is_ok());
        assert!(check_bits_per_key(10).is_ok());
    }
}
