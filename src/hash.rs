//! Shared hashing and range-reduction primitives.
//!
//! Every filter variant derives probe positions from the same 64-bit
//! mixer and the same multiply-shift range reducer, so the variants
//! differ only in how they slice the mixed bits.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use rand::Rng;

/// Mix a key and a seed into 64 well-distributed bits.
///
/// Splitmix64 finalizer over `key + seed`. Deterministic, avalanching,
/// and free of a fixed point for the zero key once a seed is mixed in.
#[inline]
pub fn hash64(key: u64, seed: u64) -> u64 {
    let mut x = key.wrapping_add(seed);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

/// Map a 32-bit value to `[0, n)` without division.
///
/// High half of the 32x32 multiply. Unbiased enough for probe
/// placement and much cheaper than `%` on the query path.
#[inline]
pub fn reduce(x: u32, n: u32) -> u32 {
    ((u64::from(x) * u64::from(n)) >> 32) as u32
}

static SEED_STATE: OnceLock<AtomicU64> = OnceLock::new();

/// Draw a fresh 64-bit construction seed.
///
/// A process-wide atomic counter is initialized from system entropy on
/// first use and stepped by a large odd constant per call; the raw
/// counter value goes through the mixer so filters created back-to-back
/// never share a seed.
pub fn random_seed() -> u64 {
    let state = SEED_STATE.get_or_init(|| AtomicU64::new(rand::rng().random()));
    let raw = state.fetch_add(0x9e37_79b9_7f4a_7c15, Ordering::Relaxed);
    hash64(raw, 0x2545_f491_4f6c_dd1d)
}
