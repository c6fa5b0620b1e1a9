//! Xor filters: immutable membership over 8- or 16-bit fingerprints.
//!
//! A key hashes to one cell in each of three equal table blocks; the
//! xor of those three cells equals the key's fingerprint. Construction
//! peels the 3-uniform hypergraph bottom-up (repeatedly detaching a
//! cell incident to exactly one key), then assigns fingerprints in
//! reverse peel order. A peel that leaves a cycle is retried under a
//! fresh seed.

pub mod xor8;
pub mod xor16;
pub mod xor_plus8;

pub use xor8::Xor8;
pub use xor16::Xor16;
pub use xor_plus8::XorPlus8;

use crate::error::{FilterError, Result};
use crate::hash::{hash64, random_seed, reduce};

/// Give up after this many reseeded peeling attempts.
pub(crate) const MAX_CONSTRUCTION_ATTEMPTS: usize = 100;

/// More keys than this landing on one cell means duplicates or a
/// pathological key set, not bad luck.
const MAX_KEYS_PER_CELL: u8 = 120;

/// Table length for `n` keys: 1.23x plus slack, split into 3 blocks.
pub(crate) fn block_length(n: usize) -> usize {
    let m = 32 + n * 123 / 100;
    (m / 3).max(1)
}

/// Cell of `hash` in block `index` (0, 1 or 2), relative to the block.
#[inline]
pub(crate) fn block_cell(hash: u64, index: u32, block_length: u32) -> u32 {
    reduce(hash.rotate_left(21 * index) as u32, block_length)
}

/// Absolute table position of `hash` in block `index`.
#[inline]
pub(crate) fn table_position(hash: u64, index: u32, block_length: u32) -> u32 {
    index * block_length + block_cell(hash, index, block_length)
}

/// One key on the peel stack: the position it was detached from and its
/// mixed hash (fingerprint and all three positions derive from it).
pub(crate) type PeeledKey = (u32, u64);

/// Run one peeling pass under `seed`.
///
/// Returns the peel stack when every key was detached, `None` when a
/// cycle survived (caller reseeds), or an error when some cell collects
/// implausibly many keys.
///
/// Degree-1 cells are drained per block, blocks 0 and 1 before block 2.
/// Which peelable cell goes first never changes whether the peel
/// completes, but draining the low blocks first concentrates
/// never-assigned (zero) cells in the third block, which the
/// compressed-third-block variant exploits.
fn peel(keys: &[u64], seed: u64, block_length: u32) -> Result<Option<Vec<PeeledKey>>> {
    let table_len = 3 * block_length as usize;
    let mut xor_hash = vec![0u64; table_len];
    let mut counts = vec![0u8; table_len];

    for &key in keys {
        let hash = hash64(key, seed);
        for b in 0..3 {
            let pos = table_position(hash, b, block_length) as usize;
            if counts[pos] >= MAX_KEYS_PER_CELL {
                return Err(FilterError::InputLikelyBroken(format!(
                    "more than {MAX_KEYS_PER_CELL} keys in one cell"
                )));
            }
            xor_hash[pos] ^= hash;
            counts[pos] += 1;
        }
    }

    // Seed the queues with every degree-1 cell.
    let mut queues: [Vec<u32>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for (pos, &c) in counts.iter().enumerate() {
        if c == 1 {
            queues[pos / block_length as usize].push(pos as u32);
        }
    }

    let mut stack: Vec<PeeledKey> = Vec::with_capacity(keys.len());
    while let Some(pos) = queues.iter_mut().find_map(|q| q.pop()) {
        if counts[pos as usize] == 0 {
            continue;
        }

        // Degree 1: the xor of incident hashes IS the remaining key.
        let hash = xor_hash[pos as usize];
        stack.push((pos, hash));

        for b in 0..3 {
            let other = table_position(hash, b, block_length);
            xor_hash[other as usize] ^= hash;
            counts[other as usize] -= 1;
            if counts[other as usize] == 1 {
                queues[b as usize].push(other);
            }
        }
    }

    if stack.len() == keys.len() {
        Ok(Some(stack))
    } else {
        Ok(None)
    }
}

/// Peel under fresh seeds until success or the attempt budget runs out.
pub(crate) fn peel_with_retries(keys: &[u64], block_length: u32) -> Result<(u64, Vec<PeeledKey>)> {
    if keys.is_empty() {
        return Err(FilterError::InvalidArgument(
            "cannot build a filter from an empty key set".into(),
        ));
    }

    for attempt in 0..MAX_CONSTRUCTION_ATTEMPTS {
        let seed = random_seed();
        if let Some(stack) = peel(keys, seed, block_length)? {
            if attempt > 0 {
                tracing::debug!(attempt, "xor peeling succeeded after reseeding");
            }
            return Ok((seed, stack));
        }
        tracing::debug!(attempt, "xor peeling left a cycle, reseeding");
    }

    Err(FilterError::ConstructionFailed {
        attempts: MAX_CONSTRUCTION_ATTEMPTS,
    })
}
