//! Succinct counting blocked Bloom filter.
//!
//! The data bits live in 512-bit cache-line blocks exactly like
//! [`BlockedBloom`](super::BlockedBloom), so lookups stay one line per
//! query. Counter words pair one-to-one with the eight data words of
//! each block and share the inline/overflow encoding of the flat
//! counting filter.

use crate::bits::AlignedWords;
use crate::error::Result;
use crate::filter::Filter;
use crate::hash::{hash64, random_seed, reduce};

use super::succinct::CounterMatrix;
use super::{check_bits_per_key, optimal_k, BITS_PER_BLOCK, WORDS_PER_BLOCK};

/// Counting Bloom filter with blocked data layout.
#[derive(Debug, Clone)]
pub struct SuccinctCountingBlockedBloom {
    seed: u64,
    block_count: u32,
    k: u32,
    data: AlignedWords,
    counters: CounterMatrix,
}

impl SuccinctCountingBlockedBloom {
    /// Build a filter over `keys` at `bits_per_key` data bits each.
    pub fn construct(keys: &[u64], bits_per_key: u32) -> Result<Self> {
        check_bits_per_key(bits_per_key)?;
        let raw_bits = keys.len() as u64 * u64::from(bits_per_key);
        let block_count = raw_bits.div_ceil(BITS_PER_BLOCK).max(1) as u32;

        let data = AlignedWords::new(block_count as usize * WORDS_PER_BLOCK)?;
        let mut filter = Self {
            seed: random_seed(),
            block_count,
            k: optimal_k(bits_per_key),
            counters: CounterMatrix::new(data.len()),
            data,
        };
        for &key in keys {
            filter.add(key)?;
        }
        Ok(filter)
    }

    /// Probe positions of `key` as (word index, bit in word) pairs, all
    /// within one 512-bit block.
    #[inline]
    fn probe_slots(&self, key: u64) -> impl Iterator<Item = (usize, u32)> + '_ {
        let hash = hash64(key, self.seed);
        let base = reduce(hash as u32, self.block_count) as usize * WORDS_PER_BLOCK;
        let mut a = (hash >> 32) as u32;
        let b = hash as u32;
        (0..self.k).map(move |_| {
            let bit = a & 511;
            a = a.wrapping_add(b);
            (base + (bit >> 6) as usize, bit & 63)
        })
    }

    /// Counter value at an absolute bit position.
    pub fn count_at(&self, bit: u64) -> u32 {
        let w = (bit >> 6) as usize;
        self.counters
            .read_count(w, (bit & 63) as u32, self.data.as_slice()[w])
    }

    /// Number of 512-bit blocks.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Number of probes per key.
    pub fn probes(&self) -> u32 {
        self.k
    }
}

impl Filter for SuccinctCountingBlockedBloom {
    fn may_contain(&self, key: u64) -> bool {
        let words = self.data.as_slice();
        self.probe_slots(key)
            .all(|(w, bit)| words[w] & (1u64 << bit) != 0)
    }

    fn bit_count(&self) -> u64 {
        64 * self.data.len() as u64 + self.counters.bit_count()
    }

    fn supports_add(&self) -> bool {
        true
    }

    fn supports_remove(&self) -> bool {
        true
    }

    fn add(&mut self, key: u64) -> Result<()> {
        let slots: Vec<(usize, u32)> = self.probe_slots(key).collect();
        for (w, bit) in slots {
            let mut word = self.data.as_slice()[w];
            self.counters.increment(w, bit, &mut word);
            self.data.as_mut_slice()[w] = word;
        }
        Ok(())
    }

    fn remove(&mut self, key: u64) -> Result<()> {
        let slots: Vec<(usize, u32)> = self.probe_slots(key).collect();
        for (w, bit) in slots {
            let mut word = self.data.as_slice()[w];
            self.counters.decrement(w, bit, &mut word);
            self.data.as_mut_slice()[w] = word;
        }
        Ok(())
    }

    fn cardinality(&self) -> u64 {
        self.counters.cardinality(self.data.as_slice())
    }
}
