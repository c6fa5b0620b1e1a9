//! Succinct counting Bloom filter (flat layout).
//!
//! Lookups read exactly the same bit vector as [`Bloom`](super::Bloom);
//! the counter matrix rides alongside and only add/remove touch it.
//! Total space is roughly twice the plain filter plus whatever overflow
//! blocks are live.

use crate::bits::BitField;
use crate::error::{FilterError, Result};
use crate::filter::Filter;
use crate::hash::{hash64, random_seed, reduce};

use super::succinct::CounterMatrix;
use super::{check_bits_per_key, optimal_k};

/// Counting Bloom filter with per-slot counts in ~1 extra bit/slot.
#[derive(Debug, Clone)]
pub struct SuccinctCountingBloom {
    seed: u64,
    num_bits: u32,
    k: u32,
    data: BitField,
    counters: CounterMatrix,
}

impl SuccinctCountingBloom {
    /// Build a filter over `keys` at `bits_per_key` data bits each.
    pub fn construct(keys: &[u64], bits_per_key: u32) -> Result<Self> {
        check_bits_per_key(bits_per_key)?;
        let raw_bits = keys.len() as u64 * u64::from(bits_per_key);
        let num_bits = u32::try_from(raw_bits.max(64)).map_err(|_| {
            FilterError::InvalidArgument(format!("bit array of {raw_bits} bits too large"))
        })?;

        let data = BitField::new(u64::from(num_bits));
        let mut filter = Self {
            seed: random_seed(),
            num_bits,
            k: optimal_k(bits_per_key),
            counters: CounterMatrix::new(data.word_count()),
            data,
        };
        for &key in keys {
            filter.add(key)?;
        }
        Ok(filter)
    }

    #[inline]
    fn probe_bits(&self, key: u64) -> impl Iterator<Item = u64> + '_ {
        let hash = hash64(key, self.seed);
        let mut a = (hash >> 32) as u32;
        let b = hash as u32;
        (0..self.k).map(move |_| {
            let bit = u64::from(reduce(a, self.num_bits));
            a = a.wrapping_add(b);
            bit
        })
    }

    /// Counter value at an absolute bit position.
    pub fn count_at(&self, bit: u64) -> u32 {
        let w = (bit >> 6) as usize;
        self.counters.read_count(w, (bit & 63) as u32, self.data.get_word(w))
    }

    /// Number of probes per key.
    pub fn probes(&self) -> u32 {
        self.k
    }
}

impl Filter for SuccinctCountingBloom {
    fn may_contain(&self, key: u64) -> bool {
        self.probe_bits(key).all(|bit| self.data.get(bit))
    }

    fn bit_count(&self) -> u64 {
        64 * self.data.word_count() as u64 + self.counters.bit_count()
    }

    fn supports_add(&self) -> bool {
        true
    }

    fn supports_remove(&self) -> bool {
        true
    }

    fn add(&mut self, key: u64) -> Result<()> {
        let bits: Vec<u64> = self.probe_bits(key).collect();
        for bit in bits {
            let w = (bit >> 6) as usize;
            let mut word = self.data.get_word(w);
            self.counters.increment(w, (bit & 63) as u32, &mut word);
            self.data.set_word(w, word);
        }
        Ok(())
    }

    fn remove(&mut self, key: u64) -> Result<()> {
        let bits: Vec<u64> = self.probe_bits(key).collect();
        for bit in bits {
            let w = (bit >> 6) as usize;
            let mut word = self.data.get_word(w);
            self.counters.decrement(w, (bit & 63) as u32, &mut word);
            self.data.set_word(w, word);
        }
        Ok(())
    }

    fn cardinality(&self) -> u64 {
        self.counters.cardinality(self.data.words())
    }
}
