//! Flat Bloom filter over a word-packed bit vector.

use crate::bits::BitField;
use crate::error::{FilterError, Result};
use crate::filter::Filter;
use crate::hash::{hash64, random_seed, reduce};

use super::{check_bits_per_key, optimal_k};

/// Classic Bloom filter: `k` probes spread over the whole bit array.
#[derive(Debug, Clone)]
pub struct Bloom {
    seed: u64,
    num_bits: u32,
    k: u32,
    data: BitField,
}

impl Bloom {
    /// Build a filter over `keys` at `bits_per_key` bits of space each.
    pub fn construct(keys: &[u64], bits_per_key: u32) -> Result<Self> {
        check_bits_per_key(bits_per_key)?;
        let raw_bits = keys.len() as u64 * u64::from(bits_per_key);
        let num_bits = u32::try_from(raw_bits.max(64)).map_err(|_| {
            FilterError::InvalidArgument(format!("bit array of {raw_bits} bits too large"))
        })?;

        let mut filter = Self {
            seed: random_seed(),
            num_bits,
            k: optimal_k(bits_per_key),
            data: BitField::new(u64::from(num_bits)),
        };
        for &key in keys {
            filter.set_probes(key);
        }
        Ok(filter)
    }

    fn set_probes(&mut self, key: u64) {
        let hash = hash64(key, self.seed);
        let mut a = (hash >> 32) as u32;
        let b = hash as u32;
        for _ in 0..self.k {
            self.data.set(u64::from(reduce(a, self.num_bits)));
            a = a.wrapping_add(b);
        }
    }

    /// Number of probes per key.
    pub fn probes(&self) -> u32 {
        self.k
    }
}

impl Filter for Bloom {
    fn may_contain(&self, key: u64) -> bool {
        let hash = hash64(key, self.seed);
        let mut a = (hash >> 32) as u32;
        let b = hash as u32;
        for _ in 0..self.k {
            if !self.data.get(u64::from(reduce(a, self.num_bits))) {
                return false;
            }
            a = a.wrapping_add(b);
        }
        true
    }

    fn bit_count(&self) -> u64 {
        64 * self.data.word_count() as u64
    }

    fn supports_add(&self) -> bool {
        true
    }

    fn add(&mut self, key: u64) -> Result<()> {
        self.set_probes(key);
        Ok(())
    }

    fn cardinality(&self) -> u64 {
        self.data.cardinality()
    }
}
