//! Power-of-two cuckoo filters with 8- and 16-bit fingerprints.

use crate::error::Result;
use crate::filter::Filter;

use super::{Addressing, CuckooTable, PLAIN_LOAD};

/// Cuckoo filter with 8-bit fingerprints (~0.8% FPP at typical load).
#[derive(Debug, Clone)]
pub struct Cuckoo8 {
    table: CuckooTable<u8>,
}

impl Cuckoo8 {
    /// Build a filter over `keys` with room for ~6% headroom before
    /// the power-of-two rounding.
    pub fn construct(keys: &[u64]) -> Result<Self> {
        Ok(Self {
            table: CuckooTable::build(keys, Addressing::PowerOfTwo, PLAIN_LOAD)?,
        })
    }

    pub fn bucket_count(&self) -> u32 {
        self.table.bucket_count()
    }
}

impl Filter for Cuckoo8 {
    fn may_contain(&self, key: u64) -> bool {
        self.table.contains(key)
    }

    fn bit_count(&self) -> u64 {
        self.table.bit_count()
    }

    fn supports_add(&self) -> bool {
        true
    }

    fn supports_remove(&self) -> bool {
        true
    }

    fn add(&mut self, key: u64) -> Result<()> {
        self.table.insert(key)
    }

    fn remove(&mut self, key: u64) -> Result<()> {
        self.table.remove(key)
    }

    fn cardinality(&self) -> u64 {
        self.table.cardinality()
    }
}

/// Cuckoo filter with 16-bit fingerprints (~0.003% FPP).
#[derive(Debug, Clone)]
pub struct Cuckoo16 {
    table: CuckooTable<u16>,
}

impl Cuckoo16 {
    pub fn construct(keys: &[u64]) -> Result<Self> {
        Ok(Self {
            table: CuckooTable::build(keys, Addressing::PowerOfTwo, PLAIN_LOAD)?,
        })
    }

    pub fn bucket_count(&self) -> u32 {
        self.table.bucket_count()
    }
}

impl Filter for Cuckoo16 {
    fn may_contain(&self, key: u64) -> bool {
        self.table.contains(key)
    }

    fn bit_count(&self) -> u64 {
        self.table.bit_count()
    }

    fn supports_add(&self) -> bool {
        true
    }

    fn supports_remove(&self) -> bool {
        true
    }

    fn add(&mut self, key: u64) -> Result<()> {
        self.table.insert(key)
    }

    fn remove(&mut self, key: u64) -> Result<()> {
        self.table.remove(key)
    }

    fn cardinality(&self) -> u64 {
        self.table.cardinality()
    }
}
