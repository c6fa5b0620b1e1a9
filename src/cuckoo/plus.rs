//! Reduced-space "+" cuckoo filters: exact bucket counts, higher load.
//!
//! Dropping the power-of-two rounding saves up to half the table at
//! the cost of running closer to the eviction ceiling; inserting past
//! ~95% load starts reporting the table as full.

use crate::error::Result;
use crate::filter::Filter;

use super::{Addressing, CuckooTable, PLUS_LOAD};

/// Reduced-space cuckoo filter with 8-bit fingerprints (~8.5 bits/key).
#[derive(Debug, Clone)]
pub struct CuckooPlus8 {
    table: CuckooTable<u8>,
}

impl CuckooPlus8 {
    /// Build a filter over `keys` at ~95% target load.
    pub fn construct(keys: &[u64]) -> Result<Self> {
        Ok(Self {
            table: CuckooTable::build(keys, Addressing::Reduced, PLUS_LOAD)?,
        })
    }

    pub fn bucket_count(&self) -> u32 {
        self.table.bucket_count()
    }
}

impl Filter for CuckooPlus8 {
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

/// Reduced-space cuckoo filter with 16-bit fingerprints.
#[derive(Debug, Clone)]
pub struct CuckooPlus16 {
    table: CuckooTable<u16>,
}

impl CuckooPlus16 {
    pub fn construct(keys: &[u64]) -> Result<Self> {
        Ok(Self {
            table: CuckooTable::build(keys, Addressing::Reduced, PLUS_LOAD)?,
        })
    }

    pub fn bucket_count(&self) -> u32 {
        self.table.bucket_count()
    }
}

impl Filter for CuckooPlus16 {
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
