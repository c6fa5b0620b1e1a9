//! Cuckoo filters: mutable membership over bucketed fingerprints.
//!
//! Each key owns two candidate buckets of four slots; its fingerprint
//! lives in exactly one of them. A full pair of buckets triggers a
//! random-walk eviction chain bounded by a kick budget; exhausting the
//! budget reports the table as too loaded.
//!
//! The plain variants round the bucket count up to a power of two and
//! derive the alternate bucket by xor, which is closed over that range.
//! The "+" variants keep the bucket count tight (higher load, less
//! space) and use a subtractive alternate that stays an involution for
//! any bucket count.

pub mod plain;
pub mod plus;

pub use plain::{Cuckoo8, Cuckoo16};
pub use plus::{CuckooPlus8, CuckooPlus16};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::{FilterError, Result};
use crate::hash::{hash64, random_seed, reduce};

/// Slots per bucket.
const BUCKET_SIZE: usize = 4;

/// Maximum relocations before an insert reports the table as full.
const MAX_KICKS: usize = 500;

/// Target load for the power-of-two variants (before rounding).
pub(crate) const PLAIN_LOAD: f64 = 0.94;

/// Target load for the "+" variants (bucket count kept exact).
pub(crate) const PLUS_LOAD: f64 = 0.95;

/// Stored fingerprint width and zero-sentinel handling.
pub(crate) trait Slot: Copy + PartialEq + std::fmt::Debug {
    const BITS: u32;
    const EMPTY: Self;

    /// Low fingerprint bits of `hash`, coerced away from the empty
    /// sentinel (zero becomes one).
    fn from_hash(hash: u64) -> Self;

    fn as_u64(self) -> u64;
}

impl Slot for u8 {
    const BITS: u32 = 8;
    const EMPTY: Self = 0;

    fn from_hash(hash: u64) -> Self {
        let f = hash as u8;
        if f == 0 {
            1
        } else {
            f
        }
    }

    fn as_u64(self) -> u64 {
        u64::from(self)
    }
}

impl Slot for u16 {
    const BITS: u32 = 16;
    const EMPTY: Self = 0;

    fn from_hash(hash: u64) -> Self {
        let f = hash as u16;
        if f == 0 {
            1
        } else {
            f
        }
    }

    fn as_u64(self) -> u64 {
        u64::from(self)
    }
}

/// How the alternate bucket is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Addressing {
    /// `b2 = b1 ^ reduce(H'(f), B)` over a power-of-two `B`.
    PowerOfTwo,
    /// `b2 = (reduce(H'(f), B) + B - b1) % B` over an exact `B`.
    Reduced,
}

/// Bucket table shared by all four variants.
#[derive(Debug, Clone)]
pub(crate) struct CuckooTable<F: Slot> {
    seed: u64,
    bucket_count: u32,
    addressing: Addressing,
    slots: Vec<F>,
    count: u64,
    rng: SmallRng,
}

impl<F: Slot> CuckooTable<F> {
    /// Size a table for `n` keys and insert them all.
    pub(crate) fn build(keys: &[u64], addressing: Addressing, load: f64) -> Result<Self> {
        if keys.is_empty() {
            return Err(FilterError::InvalidArgument(
                "cannot build a filter from an empty key set".into(),
            ));
        }

        let wanted = (keys.len() as f64 / (BUCKET_SIZE as f64 * load)).ceil() as u32;
        let bucket_count = match addressing {
            Addressing::PowerOfTwo => wanted.max(1).next_power_of_two(),
            Addressing::Reduced => wanted.max(1),
        };

        let seed = random_seed();
        let mut table = Self {
            seed,
            bucket_count,
            addressing,
            slots: vec![F::EMPTY; bucket_count as usize * BUCKET_SIZE],
            count: 0,
            rng: SmallRng::seed_from_u64(seed),
        };
        for &key in keys {
            table.insert(key)?;
        }
        Ok(table)
    }

    #[inline]
    fn home_bucket(&self, hash: u64) -> u32 {
        reduce((hash >> 32) as u32, self.bucket_count)
    }

    /// The other candidate bucket of `fp`, an involution for the
    /// variant's addressing mode.
    #[inline]
    fn alt_bucket(&self, bucket: u32, fp: F) -> u32 {
        let spread = reduce(hash64(fp.as_u64(), self.seed) as u32, self.bucket_count);
        match self.addressing {
            Addressing::PowerOfTwo => bucket ^ spread,
            Addressing::Reduced => {
                ((u64::from(spread) + u64::from(self.bucket_count) - u64::from(bucket))
                    % u64::from(self.bucket_count)) as u32
            }
        }
    }

    #[inline]
    fn bucket_slots(&self, bucket: u32) -> &[F] {
        let start = bucket as usize * BUCKET_SIZE;
        &self.slots[start..start + BUCKET_SIZE]
    }

    fn try_place(&mut self, bucket: u32, fp: F) -> bool {
        let start = bucket as usize * BUCKET_SIZE;
        for slot in &mut self.slots[start..start + BUCKET_SIZE] {
            if *slot == F::EMPTY {
                *slot = fp;
                return true;
            }
        }
        false
    }

    /// Insert one key, evicting on demand.
    ///
    /// A failed insert has already displaced a resident fingerprint,
    /// so the table must be discarded and rebuilt larger.
    pub(crate) fn insert(&mut self, key: u64) -> Result<()> {
        let hash = hash64(key, self.seed);
        let fp = F::from_hash(hash);
        let b1 = self.home_bucket(hash);
        let b2 = self.alt_bucket(b1, fp);

        if self.try_place(b1, fp) || self.try_place(b2, fp) {
            self.count += 1;
            return Ok(());
        }

        let mut bucket = if self.rng.random::<bool>() { b1 } else { b2 };
        let mut fp = fp;
        for _ in 0..MAX_KICKS {
            let victim = bucket as usize * BUCKET_SIZE + self.rng.random_range(0..BUCKET_SIZE);
            std::mem::swap(&mut fp, &mut self.slots[victim]);
            bucket = self.alt_bucket(bucket, fp);
            if self.try_place(bucket, fp) {
                self.count += 1;
                return Ok(());
            }
        }

        Err(FilterError::CapacityExhausted)
    }

    pub(crate) fn contains(&self, key: u64) -> bool {
        let hash = hash64(key, self.seed);
        let fp = F::from_hash(hash);
        let b1 = self.home_bucket(hash);
        if self.bucket_slots(b1).contains(&fp) {
            return true;
        }
        let b2 = self.alt_bucket(b1, fp);
        self.bucket_slots(b2).contains(&fp)
    }

    /// Clear the first slot holding the key's fingerprint. Removing a
    /// key that was never inserted is caller abuse (it can evict an
    /// unrelated key's fingerprint).
    pub(crate) fn remove(&mut self, key: u64) -> Result<()> {
        let hash = hash64(key, self.seed);
        let fp = F::from_hash(hash);
        let b1 = self.home_bucket(hash);
        let b2 = self.alt_bucket(b1, fp);

        for bucket in [b1, b2] {
            let start = bucket as usize * BUCKET_SIZE;
            for slot in &mut self.slots[start..start + BUCKET_SIZE] {
                if *slot == fp {
                    *slot = F::EMPTY;
                    self.count -= 1;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    pub(crate) fn bit_count(&self) -> u64 {
        self.slots.len() as u64 * u64::from(F::BITS)
    }

    pub(crate) fn cardinality(&self) -> u64 {
        self.count
    }

    pub(crate) fn bucket_count(&self) -> u32 {
        self.bucket_count
    }
}
