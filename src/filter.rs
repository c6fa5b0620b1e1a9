//! Uniform membership-filter contract
//!
//! Every variant answers `may_contain` with zero false negatives and a
//! bounded false-positive probability. Construction happens once from a
//! key batch; the cuckoo and counting variants additionally support
//! post-construction mutation, which they advertise through
//! `supports_add` / `supports_remove`.

use crate::error::{FilterError, Result};

/// Common interface over all approximate-membership filters.
///
/// Immutable variants may be queried from any number of threads at
/// once. Mutation is single-threaded and must not overlap with reads;
/// the embedding system is responsible for that ordering.
pub trait Filter {
    /// Whether `key` may be in the set. Never `false` for an inserted
    /// key; `true` for absent keys with bounded probability.
    fn may_contain(&self, key: u64) -> bool;

    /// Total storage bits occupied by the filter, for space reporting.
    fn bit_count(&self) -> u64;

    /// Whether [`add`](Filter::add) is implemented for this variant.
    fn supports_add(&self) -> bool {
        false
    }

    /// Whether [`remove`](Filter::remove) is implemented for this variant.
    fn supports_remove(&self) -> bool {
        false
    }

    /// Insert a key after construction.
    fn add(&mut self, _key: u64) -> Result<()> {
        Err(FilterError::UnsupportedOperation("add"))
    }

    /// Remove a previously inserted key. Removing a key that was never
    /// inserted is caller abuse and may corrupt the filter.
    fn remove(&mut self, _key: u64) -> Result<()> {
        Err(FilterError::UnsupportedOperation("remove"))
    }

    /// Variant-specific population measure (set bits or stored counts).
    /// Zero for variants that do not track one.
    fn cardinality(&self) -> u64 {
        0
    }
}
