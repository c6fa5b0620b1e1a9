//! Keysieve: approximate-membership filters for pre-filtering
//! expensive lookups (disk reads, dedup indexes, breach checks).
//!
//! Every variant answers "is this key possibly in the set?" with zero
//! false negatives and a tunable false-positive rate, in a fraction of
//! the space of the key set itself:
//!
//! - [`Xor8`] / [`Xor16`] / [`XorPlus8`]: immutable, peeling-based,
//!   ~1.23 table cells per key.
//! - [`Fuse8`]: immutable, segmented peeling, ~9 bits/key, the
//!   smallest of the 8-bit variants.
//! - [`Cuckoo8`] / [`Cuckoo16`] / [`CuckooPlus8`] / [`CuckooPlus16`]:
//!   bucketed fingerprints with add and remove.
//! - [`Bloom`] / [`BlockedBloom`]: classic probing, the blocked form
//!   touching one cache line per query.
//! - [`SuccinctCountingBloom`] / [`SuccinctCountingBlockedBloom`]:
//!   Bloom lookups plus remove, with counters in roughly the same
//!   space again.
//!
//! Filters are built once from a batch of `u64` keys via each
//! variant's `construct` and then queried through the common
//! [`Filter`] trait. Immutable variants take concurrent readers;
//! mutation is single-threaded by contract. [`Xor8`] and [`Fuse8`]
//! serialize to a compact little-endian byte layout for shipping to
//! other processes.

pub mod bits;
pub mod bloom;
pub mod cuckoo;
pub mod error;
pub mod filter;
pub mod fuse;
pub mod hash;
pub mod xor;

pub use bloom::{
    BlockedBloom, Bloom, SuccinctCountingBlockedBloom, SuccinctCountingBloom,
};
pub use cuckoo::{Cuckoo16, Cuckoo8, CuckooPlus16, CuckooPlus8};
pub use error::{FilterError, Result};
pub use filter::Filter;
pub use fuse::Fuse8;
pub use xor::{Xor16, Xor8, XorPlus8};
