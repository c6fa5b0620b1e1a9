//! Xor filter with 8-bit fingerprints (~9.84 bits/key, FPP ~0.39%).
//!
//! Binary format:
//! ```text
//! [key_count: u32 LE]       // 4 bytes
//! [seed: u64 LE]            // 8 bytes
//! [fingerprints: u8 x m]    // m = 3 * block_length(key_count)
//! ```
//! The table length is fully determined by `key_count`, so it is not
//! stored separately.

use std::io::Write;

use crate::error::{FilterError, Result};
use crate::filter::Filter;
use crate::hash::hash64;

use super::{block_length, peel_with_retries, table_position};

/// Header size: key_count(4) + seed(8) = 12 bytes.
const XOR8_HEADER_SIZE: usize = 12;

/// Immutable xor filter storing one byte per table cell.
#[derive(Debug, Clone)]
pub struct Xor8 {
    seed: u64,
    block_length: u32,
    key_count: u32,
    fingerprints: Vec<u8>,
}

impl Xor8 {
    /// Build a filter over `keys`. The keys should be distinct; heavy
    /// duplication fails construction (see crate error taxonomy).
    pub fn construct(keys: &[u64]) -> Result<Self> {
        let bl = block_length(keys.len()) as u32;
        let (seed, stack) = peel_with_retries(keys, bl)?;

        let mut fingerprints = vec![0u8; 3 * bl as usize];
        for &(pos, hash) in stack.iter().rev() {
            let mut f = hash as u8;
            for b in 0..3 {
                let other = table_position(hash, b, bl);
                if other != pos {
                    f ^= fingerprints[other as usize];
                }
            }
            fingerprints[pos as usize] = f;
        }

        Ok(Self {
            seed,
            block_length: bl,
            key_count: keys.len() as u32,
            fingerprints,
        })
    }

    /// Construction seed (changes when peeling had to retry).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Length of the fingerprint table in cells.
    pub fn table_len(&self) -> usize {
        self.fingerprints.len()
    }

    /// Serialize into the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.key_count.to_le_bytes())?;
        writer.write_all(&self.seed.to_le_bytes())?;
        writer.write_all(&self.fingerprints)?;
        Ok(())
    }

    /// Deserialize from bytes produced by [`write_to`](Self::write_to).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < XOR8_HEADER_SIZE {
            return Err(FilterError::InvalidFormat("Xor8 header truncated".into()));
        }

        let key_count = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let seed = u64::from_le_bytes(bytes[4..12].try_into().unwrap());

        let bl = block_length(key_count as usize);
        let table_len = 3 * bl;
        if bytes.len() < XOR8_HEADER_SIZE + table_len {
            return Err(FilterError::InvalidFormat("Xor8 table truncated".into()));
        }

        Ok(Self {
            seed,
            block_length: bl as u32,
            key_count,
            fingerprints: bytes[XOR8_HEADER_SIZE..XOR8_HEADER_SIZE + table_len].to_vec(),
        })
    }

    /// Total byte size when serialized.
    pub fn serialized_size(&self) -> usize {
        XOR8_HEADER_SIZE + self.fingerprints.len()
    }
}

impl Filter for Xor8 {
    fn may_contain(&self, key: u64) -> bool {
        let hash = hash64(key, self.seed);
        let f = self.fingerprints[table_position(hash, 0, self.block_length) as usize]
            ^ self.fingerprints[table_position(hash, 1, self.block_length) as usize]
            ^ self.fingerprints[table_position(hash, 2, self.block_length) as usize];
        f == hash as u8
    }

    fn bit_count(&self) -> u64 {
        8 * self.fingerprints.len() as u64
    }
}
