//! Binary fuse filter with 8-bit fingerprints (~9.0-9.1 bits/key).
//!
//! Construction buckets keys by the top bits of their hash with a
//! counting-sort pre-pass, then peels positions of degree one exactly
//! as the xor construction does. A pass whose per-cell counter byte
//! overflows is discarded wholesale and restarted under a fresh seed;
//! after ten failed passes the key set is deduplicated once, and after
//! a hundred the constructor gives up.
//!
//! Binary format:
//! ```text
//! [segment_length: u32 LE]        // 4 bytes, power of two, <= 2^18
//! [segment_count_length: u32 LE]  // 4 bytes, multiple of segment_length
//! [seed: u64 LE]                  // 8 bytes
//! [fingerprints_len: u32 LE]      // 4 bytes
//! [fingerprints: u8 x len]        // len = (scl / sl + 2) * sl
//! ```

use std::io::Write;

use crate::error::{FilterError, Result};
use crate::filter::Filter;
use crate::hash::{hash64, random_seed, reduce};

/// Header size: segment_length(4) + segment_count_length(4) + seed(8) +
/// fingerprints_len(4) = 20 bytes.
const FUSE8_HEADER_SIZE: usize = 20;

/// Segment length never exceeds 2^18 (keeps the sub-hash at 18 bits).
const MAX_SEGMENT_LENGTH: u32 = 1 << 18;

/// Give up after this many discarded passes.
const MAX_CONSTRUCTION_ATTEMPTS: usize = 100;

/// Dedup the key set once this many passes failed in a row.
const DEDUP_AFTER_ATTEMPTS: usize = 10;

/// Immutable binary fuse filter storing one byte per table cell.
#[derive(Debug, Clone)]
pub struct Fuse8 {
    seed: u64,
    segment_length: u32,
    segment_count_length: u32,
    fingerprints: Vec<u8>,
}

/// Table geometry derived from the key count.
#[derive(Debug, Clone, Copy)]
struct Geometry {
    segment_length: u32,
    segment_count_length: u32,
    array_length: usize,
}

impl Geometry {
    fn for_keys(n: usize) -> Self {
        let segment_length = if n <= 1 {
            4
        } else {
            let exp = ((n as f64).ln() / 3.33_f64.ln() + 2.11).floor() as u32;
            (1u32 << exp).min(MAX_SEGMENT_LENGTH)
        };

        let size_factor = if n <= 2 {
            2.0
        } else {
            1.125f64.max(0.875 + 0.25 * 1_000_000f64.ln() / (n as f64).ln())
        };
        let capacity = (n as f64 * size_factor).round() as u32;

        let init_segment_count =
            (capacity.div_ceil(segment_length)).saturating_sub(2).max(1);
        let array_length = (init_segment_count + 2) * segment_length;
        let mut segment_count = array_length.div_ceil(segment_length);
        segment_count = if segment_count <= 2 { 1 } else { segment_count - 2 };
        let array_length = (segment_count + 2) * segment_length;

        Self {
            segment_length,
            segment_count_length: segment_count * segment_length,
            array_length: array_length as usize,
        }
    }
}

/// The three probe positions of `hash`: one base cell in the reduced
/// segment range, then one cell in each of the next two segments,
/// displaced by 18-bit sub-hashes.
#[inline]
fn positions(hash: u64, segment_length: u32, segment_count_length: u32) -> (u32, u32, u32) {
    let mask = segment_length - 1;
    let h0 = reduce((hash >> 32) as u32, segment_count_length);
    let h1 = h0 + segment_length;
    let h2 = h1 + segment_length;
    (
        h0,
        h1 ^ (((hash >> 18) as u32) & mask),
        h2 ^ ((hash as u32) & mask),
    )
}

impl Fuse8 {
    /// Build a filter over `keys`. Up to moderate duplication is
    /// tolerated (the set is deduplicated after ten failed passes);
    /// construction that still cannot complete reports failure rather
    /// than returning a broken filter.
    pub fn construct(keys: &[u64]) -> Result<Self> {
        if keys.is_empty() {
            return Err(FilterError::InvalidArgument(
                "cannot build a filter from an empty key set".into(),
            ));
        }

        let mut deduped: Option<Vec<u64>> = None;
        for attempt in 0..MAX_CONSTRUCTION_ATTEMPTS {
            if attempt == DEDUP_AFTER_ATTEMPTS && deduped.is_none() {
                let mut sorted = keys.to_vec();
                sorted.sort_unstable();
                sorted.dedup();
                if sorted.len() < keys.len() {
                    tracing::warn!(
                        removed = keys.len() - sorted.len(),
                        "fuse construction kept failing; removed duplicate keys"
                    );
                }
                deduped = Some(sorted);
            }
            let working = deduped.as_deref().unwrap_or(keys);

            let seed = random_seed();
            if let Some(filter) = try_populate(working, seed) {
                if attempt > 0 {
                    tracing::debug!(attempt, "fuse construction succeeded after reseeding");
                }
                return Ok(filter);
            }
            tracing::debug!(attempt, "fuse pass discarded, reseeding");
        }

        Err(FilterError::ConstructionFailed {
            attempts: MAX_CONSTRUCTION_ATTEMPTS,
        })
    }

    /// Construction seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Segment length in cells (power of two).
    pub fn segment_length(&self) -> u32 {
        self.segment_length
    }

    /// Length of the fingerprint table in cells.
    pub fn table_len(&self) -> usize {
        self.fingerprints.len()
    }

    /// Serialize into the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.segment_length.to_le_bytes())?;
        writer.write_all(&self.segment_count_length.to_le_bytes())?;
        writer.write_all(&self.seed.to_le_bytes())?;
        writer.write_all(&(self.fingerprints.len() as u32).to_le_bytes())?;
        writer.write_all(&self.fingerprints)?;
        Ok(())
    }

    /// Deserialize from bytes produced by [`write_to`](Self::write_to).
    ///
    /// Rejects headers whose geometry is inconsistent: the segment
    /// length must be a power of two no larger than 2^18, the segment
    /// count length a multiple of it, and the table length must equal
    /// `(scl / sl + 2) * sl` with every byte present.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FUSE8_HEADER_SIZE {
            return Err(FilterError::InvalidFormat("Fuse8 header truncated".into()));
        }

        let segment_length = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let segment_count_length = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let seed = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let len = u32::from_le_bytes(bytes[16..20].try_into().unwrap()) as usize;

        if !segment_length.is_power_of_two() || segment_length > MAX_SEGMENT_LENGTH {
            return Err(FilterError::InvalidFormat(format!(
                "Fuse8 segment length {segment_length} is not a power of two <= 2^18"
            )));
        }
        if segment_count_length % segment_length != 0 {
            return Err(FilterError::InvalidFormat(
                "Fuse8 segment count length not segment-aligned".into(),
            ));
        }
        let expected_len = (segment_count_length / segment_length + 2) * segment_length;
        if len != expected_len as usize {
            return Err(FilterError::InvalidFormat(format!(
                "Fuse8 table length {len} does not match geometry ({expected_len})"
            )));
        }
        if bytes.len() < FUSE8_HEADER_SIZE + len {
            return Err(FilterError::InvalidFormat("Fuse8 table truncated".into()));
        }

        Ok(Self {
            seed,
            segment_length,
            segment_count_length,
            fingerprints: bytes[FUSE8_HEADER_SIZE..FUSE8_HEADER_SIZE + len].to_vec(),
        })
    }

    /// Total byte size when serialized.
    pub fn serialized_size(&self) -> usize {
        FUSE8_HEADER_SIZE + self.fingerprints.len()
    }
}

/// One construction pass. Returns the finished filter or `None` when
/// the pass has to be discarded (counter overflow or a surviving
/// cycle).
fn try_populate(keys: &[u64], seed: u64) -> Option<Fuse8> {
    let size = keys.len();
    let geom = Geometry::for_keys(size);
    let sl = geom.segment_length;
    let scl = geom.segment_count_length;
    let array_length = geom.array_length;
    let segment_count = scl / sl;

    // Counting-sort pre-pass: bucket hashes by their top bits so the
    // peel walks the table in segment order.
    let mut block_bits = 1u32;
    while (1u32 << block_bits) < segment_count {
        block_bits += 1;
    }
    let block = 1usize << block_bits;

    let mut start_pos: Vec<usize> = (0..block).map(|i| (i * size) >> block_bits).collect();

    // One extra slot holds a non-zero sentinel so the probing loop
    // below always terminates at the end of the buffer.
    let mut reverse_order = vec![0u64; size + 1];
    reverse_order[size] = 1;

    for &key in keys {
        let hash = hash64(key, seed);
        let mut segment_index = (hash >> (64 - block_bits)) as usize;
        while reverse_order[start_pos[segment_index]] != 0 {
            segment_index += 1;
            segment_index &= block - 1;
        }
        reverse_order[start_pos[segment_index]] = hash;
        start_pos[segment_index] += 1;
    }

    // Per-cell state: count in the upper six bits, the xor of the
    // incident probe indices in the low two, plus the xor of incident
    // hashes alongside.
    let mut t2count = vec![0u8; array_length];
    let mut t2hash = vec![0u64; array_length];

    for i in 0..size {
        let hash = reverse_order[i];
        let (h0, h1, h2) = positions(hash, sl, scl);
        for (j, p) in [h0, h1, h2].into_iter().enumerate() {
            let p = p as usize;
            if t2count[p] >= 0xfc {
                // Counter byte about to overflow: massive duplication
                // or a pathological hash. Discard the pass.
                return None;
            }
            t2count[p] += 4;
            t2count[p] ^= j as u8;
            t2hash[p] ^= hash;
        }
    }

    // Peel.
    let mut alone: Vec<u32> = (0..array_length as u32)
        .filter(|&p| t2count[p as usize] >> 2 == 1)
        .collect();
    let mut reverse_h = vec![0u8; size];
    let mut stack_size = 0usize;

    while let Some(index) = alone.pop() {
        let index = index as usize;
        if t2count[index] >> 2 != 1 {
            continue;
        }

        // Exactly one key remains here; its probe index survives in
        // the low two bits and its hash in the xor accumulator.
        let hash = t2hash[index];
        let found = (t2count[index] & 3) as usize;
        reverse_order[stack_size] = hash;
        reverse_h[stack_size] = found as u8;
        stack_size += 1;

        let (h0, h1, h2) = positions(hash, sl, scl);
        for (j, p) in [h0, h1, h2].into_iter().enumerate() {
            if j == found {
                continue;
            }
            let p = p as usize;
            t2count[p] -= 4;
            t2count[p] ^= j as u8;
            t2hash[p] ^= hash;
            if t2count[p] >> 2 == 1 {
                alone.push(p as u32);
            }
        }
    }

    if stack_size != size {
        return None;
    }

    // Assign fingerprints in reverse peel order.
    let mut fingerprints = vec![0u8; array_length];
    for i in (0..size).rev() {
        let hash = reverse_order[i];
        let found = reverse_h[i] as usize;
        let (h0, h1, h2) = positions(hash, sl, scl);
        let hs = [h0, h1, h2];

        let mut f = hash as u8;
        for (j, &p) in hs.iter().enumerate() {
            if j != found {
                f ^= fingerprints[p as usize];
            }
        }
        fingerprints[hs[found] as usize] = f;
    }

    Some(Fuse8 {
        seed,
        segment_length: sl,
        segment_count_length: scl,
        fingerprints,
    })
}

impl Filter for Fuse8 {
    fn may_contain(&self, key: u64) -> bool {
        let hash = hash64(key, self.seed);
        let (h0, h1, h2) = positions(hash, self.segment_length, self.segment_count_length);
        let f = self.fingerprints[h0 as usize]
            ^ self.fingerprints[h1 as usize]
            ^ self.fingerprints[h2 as usize];
        f == hash as u8
    }

    fn bit_count(&self) -> u64 {
        8 * self.fingerprints.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_invariants() {
        for n in [1usize, 2, 3, 10, 100, 1_000, 100_000, 1_000_000, 10_000_000] {
            let g = Geometry::for_keys(n);
            assert!(g.segment_length.is_power_of_two(), "n={n}");
            assert!(g.segment_length <= MAX_SEGMENT_LENGTH, "n={n}");
            assert_eq!(g.segment_count_length % g.segment_length, 0, "n={n}");
            assert_eq!(
                g.array_length,
                (g.segment_count_length + 2 * g.segment_length) as usize,
                "n={n}"
            );
            // Room for every key plus peeling slack.
            assert!(g.array_length > n, "n={n}: table {} too small", g.array_length);
        }
    }

    #[test]
    fn test_positions_stay_in_table() {
        let g = Geometry::for_keys(100_000);
        for i in 0..50_000u64 {
            let hash = hash64(i, 7);
            let (h0, h1, h2) = positions(hash, g.segment_length, g.segment_count_length);
            for h in [h0, h1, h2] {
                assert!((h as usize) < g.array_length, "hash {hash:#x} position {h}");
            }
            // The three probes land in three consecutive segments.
            assert_eq!(h0 / g.segment_length + 1, h1 / g.segment_length);
            assert_eq!(h0 / g.segment_length + 2, h2 / g.segment_length);
        }
    }

    #[test]
    fn test_fuse8_no_false_negatives() {
        let keys: Vec<u64> = (0..100_000u64).map(|i| hash64(i, 41)).collect();
        let f = Fuse8::construct(&keys).unwrap();
        for &k in &keys {
            assert!(f.may_contain(k), "false negative for key {k}");
        }
    }

    #[test]
    fn test_fuse8_false_positive_rate() {
        let keys: Vec<u64> = (0..100_000u64).map(|i| hash64(i, 42)).collect();
        let f = Fuse8::construct(&keys).unwrap();
        let hits = (0..1_000_000u64)
            .map(|i| hash64(i, 7777))
            .filter(|&k| f.may_contain(k))
            .count();
        // Theoretical ~0.39%; 3-sigma headroom on a million probes.
        assert!(hits < 6000, "{hits} false positives in 1M probes");
    }

    #[test]
    fn test_fuse8_space_per_key() {
        let keys: Vec<u64> = (0..1_000_000u64).map(|i| hash64(i, 43)).collect();
        let f = Fuse8::construct(&keys).unwrap();
        let bits_per_key = f.bit_count() as f64 / keys.len() as f64;
        assert!(
            bits_per_key > 8.5 && bits_per_key < 9.5,
            "bits/key out of envelope: {bits_per_key:.2}"
        );
    }

    #[test]
    fn test_fuse8_small_sets() {
        for n in [1usize, 2, 3, 10, 100] {
            let keys: Vec<u64> = (0..n as u64).map(|i| hash64(i, 44)).collect();
            let f = Fuse8::construct(&keys).unwrap();
            for &k in &keys {
                assert!(f.may_contain(k), "false negative for key {k} at n={n}");
            }
        }
    }

    #[test]
    fn test_fuse8_duplicate_keys_dedup_path() {
        // 10% duplicates: the dedup pass must rescue construction.
        let mut keys: Vec<u64> = (0..10_000u64).map(|i| hash64(i, 45)).collect();
        for i in 0..1000 {
            let dup = keys[i * 7];
            keys.push(dup);
        }
        let f = Fuse8::construct(&keys).unwrap();
        for &k in &keys {
            assert!(f.may_contain(k), "false negative for key {k}");
        }
    }

    #[test]
    fn test_fuse8_all_duplicates() {
        // n copies of one key collapse to a single-key filter.
        let keys = vec![99u64; 1000];
        let f = Fuse8::construct(&keys).unwrap();
        assert!(f.may_contain(99));
    }

    #[test]
    fn test_fuse8_empty_keys_rejected() {
        let err = Fuse8::construct(&[]).unwrap_err();
        assert!(
            err.to_string().contains("empty key set"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_fuse8_roundtrip() {
        let keys: Vec<u64> = (0..20_000u64).map(|i| hash64(i, 46)).collect();
        let f = Fuse8::construct(&keys).unwrap();

        let mut buf = Vec::new();
        f.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), f.serialized_size());

        let g = Fuse8::from_bytes(&buf).unwrap();
        assert_eq!(g.seed(), f.seed());
        for &k in &keys {
            assert!(g.may_contain(k), "false negative after roundtrip for {k}");
        }
        for i in 0..10_000u64 {
            let probe = hash64(i, 31337);
            assert_eq!(f.may_contain(probe), g.may_contain(probe));
        }
    }

    #[test]
    fn test_fuse8_from_bytes_header_truncated() {
        let err = Fuse8::from_bytes(&[0u8; 10]).unwrap_err();
        assert!(
            err.to_string().contains("header truncated"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_fuse8_from_bytes_bad_segment_length() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_le_bytes()); // not a power of two
        buf.extend_from_slice(&6u32.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        let err = Fuse8::from_bytes(&buf).unwrap_err();
        assert!(
            err.to_string().contains("power of two"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_fuse8_from_bytes_geometry_mismatch() {
        let keys: Vec<u64> = (0..1000).collect();
        let f = Fuse8::construct(&keys).unwrap();
        let mut buf = Vec::new();
        f.write_to(&mut buf).unwrap();

        // Corrupt the declared table length.
        let bad_len = (f.table_len() as u32 - 1).to_le_bytes();
        buf[16..20].copy_from_slice(&bad_len);
        let err = Fuse8::from_bytes(&buf).unwrap_err();
        assert!(
            err.to_string().contains("does not match geometry"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_fuse8_from_bytes_table_truncated() {
        let keys: Vec<u64> = (0..1000).collect();
        let f = Fuse8::construct(&keys).unwrap();
        let mut buf = Vec::new();
        f.write_to(&mut buf).unwrap();

        let err = Fuse8::from_bytes(&buf[..buf.len() - 3]).unwrap_err();
        assert!(
            err.to_string().contains("table truncated"),
            "unexpected error: {err}"
        );
    }
}
