//! Binary fuse filters: xor-style membership with segmented locality.
//!
//! Like the xor filters, a key's fingerprint is the xor of three table
//! cells; unlike them, the three cells sit in three *consecutive*
//! power-of-two segments, so a query touches a narrow window of the
//! table and the size factor drops to ~1.125x.

pub mod fuse8;

pub use fuse8::Fuse8;
