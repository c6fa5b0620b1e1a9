//! keysieve-lookup - query a serialized fuse filter for passwords.
//!
//! Usage:
//!   keysieve-lookup <filter.ksv> [candidate...]
//!
//! Each candidate string is hashed with SHA-1 and its leading 16 hex
//! digits become the 64-bit key, matching what keysieve-build stored.
//! With no candidates on the command line, lines are read from stdin.
//! Prints "Found" (possibly in the list) or "Not found" (definitely
//! absent) per candidate.

use std::io::BufRead;

use anyhow::{bail, Context, Result};
use sha1::{Digest, Sha1};

use keysieve::{Filter, Fuse8};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        bail!("usage: keysieve-lookup <filter.ksv> [candidate...]");
    }

    let bytes =
        std::fs::read(&args[1]).with_context(|| format!("reading {}", args[1]))?;
    let filter = Fuse8::from_bytes(&bytes).context("loading filter")?;

    if args.len() > 2 {
        for candidate in &args[2..] {
            report(&filter, candidate);
        }
    } else {
        for line in std::io::stdin().lock().lines() {
            let line = line?;
            report(&filter, line.trim_end_matches(['\r', '\n']));
        }
    }

    Ok(())
}

fn report(filter: &Fuse8, candidate: &str) {
    let verdict = if filter.may_contain(password_key(candidate)) {
        "Found"
    } else {
        "Not found"
    };
    println!("{candidate}: {verdict}");
}

/// Leading 16 hex digits of the SHA-1 digest, as a 64-bit key.
fn password_key(candidate: &str) -> u64 {
    let digest = Sha1::digest(candidate.as_bytes());
    u64::from_be_bytes(digest[..8].try_into().unwrap())
}
