//! keysieve-build - compile a password-hash list into a fuse filter.
//!
//! Usage:
//!   keysieve-build <hashes.txt> <output.ksv>
//!
//! The input is a newline-delimited ASCII list of 40-hex-digit SHA-1
//! digests (a trailing ":count" per line, as in breach-corpus exports,
//! is tolerated). The leading 16 hex digits of each line become the
//! 64-bit key. The output is a serialized 8-bit binary fuse filter.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use keysieve::{Filter, Fuse8};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        bail!("usage: keysieve-build <hashes.txt> <output.ksv>");
    }

    let keys = read_keys(Path::new(&args[1]))?;
    if keys.is_empty() {
        bail!("no hashes found in {}", args[1]);
    }
    tracing::info!(keys = keys.len(), "building fuse filter");

    let filter = Fuse8::construct(&keys).context("filter construction failed")?;
    tracing::info!(
        bits_per_key = filter.bit_count() as f64 / keys.len() as f64,
        "filter built"
    );

    let out = File::create(&args[2]).with_context(|| format!("creating {}", args[2]))?;
    let mut writer = BufWriter::new(out);
    filter
        .write_to(&mut writer)
        .with_context(|| format!("writing {}", args[2]))?;
    writer.flush().with_context(|| format!("writing {}", args[2]))?;

    Ok(())
}

/// Parse the leading 16 hex digits of every non-empty line.
fn read_keys(path: &Path) -> Result<Vec<u64>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut keys = Vec::new();

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let digits = line
            .get(..16)
            .with_context(|| format!("line {}: too short for a SHA-1 digest", line_no + 1))?;
        let key = u64::from_str_radix(digits, 16)
            .with_context(|| format!("line {}: not a hex digest", line_no + 1))?;
        keys.push(key);
    }

    Ok(keys)
}
