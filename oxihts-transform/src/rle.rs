//! Run-length splitting for the Nx16 entropy coders.
//!
//! Unlike classic in-band RLE, this transform separates a stream into a
//! literal stream (fed to the entropy coder) and a metadata blob holding
//! the set of run symbols plus one extra-copy count per run. The metadata
//! layout is:
//!
//! ```text
//! n_run_symbols:u8 | symbols[n] | uint7 counts, one per run
//! ```
//!
//! A symbol is chosen as a run symbol when coding its runs saves bytes
//! overall; other symbols pass through untouched. The table is capped at
//! 255 entries so the count byte can also express "no run symbols".

use oxihts_core::bytes::ByteCursor;
use oxihts_core::error::Result;
use oxihts_core::varint::{read_uint7, write_uint7};

/// Split `data` into (literals, metadata).
pub fn split(data: &[u8]) -> (Vec<u8>, Vec<u8>) {
    // Net saving per symbol if its runs were collapsed: each run of length
    // L stores one literal and roughly one count byte instead of L bytes.
    let mut saving = [0i64; 256];
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        let mut run = 1usize;
        while i + run < data.len() && data[i + run] == byte {
            run += 1;
        }
        saving[byte as usize] += run as i64 - 2;
        i += run;
    }

    let mut run_symbols: Vec<u8> = (0u16..256)
        .filter(|&s| saving[s as usize] > 0)
        .map(|s| s as u8)
        .collect();
    run_symbols.truncate(255);

    let is_run = {
        let mut table = [false; 256];
        for &s in &run_symbols {
            table[s as usize] = true;
        }
        table
    };

    let mut meta = Vec::with_capacity(run_symbols.len() + 1);
    meta.push(run_symbols.len() as u8);
    meta.extend_from_slice(&run_symbols);

    let mut literals = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        literals.push(byte);
        if is_run[byte as usize] {
            let mut extra = 0usize;
            while i + 1 + extra < data.len() && data[i + 1 + extra] == byte {
                extra += 1;
            }
            write_uint7(&mut meta, extra as u32);
            i += 1 + extra;
        } else {
            i += 1;
        }
    }

    (literals, meta)
}

/// Expand (literals, metadata) back to the original stream.
pub fn expand(literals: &[u8], meta: &[u8]) -> Result<Vec<u8>> {
    let mut cur = ByteCursor::new(meta);
    let n_sym = cur.read_u8()?;

    let mut is_run = [false; 256];
    for _ in 0..n_sym {
        is_run[cur.read_u8()? as usize] = true;
    }

    let mut out = Vec::with_capacity(literals.len() * 2);
    for &byte in literals {
        out.push(byte);
        if is_run[byte as usize] {
            let extra = read_uint7(&mut cur)?;
            for _ in 0..extra {
                out.push(byte);
            }
        }
    }
    Ok(out)
}
