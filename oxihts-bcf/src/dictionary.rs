//! Header dictionaries mapping integer offsets to strings.
//!
//! BCF records reference FILTER/INFO/FORMAT keys and contigs by integer
//! offset. The mapping is rebuilt from the header lines: either
//! positionally (no IDX attributes anywhere) or from explicit IDX values.
//! A gap-free `{0..N-1}` index set gets the dense array form; anything
//! else a sparse map.

use log::warn;
use oxihts_core::error::{HtsCodecError, Result};
use std::collections::HashMap;

/// Which header line kind an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLineKind {
    /// `##FILTER=<...>` lines.
    Filter,
    /// `##INFO=<...>` lines.
    Info,
    /// `##FORMAT=<...>` lines.
    Format,
    /// `##contig=<...>` lines.
    Contig,
}

/// One structured header line, as exposed by the header collaborator.
#[derive(Debug, Clone)]
pub struct HeaderLine {
    /// The line kind.
    pub kind: HeaderLineKind,
    /// The ID attribute.
    pub id: String,
    /// The optional IDX attribute.
    pub idx: Option<u32>,
}

impl HeaderLine {
    /// Convenience constructor.
    pub fn new(kind: HeaderLineKind, id: impl Into<String>, idx: Option<u32>) -> Self {
        Self {
            kind,
            id: id.into(),
            idx,
        }
    }
}

/// An offset-to-string dictionary in dense or sparse form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dictionary {
    /// Offsets form `{0..N-1}`.
    Dense(Vec<String>),
    /// Arbitrary offsets.
    Sparse(HashMap<u32, String>),
}

impl Dictionary {
    /// Entry at `offset`.
    pub fn get(&self, offset: u32) -> Option<&str> {
        match self {
            Self::Dense(v) => v.get(offset as usize).map(String::as_str),
            Self::Sparse(m) => m.get(&offset).map(String::as_str),
        }
    }

    /// Offset of `name`.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        match self {
            Self::Dense(v) => v.iter().position(|s| s == name).map(|i| i as u32),
            Self::Sparse(m) => m.iter().find(|(_, s)| s.as_str() == name).map(|(&i, _)| i),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Dense(v) => v.len(),
            Self::Sparse(m) => m.len(),
        }
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the dense array form was chosen.
    pub fn is_dense(&self) -> bool {
        matches!(self, Self::Dense(_))
    }
}

/// Build the shared FILTER/INFO/FORMAT string dictionary.
///
/// Entry 0 is always "PASS", inserted before any user line; a repeated ID
/// (across all three kinds) adds nothing.
pub fn build_string_dictionary(lines: &[HeaderLine]) -> Result<Dictionary> {
    let relevant: Vec<&HeaderLine> = lines
        .iter()
        .filter(|l| {
            matches!(
                l.kind,
                HeaderLineKind::Filter | HeaderLineKind::Info | HeaderLineKind::Format
            )
        })
        .collect();
    build(&relevant, true)
}

/// Build the contig dictionary.
pub fn build_contig_dictionary(lines: &[HeaderLine]) -> Result<Dictionary> {
    let relevant: Vec<&HeaderLine> = lines
        .iter()
        .filter(|l| l.kind == HeaderLineKind::Contig)
        .collect();
    build(&relevant, false)
}

fn build(lines: &[&HeaderLine], implicit_pass: bool) -> Result<Dictionary> {
    let with_idx = lines.iter().filter(|l| l.idx.is_some()).count();
    if with_idx != 0 && with_idx != lines.len() {
        return Err(HtsCodecError::malformed_header(
            "some header lines carry IDX and some do not",
        ));
    }

    let mut by_idx: HashMap<u32, String> = HashMap::new();
    let mut seen: HashMap<String, u32> = HashMap::new();

    if implicit_pass {
        let pass_idx = 0u32;
        by_idx.insert(pass_idx, "PASS".to_string());
        seen.insert("PASS".to_string(), pass_idx);
    }

    if with_idx == 0 {
        // Positional assignment in line order.
        let mut next = by_idx.len() as u32;
        for line in lines {
            if seen.contains_key(&line.id) {
                continue;
            }
            by_idx.insert(next, line.id.clone());
            seen.insert(line.id.clone(), next);
            next += 1;
        }
    } else {
        for line in lines {
            let idx = line.idx.expect("all lines carry IDX here");
            if let Some(&existing) = seen.get(&line.id) {
                if existing == idx {
                    warn!("duplicate header line for {} at IDX {idx}", line.id);
                    continue;
                }
                // Same ID elsewhere: first occurrence wins, no new entry.
                continue;
            }
            if let Some(existing) = by_idx.get(&idx) {
                if existing != &line.id {
                    return Err(HtsCodecError::malformed_header(format!(
                        "IDX {idx} claimed by both {existing} and {}",
                        line.id
                    )));
                }
                continue;
            }
            by_idx.insert(idx, line.id.clone());
            seen.insert(line.id.clone(), idx);
        }
    }

    // Dense when the index set is exactly {0..N-1}.
    let n = by_idx.len() as u32;
    let dense = (0..n).all(|i| by_idx.contains_key(&i));
    if dense {
        let mut v = vec![String::new(); n as usize];
        for (idx, id) in by_idx {
            v[idx as usize] = id;
        }
        Ok(Dictionary::Dense(v))
    } else {
        Ok(Dictionary::Sparse(by_idx))
    }
}
