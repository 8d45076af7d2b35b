// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Mapping file parser.
//!
//! A mapping file is tab-delimited, one line per query. The first
//! `skip_columns` tokens are metadata (read name, hit count, positions...),
//! everything after is the query's hit set. The two formats we consume differ
//! only in how many metadata columns they carry:
//!
//! ```text
//! ground truth:  q1 <TAB> pos5 <TAB> pos9 <TAB> x <TAB> refA <TAB> refB    (skip 4)
//! candidate:     q1 <TAB> 2    <TAB> refA <TAB> refC                       (skip 2)
//! ```
//!
//! Line *i* of every stream refers to the same query. There is no join key, so
//! the parser never drops or merges lines: `Q` lines in, `Q` hit sets out.

use crate::error::{Result, SweepError};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Token delimiter of every mapping file.
pub const DELIMITER: char = '\t';

/// The hits reported for one query. Order is irrelevant and duplicates collapse.
pub type HitSet = BTreeSet<String>;

/// Column layout of a mapping file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingFormat {
    pub name: &'static str,
    pub skip_columns: usize,
}

/// Exhaustive search output: name, two positions, strand, then hits.
pub const GROUND_TRUTH: MappingFormat = MappingFormat {
    name: "ground-truth",
    skip_columns: 4,
};

/// Query stage output: name, hit count, then hits.
pub const CANDIDATE: MappingFormat = MappingFormat {
    name: "candidate",
    skip_columns: 2,
};

impl MappingFormat {
    pub const fn new(name: &'static str, skip_columns: usize) -> Self {
        MappingFormat { name, skip_columns }
    }
}

/// Parse a mapping file into one hit set per line, in file order.
pub fn parse_mapping(path: &Path, format: MappingFormat) -> Result<Vec<HitSet>> {
    let file = File::open(path).map_err(|e| {
        SweepError::io(
            format!("Failed to open {} mapping {}", format.name, path.display()),
            e,
        )
    })?;
    parse_mapping_reader(BufReader::new(file), format, path)
}

/// Parse mapping lines from any reader. `origin` is only used in errors.
pub fn parse_mapping_reader<R: BufRead>(
    mut reader: R,
    format: MappingFormat,
    origin: &Path,
) -> Result<Vec<HitSet>> {
    let mut sets = Vec::new();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| SweepError::io(format!("Failed to read {}", origin.display()), e))?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = std::str::from_utf8(&buf).map_err(|e| SweepError::Format {
            path: origin.to_path_buf(),
            line: line_no,
            reason: format!("invalid UTF-8: {}", e),
        })?;
        let line = line.trim_end_matches(['\n', '\r']);

        sets.push(parse_line(line, format).map_err(|reason| SweepError::Format {
            path: origin.to_path_buf(),
            line: line_no,
            reason,
        })?);
    }

    Ok(sets)
}

/// Tokenize one line and keep the tokens after the metadata columns.
///
/// A line with exactly `skip_columns` tokens is a query with no hits. A line
/// with fewer is truncated metadata and rejected. Empty trailing tokens (a
/// trailing tab) are not hits.
pub fn parse_line(line: &str, format: MappingFormat) -> std::result::Result<HitSet, String> {
    let tokens: Vec<&str> = line.split(DELIMITER).collect();

    // "".split() yields one empty token; only a metadata-free format accepts it.
    let present = if line.is_empty() { 0 } else { tokens.len() };
    if present < format.skip_columns {
        return Err(format!(
            "expected at least {} metadata columns for {} format, found {}",
            format.skip_columns, format.name, present
        ));
    }

    Ok(tokens
        .into_iter()
        .skip(format.skip_columns)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect())
}

/// Parse an in-memory mapping (tests and the `evaluate` command use this).
pub fn parse_mapping_str(text: &str, format: MappingFormat) -> Result<Vec<HitSet>> {
    parse_mapping_reader(text.as_bytes(), format, Path::new("<memory>"))
}
