//! Shared test utilities and fixtures.
//!
//! The fake engine is a pair of `sh` scripts that behave like the real build
//! and query binaries: the build stage writes an artifact and prints the two
//! length counters, the query stage writes a 2-metadata-column mapping.
//!
//! Fake engine behaviour, per `(w, k)`:
//! - reduction is `1 / (w - k + 1)` (original length 1200)
//! - q1 is always exact
//! - q2 gains a spurious hit `refZ` when `w - k > 2`

#![allow(dead_code)]

use mzsweep::{EngineConfig, SweepConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Ground truth for the fake engine's two queries (4 metadata columns).
pub const GROUND_TRUTH: &str = "q1\tchr\t100\t+\trefA\trefB\n\
q2\tchr\t500\t+\trefC\n";

pub const BUILD_SCRIPT: &str = r#"#!/bin/sh
# usage: build.sh <reference> <k> <w> <index>
printf '%s %s\n' "$2" "$3" > "$4"
head -c 2048 /dev/zero >> "$4"
echo "Reading reference $1"
echo "Original sequence length: 1200"
echo "Minimizer sequence length (indices stored): $((1200 / ($3 - $2 + 1)))"
"#;

pub const QUERY_SCRIPT: &str = r#"#!/bin/sh
# usage: query.sh <index> <queries> <output>
read k w < "$1"
{
  printf 'q1\t2\trefA\trefB\n'
  if [ $((w - k)) -gt 2 ]; then
    printf 'q2\t2\trefC\trefZ\n'
  else
    printf 'q2\t1\trefC\n'
  fi
} > "$3"
"#;

/// Bytes of every artifact the fake build writes for single-digit k and w.
pub const FAKE_INDEX_BYTES: u64 = 4 + 2048;

/// Scratch inputs and fake engine scripts for one test.
pub struct Fixture {
    pub dir: PathBuf,
    pub reference: PathBuf,
    pub queries: PathBuf,
    pub ground_truth: PathBuf,
    pub output: PathBuf,
}

impl Fixture {
    pub fn new(dir: &Path) -> Self {
        let reference = dir.join("reference.fa");
        let queries = dir.join("reads.fq");
        let ground_truth = dir.join("truth.map");
        fs::write(&reference, ">chr\nACGTACGTTTGACCAGGT\n").unwrap();
        fs::write(&queries, ">q1\nACGTAC\n>q2\nTTGACC\n").unwrap();
        fs::write(&ground_truth, GROUND_TRUTH).unwrap();
        write_script(dir, "build.sh", BUILD_SCRIPT);
        write_script(dir, "query.sh", QUERY_SCRIPT);
        Fixture {
            dir: dir.to_path_buf(),
            reference,
            queries,
            ground_truth,
            output: dir.join("out"),
        }
    }

    /// Replace one of the fake engine scripts.
    pub fn override_script(&self, name: &str, body: &str) {
        write_script(&self.dir, name, body);
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            build: vec![
                "sh".into(),
                self.dir.join("build.sh").display().to_string(),
                "{reference}".into(),
                "{k}".into(),
                "{w}".into(),
                "{index}".into(),
            ],
            query: vec![
                "sh".into(),
                self.dir.join("query.sh").display().to_string(),
                "{index}".into(),
                "{queries}".into(),
                "{output}".into(),
            ],
            timeout_secs: None,
        }
    }

    pub fn config(&self) -> SweepConfig {
        SweepConfig::new(
            &self.reference,
            &self.queries,
            &self.ground_truth,
            &self.output,
        )
        .with_engine(self.engine())
    }
}

fn write_script(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).unwrap();
}
