// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! The external index engine, seen from the outside.
//!
//! The engine is two black-box programs: a build stage that turns a reference
//! into an index artifact and prints a short report, and a query stage that
//! maps a read set against that artifact. [`IndexEngine`] is the seam the
//! sweep driver talks to; [`ProcessEngine`] implements it by spawning the
//! configured commands.
//!
//! Timing is not measured here. The driver wraps each call with a wall-clock
//! timer, so any [`IndexEngine`] implementation is timed the same way.

use crate::config::EngineConfig;
use crate::error::{Result, SweepError, Stage};
use crate::grid::ParamPair;
use regex::Regex;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

/// Label of the original length counter in the build report.
pub const ORIGINAL_LENGTH_LABEL: &str = "Original sequence length";
/// Label of the reduced length counter in the build report.
pub const MINIMIZER_LENGTH_LABEL: &str = "Minimizer sequence length";

/// How often a running child is polled when a timeout is set.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Build and query stages of an index engine.
///
/// Both calls block until the stage finishes. Implementations must be
/// shareable across threads so the sweep can run cells in parallel.
pub trait IndexEngine: Sync {
    /// Build an index for `pair` from `reference` into `index`.
    /// Returns the stage's textual report (its stdout).
    fn build(&self, reference: &Path, pair: ParamPair, index: &Path) -> Result<String>;

    /// Query `queries` against `index`, writing the candidate mapping to `output`.
    fn query(&self, index: &Path, queries: &Path, output: &Path) -> Result<()>;
}

/// Counters parsed from the build stage's report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub original_len: u64,
    pub minimizer_len: u64,
}

fn original_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*Original sequence length:[ \t]*(\S*)").expect("static regex")
    })
}

fn minimizer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*Minimizer sequence length(?: \([^)]*\))?:[ \t]*(\S*)")
            .expect("static regex")
    })
}

fn extract_counter(re: &Regex, label: &'static str, report: &str) -> Result<u64> {
    let caps = re.captures(report).ok_or_else(|| SweepError::BuildReport {
        counter: label,
        reason: "not found in build output".to_string(),
    })?;
    let raw = caps.get(1).map_or("", |m| m.as_str());
    raw.parse::<u64>().map_err(|_| SweepError::BuildReport {
        counter: label,
        reason: format!("'{}' is not a non-negative integer", raw),
    })
}

impl BuildReport {
    /// Pull both counters out of a build report.
    ///
    /// Accepts `Minimizer sequence length (indices stored): N` as well as the
    /// bare label. Either counter missing, or not an integer, is an error.
    pub fn parse(report: &str) -> Result<Self> {
        let original_len = extract_counter(original_re(), ORIGINAL_LENGTH_LABEL, report)?;
        let minimizer_len = extract_counter(minimizer_re(), MINIMIZER_LENGTH_LABEL, report)?;
        if original_len == 0 {
            return Err(SweepError::BuildReport {
                counter: ORIGINAL_LENGTH_LABEL,
                reason: "is zero, reduction ratio undefined".to_string(),
            });
        }
        Ok(BuildReport {
            original_len,
            minimizer_len,
        })
    }

    /// Stored sequence length relative to the original.
    pub fn reduction(&self) -> f64 {
        self.minimizer_len as f64 / self.original_len as f64
    }
}

/// Substitute `{name}` placeholders in every argument of a command template.
pub fn render_template(template: &[String], vars: &[(&str, String)]) -> Vec<String> {
    template
        .iter()
        .map(|arg| {
            let mut arg = arg.clone();
            for (name, value) in vars {
                let token = format!("{{{}}}", name);
                if arg.contains(&token) {
                    arg = arg.replace(&token, value);
                }
            }
            arg
        })
        .collect()
}

/// Runs the engine stages as child processes.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    config: EngineConfig,
}

impl ProcessEngine {
    pub fn new(config: EngineConfig) -> Self {
        ProcessEngine { config }
    }

    fn run(&self, stage: Stage, argv: Vec<String>) -> Result<String> {
        let command_line = argv.join(" ");
        log::debug!("{} stage: {}", stage, command_line);

        let (program, args) = argv.split_first().ok_or_else(|| SweepError::Config {
            reason: format!("{} command is empty", stage),
        })?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // Own process group, so a timeout reaches wrapper scripts' children too.
        #[cfg(unix)]
        std::os::unix::process::CommandExt::process_group(&mut command, 0);

        let child = command
            .spawn()
            .map_err(|e| SweepError::Subprocess {
                stage,
                command: command_line.clone(),
                status: None,
                stderr: format!("failed to spawn: {}", e),
            })?;

        let finished = wait_with_deadline(child, self.config.timeout())
            .map_err(|e| SweepError::io(format!("Failed waiting for {} stage", stage), e))?;

        let Some(output) = finished else {
            return Err(SweepError::Timeout {
                stage,
                command: command_line,
                limit: self.config.timeout().unwrap_or_default(),
            });
        };

        if !output.status.success() {
            return Err(SweepError::Subprocess {
                stage,
                command: command_line,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl IndexEngine for ProcessEngine {
    fn build(&self, reference: &Path, pair: ParamPair, index: &Path) -> Result<String> {
        let argv = render_template(
            &self.config.build,
            &[
                ("reference", reference.display().to_string()),
                ("k", pair.k().to_string()),
                ("w", pair.w().to_string()),
                ("index", index.display().to_string()),
            ],
        );
        self.run(Stage::Build, argv)
    }

    fn query(&self, index: &Path, queries: &Path, output: &Path) -> Result<()> {
        let argv = render_template(
            &self.config.query,
            &[
                ("index", index.display().to_string()),
                ("queries", queries.display().to_string()),
                ("output", output.display().to_string()),
            ],
        );
        self.run(Stage::Query, argv).map(|_| ())
    }
}

/// Collected result of a finished child.
struct Finished {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn drain<R: Read + Send + 'static>(
    pipe: Option<R>,
    name: &'static str,
) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf) {
                log::warn!(
                    "reading child {} failed after {} bytes, output is truncated: {}",
                    name,
                    buf.len(),
                    e
                );
            }
        }
        buf
    })
}

/// Kill `child` and everything else in its process group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        let group = format!("-{}", child.id());
        match Command::new("kill")
            .args(["-KILL", "--", group.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => {}
            Ok(status) => log::warn!("kill of process group {} exited with {}", group, status),
            Err(e) => log::warn!("could not signal process group {}: {}", group, e),
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Wait for `child`, killing it once `limit` has elapsed.
///
/// Returns `Ok(None)` on timeout. Both pipes are drained on background
/// threads so a chatty child cannot block on a full pipe. After a timeout the
/// drain threads are detached rather than joined: a descendant that escaped
/// the kill may still hold the pipes open.
fn wait_with_deadline(mut child: Child, limit: Option<Duration>) -> std::io::Result<Option<Finished>> {
    let stdout = drain(child.stdout.take(), "stdout");
    let stderr = drain(child.stderr.take(), "stderr");

    let status = match limit {
        None => Some(child.wait()?),
        Some(limit) => {
            let deadline = Instant::now() + limit;
            loop {
                if let Some(status) = child.try_wait()? {
                    break Some(status);
                }
                if Instant::now() >= deadline {
                    kill_tree(&mut child);
                    break None;
                }
                thread::sleep(POLL_INTERVAL);
            }
        }
    };

    let Some(status) = status else {
        return Ok(None);
    };

    let stdout = stdout.join().unwrap_or_default();
    let stderr = stderr.join().unwrap_or_default();

    Ok(Some(Finished {
        status,
        stdout,
        stderr,
    }))
}
