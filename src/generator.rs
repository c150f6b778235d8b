//! Baseline test generator: the external `hypothesis write` command.
//!
//! Patterns the generator supports natively are delegated to it. The
//! orchestrator only sees the [`BaselineGenerator`] trait, so tests can
//! substitute an in-memory fake for the subprocess.

use std::env;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

// ============================================================================
// Types
// ============================================================================

/// What to generate tests for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineTarget {
    /// Importable module name.
    pub module: String,
    /// Functions within the module (`f` or `Class.method`).
    pub functions: Vec<String>,
    /// Directory the module can be imported from.
    pub working_dir: PathBuf,
    /// Further directories the module's own imports resolve against.
    pub import_paths: Vec<PathBuf>,
}

impl BaselineTarget {
    /// Fully qualified function references: `module.f`.
    pub fn qualified_functions(&self) -> Vec<String> {
        self.functions
            .iter()
            .map(|f| format!("{}.{}", self.module, f))
            .collect()
    }
}

/// Captured output of one generator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaselineOutput {
    /// Generated test module.
    pub stdout: String,
    /// Diagnostics. Non-empty means the run failed.
    pub stderr: String,
}

impl BaselineOutput {
    /// True when the generator reported an error.
    pub fn failed(&self) -> bool {
        !self.stderr.trim().is_empty()
    }
}

/// Errors running the generator (as opposed to errors it reports).
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The program could not be found.
    #[error("generator program not found: {program}")]
    NotFound { program: String },

    /// The program could not be started.
    #[error("failed to start generator {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The run exceeded its time bound and was killed.
    #[error("generator timed out after {timeout:?}")]
    TimedOut { timeout: Duration },

    /// IO error while waiting for or reading from the generator.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Produces baseline test modules.
pub trait BaselineGenerator {
    /// Generate tests for `target`, optionally in a specific `mode`
    /// (e.g. `--roundtrip`). No mode lets the generator choose.
    fn generate(
        &self,
        target: &BaselineTarget,
        mode: Option<&str>,
    ) -> Result<BaselineOutput, GeneratorError>;
}

// ============================================================================
// HypothesisWriter
// ============================================================================

/// Runs `<program> write [mode] module.f ...` as a subprocess.
#[derive(Debug, Clone)]
pub struct HypothesisWriter {
    program: PathBuf,
    timeout: Duration,
}

impl HypothesisWriter {
    /// A writer for `program`, a path or a name looked up on `PATH` when
    /// the generator first runs.
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        HypothesisWriter {
            program: program.into(),
            timeout,
        }
    }

    /// The program to execute: `program` itself if it is a path, otherwise
    /// its location on `PATH`.
    pub fn resolve_program(&self) -> Result<PathBuf, GeneratorError> {
        if self.program.components().count() > 1 {
            return Ok(self.program.clone());
        }
        let resolved = which::which(&self.program).map_err(|_| GeneratorError::NotFound {
            program: self.program.display().to_string(),
        })?;
        debug!(program = %resolved.display(), "resolved generator");
        Ok(resolved)
    }

    /// Arguments passed to the program.
    pub fn arguments(&self, target: &BaselineTarget, mode: Option<&str>) -> Vec<String> {
        let mut args = vec!["write".to_string()];
        if let Some(mode) = mode.filter(|m| !m.is_empty()) {
            args.push(mode.to_string());
        }
        args.extend(target.qualified_functions());
        args
    }
}

impl BaselineGenerator for HypothesisWriter {
    fn generate(
        &self,
        target: &BaselineTarget,
        mode: Option<&str>,
    ) -> Result<BaselineOutput, GeneratorError> {
        let program = self.resolve_program()?;
        let args = self.arguments(target, mode);
        let python_path = python_path(target)?;
        debug!(program = %program.display(), ?args, ?python_path, "running generator");

        let start = Instant::now();
        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&target.working_dir)
            .env("PYTHONPATH", &python_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GeneratorError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        // Both pipes must be drained while the child runs.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        match child.wait_timeout(self.timeout)? {
            Some(status) => {
                let stdout = join_drain(stdout)?;
                let stderr = join_drain(stderr)?;
                debug!(
                    exit_code = ?status.code(),
                    elapsed = ?start.elapsed(),
                    "generator finished"
                );
                Ok(BaselineOutput { stdout, stderr })
            }
            None => {
                let _ = child.kill();
                let _ = child.wait();
                warn!(timeout = ?self.timeout, ?args, "generator timed out");
                Err(GeneratorError::TimedOut {
                    timeout: self.timeout,
                })
            }
        }
    }
}

/// `PYTHONPATH` for one run: the working directory, the target's import
/// paths, then whatever the environment already holds.
fn python_path(target: &BaselineTarget) -> Result<OsString, GeneratorError> {
    let mut paths = vec![target.working_dir.clone()];
    paths.extend(target.import_paths.iter().cloned());
    if let Some(existing) = env::var_os("PYTHONPATH") {
        paths.extend(env::split_paths(&existing));
    }
    env::join_paths(paths).map_err(|e| GeneratorError::Io(io::Error::other(e)))
}

type Drain = thread::JoinHandle<io::Result<Vec<u8>>>;

fn drain<R: Read + Send + 'static>(mut reader: R) -> Drain {
    thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_drain(handle: Option<Drain>) -> Result<String, GeneratorError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| io::Error::other("output reader panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> BaselineTarget {
        BaselineTarget {
            module: "codec".to_string(),
            functions: vec!["encode".to_string(), "decode".to_string()],
            working_dir: PathBuf::from("."),
            import_paths: Vec::new(),
        }
    }

    #[test]
    fn arguments_include_mode_and_qualified_functions() {
        let writer = HypothesisWriter::new("hypothesis", Duration::from_secs(1));
        assert_eq!(
            writer.arguments(&target(), Some("--roundtrip")),
            vec!["write", "--roundtrip", "codec.encode", "codec.decode"]
        );
    }

    #[test]
    fn arguments_without_mode() {
        let writer = HypothesisWriter::new("hypothesis", Duration::from_secs(1));
        assert_eq!(
            writer.arguments(&target(), None),
            vec!["write", "codec.encode", "codec.decode"]
        );
        assert_eq!(writer.arguments(&target(), Some("")).len(), 3);
    }

    #[test]
    fn python_path_puts_working_dir_first() {
        let target = BaselineTarget {
            working_dir: PathBuf::from("/tmp/staged"),
            import_paths: vec![PathBuf::from("/src/project")],
            ..target()
        };
        let joined = python_path(&target).unwrap();
        let paths: Vec<PathBuf> = env::split_paths(&joined).collect();
        assert_eq!(
            &paths[..2],
            &[PathBuf::from("/tmp/staged"), PathBuf::from("/src/project")]
        );
    }

    #[test]
    fn stderr_marks_failure() {
        let ok = BaselineOutput {
            stdout: "def test(): pass".to_string(),
            stderr: "\n".to_string(),
        };
        assert!(!ok.failed());
        let failed = BaselineOutput {
            stdout: String::new(),
            stderr: "Error: module not found".to_string(),
        };
        assert!(failed.failed());
    }

    #[test]
    fn unknown_program_is_not_found() {
        let writer = HypothesisWriter::new(
            "definitely-not-a-real-generator-binary",
            Duration::from_secs(1),
        );
        let err = writer.generate(&target(), None).unwrap_err();
        assert!(matches!(err, GeneratorError::NotFound { .. }));
    }

    #[test]
    fn explicit_paths_are_not_looked_up() {
        let writer = HypothesisWriter::new("/opt/tools/hypothesis", Duration::from_secs(1));
        assert_eq!(
            writer.resolve_program().unwrap(),
            PathBuf::from("/opt/tools/hypothesis")
        );
    }

    #[cfg(unix)]
    #[test]
    fn spawn_failure_is_reported() {
        let writer = HypothesisWriter::new("/nonexistent/hypothesis", Duration::from_secs(1));
        let err = writer.generate(&target(), None).unwrap_err();
        assert!(matches!(err, GeneratorError::Spawn { .. }));
    }
}
