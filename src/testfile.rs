//! Test file location and I/O.
//!
//! The test file for `pkg/codec.py` lives next to it as
//! `pkg/codec<suffix>.py`. A missing test file reads as empty, and writes go
//! through a temporary file in the same directory so readers never observe a
//! partially written file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// Error Types
// ============================================================================

/// Errors reading or writing test files.
#[derive(Debug, Error)]
pub enum TestFileError {
    /// The source path has no usable file stem.
    #[error("cannot derive a module name from {path}")]
    NoModuleName { path: PathBuf },

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for test file operations.
pub type TestFileResult<T> = Result<T, TestFileError>;

// ============================================================================
// Paths
// ============================================================================

/// Importable module name of a source file: its file stem.
pub fn module_name(source_path: &Path) -> TestFileResult<String> {
    source_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TestFileError::NoModuleName {
            path: source_path.to_path_buf(),
        })
}

/// `<dir>/<stem><suffix>.py` for a source file.
pub fn test_file_path(source_path: &Path, suffix: &str) -> TestFileResult<PathBuf> {
    let stem = module_name(source_path)?;
    Ok(source_path.with_file_name(format!("{}{}.py", stem, suffix)))
}

// ============================================================================
// Reading and Writing
// ============================================================================

/// Read a source file. Unlike test files, it must exist.
pub fn read_source(path: &Path) -> TestFileResult<String> {
    fs::read_to_string(path).map_err(|source| TestFileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a test file, treating a missing file as empty.
pub fn read_test_file(path: &Path) -> TestFileResult<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "test file does not exist yet");
            Ok(String::new())
        }
        Err(source) => Err(TestFileError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Replace `path` with `content` in one step.
pub fn write_atomic(path: &Path, content: &str) -> TestFileResult<()> {
    let write_err = |source: io::Error| TestFileError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.flush().map_err(write_err)?;
    temp.persist(path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), bytes = content.len(), "wrote test file");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_path_sits_next_to_source() {
        let path = test_file_path(Path::new("pkg/codec.py"), "_test").unwrap();
        assert_eq!(path, PathBuf::from("pkg/codec_test.py"));
    }

    #[test]
    fn test_path_honors_custom_suffix() {
        let path = test_file_path(Path::new("sorting.py"), "_pbt").unwrap();
        assert_eq!(path, PathBuf::from("sorting_pbt.py"));
    }

    #[test]
    fn module_name_is_the_stem() {
        assert_eq!(module_name(Path::new("/a/b/mymath.py")).unwrap(), "mymath");
        assert!(module_name(Path::new("/")).is_err());
    }

    #[test]
    fn missing_test_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let content = read_test_file(&dir.path().join("absent_test.py")).unwrap();
        assert_eq!(content, "");
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = read_source(&dir.path().join("absent.py")).unwrap_err();
        assert!(matches!(err, TestFileError::Read { .. }));
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("m_test.py");
        fs::write(&path, "old\n").unwrap();

        write_atomic(&path, "new\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        let leftovers: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temporary file left behind");
    }

    #[test]
    fn write_atomic_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fresh_test.py");
        write_atomic(&path, "import unittest\n").unwrap();
        assert_eq!(read_test_file(&path).unwrap(), "import unittest\n");
    }
}
