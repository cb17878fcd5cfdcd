//! Driver errors
//!
//! Only failures that stop a case from being evaluated at all end up here.
//! Tree comparison never errors: discrepancies are data, see [`crate::Comparison`].

use std::fmt;
use std::path::PathBuf;

/// The kind of driver error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The per-case output directory could not be created
    OutputDir,
    /// The generator process could not be started
    Spawn,
    /// Reading or writing a case artifact failed
    Io,
    /// Invalid driver configuration
    Usage,
}

/// A driver error with optional path context
#[derive(Debug)]
pub struct DriverError {
    pub kind: ErrorKind,
    pub message: String,
    pub path: Option<PathBuf>,
    pub case: Option<String>,
}

impl DriverError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            path: None,
            case: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_case(mut self, case: impl Into<String>) -> Self {
        self.case = Some(case.into());
        self
    }

    pub fn output_dir(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::new(ErrorKind::OutputDir, err.to_string()).with_path(path)
    }

    pub fn spawn(program: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::new(ErrorKind::Spawn, err.to_string()).with_path(program)
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, msg)
    }

    /// Whether the whole run must stop, not just the current case
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ErrorKind::OutputDir | ErrorKind::Usage)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref case) = self.case {
            write!(f, "{}: ", case)?;
        }
        match self.kind {
            ErrorKind::OutputDir => write!(f, "cannot create output directory")?,
            ErrorKind::Spawn => write!(f, "cannot start generator")?,
            ErrorKind::Io => write!(f, "i/o error")?,
            ErrorKind::Usage => write!(f, "invalid usage")?,
        }
        if let Some(ref path) = self.path {
            write!(f, " '{}'", path.display())?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for DriverError {}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}
