//! exec — run the generator and capture its streams

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::process::{Command as ProcessCommand, Stdio};
use crate::error::DriverError;

/// A fully built generator command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

/// What a finished generator run left behind
#[derive(Debug, Clone, Default)]
pub struct Captured {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Raw bytes; generated output is compared byte for byte
    pub stdout: Vec<u8>,
    /// Lossily decoded; only ever matched as text
    pub stderr: String,
}

impl Captured {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout decoded for display
    pub fn stdout_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// Spawn, wait, and collect stdout/stderr. Stdin is closed.
    pub fn run(&self) -> Result<Captured, DriverError> {
        let child = ProcessCommand::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DriverError::spawn(&self.program, e))?;

        let output = child.wait_with_output()?;
        Ok(Captured {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.contains(' ') || arg.contains('\t') || arg.is_empty() {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
