//! Test cases
//!
//! A case is one esdl invocation plus the rule for locating its output and
//! its key. Three shapes exist, matching how the generator writes results:
//!
//! - [`CaseKind::Schema`]: `wsdl` / `xsd`, one file named after the service
//! - [`CaseKind::Code`]: `cpp` / `java`, a `source/` directory tree
//! - [`CaseKind::Transform`]: `ecl` / `xml`, a directory or standard output
//!
//! Keys live under `<testroot>/key/`, inputs under `<testroot>/inputs/`.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, Level};

use crate::compare::{compare, Comparison};
use crate::error::DriverError;
use crate::exec::{Captured, Invocation};
use crate::runner::RunSettings;

/// File the captured stdout of a transform is written to, inside the output dir.
pub const STDOUT_FILE: &str = "from-stdout.ecl";

/// esdl sub-commands exercised by the suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    Wsdl,
    Xsd,
    Cpp,
    Java,
    Ecl,
    Xml,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Wsdl,
        Command::Xsd,
        Command::Cpp,
        Command::Java,
        Command::Ecl,
        Command::Xml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Wsdl => "wsdl",
            Command::Xsd => "xsd",
            Command::Cpp => "cpp",
            Command::Java => "java",
            Command::Ecl => "ecl",
            Command::Xml => "xml",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DriverError::usage(format!("unknown esdl command: {}", s)))
    }
}

/// How a case is invoked and validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseKind {
    /// Single-file output `<service lowercased>.<command>`
    Schema { service: String },
    /// Directory output `source/`; the xslt argument needs `xslt/` appended
    Code { service: String },
    /// Output directory or stdout. If `expected_stderr` matches the captured
    /// stderr exactly the case passes without further validation.
    Transform { use_stdout: bool, expected_stderr: Option<String> },
}

/// Why a case failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The generator ran but exited unsuccessfully
    Generator { exit_code: Option<i32>, stderr: String },
    /// The generator could not be run or its artifacts not handled
    Error(String),
    /// A stdout transform produced no output
    MissingStdout,
    MissingKey(PathBuf),
    MissingOutput(PathBuf),
    /// Output and key differ
    Mismatch(Comparison),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Generator { exit_code: Some(code), stderr } => {
                write!(f, "generator exited with code {}: {}", code, stderr.trim_end())
            }
            Failure::Generator { exit_code: None, stderr } => {
                write!(f, "generator terminated by signal: {}", stderr.trim_end())
            }
            Failure::Error(msg) => f.write_str(msg),
            Failure::MissingStdout => f.write_str("missing stdout output"),
            Failure::MissingKey(path) => write!(f, "missing key file {}", path.display()),
            Failure::MissingOutput(path) => write!(f, "missing output {}", path.display()),
            Failure::Mismatch(cmp) => write!(f, "output differs from key:\n{}", cmp),
        }
    }
}

/// Outcome of a single case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(Failure),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// One generator invocation and the key it must reproduce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Unique name; also names the output directory and the key
    pub name: String,
    pub command: Command,
    /// Input file name under `<testroot>/inputs/`
    pub esdl_file: String,
    pub kind: CaseKind,
    /// Extra arguments appended after the fixed ones
    pub options: Vec<String>,
}

impl TestCase {
    pub fn schema(name: &str, command: Command, esdl_file: &str, service: &str) -> Self {
        Self::new(name, command, esdl_file, CaseKind::Schema { service: service.into() })
    }

    pub fn code(name: &str, command: Command, esdl_file: &str, service: &str) -> Self {
        Self::new(name, command, esdl_file, CaseKind::Code { service: service.into() })
    }

    pub fn transform(name: &str, command: Command, esdl_file: &str, use_stdout: bool) -> Self {
        Self::new(
            name,
            command,
            esdl_file,
            CaseKind::Transform { use_stdout, expected_stderr: None },
        )
    }

    fn new(name: &str, command: Command, esdl_file: &str, kind: CaseKind) -> Self {
        Self {
            name: name.into(),
            command,
            esdl_file: esdl_file.into(),
            kind,
            options: Vec::new(),
        }
    }

    /// Append extra generator options
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Expect the generator to fail with exactly this stderr (transforms only)
    pub fn expecting_stderr(mut self, stderr: impl Into<String>) -> Self {
        if let CaseKind::Transform { ref mut expected_stderr, .. } = self.kind {
            *expected_stderr = Some(stderr.into());
        }
        self
    }

    /// Directory the generator writes into: `<output base>/<name>`
    pub fn output_path(&self, settings: &RunSettings) -> PathBuf {
        settings.output_base.join(&self.name)
    }

    /// The artifact compared against the key
    pub fn result_path(&self, settings: &RunSettings) -> PathBuf {
        let out = self.output_path(settings);
        match &self.kind {
            CaseKind::Schema { service } => out
                .join(service.to_lowercase())
                .with_extension(self.command.as_str()),
            CaseKind::Code { .. } => out.join("source"),
            CaseKind::Transform { .. } => out,
        }
    }

    pub fn key_path(&self, settings: &RunSettings) -> PathBuf {
        let key = settings.test_root.join("key").join(&self.name);
        match &self.kind {
            CaseKind::Schema { .. } => key.with_extension(self.command.as_str()),
            CaseKind::Code { .. } | CaseKind::Transform { .. } => key,
        }
    }

    /// The full command line for this case
    pub fn invocation(&self, settings: &RunSettings) -> Invocation {
        let esdl_path = settings.test_root.join("inputs").join(&self.esdl_file);
        let output_path = self.output_path(settings);
        let inv = Invocation::new(&settings.exe_path).arg(self.command.as_str()).arg(&esdl_path);

        let inv = match &self.kind {
            CaseKind::Schema { service } => inv
                .arg(service)
                .arg("--xslt")
                .arg(&settings.xsl_base)
                .arg("--outdir")
                .arg(with_trailing_slash(&output_path)),
            CaseKind::Code { service } => inv
                .arg(service)
                .arg("--xslt")
                .arg(with_trailing_slash(&settings.xsl_base.join("xslt")))
                .arg("--outdir")
                .arg(with_trailing_slash(&output_path)),
            CaseKind::Transform { use_stdout: true, .. } => {
                inv.arg("-cde").arg(&settings.xsl_base)
            }
            CaseKind::Transform { use_stdout: false, .. } => {
                inv.arg(&output_path).arg("-cde").arg(&settings.xsl_base)
            }
        };
        inv.args(&self.options)
    }

    /// Prepare an empty output directory, run the generator and judge the result.
    ///
    /// Output left by an earlier run is removed first, so only what this
    /// invocation writes is compared.
    ///
    /// Errors are returned only when the case could not be evaluated at all;
    /// see [`DriverError::is_fatal`] for which of them end the run.
    pub fn run(&self, settings: &RunSettings) -> Result<Verdict, DriverError> {
        let output_path = self.output_path(settings);
        reset_dir(&output_path)
            .map_err(|e| DriverError::output_dir(&output_path, e).with_case(&self.name))?;

        let invocation = self.invocation(settings);
        debug!("Test {} args: {}", self.name, invocation);
        let captured = invocation.run().map_err(|e| e.with_case(&self.name))?;

        if let CaseKind::Transform { expected_stderr: Some(expected), .. } = &self.kind {
            if *expected == captured.stderr {
                debug!("Passed: {} (expected error output)", self.name);
                return Ok(Verdict::Pass);
            }
        }

        if !captured.success() {
            error!(
                "Error running \"esdl {}\" for test \"{}\": {}",
                self.command,
                self.name,
                captured.stderr.trim_end()
            );
            return Ok(Verdict::Fail(Failure::Generator {
                exit_code: captured.exit_code,
                stderr: captured.stderr,
            }));
        }

        self.validate(settings, &captured)
    }

    /// Compare the case's result to its key.
    fn validate(&self, settings: &RunSettings, captured: &Captured) -> Result<Verdict, DriverError> {
        let result = self.result_path(settings);
        let key = self.key_path(settings);

        // Stdout transforms are materialized so they compare like any other tree.
        if let CaseKind::Transform { use_stdout: true, .. } = self.kind {
            if captured.stdout.is_empty() {
                error!("Missing stdout output for test {}", self.name);
                return Ok(Verdict::Fail(Failure::MissingStdout));
            }
            let file = result.join(STDOUT_FILE);
            std::fs::write(&file, &captured.stdout).map_err(|e| {
                DriverError::from(e).with_path(&file).with_case(&self.name)
            })?;
        }

        if !key.exists() {
            error!("Missing key file {}", key.display());
            return Ok(Verdict::Fail(Failure::MissingKey(key)));
        }
        if !result.exists() {
            error!("Missing output for test {}", self.name);
            return Ok(Verdict::Fail(Failure::MissingOutput(result)));
        }

        let comparison = compare(&key, &result);
        if comparison.is_equal() {
            debug!("Passed: {}", self.name);
            return Ok(Verdict::Pass);
        }

        debug!("Comparing key {} to output {}", key.display(), result.display());
        log_discrepancies(&key, &result, &comparison);
        error!("Test failed: {}", self.name);
        Ok(Verdict::Fail(Failure::Mismatch(comparison)))
    }
}

fn log_discrepancies(key: &Path, result: &Path, comparison: &Comparison) {
    for line in comparison.to_string().lines() {
        debug!("  {}", line);
    }
    if !tracing::enabled!(Level::DEBUG) {
        return;
    }
    let Some(found) = comparison.discrepancies() else {
        return;
    };
    for rel in &found.differing {
        let (k, r) = (under(key, rel), under(result, rel));
        let label_key = k.to_string_lossy();
        let label_out = r.to_string_lossy();
        if let Some(diff) = crate::diff::unified_diff(&k, &r, &label_key, &label_out) {
            for line in diff.lines() {
                debug!("    {}", line);
            }
        }
    }
}

/// Resolve a discrepancy path against a compared root; `.` is the root itself.
fn under(root: &Path, rel: &Path) -> PathBuf {
    if rel == Path::new(".") {
        root.to_path_buf()
    } else {
        root.join(rel)
    }
}

/// Remove `dir` if present, then create it (and its parents) empty.
fn reset_dir(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::fs::create_dir_all(dir)
}

/// esdl appends file names to `--outdir`/`--xslt` verbatim, so these need a separator.
fn with_trailing_slash(path: &Path) -> OsString {
    let mut s = path.as_os_str().to_os_string();
    s.push("/");
    s
}
