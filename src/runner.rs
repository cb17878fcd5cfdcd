//! Test runner
//!
//! Selects cases from a table, runs them one after another, and tallies
//! the verdicts. A case failure never stops the run; only a fatal
//! [`DriverError`] (e.g. an output directory that cannot be created) does.

use std::path::PathBuf;
use std::time::{Duration, Instant};
use regex::Regex;
use tracing::{error, info};

use crate::case::{Command, Failure, TestCase, Verdict};
use crate::error::DriverError;

/// Default root for per-case output directories
pub const DEFAULT_OUTPUT_BASE: &str = "esdlcmd-test-output";

/// Default folder holding `xslt/*.xslt`
pub const DEFAULT_XSL_BASE: &str = "/opt/HPCCSystems/componentfiles/";

/// Settings shared by every case in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// The esdl executable
    pub exe_path: PathBuf,
    /// Each case writes into `<output_base>/<case name>`
    pub output_base: PathBuf,
    /// Holds `inputs/` and `key/`
    pub test_root: PathBuf,
    /// Passed to esdl as the xslt location
    pub xsl_base: PathBuf,
}

impl RunSettings {
    pub fn new(test_root: impl Into<PathBuf>) -> Self {
        Self {
            exe_path: PathBuf::from("esdl"),
            output_base: PathBuf::from(DEFAULT_OUTPUT_BASE),
            test_root: test_root.into(),
            xsl_base: PathBuf::from(DEFAULT_XSL_BASE),
        }
    }
}

/// Which cases to run by esdl command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFilter {
    All,
    Only(Command),
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub settings: RunSettings,
    /// A case runs if any filter matches its command
    pub commands: Vec<CommandFilter>,
    /// Optional filter on case names
    pub filter: Option<Regex>,
}

impl RunConfig {
    pub fn new(settings: RunSettings) -> Self {
        Self {
            settings,
            commands: vec![CommandFilter::All],
            filter: None,
        }
    }

    /// Whether a case is selected by the command and name filters
    pub fn selects(&self, case: &TestCase) -> bool {
        let by_command = self.commands.iter().any(|c| match c {
            CommandFilter::All => true,
            CommandFilter::Only(cmd) => *cmd == case.command,
        });
        let by_name = self.filter.as_ref().map_or(true, |re| re.is_match(&case.name));
        by_command && by_name
    }
}

/// Pass/fail tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub success_count: usize,
    pub failure_count: usize,
}

impl Statistics {
    pub fn add_count(&mut self, success: bool) {
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
    }
}

/// Result of a single case
#[derive(Debug)]
pub struct CaseOutcome {
    pub name: String,
    pub command: Command,
    pub verdict: Verdict,
    pub duration: Duration,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.verdict.passed()
    }
}

/// Result of running all selected cases
#[derive(Debug)]
pub struct RunResult {
    pub cases: Vec<CaseOutcome>,
    pub stats: Statistics,
    pub duration: Duration,
}

impl RunResult {
    pub fn all_passed(&self) -> bool {
        self.stats.failure_count == 0
    }

    /// Format a summary line
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed ({}ms)",
            self.stats.success_count,
            self.stats.failure_count,
            self.duration.as_millis(),
        )
    }
}

/// The test runner
pub struct TestRunner {
    config: RunConfig,
}

impl TestRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Cases from `cases` that this run would execute, in order
    pub fn select<'a>(&self, cases: &'a [TestCase]) -> Vec<&'a TestCase> {
        cases.iter().filter(|c| self.config.selects(c)).collect()
    }

    /// Run every selected case sequentially
    pub fn run_all(&self, cases: &[TestCase]) -> Result<RunResult, DriverError> {
        let start = Instant::now();
        let mut stats = Statistics::default();
        let mut outcomes = Vec::new();

        for case in self.select(cases) {
            let outcome = self.run_one(case)?;
            stats.add_count(outcome.passed());
            outcomes.push(outcome);
        }

        info!("Success count: {}", stats.success_count);
        info!("Failure count: {}", stats.failure_count);

        Ok(RunResult {
            cases: outcomes,
            stats,
            duration: start.elapsed(),
        })
    }

    /// Run a single case; non-fatal errors become a failed verdict
    pub fn run_one(&self, case: &TestCase) -> Result<CaseOutcome, DriverError> {
        let start = Instant::now();
        let verdict = match case.run(&self.config.settings) {
            Ok(verdict) => verdict,
            Err(e) if e.is_fatal() => {
                error!("{}", e);
                return Err(e);
            }
            Err(e) => {
                error!("{}", e);
                Verdict::Fail(Failure::Error(e.to_string()))
            }
        };

        Ok(CaseOutcome {
            name: case.name.clone(),
            command: case.command,
            verdict,
            duration: start.elapsed(),
        })
    }
}
