//! esdlcmd-test: regression driver for the esdl code generator
//!
//! Runs `esdl` with a table of argument combinations, captures what it
//! produces (a file, a directory tree, or standard output) and compares the
//! result against recorded keys.
//!
//! # Layout of a test root
//!
//! ```text
//! <testroot>/
//!   inputs/ws_test.ecm ...        esdl inputs
//!   key/wstest-wsdl-default.wsdl  single-file keys (wsdl, xsd)
//!   key/wstest-cpp-installdir/    directory keys (cpp, java, ecl)
//! ```
//!
//! # Comparing trees
//!
//! The comparison engine is usable on its own:
//!
//! ```rust,no_run
//! use esdlcmd_test::{compare, Comparison};
//!
//! match compare("key/ecl-incl", "out/ecl-incl") {
//!     Comparison::Equal => println!("match"),
//!     Comparison::Unequal(found) => println!("{}", found),
//!     Comparison::Missing { left, right } => println!("missing: {} {}", left, right),
//! }
//! ```

mod case;
mod compare;
mod diff;
mod error;
mod exec;
mod runner;
mod suite;

pub mod logging;

pub use case::{Command, CaseKind, Failure, TestCase, Verdict, STDOUT_FILE};
pub use compare::{
    compare, files_equal, Comparator, Comparison, Discrepancies, EntryKind, Incomparable, Side,
};
pub use diff::{diff_text, unified_diff};
pub use error::{DriverError, ErrorKind};
pub use exec::{Captured, Invocation};
pub use runner::{
    CaseOutcome, CommandFilter, RunConfig, RunResult, RunSettings, Statistics, TestRunner,
    DEFAULT_OUTPUT_BASE, DEFAULT_XSL_BASE,
};
pub use suite::{default_cases, ERR_MULTI_FILE_EXPANDED, ERR_MULTI_FILE_INCLUDES};
