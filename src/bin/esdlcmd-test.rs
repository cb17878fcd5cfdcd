//! esdlcmd-test CLI
//!
//! Test the functioning of the esdl command against recorded keys.

use std::path::PathBuf;
use std::process::ExitCode;
use anyhow::Context;
use clap::{Parser, ValueEnum};
use regex::Regex;
use esdlcmd_test::{
    default_cases, logging, Command, CommandFilter, RunConfig, RunSettings, TestRunner, Verdict,
    DEFAULT_OUTPUT_BASE, DEFAULT_XSL_BASE,
};

#[derive(Parser, Debug)]
#[command(name = "esdlcmd-test")]
#[command(version)]
#[command(about = "Test the functioning of the esdl command")]
struct Cli {
    /// Path of the root folder of the esdlcmd testing project
    testroot: PathBuf,

    /// Directory name of output for tests
    #[arg(short, long, default_value = DEFAULT_OUTPUT_BASE)]
    outdir: PathBuf,

    /// Path to the folder holding the esdl executable [default: search PATH]
    #[arg(short, long)]
    esdlpath: Option<PathBuf>,

    /// Path to the folder containing xslt/*.xslt transforms
    #[arg(short = 'x', long, default_value = DEFAULT_XSL_BASE)]
    xslpath: PathBuf,

    /// Enable debug logging of test cases
    #[arg(short, long)]
    debug: bool,

    /// esdl commands to run tests for; repeat for several [default: all]
    #[arg(short, long, value_enum)]
    commands: Vec<CommandArg>,

    /// Only run cases whose name matches this regular expression
    #[arg(short, long)]
    filter: Option<String>,

    /// Print the selected cases without running them
    #[arg(long)]
    list: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CommandArg {
    All,
    Cpp,
    Ecl,
    Java,
    Wsdl,
    Xsd,
    Xml,
}

impl From<CommandArg> for CommandFilter {
    fn from(arg: CommandArg) -> Self {
        match arg {
            CommandArg::All => CommandFilter::All,
            CommandArg::Cpp => CommandFilter::Only(Command::Cpp),
            CommandArg::Ecl => CommandFilter::Only(Command::Ecl),
            CommandArg::Java => CommandFilter::Only(Command::Java),
            CommandArg::Wsdl => CommandFilter::Only(Command::Wsdl),
            CommandArg::Xsd => CommandFilter::Only(Command::Xsd),
            CommandArg::Xml => CommandFilter::Only(Command::Xml),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = RunSettings {
        exe_path: cli
            .esdlpath
            .map(|dir| dir.join("esdl"))
            .unwrap_or_else(|| PathBuf::from("esdl")),
        output_base: cli.outdir,
        test_root: cli.testroot,
        xsl_base: cli.xslpath,
    };

    let mut config = RunConfig::new(settings);
    if !cli.commands.is_empty() {
        config.commands = cli.commands.into_iter().map(CommandFilter::from).collect();
    }
    if let Some(pattern) = cli.filter {
        let re = Regex::new(&pattern).with_context(|| format!("invalid --filter '{}'", pattern))?;
        config.filter = Some(re);
    }

    let cases = default_cases(&config.settings);
    let runner = TestRunner::new(config);

    if cli.list {
        for case in runner.select(&cases) {
            println!("{:<28} {}", case.name, case.invocation(&runner.config().settings));
        }
        return Ok(true);
    }

    let result = runner.run_all(&cases).context("test run aborted")?;

    for case in result.cases.iter().filter(|c| !c.passed()) {
        if let Verdict::Fail(ref failure) = case.verdict {
            println!("FAIL  {}", case.name);
            for line in failure.to_string().lines() {
                println!("      {}", line);
            }
        }
    }
    println!("{}", result.summary());

    Ok(result.all_passed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["esdlcmd-test", "/root"]).unwrap();
        assert_eq!(cli.outdir, PathBuf::from(DEFAULT_OUTPUT_BASE));
        assert_eq!(cli.xslpath, PathBuf::from(DEFAULT_XSL_BASE));
        assert!(cli.commands.is_empty());
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_repeated_commands() {
        let cli = Cli::try_parse_from(["esdlcmd-test", "/root", "-c", "wsdl", "-c", "ecl", "-d"]).unwrap();
        assert_eq!(cli.commands, vec![CommandArg::Wsdl, CommandArg::Ecl]);
        assert!(cli.debug);
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["esdlcmd-test", "/root", "-c", "rust"]).is_err());
    }
}
