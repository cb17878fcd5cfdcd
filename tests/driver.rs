//! End-to-end driver runs against a stand-in esdl
//!
//! The stand-ins are shell scripts, so these tests are unix only. They are
//! all written once, before any test spawns, so no script is still open for
//! writing while another thread forks. They live in cargo's per-target
//! scratch directory and are overwritten on every run.

#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use esdlcmd_test::{
    default_cases, Command, Comparison, Failure, RunConfig, RunSettings, TestCase, TestRunner,
    Verdict, ERR_MULTI_FILE_EXPANDED,
};

const GOOD: &str = r#"#!/bin/sh
cmd="$1"
case "$cmd" in
  wsdl|xsd)
    printf '<%s/>\n' "$cmd" > "${7}$(echo "$3" | tr 'A-Z' 'a-z').$cmd"
    ;;
  cpp|java)
    mkdir -p "${7}source/sub"
    printf 'class WsTest;\n' > "${7}source/WsTest.hpp"
    printf 'int sub;\n' > "${7}source/sub/impl.cpp"
    ;;
  ecl|xml)
    if [ "$3" = "-cde" ]; then
      for a in "$@"; do
        if [ "$a" = "-x" ]; then
          printf '\nOutput to stdout is not supported for multiple files. Remove the Output expanded\n XML option or specify an output directory.\n' >&2
          exit 1
        fi
      done
      echo 'export WsTest := MODULE;'
    else
      echo 'export WsTest := MODULE;' > "$3/ws_test.ecl"
    fi
    ;;
esac
exit 0
"#;

const FAILING: &str = "#!/bin/sh\necho 'cannot parse input' >&2\nexit 2\n";

const SILENT: &str = "#!/bin/sh\nexit 0\n";

/// Writes Latin-1 `café`, which is not valid UTF-8
const LATIN1: &str = "#!/bin/sh\nprintf 'caf\\351\\n'\n";

const KEYS: &str = concat!(
    "-- inputs/ws_test.ecm --\nESPservice WsTest {};\n",
    "-- key/wstest-wsdl-default.wsdl --\n<wsdl/>\n",
    "-- key/wstest-xsd-default.xsd --\n<xsd/>\n",
    "-- key/wstest-cpp-installdir/WsTest.hpp --\nclass WsTest;\n",
    "-- key/wstest-cpp-installdir/sub/impl.cpp --\nint sub;\n",
    "-- key/ecl-stdout-single/from-stdout.ecl --\nexport WsTest := MODULE;\n",
    "-- key/ecl-incl/ws_test.ecl --\nexport WsTest := MODULE;\n",
);

/// Directory holding the stand-in executables
fn bin_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("esdl-stand-ins");
        std::fs::create_dir_all(&dir).unwrap();
        let scripts = [
            ("esdl-good", GOOD),
            ("esdl-failing", FAILING),
            ("esdl-silent", SILENT),
            ("esdl-latin1", LATIN1),
        ];
        for (name, body) in scripts {
            let path = dir.join(name);
            std::fs::write(&path, body).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        dir
    })
}

fn runner(root: &Path, exe: &str) -> TestRunner {
    let mut settings = RunSettings::new(root);
    settings.exe_path = bin_dir().join(exe);
    settings.output_base = root.join("output");
    settings.xsl_base = root.join("xsl");
    TestRunner::new(RunConfig::new(settings))
}

fn by_name(name: &str, settings: &RunSettings) -> TestCase {
    default_cases(settings)
        .into_iter()
        .find(|c| c.name == name)
        .unwrap()
}

#[test]
fn generated_output_matching_keys_passes() {
    let fx = common::materialize(KEYS);
    let runner = runner(fx.dir.path(), "esdl-good");
    let settings = &runner.config().settings;
    let cases: Vec<TestCase> = [
        "wstest-wsdl-default",
        "wstest-xsd-default",
        "wstest-cpp-installdir",
        "ecl-stdout-single",
        "ecl-stdout-expanded-err",
        "ecl-incl",
    ]
    .iter()
    .map(|n| by_name(n, settings))
    .collect();

    let result = runner.run_all(&cases).unwrap();
    for case in &result.cases {
        assert!(case.passed(), "{}: {:?}", case.name, case.verdict);
    }
    assert_eq!(result.stats.success_count, 6);
    assert!(result.all_passed());
    assert_eq!(
        std::fs::read_to_string(fx.path("output/ecl-stdout-single/from-stdout.ecl")).unwrap(),
        "export WsTest := MODULE;\n"
    );
}

#[test]
fn changed_output_is_a_mismatch() {
    let fx = common::materialize(concat!(
        "-- key/wstest-cpp-installdir/WsTest.hpp --\nclass WsTest;\n",
        "-- key/wstest-cpp-installdir/sub/impl.cpp --\nint old;\n",
        "-- key/wstest-cpp-installdir/extra.hpp --\n\n",
    ));
    let runner = runner(fx.dir.path(), "esdl-good");
    let case = TestCase::code("wstest-cpp-installdir", Command::Cpp, "ws_test.ecm", "WsTest");

    let outcome = runner.run_one(&case).unwrap();
    let Verdict::Fail(Failure::Mismatch(Comparison::Unequal(found))) = outcome.verdict else {
        panic!("expected mismatch, got {:?}", outcome.verdict);
    };
    assert_eq!(found.differing.iter().collect::<Vec<_>>(), vec![Path::new("sub/impl.cpp")]);
    assert_eq!(found.left_only.iter().collect::<Vec<_>>(), vec![Path::new("extra.hpp")]);
}

#[test]
fn generator_error_fails_case() {
    let fx = common::materialize(KEYS);
    let runner = runner(fx.dir.path(), "esdl-failing");
    let case = by_name("wstest-wsdl-default", &runner.config().settings);

    let outcome = runner.run_one(&case).unwrap();
    assert_eq!(
        outcome.verdict,
        Verdict::Fail(Failure::Generator {
            exit_code: Some(2),
            stderr: "cannot parse input\n".into(),
        })
    );
}

#[test]
fn expected_stderr_must_match_exactly() {
    let fx = common::materialize(KEYS);
    let runner = runner(fx.dir.path(), "esdl-failing");
    let case = TestCase::transform("ecl-stdout-expanded-err", Command::Ecl, "ws_test.ecm", true)
        .expecting_stderr(ERR_MULTI_FILE_EXPANDED);

    let outcome = runner.run_one(&case).unwrap();
    assert!(matches!(outcome.verdict, Verdict::Fail(Failure::Generator { .. })));
}

#[test]
fn empty_stdout_fails_transform() {
    let fx = common::materialize(KEYS);
    let runner = runner(fx.dir.path(), "esdl-silent");
    let case = by_name("ecl-stdout-single", &runner.config().settings);

    let outcome = runner.run_one(&case).unwrap();
    assert_eq!(outcome.verdict, Verdict::Fail(Failure::MissingStdout));
}

#[test]
fn missing_key_and_missing_output_fail() {
    let fx = common::materialize("-- key/wstest-cpp-installdir/WsTest.hpp --\nclass WsTest;\n");
    let runner = runner(fx.dir.path(), "esdl-silent");
    let settings = &runner.config().settings;

    let no_key = by_name("wstest-wsdl-noarrayof", settings);
    let outcome = runner.run_one(&no_key).unwrap();
    assert_eq!(
        outcome.verdict,
        Verdict::Fail(Failure::MissingKey(fx.path("key/wstest-wsdl-noarrayof.wsdl")))
    );

    let no_output = by_name("wstest-cpp-installdir", settings);
    let outcome = runner.run_one(&no_output).unwrap();
    assert_eq!(
        outcome.verdict,
        Verdict::Fail(Failure::MissingOutput(fx.path("output/wstest-cpp-installdir/source")))
    );
}

#[test]
fn full_suite_tallies_every_selected_case() {
    let fx = common::materialize(KEYS);
    let mut runner_config = runner(fx.dir.path(), "esdl-good").config().clone();
    runner_config.commands = vec![esdlcmd_test::CommandFilter::Only(Command::Xsd)];
    let runner = TestRunner::new(runner_config);

    let cases = default_cases(&runner.config().settings);
    let result = runner.run_all(&cases).unwrap();
    // 10 ws_test variants and 4 exception cases; only the default variant has a key.
    assert_eq!(result.cases.len(), 14);
    assert_eq!(result.stats.success_count, 1);
    assert_eq!(result.stats.failure_count, 13);
}

#[test]
fn non_utf8_stdout_is_compared_as_raw_bytes() {
    let fx = common::materialize("-- inputs/ws_test.ecm --\nESPservice WsTest {};\n");
    std::fs::create_dir_all(fx.path("key/ecl-stdout-single")).unwrap();
    std::fs::write(fx.path("key/ecl-stdout-single/from-stdout.ecl"), b"caf\xe9\n").unwrap();
    let runner = runner(fx.dir.path(), "esdl-latin1");
    let case = by_name("ecl-stdout-single", &runner.config().settings);

    let outcome = runner.run_one(&case).unwrap();
    assert_eq!(outcome.verdict, Verdict::Pass);
    assert_eq!(
        std::fs::read(fx.path("output/ecl-stdout-single/from-stdout.ecl")).unwrap(),
        b"caf\xe9\n"
    );
}

#[test]
fn stale_output_from_earlier_run_is_discarded() {
    let fx = common::materialize(concat!(
        "-- key/wstest-wsdl-default.wsdl --\n<wsdl/>\n",
        "-- output/wstest-wsdl-default/wstest.wsdl --\n<wsdl/>\n",
    ));
    let runner = runner(fx.dir.path(), "esdl-silent");
    let case = by_name("wstest-wsdl-default", &runner.config().settings);

    let outcome = runner.run_one(&case).unwrap();
    assert_eq!(
        outcome.verdict,
        Verdict::Fail(Failure::MissingOutput(fx.path("output/wstest-wsdl-default/wstest.wsdl")))
    );
    assert!(fx.path("output/wstest-wsdl-default").is_dir());
}
