//! The esdlcmd regression suite
//!
//! Inputs are the `.ecm` files under `<testroot>/inputs/`; every case has a
//! key of the same name under `<testroot>/key/`.

use crate::case::{Command, TestCase};
use crate::runner::RunSettings;

/// stderr of `esdl ecl` when `--includes` would write several files to stdout
pub const ERR_MULTI_FILE_INCLUDES: &str = "\nOutput to stdout is not supported for multiple files. Either add the Rollup\noption or specify an output directory.\n";

/// stderr of `esdl ecl` when `-x` would write several files to stdout
pub const ERR_MULTI_FILE_EXPANDED: &str = "\nOutput to stdout is not supported for multiple files. Remove the Output expanded\n XML option or specify an output directory.\n";

/// Option sets shared by the wsdl and xsd variants of `ws_test.ecm`
const SCHEMA_VARIANTS: &[(&str, &[&str])] = &[
    ("default", &[]),
    ("noarrayof", &["--no-arrayof"]),
    ("iv1", &["-iv", "1"]),
    ("iv2", &["-iv", "2"]),
    ("iv3", &["-iv", "3"]),
    ("uvns", &["-iv", "3", "-uvns"]),
    ("allannot", &["--annotate", "all"]),
    // -iv 1 keeps the output small
    ("noannot", &["-iv", "1", "--annotate", "none"]),
    ("opt", &["-iv", "1", "-opt", "developer"]),
    // TODO: add "noopt" (-iv 1 --noopt) once esdl implements --noopt fully
    ("tns", &["-iv", "1", "-tns", "urn:passed:name:space"]),
];

/// The full case table, in run order
pub fn default_cases(settings: &RunSettings) -> Vec<TestCase> {
    let includes = settings.test_root.join("inputs").to_string_lossy().into_owned();
    let mut cases = Vec::new();

    for command in [Command::Wsdl, Command::Xsd] {
        for (variant, options) in SCHEMA_VARIANTS {
            let name = format!("wstest-{}-{}", command, variant);
            cases.push(
                TestCase::schema(&name, command, "ws_test.ecm", "WsTest")
                    .with_options(options.iter().copied()),
            );
        }
    }

    cases.push(TestCase::code("wstest-cpp-installdir", Command::Cpp, "ws_test.ecm", "WsTest"));

    // exceptions_inline output
    for command in [Command::Wsdl, Command::Xsd] {
        for n in 1..=3 {
            cases.push(TestCase::schema(
                &format!("wsexctest{}-{}-default", n, command),
                command,
                &format!("ws_exc_test_{}.ecm", n),
                &format!("WsExcTest{}", n),
            ));
        }
        cases.push(
            TestCase::schema(
                &format!("wsexctest3-{}-no-exc", command),
                command,
                "ws_exc_test_3.ecm",
                "WsExcTest3",
            )
            .with_options(["--no-exceptions-inline"]),
        );
    }

    // One request element per method sharing a request structure
    // (use_method_name on the EsdlService).
    cases.push(TestCase::schema("use-method-name", Command::Wsdl, "ws_usemethodname.ecm", "WsUseMethodName"));
    // One element per request structure, the default.
    cases.push(TestCase::schema("use-request-name", Command::Wsdl, "ws_userequestname.ecm", "WsUseRequestName"));

    cases.push(TestCase::transform("ecl-stdout-single", Command::Ecl, "ws_test.ecm", true));
    cases.push(
        TestCase::transform("ecl-stdout-incl-err", Command::Ecl, "ws_test.ecm", true)
            .expecting_stderr(ERR_MULTI_FILE_INCLUDES)
            .with_options(["-I", includes.as_str(), "--includes"]),
    );
    cases.push(
        TestCase::transform("ecl-stdout-expanded-err", Command::Ecl, "ws_test.ecm", true)
            .expecting_stderr(ERR_MULTI_FILE_EXPANDED)
            .with_options(["-x"]),
    );
    cases.push(
        TestCase::transform("ecl-stdout-incl-rollup", Command::Ecl, "ws_test.ecm", true)
            .with_options(["-I", includes.as_str(), "--includes", "--rollup"]),
    );
    cases.push(
        TestCase::transform("ecl-incl", Command::Ecl, "ws_test.ecm", false)
            .with_options(["-I", includes.as_str(), "--includes"]),
    );

    cases
}
