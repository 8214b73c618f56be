//! Shared E2E test helpers for `shellbus` binary tests.

use assert_cmd::cargo::cargo_bin_cmd;
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Variables that would leak the developer's setup into a test run.
const SHELLBUS_VARS: &[&str] = &[
    "SHELLBUS_DEBUG",
    "SHELLBUS_REQUEST_TIMEOUT_MS",
    "SHELLBUS_CATCH_PANICS",
    "SHELLBUS_LOG_LEVEL",
    "SHELLBUS_LOG_FILE",
    "RUST_LOG",
];

/// Build a Command for the `shellbus` binary rooted in a fresh project dir.
///
/// Returns the command and the temp dir guard; keep the guard alive while the test runs.
pub fn shellbus_cmd() -> (assert_cmd::Command, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("create temp project dir");
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("shellbus");
    cmd.timeout(TIMEOUT_BASIC);
    for var in SHELLBUS_VARS {
        cmd.env_remove(var);
    }
    cmd.args(["-C", tmp.path().to_str().expect("valid utf8")]);
    (cmd, tmp)
}
