//! E2E integration tests for the `shellbus` binary.
//!
//! Tests the stdin/stdout interface by spawning real subprocesses.
//! Surface output (`[surface-N] ...`) is printed by the surface listeners.

mod common;

use common::shellbus_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

// ─── Startup / Shutdown ────────────────────────────────────────────

#[test]
fn quit_immediately() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("q\n")
        .assert()
        .success()
        .stdout(contains("shellbus v"))
        .stdout(contains("opened surface-1"))
        .stdout(contains("opened surface-2"))
        .stdout(contains("bye"));
}

#[test]
fn empty_stdin_exits_gracefully() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("").assert().success();
}

#[test]
fn surfaces_flag_sets_initial_count() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.args(["--surfaces", "3"])
        .write_stdin("surfaces\nq\n")
        .assert()
        .success()
        .stdout(contains("3  surface-3@"));
}

#[test]
fn project_config_sets_initial_count() {
    let (mut cmd, guard) = shellbus_cmd();
    let dir = guard.path().join(".shellbus");
    std::fs::create_dir_all(&dir).expect("create config dir");
    std::fs::write(dir.join("config.toml"), "[surfaces]\ninitial = 0\n").expect("write config");

    cmd.write_stdin("surfaces\nq\n")
        .assert()
        .success()
        .stdout(contains("no open surfaces"));
}

// ─── Host dispatch ─────────────────────────────────────────────────

#[test]
fn host_dispatch_fans_out_with_reply() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("dispatch ipc-ping 5\nq\n")
        .assert()
        .success()
        .stdout(contains("dispatched ipc-ping: 1 ok, 0 failed, 2 surface(s)"))
        .stdout(contains("[surface-1] ipc-ping 5"))
        .stdout(contains("[surface-2] ipc-ping 5"))
        .stdout(contains(r#"[surface-2] ipc-ping-reply {"pong":5}"#));
}

#[test]
fn failing_service_is_isolated() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("dispatch ipc-fail\nq\n")
        .assert()
        .success()
        .stdout(contains("dispatched ipc-fail: 0 ok, 1 failed"))
        .stdout(contains("bye"));
}

// ─── Surface commands ──────────────────────────────────────────────

#[test]
fn echo_reaches_other_surfaces() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("echo 1 ipc-ping 7\nq\n")
        .assert()
        .success()
        .stdout(contains("[surface-1] echo env:"))
        .stdout(contains("[surface-2] ipc-ping 7"))
        .stdout(contains(r#"[surface-1] ipc-ping-reply {"pong":7}"#));
}

#[test]
fn post_reaches_host_service() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("post 2 ipc-ping \"hi\"\nq\n")
        .assert()
        .success()
        .stdout(contains("[surface-2] posted on ipc-ping"))
        .stdout(contains(r#"[surface-1] ipc-ping-reply {"pong":"hi"}"#));
}

#[test]
fn invoke_returns_host_answer() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("invoke 1 ipc-ping 3\nq\n")
        .assert()
        .success()
        .stdout(contains("[surface-1] response 3"));
}

#[test]
fn invoke_failures_carry_error_codes() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("invoke 1 ipc-fail\ninvoke 1 ipc-nobody\nq\n")
        .assert()
        .success()
        .stdout(contains("error [BUS_REMOTE_FAILURE]"))
        .stdout(contains("ipc-fail always fails"))
        .stdout(contains("error [BUS_EMPTY_RESPONSE]"));
}

#[test]
fn close_and_reopen_surfaces() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("close 1\nopen\nsurfaces\ndispatch ipc-ping 1\nq\n")
        .assert()
        .success()
        .stdout(contains("closed surface-1"))
        .stdout(contains("opened surface-3"))
        .stdout(contains("[surface-3] ipc-ping 1"))
        .stdout(contains("[surface-1] ipc-ping 1").not());
}

// ─── Input errors ──────────────────────────────────────────────────

#[test]
fn bad_commands_do_not_stop_the_shell() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.write_stdin("launch\nclose 9\necho 9 ipc-ping\ndispatch\nq\n")
        .assert()
        .success()
        .stdout(contains("error: unknown command: launch"))
        .stdout(contains("error: no surface 9"))
        .stdout(contains("error: missing channel"))
        .stdout(contains("bye"));
}

#[test]
fn debug_flag_enables_logs() {
    let (mut cmd, _guard) = shellbus_cmd();
    cmd.arg("-d")
        .write_stdin("dispatch ipc-ping 1\nq\n")
        .assert()
        .success()
        .stdout(contains("surface opened"))
        .stdout(contains("dispatch"));
}

#[test]
fn log_file_receives_output() {
    let (mut cmd, guard) = shellbus_cmd();
    let log = guard.path().join("logs").join("shellbus.log");
    cmd.args(["--log-file", log.to_str().expect("valid utf8")])
        .write_stdin("dispatch ipc-fail\nq\n")
        .assert()
        .success();

    let content = std::fs::read_to_string(&log).expect("log file written");
    assert!(content.contains("listener failed"));
    assert!(!content.contains('\u{1b}'), "file log must be ANSI-free");
}
