use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::{contains, is_empty};
use tempfile::NamedTempFile;

// `tablet-shell` with no input exits cleanly
#[test]
fn shell_empty_input() {
    Command::cargo_bin("tablet-shell")
        .unwrap()
        .write_stdin("")
        .assert()
        .success();
}

#[test]
fn shell_put_get_del() {
    Command::cargo_bin("tablet-shell")
        .unwrap()
        .write_stdin("PUT user1 name Alice\nGET user1 name\nDEL user1 name\nGET user1 name\nEXIT\n")
        .assert()
        .success()
        .stdout(contains("+250 OK Alice"))
        .stdout(contains("-550 Resource Does Not Exist"))
        .stdout(contains("+950 GOODBYE"));
}

#[test]
fn shell_sharded_engine() {
    Command::cargo_bin("tablet-shell")
        .unwrap()
        .args(&["--engine", "sharded"])
        .write_stdin("PUT r c hello world\nGET r c\n")
        .assert()
        .success()
        .stdout(contains("+250 OK hello world"));
}

#[test]
fn shell_prints_usage_on_bad_input() {
    Command::cargo_bin("tablet-shell")
        .unwrap()
        .write_stdin("PUT onlyrow\nEXIT\n")
        .assert()
        .success()
        .stdout(contains("-550 Parser Failure"))
        .stderr(contains("GET <row> <col>"));
}

#[test]
fn shell_stops_at_exit() {
    Command::cargo_bin("tablet-shell")
        .unwrap()
        .write_stdin("EXIT\nPUT r c v\nGET r c\n")
        .assert()
        .success()
        .stdout(contains("+950 GOODBYE"))
        .stdout(contains("+250 OK").not());
}

#[test]
fn shell_rejects_unknown_engine() {
    Command::cargo_bin("tablet-shell")
        .unwrap()
        .args(&["--engine", "sled"])
        .assert()
        .failure();
}

// `tablet-client` with no args should exit with a non-zero code.
#[test]
fn client_no_args() {
    Command::cargo_bin("tablet-client").unwrap().assert().failure();
}

#[test]
fn client_invalid_get() {
    Command::cargo_bin("tablet-client")
        .unwrap()
        .args(&["get"])
        .assert()
        .failure();

    Command::cargo_bin("tablet-client")
        .unwrap()
        .args(&["get", "row", "col", "extra"])
        .assert()
        .failure();

    Command::cargo_bin("tablet-client")
        .unwrap()
        .args(&["get", "row", "col", "--coordinator", "invalid-addr"])
        .assert()
        .failure()
        .stderr(contains("could not parse"));
}

#[test]
fn client_invalid_put() {
    Command::cargo_bin("tablet-client")
        .unwrap()
        .args(&["put", "row", "col"])
        .assert()
        .failure();

    Command::cargo_bin("tablet-client")
        .unwrap()
        .args(&["put", "two words", "col", "value"])
        .assert()
        .failure()
        .stdout(is_empty());
}

#[test]
fn client_conflicting_targets() {
    Command::cargo_bin("tablet-client")
        .unwrap()
        .args(&[
            "get",
            "row",
            "col",
            "--coordinator",
            "127.0.0.1:5000",
            "--server",
            "127.0.0.1:5001",
        ])
        .assert()
        .failure();
}

#[test]
fn client_lookup_needs_the_coordinator() {
    Command::cargo_bin("tablet-client")
        .unwrap()
        .args(&["lookup", "row", "--server", "127.0.0.1:5001"])
        .assert()
        .failure()
        .stderr(contains("coordinator"));
}

#[test]
fn coordinator_requires_config() {
    Command::cargo_bin("coordinator").unwrap().assert().failure();
}

#[test]
fn coordinator_rejects_bad_config() {
    let mut file = NamedTempFile::new().expect("unable to create temporary file");
    writeln!(file, "127.0.0.1:5000").unwrap();
    writeln!(file, "not-an-address").unwrap();

    Command::cargo_bin("coordinator")
        .unwrap()
        .args(&["--config"])
        .arg(file.path())
        .assert()
        .failure()
        .stderr(contains("line 2"));
}

#[test]
fn coordinator_rejects_more_groups_than_servers() {
    let mut file = NamedTempFile::new().expect("unable to create temporary file");
    writeln!(file, "127.0.0.1:0").unwrap();
    writeln!(file, "127.0.0.1:5001").unwrap();

    Command::cargo_bin("coordinator")
        .unwrap()
        .args(&["--groups", "2", "--config"])
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn server_invalid_options() {
    Command::cargo_bin("tablet-server")
        .unwrap()
        .args(&["--engine", "unknown"])
        .assert()
        .failure();

    Command::cargo_bin("tablet-server")
        .unwrap()
        .args(&["--addr", "127.0.0.1"])
        .assert()
        .failure();

    Command::cargo_bin("tablet-server")
        .unwrap()
        .args(&["--pool", "shared", "--threads", "0", "--addr", "127.0.0.1:0"])
        .assert()
        .failure();
}
