mod common;

use assert_cmd::Command;
use assert_fs::{prelude::*, TempDir};
use finledger_storage_json::JsonLedgerStore;
use predicates::prelude::*;
use predicates::str::contains;
use regex::Regex;

use common::seed_march_2024;

fn cli(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("finledger_cli").expect("binary");
    cmd.env("FINLEDGER_HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("FINLEDGER_OWNER")
        .env_remove("FINLEDGER_DATA");
    cmd
}

#[test]
fn script_closes_a_period_once() {
    let home = TempDir::new().expect("temp dir");
    let data = home.child("ledger.json");
    let seeded = {
        let store = JsonLedgerStore::open(data.path()).expect("open");
        seed_march_2024(&store)
    };

    cli(&home)
        .env("FINLEDGER_DATA", data.path())
        .env("FINLEDGER_OWNER", seeded.owner.to_string())
        .write_stdin("close 3 2024\nclose 3 2024\nbogus\nsummaries\nexit\nproject\n")
        .assert()
        .success()
        .stdout(contains("[✓] Closed March 2024 with balance 220.00 USD."))
        .stdout(contains("Generated 1 recurring entries"))
        .stdout(contains("already closed"))
        .stdout(contains("Unknown command `bogus`"))
        .stdout(contains("2024-03"))
        .stdout(contains("Projection").not());

    data.assert(predicate::path::exists());
    let reopened = JsonLedgerStore::open(data.path()).expect("reopen");
    assert_eq!(reopened.snapshot().monthly_summaries.len(), 1);
}

#[test]
fn contributions_and_bad_arguments_are_reported() {
    let home = TempDir::new().expect("temp dir");
    let data = home.child("ledger.json");
    let seeded = {
        let store = JsonLedgerStore::open(data.path()).expect("open");
        seed_march_2024(&store)
    };
    let script = format!(
        "contribute {} 70\ncontribute not-a-goal 10\nclose march 2024\n",
        seeded.goal_id
    );

    cli(&home)
        .env("FINLEDGER_DATA", data.path())
        .env("FINLEDGER_OWNER", seeded.owner.to_string())
        .write_stdin(script)
        .assert()
        .success()
        .stdout(contains("Now 100.00 USD of 500.00 USD."))
        .stdout(contains("`not-a-goal` is not a goal id."))
        .stdout(contains("`march` is not a month."));

    let reopened = JsonLedgerStore::open(data.path()).expect("reopen");
    assert_eq!(reopened.contributions(seeded.goal_id).len(), 2);
}

#[test]
fn missing_owner_asks_to_sign_in() {
    let home = TempDir::new().expect("temp dir");
    let data = home.child("ledger.json");

    cli(&home)
        .env("FINLEDGER_DATA", data.path())
        .write_stdin("status\noverview\n")
        .assert()
        .success()
        .stdout(contains("[x] Please sign in to continue."));
}

#[test]
fn invalid_owner_aborts_with_an_error() {
    let home = TempDir::new().expect("temp dir");

    cli(&home)
        .env("FINLEDGER_DATA", home.child("ledger.json").path())
        .env("FINLEDGER_OWNER", "nobody")
        .write_stdin("status\n")
        .assert()
        .failure()
        .stderr(contains("FINLEDGER_OWNER is not a valid UUID"));
}

#[test]
fn version_and_help_are_available() {
    let home = TempDir::new().expect("temp dir");

    let output = cli(&home)
        .env("FINLEDGER_DATA", home.child("ledger.json").path())
        .write_stdin("version\nhelp\nhelp close\n")
        .output()
        .expect("run cli");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8 output");
    let version = Regex::new(r"finledger (\d+\.\d+\.\d+)").expect("regex");
    let captures = version.captures(&stdout).expect("version line");
    assert_eq!(&captures[1], env!("CARGO_PKG_VERSION"));
    assert!(stdout.contains("close <month> <year>"));
    assert!(stdout.contains("materialize <month> <year>"));
}
