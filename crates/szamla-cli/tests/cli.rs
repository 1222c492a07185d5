//! End-to-end CLI checks.

use assert_cmd::Command;
use predicates::prelude::*;

const MVM_TEXT: &str = "\
Szolgáltató neve: MVM Next Energiakereskedelmi Zrt.
Számla sorszáma: 845602160521
Fizetendő összeg: 6.364 Ft
Fizetési határidő: 2025.05.05
";

#[test]
fn extract_reports_bill_fields_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("szamla.txt");
    std::fs::write(&input, MVM_TEXT).unwrap();

    Command::cargo_bin("szamla")
        .unwrap()
        .args(["extract", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"))
        .stdout(predicate::str::contains("845602160521"))
        .stdout(predicate::str::contains("2025-05-05"));
}

#[test]
fn extract_fails_on_missing_file() {
    Command::cargo_bin("szamla")
        .unwrap()
        .args(["extract", "/nonexistent/input.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn patterns_list_shows_builtin_presets() {
    Command::cargo_bin("szamla")
        .unwrap()
        .args(["patterns", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hu-mvm"))
        .stdout(predicate::str::contains("amount"));
}

#[test]
fn patterns_validate_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("bad.json");
    std::fs::write(&file, "{not json").unwrap();

    Command::cargo_bin("szamla")
        .unwrap()
        .args(["patterns", "validate", file.to_str().unwrap()])
        .assert()
        .failure();
}
