use assert_cmd::Command;
use predicates::prelude::*;

fn bin() -> Command {
    Command::cargo_bin("expense-tracker").unwrap()
}

#[test]
fn setup_loads_and_previews() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("expenses.db");

    bin()
        .args(["setup", "--months", "2", "--seed", "7", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully loaded"))
        .stdout(predicate::str::contains("Verifying data in the database (first 5 rows)"));

    assert!(db.exists());

    bin()
        .args(["status", "--db"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("Records:"))
        .stdout(predicate::str::contains("2024-01-"));
}

#[test]
fn status_reports_missing_store() {
    let dir = tempfile::tempdir().unwrap();
    bin()
        .args(["status", "--db"])
        .arg(dir.path().join("absent.db"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Database not found"));
    assert!(!dir.path().join("absent.db").exists());
}

#[test]
fn export_writes_csv() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("batch.csv");

    bin()
        .args(["export", "--months", "1", "--seed", "1", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Data saved to"));

    let content = std::fs::read_to_string(&out).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Category,Payment_Mode,Description,Amount_Paid,Cashback")
    );
    assert!(lines.all(|l| l.starts_with("2024-01-")));
}

#[test]
fn setup_rejects_impossible_year() {
    let dir = tempfile::tempdir().unwrap();
    bin()
        .args(["setup", "--start-year", "999999", "--db"])
        .arg(dir.path().join("expenses.db"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn setup_rejects_oversized_window() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("expenses.db");
    bin()
        .args(["setup", "--months", "1000000", "--db"])
        .arg(&db)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1000000"));
    assert!(!db.exists());
}
