use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const SAMPLE: &str = "\
Family ID,Member ID,Category,Amount,Transaction Date,Income,Savings,Monthly Expenses,Loan Payments,Credit Card Spending
1,11,Food,10,15-01-2025,1000,200,300,100,50
1,12,Travel,15,16-01-2025,1000,200,300,100,50
2,21,Rent,50,17-01-2025,2000,100,300,100,50
";

fn hearth(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hearth").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn init(home: &Path) -> std::path::PathBuf {
    let data = home.join("data");
    hearth(home)
        .args(["init", "--data-dir"])
        .arg(&data)
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized hearth"));
    data
}

#[test]
fn upload_prints_every_chart() {
    let home = tempfile::tempdir().unwrap();
    let data = init(home.path());
    let file = home.path().join("sample.csv");
    std::fs::write(&file, SAMPLE).unwrap();

    hearth(home.path())
        .arg("upload")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("3 rows scored"))
        .stdout(predicate::str::contains("Spending Distribution by Category"))
        .stdout(predicate::str::contains("Family Financial Scores"))
        .stdout(predicate::str::contains("Member Spending Trends"))
        .stdout(predicate::str::contains("Income vs Savings"));

    let stored: Vec<_> = std::fs::read_dir(data.join("uploads")).unwrap().collect();
    assert_eq!(stored.len(), 1);
}

#[test]
fn report_uses_latest_upload() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());

    hearth(home.path())
        .args(["report", "family"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No uploads yet"));

    let file = home.path().join("sample.csv");
    std::fs::write(&file, SAMPLE).unwrap();
    hearth(home.path()).arg("upload").arg(&file).assert().success();

    hearth(home.path())
        .args(["report", "category"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rent"))
        .stdout(predicate::str::contains("Family Financial Scores").not());
}

#[test]
fn missing_date_column_fails_to_load() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    let file = home.path().join("nodate.csv");
    std::fs::write(&file, "Family ID,Amount\n1,10\n").unwrap();

    hearth(home.path())
        .arg("upload")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Error loading and preprocessing data",
        ));
}

#[test]
fn unsupported_media_type_is_rejected() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    let file = home.path().join("notes.txt");
    std::fs::write(&file, "hello").unwrap();

    hearth(home.path())
        .arg("upload")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Upload rejected"));
}

#[test]
fn export_writes_chart_json() {
    let home = tempfile::tempdir().unwrap();
    init(home.path());
    let file = home.path().join("sample.csv");
    std::fs::write(&file, SAMPLE).unwrap();
    let out = home.path().join("charts.json");
    let scored = home.path().join("scored.csv");

    hearth(home.path())
        .arg("export")
        .arg(&file)
        .arg("--output")
        .arg(&out)
        .arg("--scored-csv")
        .arg(&scored)
        .assert()
        .success();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["family"]["title"], "Family Financial Scores");
    assert_eq!(json["scatter"]["points"].as_array().unwrap().len(), 3);

    let csv = std::fs::read_to_string(&scored).unwrap();
    assert!(csv.lines().next().unwrap().ends_with("Financial Score"));
}
