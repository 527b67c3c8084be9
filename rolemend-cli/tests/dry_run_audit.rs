//! Binary-level tests: dry-run purity, live application, env overrides,
//! and the exit-0 policy on connection failure.

use assert_cmd::Command;
use chrono::Utc;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use rolemend_store::{collections, document::ID_FIELD, fields, DocumentStore, JsonDocumentStore};

struct Fixture {
    dir: TempDir,
    config_path: std::path::PathBuf,
    doc_path: std::path::PathBuf,
    db_path: std::path::PathBuf,
}

/// Stores plus config file in a temp dir: team t1 created by u1, members
/// u1 (holding only `member`) and u2 (holding `admin` and `member`).
fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let doc_path = dir.path().join("documents.json");
    let db_path = dir.path().join("role_sync.db");
    let config_path = dir.path().join("config.yaml");

    std::fs::write(
        &config_path,
        format!(
            "document_store: {}\nrelational_store: {}\n",
            doc_path.display(),
            db_path.display()
        ),
    )
    .unwrap();

    let mut docs = JsonDocumentStore::open(&doc_path).unwrap();
    docs.insert_one(
        collections::TEAMS,
        fields([(ID_FIELD, json!("t1")), ("created_by", json!("u1"))]),
    )
    .unwrap();
    for user in ["u1", "u2"] {
        docs.insert_one(
            collections::MEMBERSHIPS,
            fields([("user_id", json!(user)), ("team_id", json!("t1"))]),
        )
        .unwrap();
    }
    for (id, user, role) in [("r1", "u1", "member"), ("r2", "u2", "admin"), ("r3", "u2", "member")]
    {
        docs.insert_one(
            collections::USER_ROLES,
            fields([
                (ID_FIELD, json!(id)),
                ("user_id", json!(user)),
                ("team_id", json!("t1")),
                ("role_name", json!(role)),
                ("scope", json!("TEAM")),
                ("is_active", json!(true)),
                ("created_by", json!("seed")),
                ("created_at", json!(Utc::now())),
            ]),
        )
        .unwrap();
    }

    Fixture {
        dir,
        config_path,
        doc_path,
        db_path,
    }
}

fn rolemend() -> Command {
    Command::cargo_bin("rolemend").expect("binary built")
}

#[test]
fn dry_run_reports_counts_and_writes_nothing() {
    let fx = fixture();
    let before = std::fs::read_to_string(&fx.doc_path).unwrap();

    rolemend()
        .arg("--dry-run")
        .arg("--config")
        .arg(&fx.config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("dry-run"))
        .stdout(predicate::str::contains("reconciliation summary"));

    assert_eq!(
        std::fs::read_to_string(&fx.doc_path).unwrap(),
        before,
        "dry-run must not modify the document store"
    );
    assert_eq!(
        sqlite_row_count(&fx.db_path),
        0,
        "dry-run must not insert relational rows"
    );
}

fn sqlite_row_count(path: &std::path::Path) -> u64 {
    let store = rolemend_store::SqliteRoleStore::open(path).unwrap();
    store.all_rows().unwrap().len() as u64
}

#[test]
fn dry_run_json_report_matches_expected_counts() {
    let fx = fixture();

    let output = rolemend()
        .arg("--dry-run")
        .arg("--json")
        .arg("--config")
        .arg(&fx.config_path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    // The report JSON is the last thing printed; find its opening brace.
    let json_start = stdout.find('{').expect("JSON report in stdout");
    let report: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();

    assert_eq!(report["dry_run"], true);
    assert_eq!(report["created"], 2, "u1 gains owner and admin");
    assert_eq!(report["deleted"], 1, "u2 loses admin");
    assert_eq!(report["skipped"], 1, "u2's member role already correct");
    assert_eq!(report["errors"], 0);
}

#[test]
fn live_run_requires_confirmation_and_applies_fixes() {
    let fx = fixture();

    rolemend()
        .arg("--config")
        .arg(&fx.config_path)
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("live mode"))
        .stdout(predicate::str::contains("Press ENTER to continue"));

    let store = rolemend_store::SqliteRoleStore::open(&fx.db_path).unwrap();
    let rows = store.all_rows().unwrap();
    assert_eq!(rows.len(), 2, "u1's owner and admin rows are mirrored");
}

#[test]
fn live_run_without_stdin_aborts_before_mutating() {
    let fx = fixture();
    let before = std::fs::read_to_string(&fx.doc_path).unwrap();

    rolemend()
        .arg("--config")
        .arg(&fx.config_path)
        .assert()
        .failure();

    assert_eq!(std::fs::read_to_string(&fx.doc_path).unwrap(), before);
}

#[test]
fn env_overrides_replace_the_config_file() {
    let fx = fixture();

    rolemend()
        .arg("--dry-run")
        // Point --config at a file that does not exist; the environment
        // supplies both store locations.
        .arg("--config")
        .arg(fx.dir.path().join("absent.yaml"))
        .env("ROLEMEND_DOC_STORE", &fx.doc_path)
        .env("ROLEMEND_DB", &fx.db_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("reconciliation summary"));
}

#[test]
fn connection_failure_prints_critical_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    // The document store path is a directory, which cannot be read as a
    // store file.
    std::fs::write(
        &config_path,
        format!(
            "document_store: {}\nrelational_store: {}\n",
            dir.path().display(),
            dir.path().join("role_sync.db").display()
        ),
    )
    .unwrap();

    rolemend()
        .arg("--dry-run")
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("critical:"))
        .stdout(predicate::str::contains("reconciliation summary"));
}

#[test]
fn missing_configuration_is_critical_but_still_summarizes() {
    let dir = TempDir::new().unwrap();

    rolemend()
        .arg("--dry-run")
        .arg("--config")
        .arg(dir.path().join("absent.yaml"))
        .env_remove("ROLEMEND_DOC_STORE")
        .env_remove("ROLEMEND_DB")
        .assert()
        .success()
        .stderr(predicate::str::contains("critical:"));
}
