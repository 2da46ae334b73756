//! End-to-end tests for the mdbatch binary
//!
//! These run the real executable against files in a temporary directory:
//! - check mode summaries and issue listings
//! - CSV shape errors
//! - prepare output and change detection after recorded write-backs
//! - store maintenance commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CONFIG: &str = r#"
authority_sources: [viaf]
allowed_relators: ["relators:pht", "relators:aut"]
minimum_host_version: "9.1"
fields:
  field_coordinates:
    kind: geolocation
  field_linked_agent:
    kind: typed_relation
    target_type: taxonomy_term
  field_edtf_date:
    kind: edtf
"#;

/// A scratch batch: configuration plus store directory
struct Batch {
    dir: TempDir,
}

impl Batch {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = format!(
            "temp_dir: '{}'\ninput_dir: '{}'\n{CONFIG}",
            dir.path().display(),
            dir.path().display()
        );
        std::fs::write(dir.path().join("batch.yml"), config).unwrap();
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("batch.yml")
    }

    fn csv(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("mdbatch").unwrap();
        cmd.env_remove("MDBATCH_TEMP_DIR")
            .env_remove("MDBATCH_DB_FILENAME")
            .env_remove("MDBATCH_CONFIG")
            .env_remove("MDBATCH_LOG_LEVEL");
        cmd
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("mdbatch.db")
    }

    /// Record the write-back of a prepared row the way the remote client does
    fn write_back(&self, row: &serde_json::Value, remote_id: &str) {
        let mut cmd = self.cmd();
        cmd.args(["store", "map", "--config"])
            .arg(self.config())
            .arg(row["local_id"].as_str().unwrap())
            .arg(remote_id)
            .arg("--fingerprint")
            .arg(row["fingerprint"].as_str().unwrap());
        if let Some(parent_id) = row["parent_id"].as_str() {
            cmd.args(["--parent-id", parent_id]);
        }
        cmd.assert().success();
    }

    fn prepared(&self, input: &Path) -> Vec<serde_json::Value> {
        let assert = self.run("prepare", input).success();
        json_lines(&assert.get_output().stdout)
    }

    fn run(&self, subcommand: &str, input: &Path) -> assert_cmd::assert::Assert {
        self.cmd()
            .arg(subcommand)
            .arg("--config")
            .arg(self.config())
            .arg("--input")
            .arg(input)
            .assert()
    }
}

fn json_lines(output: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

const GOOD_CSV: &str = "id,title,field_coordinates,field_linked_agent,field_edtf_date,parent_id
p1,Postcard,\"49.16667,-123.93333\",relators:pht:5,1950~,
c1,,,,1950-08,p1
";

// ============================================================================
// Usage
// ============================================================================

#[test]
fn test_no_arguments_prints_help() {
    Command::cargo_bin("mdbatch")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ============================================================================
// Check
// ============================================================================

#[test]
fn test_check_valid_input() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", GOOD_CSV);

    batch
        .run("check", &input)
        .success()
        .stdout(predicate::str::contains(
            "OK, all 2 rows in the CSV file have the same number of columns \
             as there are headers (6).",
        ))
        .stdout(predicate::str::contains("Configuration and input data appear to be valid."));
}

#[test]
fn test_check_leaves_no_store_behind() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", GOOD_CSV);

    batch.run("check", &input).success();
    assert!(!batch.store_path().exists());
}

#[test]
fn test_check_lists_every_issue() {
    let batch = Batch::new();
    let input = batch.csv(
        "rows.csv",
        "id,title,field_coordinates,field_linked_agent,field_edtf_date,parent_id
1,One,+43.45-123.17,,,
2,Two,,:pht:5,,
3,Three,,,7/5/51,
c4,Four,,,,p9
",
    );

    batch
        .run("check", &input)
        .failure()
        .code(1)
        .stdout(predicate::str::contains("+43.45-123.17"))
        .stdout(predicate::str::contains("require a vocabulary namespace"))
        .stdout(predicate::str::contains("7/5/51"))
        .stdout(predicate::str::contains("\"c4\" must come after its parent \"p9\""))
        .stdout(predicate::str::contains("appear to be valid").not())
        .stderr(predicate::str::contains("4 problem(s) found"));
}

#[test]
fn test_check_skips_comment_rows() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", "id,title\n1,One\n# 2,Two\n3,Three\n#4,Four\n5,Five\n");

    batch
        .run("check", &input)
        .success()
        .stdout(predicate::str::contains("all 3 rows in the CSV file"));
}

#[test]
fn test_check_reports_column_mismatch() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", "id,title,field_edtf_date\n1,One,1950\n2,Two\n");

    batch.run("check", &input).failure().stderr(predicate::str::contains(
        "Row 2 of your CSV file does not have the same number of columns (2) \
         as there are headers (3).",
    ));
}

#[test]
fn test_check_tab_delimited_input() {
    let batch = Batch::new();
    let input = batch.csv("rows.tsv", "id\ttitle\n1\tOne, with a comma\n");

    batch
        .cmd()
        .args(["check", "--delimiter", "tab", "--config"])
        .arg(batch.config())
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("appear to be valid"));
}

#[test]
fn test_check_missing_id_column() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", "identifier,title\n1,One\n");

    batch
        .run("check", &input)
        .failure()
        .stderr(predicate::str::contains("has no 'id' column"));
}

#[test]
fn test_check_host_version_gate() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", GOOD_CSV);

    let check = |version: &str| {
        batch
            .cmd()
            .arg("check")
            .arg("--config")
            .arg(batch.config())
            .arg("--input")
            .arg(&input)
            .args(["--host-version", version])
            .assert()
    };

    check("8.6.3")
        .failure()
        .stderr(predicate::str::contains("older than the configured minimum 9.1"));
    check("10.0-rc1").success();
}

#[test]
fn test_check_invalid_config() {
    let batch = Batch::new();
    std::fs::write(batch.config(), "subdelimeter: '|'\n").unwrap();
    let input = batch.csv("rows.csv", GOOD_CSV);

    batch.run("check", &input).failure().stderr(predicate::str::contains("subdelimeter"));
}

// ============================================================================
// Prepare
// ============================================================================

#[test]
fn test_prepare_emits_rows_until_written_back() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", GOOD_CSV);

    let rows = batch.prepared(&input);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["local_id"], "p1");
    assert_eq!(rows[0]["fields"]["field_linked_agent"][0]["target_id"], 5);
    assert_eq!(rows[1]["row"]["title"], "Postcard, page 1");
    assert_eq!(rows[1]["parent_id"], "p1");

    // No write-back recorded, so nothing is skipped on the rerun
    assert_eq!(batch.prepared(&input), rows);

    batch.write_back(&rows[0], "node/101");
    let rerun = batch.prepared(&input);
    assert_eq!(rerun.len(), 1);
    assert_eq!(rerun[0]["local_id"], "c1");
    assert_eq!(rerun[0]["parent_remote_id"], "node/101");

    batch.write_back(&rerun[0], "node/102");
    assert!(batch.prepared(&input).is_empty());

    let edited = GOOD_CSV.replace("Postcard", "Postcard of Nanaimo");
    std::fs::write(&input, edited).unwrap();
    assert_eq!(batch.prepared(&input).len(), 2, "child title follows the parent title");
}

#[test]
fn test_prepare_all_includes_unchanged() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", GOOD_CSV);
    for (row, remote_id) in batch.prepared(&input).iter().zip(["node/101", "node/102"]) {
        batch.write_back(row, remote_id);
    }

    let again = batch
        .cmd()
        .args(["prepare", "--all", "--config"])
        .arg(batch.config())
        .arg("--input")
        .arg(&input)
        .assert()
        .success();
    let rows = json_lines(&again.get_output().stdout);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row["unchanged"] == true));
}

#[test]
fn test_prepare_stops_before_writing_anything() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", "id,title,parent_id\np1,One,\nc2p2,Child,p2\np2,Two,\n");

    batch
        .run("prepare", &input)
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"c2p2\" must come after its parent \"p2\""));
}

// ============================================================================
// Store
// ============================================================================

#[test]
fn test_store_mapping_satisfies_parent_order() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", "id,title,parent_id\nc1,Child,p1\n");

    batch.run("check", &input).failure();

    batch
        .cmd()
        .args(["store", "map", "--config"])
        .arg(batch.config())
        .args(["p1", "node/101"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mapped p1 to node/101."));

    batch.run("check", &input).success();

    batch
        .cmd()
        .args(["store", "show", "--config"])
        .arg(batch.config())
        .arg("p1")
        .assert()
        .success()
        .stdout(predicate::str::contains("p1 -> node/101"));

    batch
        .cmd()
        .args(["store", "unmap", "--config"])
        .arg(batch.config())
        .arg("p1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed the mapping for p1."));

    batch.run("check", &input).failure();
}

#[test]
fn test_store_map_rejects_bad_fingerprint() {
    let batch = Batch::new();

    batch
        .cmd()
        .args(["store", "map", "--config"])
        .arg(batch.config())
        .args(["p1", "node/101", "--fingerprint", "not-a-digest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a row fingerprint"));

    batch
        .cmd()
        .args(["store", "show", "--config"])
        .arg(batch.config())
        .arg("p1")
        .assert()
        .success()
        .stdout(predicate::str::contains("No mapping recorded for p1."));
}

#[test]
fn test_store_clear_forgets_fingerprints() {
    let batch = Batch::new();
    let input = batch.csv("rows.csv", GOOD_CSV);
    for (row, remote_id) in batch.prepared(&input).iter().zip(["node/101", "node/102"]) {
        batch.write_back(row, remote_id);
    }
    assert!(batch.prepared(&input).is_empty());

    batch
        .cmd()
        .args(["store", "clear", "--config"])
        .arg(batch.config())
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared local state"));

    let after = batch.run("prepare", &input).success();
    assert_eq!(json_lines(&after.get_output().stdout).len(), 2);
}
