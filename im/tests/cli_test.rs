//! CLI tests for the `im` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const PIPELINE_YAML: &str = r#"
name: Leads
targetObject: person
dedupFieldName: emails.primaryEmail
responseRecordsPath: leads
mappings:
  - sourceFieldPath: email
    targetFieldName: emails
    targetCompositeSubField: primaryEmail
    transform:
      type: lowercase
  - sourceFieldPath: phone
    targetFieldName: phones
    targetCompositeSubField: primaryPhoneNumber
    transform:
      type: phoneNormalize
    position: 1
  - sourceFieldPath: company
    targetFieldName: companyId
    relationTargetObjectName: company
    relationMatchFieldName: name
    relationAutoCreate: true
    position: 2
"#;

const PAYLOAD_JSON: &str = r#"{
  "leads": [
    {"email": "A@X.IO", "phone": "555-123-4567", "company": "Acme"},
    {"email": "b@x.io", "company": "Acme"}
  ]
}"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::write(dir.path().join("config.yml"), "preview-limit: 1\n").unwrap();
        fs::write(dir.path().join("pipeline.yml"), PIPELINE_YAML).unwrap();
        fs::write(dir.path().join("payload.json"), PAYLOAD_JSON).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("im").unwrap();
        cmd.current_dir(self.dir.path()).arg("--config").arg(self.path("config.yml"));
        cmd
    }
}

#[test]
fn test_extract_prints_value() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["extract"])
        .arg(fx.path("payload.json"))
        .arg("leads[1].email")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"b@x.io\""));
}

#[test]
fn test_extract_missing_path_fails() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("extract")
        .arg(fx.path("payload.json"))
        .arg("leads[7].email")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No value at path"));
}

#[test]
fn test_validate_lists_mappings() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("validate")
        .arg(fx.path("pipeline.yml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("emails.primaryEmail"))
        .stdout(predicate::str::contains("companyId -> company.name (auto-create)"))
        .stderr(predicate::str::contains("is valid"));
}

#[test]
fn test_validate_rejects_partial_relation() {
    let fx = Fixture::new();
    let broken = PIPELINE_YAML.replace("    relationMatchFieldName: name\n", "");
    fs::write(fx.path("broken.yml"), broken).unwrap();

    fx.cmd()
        .arg("validate")
        .arg(fx.path("broken.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("companyId"));
}

#[test]
fn test_map_outputs_assembled_records() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .arg("map")
        .arg(fx.path("pipeline.yml"))
        .arg(fx.path("payload.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let mapped: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = &mapped["records"];
    assert_eq!(records[0]["emails"]["primaryEmail"], "a@x.io");
    assert_eq!(records[0]["phones"]["primaryPhoneNumber"], "+15551234567");
    assert_eq!(records[1]["companyId"]["matchValue"], "Acme");
    assert_eq!(mapped["errors"].as_array().unwrap().len(), 0);
}

#[test]
fn test_map_reports_bad_records_as_json() {
    let fx = Fixture::new();
    fs::write(
        fx.path("mixed.json"),
        r#"{"leads": [{"email": "a@x.io"}, "not a lead", 42]}"#,
    )
    .unwrap();

    let output = fx
        .cmd()
        .arg("map")
        .arg(fx.path("pipeline.yml"))
        .arg(fx.path("mixed.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let mapped: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(mapped["records"].as_array().unwrap().len(), 1);
    let errors = mapped["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["recordIndex"], 1);
    assert_eq!(errors[0]["sourceSnippet"], "\"not a lead\"");
    assert!(errors[1]["message"].as_str().unwrap().contains("number"));
}

#[test]
fn test_preview_uses_configured_limit() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .arg("preview")
        .arg(fx.path("pipeline.yml"))
        .arg(fx.path("payload.json"))
        .output()
        .unwrap();
    assert!(output.status.success());

    // samples are used as-is, so the whole payload is a single record
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["totalRecords"], 1);
    assert_eq!(result["previewRecords"].as_array().unwrap().len(), 1);
}

#[test]
fn test_preview_limit_flag_overrides_config() {
    let fx = Fixture::new();
    fs::write(
        fx.path("samples.json"),
        r#"[{"email": "a@x.io"}, {"email": "b@x.io"}, {"email": "c@x.io"}]"#,
    )
    .unwrap();

    let output = fx
        .cmd()
        .arg("preview")
        .arg(fx.path("pipeline.yml"))
        .arg(fx.path("samples.json"))
        .args(["--limit", "2"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["totalRecords"], 3);
    assert_eq!(result["success"], true);
    assert_eq!(result["previewRecords"].as_array().unwrap().len(), 2);
}

#[test]
fn test_process_dump_shows_store() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .arg("process")
        .arg(fx.path("pipeline.yml"))
        .arg(fx.path("payload.json"))
        .arg("--dump")
        .output()
        .unwrap();
    assert!(output.status.success());

    let dump: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(dump["result"]["recordsCreated"], 2);
    assert_eq!(dump["store"]["person"].as_array().unwrap().len(), 2);
    assert_eq!(dump["store"]["company"].as_array().unwrap().len(), 1);
}

#[test]
fn test_bad_config_is_reported() {
    let fx = Fixture::new();
    fs::write(fx.path("config.yml"), "phone:\n  default-country-code: abc\n").unwrap();

    fx.cmd()
        .arg("validate")
        .arg(fx.path("pipeline.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("default-country-code"));
}
