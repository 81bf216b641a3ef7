//! End-to-end tests for the `embed-codebase` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn embed_codebase() -> Command {
    let mut cmd = Command::cargo_bin("embed-codebase").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OPENAI_API_BASE");
    cmd
}

#[test]
fn test_requires_all_flags() {
    embed_codebase()
        .args(["--codebase-id", "repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--codebase-path"));
}

#[test]
fn test_missing_codebase_path_fails() {
    let output = TempDir::new().unwrap();
    let missing = output.path().join("does-not-exist");

    embed_codebase()
        .arg("--codebase-id")
        .arg("repo")
        .arg("--codebase-path")
        .arg(&missing)
        .arg("--output-dir")
        .arg(output.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("codebase path not found"));
}

#[test]
fn test_missing_api_key_fails() {
    let codebase = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fs::write(codebase.path().join("main.go"), "package main").unwrap();

    embed_codebase()
        .arg("--codebase-id")
        .arg("repo")
        .arg("--codebase-path")
        .arg(codebase.path())
        .arg("--output-dir")
        .arg(output.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not configured"));

    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_writes_both_artifacts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"embedding": [0.25, 0.5, 0.75], "index": 0}],
            "model": "text-embedding-ada-002"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let codebase = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    fs::write(codebase.path().join("app.py"), "print('hello')").unwrap();

    embed_codebase()
        .env("OPENAI_API_KEY", "test-key")
        .env("OPENAI_API_BASE", server.uri())
        .arg("--codebase-id")
        .arg("github.com/org/repo")
        .arg("--codebase-path")
        .arg(codebase.path())
        .arg("--output-dir")
        .arg(output.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Total embedding time"));

    let metadata = fs::read_to_string(
        output
            .path()
            .join("github_com_org_repo_embeddings_metadata.json"),
    )
    .unwrap();
    let metadata: serde_json::Value = serde_json::from_str(&metadata).unwrap();
    assert_eq!(
        metadata,
        json!([{"start": 0, "end": 14, "text": "print('hello')", "filePath": "app.py"}])
    );
    assert!(
        output
            .path()
            .join("github_com_org_repo_embeddings.npy")
            .is_file()
    );
}
