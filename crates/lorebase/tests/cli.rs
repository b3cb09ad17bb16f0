// These run against the in-memory index with the hashing embedder, which is
// what a build without ml-features falls back to.
#![cfg(not(feature = "ml-features"))]

use assert_cmd::Command;
use predicates::prelude::*;

const ENV_VARS: &[&str] = &[
  "LOREBASE_COLLECTION",
  "LOREBASE_INDEX_URL",
  "LOREBASE_INDEX_API_KEY",
  "LOREBASE_EMBEDDING_MODEL",
];

fn lorebase() -> Command {
  let mut cmd = Command::cargo_bin("lorebase").unwrap();
  for var in ENV_VARS {
    cmd.env_remove(var);
  }
  cmd.env("NO_COLOR", "1");
  cmd
}

#[test]
fn status_reports_defaults() {
  lorebase()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("story_knowledge_base"))
    .stdout(predicate::str::contains("in-memory"))
    .stdout(predicate::str::contains("feature-hashing"))
    .stderr(predicate::str::contains("in memory"));
}

#[test]
fn status_uses_collection_from_environment() {
  lorebase()
    .env("LOREBASE_COLLECTION", "physics_facts")
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("physics_facts"));
}

#[test]
fn seed_reports_count() {
  lorebase()
    .args(["seed", "Tides follow the moon", "The Nile flows north"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Seeded 2 chunks"));
}

#[test]
fn seed_reads_facts_from_file() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("facts.txt");
  std::fs::write(&path, "one fact\n\nanother fact\n").unwrap();

  lorebase()
    .args(["seed", "--subject", "Science", "--topic", "Tides", "--file"])
    .arg(&path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Seeded 2 chunks"));
}

#[test]
fn seed_without_texts_does_nothing() {
  lorebase().arg("seed").assert().success().stdout(predicate::str::contains("Nothing to seed"));
}

#[test]
fn seed_rejects_bad_metadata() {
  lorebase()
    .args(["seed", "a fact", "--metadata", "not json"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--metadata must be a JSON object"));
}

#[test]
fn search_on_fresh_index_is_empty_json() {
  lorebase()
    .args(["search", "tides", "--json"])
    .assert()
    .success()
    .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn search_without_matches_says_so() {
  lorebase().args(["search", "tides"]).assert().success().stdout(predicate::str::contains("No matches"));
}

#[test]
fn search_requires_terms() {
  lorebase().arg("search").assert().failure();
}

#[test]
fn index_url_without_lancedb_support_fails() {
  lorebase()
    .args(["--index-url", "/tmp/lorebase-test", "status"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("ml-features"));
}
