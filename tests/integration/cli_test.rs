//! End-to-end tests driving the CLI.

use std::fs;

use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{corpus_clean, sample_corpus, write_file};

// ============================================================================
// Help and auxiliary flags
// ============================================================================

#[test]
fn help_lists_processing_steps() {
    let home = TempDir::new().unwrap();
    corpus_clean(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing steps"))
        .stdout(predicate::str::contains("[FOLDER]"));
}

#[test]
fn show_config_prints_defaults() {
    let home = TempDir::new().unwrap();
    corpus_clean(&home)
        .arg("--show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[filter]"))
        .stdout(predicate::str::contains("gutenberg"));
}

#[test]
fn show_config_reads_explicit_file() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("custom.toml");
    fs::write(&path, "[filter]\nmax_blank_run = 5\n").unwrap();

    corpus_clean(&home)
        .arg("--config")
        .arg(&path)
        .arg("--show-config")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_blank_run = 5"));
}

#[test]
fn missing_explicit_config_fails() {
    let home = TempDir::new().unwrap();
    corpus_clean(&home)
        .args(["--config", "/definitely/not/here.toml", "--show-config"])
        .assert()
        .failure();
}

#[test]
fn completions_for_bash() {
    let home = TempDir::new().unwrap();
    corpus_clean(&home)
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("corpus-clean"));
}

// ============================================================================
// Setup failures
// ============================================================================

#[test]
fn missing_folder_exits_1() {
    let home = TempDir::new().unwrap();
    corpus_clean(&home)
        .arg(home.path().join("nowhere"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn folder_without_sources_exits_1() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "notes.md", "# not a source\n");

    corpus_clean(&home)
        .arg(dir.path())
        .arg("--yes")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No .txt or .json files"));
    assert!(dir.path().join("notes.md").exists());
}

#[test]
fn missing_output_directory_fails_before_deleting() {
    let home = TempDir::new().unwrap();
    let dir = sample_corpus();

    corpus_clean(&home)
        .arg(dir.path())
        .arg("missing/out.txt")
        .arg("--yes")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.json").exists());
}

// ============================================================================
// Confirmation
// ============================================================================

#[test]
fn non_interactive_without_yes_cancels() {
    let home = TempDir::new().unwrap();
    let dir = sample_corpus();

    corpus_clean(&home)
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Found 3 files total"))
        .stdout(predicate::str::contains("Operation cancelled."));

    assert!(dir.path().join("a.txt").exists());
    assert!(dir.path().join("b.json").exists());
    assert!(dir.path().join("sub/c.txt").exists());
    assert!(!dir.path().join("combined_cleaned.txt").exists());
}

// ============================================================================
// Full runs
// ============================================================================

#[test]
fn yes_run_writes_cleaned_output_and_deletes_sources() {
    let home = TempDir::new().unwrap();
    let dir = sample_corpus();

    corpus_clean(&home)
        .arg(dir.path())
        .args(["--yes", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALL DONE!"))
        .stdout(predicate::str::contains("Deleted 3/3 original files"));

    let output = fs::read_to_string(dir.path().join("combined_cleaned.txt")).unwrap();
    assert_eq!(
        output,
        "The cat sat.\nhello world\nedition printed here\nanother fine line\n"
    );
    assert!(!dir.path().join("a.txt").exists());
    assert!(!dir.path().join("b.json").exists());
    assert!(!dir.path().join("sub/c.txt").exists());
}

#[test]
fn absolute_output_inside_relative_folder_is_not_consumed() {
    let home = TempDir::new().unwrap();
    let dir = sample_corpus();
    let previous = "an earlier cleaned line\n";
    write_file(dir.path(), "combined_cleaned.txt", previous);

    let parent = dir.path().parent().unwrap();
    let folder = dir.path().file_name().unwrap();
    let output = fs::canonicalize(dir.path())
        .unwrap()
        .join("combined_cleaned.txt");

    corpus_clean(&home)
        .current_dir(parent)
        .arg(folder)
        .arg(&output)
        .args(["--yes", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 files total"));

    let cleaned = fs::read_to_string(&output).unwrap();
    assert!(!cleaned.contains("earlier"));
    assert!(cleaned.contains("another fine line"));
}

#[test]
fn symbol_edged_metadata_tokens_are_removed() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.txt", "end of poem <eos> more\nlearn c++ now\n");
    let config = home.path().join("run.toml");
    fs::write(&config, "[sanitize]\nmetadata_tokens = [\"c++\", \"<eos>\"]\n").unwrap();

    corpus_clean(&home)
        .arg(dir.path())
        .arg("--config")
        .arg(&config)
        .args(["--yes", "--quiet"])
        .assert()
        .success();

    let output = fs::read_to_string(dir.path().join("combined_cleaned.txt")).unwrap();
    assert_eq!(output, "end of poem more\nlearn now\n");
}

#[test]
fn custom_output_name_and_metadata_tokens() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.txt", "Draft copy by ACME press\nsecond good line\n");
    let config = home.path().join("run.toml");
    fs::write(&config, "[sanitize]\nmetadata_tokens = [\"acme\", \"draft\"]\n").unwrap();

    corpus_clean(&home)
        .arg(dir.path())
        .arg("clean.txt")
        .arg("--config")
        .arg(&config)
        .args(["--yes", "--quiet"])
        .assert()
        .success();

    let output = fs::read_to_string(dir.path().join("clean.txt")).unwrap();
    assert_eq!(output, "copy by press\nsecond good line\n");
}

#[test]
fn malformed_json_is_left_in_place() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "good.txt", "kept text here\n");
    write_file(dir.path(), "bad.json", "{ not json");

    corpus_clean(&home)
        .arg(dir.path())
        .args(["--yes", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 unreadable files"));

    assert!(dir.path().join("bad.json").exists());
    assert!(!dir.path().join("good.txt").exists());
    let output = fs::read_to_string(dir.path().join("combined_cleaned.txt")).unwrap();
    assert_eq!(output, "kept text here\n");
}
