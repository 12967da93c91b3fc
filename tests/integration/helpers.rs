//! Shared helpers for integration tests.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

/// A `corpus-clean` command isolated from the user's own config file.
pub fn corpus_clean(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("corpus-clean").expect("binary should be built");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// Write `content` to `dir/rel`, creating parent folders.
pub fn write_file(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// A small mixed corpus: two text files (one nested) and one JSON record.
pub fn sample_corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "a.txt", "The the cat sat.\nhello world\n");
    write_file(
        dir.path(),
        "b.json",
        r#"{"meta":{"id":7},"body":[{"text":"hello world","pos":"NN"},{"text":"Gutenberg edition 1901 printed here"}]}"#,
    );
    write_file(dir.path(), "sub/c.txt", "solo\nanother fine line\n");
    dir
}
