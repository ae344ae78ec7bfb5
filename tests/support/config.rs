use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

/// Write `contents` to `config.toml` inside a fresh temp dir.
///
/// The returned dir must outlive the path.
pub fn write_temp_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write temp config");
    (dir, path)
}

/// A config pointing at `catalog` with fast retries.
pub fn config_with_catalog(catalog: &std::path::Path) -> String {
    format!(
        concat!(
            "[logging]\n",
            "level = \"warn\"\n",
            "\n",
            "[recovery]\n",
            "max_retries = 1\n",
            "retry_delay_ms = 0\n",
            "\n",
            "[catalog]\n",
            "path = {:?}\n",
        ),
        catalog.display().to_string()
    )
}
