//! Shared utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use config_composer::Composer;

/// Search root holding the S4 / ListOps experiment fragments.
#[allow(dead_code)]
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/conf")
}

/// Composer over the fixture fragments.
#[allow(dead_code)]
pub fn fixture_composer() -> Composer {
    Composer::with_search_path([fixture_root()])
}

/// Write fragment `name` (`model/s4`) under `root` as YAML.
#[allow(dead_code)]
pub fn write_fragment(root: &Path, name: &str, text: &str) {
    let path = root.join(format!("{}.yaml", name));
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).unwrap();
    }
    fs::write(path, text).unwrap();
}
