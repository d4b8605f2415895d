//! Fragments stored as files under one or more search roots.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::source::FragmentSource;

const EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Ordered list of root directories. The first root holding a fragment wins.
#[derive(Debug, Clone)]
pub struct SearchPath {
    roots: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// File that would back fragment `name` under `root`, if one exists.
    fn locate(root: &Path, name: &str) -> Option<PathBuf> {
        EXTENSIONS
            .iter()
            .map(|ext| root.join(format!("{}.{}", name, ext)))
            .find(|candidate| candidate.is_file())
    }
}

impl FragmentSource for SearchPath {
    fn read(&self, name: &str) -> Result<Option<String>, ConfigError> {
        for root in &self.roots {
            let Some(path) = Self::locate(root, name) else {
                continue;
            };
            return match fs::read_to_string(&path) {
                Ok(text) => {
                    tracing::trace!(fragment = name, path = %path.display(), "Fragment read");
                    Ok(Some(text))
                }
                // Removed between the existence check and the read.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => Err(ConfigError::Io { path, source }),
            };
        }
        Ok(None)
    }

    fn describe(&self) -> String {
        let roots: Vec<String> = self
            .roots
            .iter()
            .map(|root| root.display().to_string())
            .collect();
        format!("[{}]", roots.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_root_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::create_dir_all(first.path().join("model")).unwrap();
        fs::create_dir_all(second.path().join("model")).unwrap();
        fs::write(first.path().join("model/s4.yaml"), "d_model: 128\n").unwrap();
        fs::write(second.path().join("model/s4.yaml"), "d_model: 256\n").unwrap();
        fs::write(second.path().join("model/s4d.yml"), "d_model: 64\n").unwrap();

        let search = SearchPath::new([first.path(), second.path()]);
        assert_eq!(search.read("model/s4").unwrap().as_deref(), Some("d_model: 128\n"));
        assert_eq!(search.read("model/s4d").unwrap().as_deref(), Some("d_model: 64\n"));
        assert_eq!(search.read("model/missing").unwrap(), None);
    }

    #[test]
    fn test_describe_lists_roots() {
        let search = SearchPath::new(["conf", "/etc/experiments"]);
        assert_eq!(search.describe(), "[conf, /etc/experiments]");
    }
}
