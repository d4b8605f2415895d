//! Fragment watcher for live recomposition.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::compose::{Composer, Override, ResolvedConfig};

/// Watches the search path and recomposes a configuration on every change.
pub struct ConfigWatcher {
    composer: Composer,
    name: String,
    overrides: Vec<Override>,
    roots: Vec<PathBuf>,
    poll_interval: Duration,
    update_tx: mpsc::UnboundedSender<ResolvedConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for recomposed configurations.
    pub fn new(
        composer: Composer,
        name: impl Into<String>,
        overrides: Vec<Override>,
        roots: Vec<PathBuf>,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ResolvedConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                composer,
                name: name.into(),
                overrides,
                roots,
                poll_interval,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread. Dropping the returned watcher
    /// stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let composer = self.composer.clone();
        let name = self.name.clone();
        let overrides = self.overrides.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let changed = event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove();
                    if changed && event.paths.iter().any(|path| is_fragment_file(path)) {
                        tracing::info!(config = %name, "Fragment change detected, recomposing...");
                        match composer.compose(&name, &overrides) {
                            Ok(config) => {
                                let _ = tx.send(config);
                            }
                            Err(e) => {
                                tracing::error!(
                                    "Failed to recompose {}: {}. Keeping current configuration.",
                                    name,
                                    e
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        for root in &self.roots {
            if root.is_dir() {
                watcher.watch(root, RecursiveMode::Recursive)?;
            } else {
                tracing::warn!(path = ?root, "Search path entry is not a directory, not watching");
            }
        }

        tracing::info!(roots = ?self.roots, "Fragment watcher started");
        Ok(watcher)
    }
}

/// Only YAML files can hold fragments; swap files and the like are ignored.
fn is_fragment_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tokio::time::{sleep, timeout};

    /// Swap in a new version of `name` with a rename, so the watcher never
    /// sees a half-written file.
    fn replace_fragment(root: &Path, name: &str, text: &str) {
        let staged = root.join(format!("{}.tmp", name));
        fs::write(&staged, text).unwrap();
        fs::rename(&staged, root.join(format!("{}.yaml", name))).unwrap();
    }

    async fn next_with_d_model(
        updates: &mut mpsc::UnboundedReceiver<ResolvedConfig>,
        d_model: i64,
    ) -> ResolvedConfig {
        timeout(Duration::from_secs(5), async {
            loop {
                let config = updates.recv().await.unwrap();
                if config.get_i64("model.d_model") == Some(d_model) {
                    return config;
                }
            }
        })
        .await
        .unwrap()
    }

    async fn drain(updates: &mut mpsc::UnboundedReceiver<ResolvedConfig>) {
        sleep(Duration::from_millis(300)).await;
        while updates.try_recv().is_ok() {}
    }

    #[test]
    fn test_fragment_files() {
        assert!(is_fragment_file(Path::new("conf/model/s4.yaml")));
        assert!(is_fragment_file(Path::new("conf/model/s4.yml")));
        assert!(!is_fragment_file(Path::new("conf/model/.s4.yaml.swp")));
        assert!(!is_fragment_file(Path::new("conf/model/s4.yaml~")));
        assert!(!is_fragment_file(Path::new("conf/model")));
    }

    #[tokio::test]
    async fn test_recompose_on_change_and_keep_last_good() {
        let root = tempfile::tempdir().unwrap();
        replace_fragment(root.path(), "config", "model:\n  d_model: 128\n");

        let composer = Composer::with_search_path([root.path()]);
        let (watcher, mut updates) = ConfigWatcher::new(
            composer,
            "config",
            Vec::new(),
            vec![root.path().to_path_buf()],
            Duration::from_millis(50),
        );
        let _watcher = watcher.run().unwrap();

        replace_fragment(root.path(), "config", "model:\n  d_model: 256\n");
        let config = next_with_d_model(&mut updates, 256).await;
        assert_eq!(config.fragments().to_vec(), vec!["config"]);
        drain(&mut updates).await;

        // A broken fragment sends nothing.
        replace_fragment(root.path(), "config", "model: [256\n");
        assert!(timeout(Duration::from_millis(500), updates.recv()).await.is_err());

        replace_fragment(root.path(), "config", "model:\n  d_model: 64\n");
        next_with_d_model(&mut updates, 64).await;
        drain(&mut updates).await;

        // Files that cannot be fragments never trigger a recomposition.
        fs::write(root.path().join("notes.txt"), "scratch").unwrap();
        assert!(timeout(Duration::from_millis(500), updates.recv()).await.is_err());
    }
}
