//! Configuration file watcher for hot reload of the aspect scope.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AutoLogConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<AutoLogConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AutoLogConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file on notify's background thread.
    ///
    /// The returned watcher must be kept alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Config file change detected, reloading");
                        match load_config(&path) {
                            Ok(new_config) => {
                                let _ = tx.send(new_config);
                            }
                            Err(e) => {
                                tracing::error!(
                                    error = %e,
                                    "Failed to reload config, keeping current configuration"
                                );
                            }
                        }
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_reload_sends_new_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auto-log.toml");
        fs::write(&path, "[aspect]\nenabled = true\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();

        fs::write(&path, "[aspect]\nenabled = false\nbase_paths = [\"shop\"]\n").unwrap();

        // a single write can surface as several events; wait for the final content
        let config = tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let config = updates.recv().await.expect("watcher channel closed");
                if !config.aspect.base_paths.is_empty() {
                    return config;
                }
            }
        })
        .await
        .expect("no reload within timeout");

        assert!(!config.aspect.enabled);
        assert_eq!(config.aspect.base_paths, vec!["shop".to_string()]);
    }
}
