//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - Every change is resolved exactly like startup: file, env overrides, validation
//! - Invalid edits are logged and dropped; the running configuration stays in place
//! - A reload identical to the last published one is not sent again (editors
//!   often emit several events per save)

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::resolve_config;
use crate::config::schema::DispatcherConfig;

/// Config sections that differ between two configurations.
///
/// Returned names are `"endpoints"`, `"dispatch"`, `"health"` and
/// `"observability"`, in that order.
pub fn changed_sections(old: &DispatcherConfig, new: &DispatcherConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if old.endpoints != new.endpoints {
        changed.push("endpoints");
    }
    if old.dispatch != new.dispatch {
        changed.push("dispatch");
    }
    if old.health != new.health {
        changed.push("health");
    }
    if old.observability != new.observability {
        changed.push("observability");
    }
    changed
}

/// Watches the configuration file and publishes validated changes.
pub struct ConfigWatcher {
    path: PathBuf,
    current: DispatcherConfig,
    update_tx: mpsc::UnboundedSender<DispatcherConfig>,
}

impl ConfigWatcher {
    /// Create a watcher for `path`, starting from the `current` configuration.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(
        path: &Path,
        current: DispatcherConfig,
    ) -> (Self, mpsc::UnboundedReceiver<DispatcherConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let mut last_sent = self.current;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match resolve_config(Some(&path)) {
                        Ok(new_config) => {
                            let changed = changed_sections(&last_sent, &new_config);
                            if changed.is_empty() {
                                return;
                            }
                            tracing::info!(path = ?path, ?changed, "Config file changed");
                            last_sent = new_config.clone();
                            let _ = tx.send(new_config);
                        }
                        Err(e) => {
                            tracing::error!(
                                path = ?path,
                                error = %e,
                                "Rejected config change, keeping current configuration"
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
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
    use crate::config::loader::load_config;

    #[test]
    fn test_changed_sections() {
        let old = DispatcherConfig::default();
        assert!(changed_sections(&old, &old).is_empty());

        let mut new = old.clone();
        new.endpoints = "http://a".into();
        new.health.probe_window_secs = 60;
        assert_eq!(changed_sections(&old, &new), vec!["endpoints", "health"]);

        new.observability.log_level = "debug".into();
        new.dispatch.retry_count = 0;
        assert_eq!(
            changed_sections(&old, &new),
            vec!["endpoints", "dispatch", "health", "observability"]
        );
    }

    /// Wait for a published config matching `pred`, failing on anything with a
    /// zero timeout (which validation must have rejected).
    async fn next_matching<F>(
        rx: &mut mpsc::UnboundedReceiver<DispatcherConfig>,
        pred: F,
    ) -> DispatcherConfig
    where
        F: Fn(&DispatcherConfig) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                let config = rx.recv().await.expect("watcher channel closed");
                assert_ne!(config.dispatch.timeout_ms, 0, "invalid config was published");
                if pred(&config) {
                    return config;
                }
            }
        })
        .await
        .expect("no matching config reload")
    }

    #[tokio::test]
    async fn test_reload_publishes_valid_edits_and_drops_invalid_ones() {
        let dir = std::env::temp_dir().join(format!(
            "failover-dispatch-watch-{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dispatch.toml");
        std::fs::write(&path, "endpoints = \"http://a\"\n").unwrap();

        let initial = load_config(&path).unwrap();
        let (watcher, mut rx) = ConfigWatcher::new(&path, initial);
        let _watcher = watcher.run().unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        std::fs::write(
            &path,
            "endpoints = \"http://a\\nhttp://b\"\n[health]\nprobe_window_secs = 30\n",
        )
        .unwrap();
        let reloaded = next_matching(&mut rx, |c| c.health.probe_window_secs == 30).await;
        assert_eq!(reloaded.endpoint_list().len(), 2);

        std::fs::write(&path, "[dispatch]\ntimeout_ms = 0\n").unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        std::fs::write(&path, "[dispatch]\nretry_count = 4\n").unwrap();
        let reloaded = next_matching(&mut rx, |c| c.dispatch.retry_count == 4).await;
        assert_eq!(reloaded.dispatch.timeout_ms, 3000);

        std::fs::remove_dir_all(&dir).unwrap_or_default();
    }
}
