use anyhow::Result;
use cardboard_config::AppConfig;
use cardboard_render::ViewController;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Watches the config file and pushes edits into a running view.
pub struct ConfigWatcher {
    path: PathBuf,
    last_modified: Option<SystemTime>,
    controller: ViewController,
}

impl ConfigWatcher {
    pub fn new(path: PathBuf, controller: ViewController) -> Self {
        let last_modified = modified(&path);
        Self {
            path,
            last_modified,
            controller,
        }
    }

    /// Poll every `period` until the task is dropped.
    pub async fn run(mut self, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(e) = self.poll() {
                tracing::warn!(?e, path = %self.path.display(), "Ignoring config change");
            }
        }
    }

    /// Apply the file if it changed since the last poll. Returns whether it did.
    pub fn poll(&mut self) -> Result<bool> {
        let current = modified(&self.path);
        if current.is_none() || current == self.last_modified {
            return Ok(false);
        }
        self.last_modified = current;

        let config = cardboard_config::load_config_from(&self.path)?;
        self.apply(&config)?;
        tracing::info!(path = %self.path.display(), "Config reloaded");
        Ok(true)
    }

    /// Queue the whole file as one update so a frame never sees half of it.
    fn apply(&self, config: &AppConfig) -> Result<()> {
        let mut settings = self.controller.settings();
        settings.hmd.device = config.device.clone();
        if let Some(screen) = &config.screen {
            settings.hmd.screen = screen.clone();
        }
        settings.render = config.render.clone();
        self.controller.set_settings(settings)?;
        Ok(())
    }
}

fn modified(path: &std::path::Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
