use std::path::{Path, PathBuf};
use std::time::Duration;

use platform_dirs::AppDirs;
use playback::{SegmentedClientConfig, SessionOptions};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "matchstream";
const CONFIG_FILE: &str = "Conf.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default = "default_low_latency")]
    pub low_latency: bool,
    #[serde(default = "default_back_buffer_secs")]
    pub back_buffer_secs: u64,
}

fn default_autoplay() -> bool {
    true
}

fn default_volume() -> f64 {
    1.0
}

fn default_low_latency() -> bool {
    true
}

fn default_back_buffer_secs() -> u64 {
    90
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autoplay: default_autoplay(),
            volume: default_volume(),
            low_latency: default_low_latency(),
            back_buffer_secs: default_back_buffer_secs(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the platform config dir when no path is
    /// given. Defaults are written back on first run; a broken file falls
    /// back to defaults without overwriting it.
    pub fn load(path: Option<&Path>) -> Self {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Self::default(),
            },
        };

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("ignoring malformed config {}: {e}", config_path.display());
                    Self::default()
                }
            },
            Err(_) => {
                let config = Self::default();
                config.save(&config_path);
                config
            }
        }
    }

    fn default_path() -> Option<PathBuf> {
        AppDirs::new(Some(APP_NAME), false).map(|dirs| dirs.config_dir.join(CONFIG_FILE))
    }

    fn save(&self, path: &Path) {
        let content = match toml::to_string(self) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("failed to serialize config: {e}");
                return;
            }
        };
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::warn!("failed to create config dir {}: {e}", parent.display());
                return;
            }
        }
        if let Err(e) = std::fs::write(path, content) {
            log::warn!("failed to write config {}: {e}", path.display());
        }
    }

    pub fn client_config(&self) -> SegmentedClientConfig {
        SegmentedClientConfig {
            low_latency: self.low_latency,
            back_buffer: Duration::from_secs(self.back_buffer_secs),
            prefetch: true,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            autoplay: self.autoplay,
            volume: self.volume,
            client_config: self.client_config(),
        }
    }
}
