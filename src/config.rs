// SPDX-License-Identifier: GPL-3.0-only

use std::path::{Path, PathBuf};
use std::time::Duration;

use anywho::anywho;
use iced::Theme;
use serde::{Deserialize, Serialize};

use crate::app::core::sync::Window;

/// Overrides `server.base_url` when set
pub const SERVER_ENV: &str = "TOTP_BOARD_SERVER";

const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of one of the built-in [`Theme`]s
    pub theme: String,
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub toast_duration_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Time step of the code rotation, in seconds
    pub window_length: u32,
    pub offset_sync_interval_secs: u64,
    /// How far under the full window the countdown must fall before the
    /// boundary latch lets go
    pub guard_margin: u64,
    /// Head start given to the server before fetching the codes of a new window
    pub trigger_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::CatppuccinMocha.to_string(),
            server: ServerConfig::default(),
            sync: SyncConfig::default(),
            toast_duration_secs: 3,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:5000/api"),
            request_timeout_secs: 10,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window_length: 30,
            offset_sync_interval_secs: 30,
            guard_margin: 2,
            trigger_delay_ms: 50,
        }
    }
}

impl Config {
    /// Loads the config of `app_id` from the platform data directory, writing
    /// the defaults there on first run
    pub async fn load(app_id: &str) -> Result<Self, anywho::Error> {
        let path = config_path(app_id)?;
        let config = Self::load_from(path).await?;

        Ok(config.with_server_override(std::env::var(SERVER_ENV).ok()))
    }

    pub async fn save(self, app_id: &str) -> Result<(), anywho::Error> {
        let path = config_path(app_id)?;
        self.save_to(path).await
    }

    pub async fn load_from(path: PathBuf) -> Result<Self, anywho::Error> {
        use std::fs;

        smol::unblock(move || {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .map_err(|e| anywho!("Failed to create config directory: {}", e))?;
            }

            if path.exists() {
                let content = fs::read_to_string(&path)
                    .map_err(|e| anywho!("Failed to read config file: {}", e))?;

                let config: Config = ron::from_str(&content)
                    .map_err(|e| anywho!("Failed to parse config file: {}", e))?;
                config.validate()?;

                Ok(config)
            } else {
                let config = Config::default();
                write_config(&path, &config)?;
                tracing::info!("Wrote default config to {}", path.display());

                Ok(config)
            }
        })
        .await
    }

    pub async fn save_to(self, path: PathBuf) -> Result<(), anywho::Error> {
        self.validate()?;

        smol::unblock(move || {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| anywho!("Failed to create config directory: {}", e))?;
            }
            write_config(&path, &self)
        })
        .await
    }

    /// Rejects settings the sync engine cannot run with
    pub fn validate(&self) -> Result<(), anywho::Error> {
        if self.sync.window_length == 0 {
            return Err(anywho!("window_length must be at least one second"));
        }
        if self.sync.guard_margin >= u64::from(self.sync.window_length) {
            return Err(anywho!(
                "guard_margin ({}) must be smaller than window_length ({})",
                self.sync.guard_margin,
                self.sync.window_length
            ));
        }
        if self.sync.offset_sync_interval_secs == 0 {
            return Err(anywho!("offset_sync_interval_secs must be at least one second"));
        }
        if self.server.request_timeout_secs == 0 {
            return Err(anywho!("request_timeout_secs must be at least one second"));
        }
        reqwest::Url::parse(&self.server.base_url)
            .map_err(|e| anywho!("Invalid server url {:?}: {}", self.server.base_url, e))?;

        Ok(())
    }

    /// Points the config at `base_url` when it is usable, keeps it as is
    /// otherwise
    fn with_server_override(self, base_url: Option<String>) -> Self {
        let Some(base_url) = base_url.filter(|url| !url.trim().is_empty()) else {
            return self;
        };

        let mut candidate = self.clone();
        candidate.server.base_url = base_url.trim().to_string();
        match candidate.validate() {
            Ok(()) => {
                tracing::info!("Using server {} from {}", candidate.server.base_url, SERVER_ENV);
                candidate
            }
            Err(err) => {
                tracing::warn!("Ignoring {}: {}", SERVER_ENV, err);
                self
            }
        }
    }

    /// The configured theme, falling back to the default for unknown names
    pub fn theme(&self) -> Theme {
        Theme::ALL
            .iter()
            .find(|theme| theme.to_string() == self.theme)
            .cloned()
            .unwrap_or(Theme::CatppuccinMocha)
    }

    pub fn window(&self) -> Window {
        Window::new(self.sync.window_length).unwrap_or_default()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    pub fn offset_sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync.offset_sync_interval_secs)
    }

    pub fn trigger_delay(&self) -> Duration {
        Duration::from_millis(self.sync.trigger_delay_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.toast_duration_secs)
    }
}

fn config_path(app_id: &str) -> Result<PathBuf, anywho::Error> {
    Ok(dirs::data_dir()
        .ok_or_else(|| anywho!("Could not determine config directory"))?
        .join(app_id)
        .join(CONFIG_FILE))
}

fn write_config(path: &Path, config: &Config) -> Result<(), anywho::Error> {
    let content = ron::ser::to_string_pretty(config, ron::ser::PrettyConfig::default())
        .map_err(|e| anywho!("Failed to serialize config: {}", e))?;

    std::fs::write(path, content).map_err(|e| anywho!("Failed to write config file: {}", e))
}
