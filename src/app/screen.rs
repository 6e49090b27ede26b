// SPDX-License-Identifier: GPL-3.0-only

use std::sync::{Arc, Mutex};

use iced::Task;

use crate::app::core::ApiClient;
use crate::config::Config;

pub mod dashboard;

pub use dashboard::Dashboard;

pub enum Screen {
    Error(String),
    Dashboard(Dashboard),
}

impl Screen {
    /// Creates the initial application [`Screen`] from the loaded configuration.
    ///
    /// The [`Dashboard`] is shown when a client for the configured server can
    /// be built, an [`Screen::Error`] otherwise. The returned task performs the
    /// first load of the dashboard.
    pub fn from_config(config: Arc<Mutex<Config>>) -> (Self, Task<crate::app::Message>) {
        let settings = config.lock().map(|cfg| cfg.clone()).unwrap_or_default();

        match ApiClient::new(&settings.server.base_url, settings.request_timeout()) {
            Ok(api) => {
                tracing::info!("Using server {}", api.base_url());
                let (dashboard, task) = Dashboard::new(config, Arc::new(api));
                (
                    Screen::Dashboard(dashboard),
                    task.map(crate::app::Message::Dashboard),
                )
            }
            Err(err) => {
                tracing::error!("Cannot reach {}: {}", settings.server.base_url, err);
                (Screen::Error(err.to_string()), Task::none())
            }
        }
    }
}
