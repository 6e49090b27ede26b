// SPDX-License-Identifier: GPL-3.0-only

use std::sync::{Arc, Mutex};

use iced::{
    Element, Length, Subscription, Task, Theme,
    time::Instant,
    widget::{center, column, stack, text},
};

use crate::{APP_ID, config::Config};

use screen::{Screen, dashboard};
use utils::style;
use widgets::{Toast, Toasts};

pub mod core;
mod screen;
mod utils;
mod widgets;

pub struct TotpBoard {
    now: Instant,
    state: State,
    toasts: Toasts,
    config: Arc<Mutex<Config>>,
}

enum State {
    Loading,
    Ready { screen: Screen },
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Callback after loading the [`Config`] from disk
    ConfigLoaded(Result<Config, anywho::Error>),
    /// Messages of the [`dashboard::Dashboard`]
    Dashboard(dashboard::Message),
    /// Drops the toasts whose time is up
    ExpireToasts,
    /// A toast was clicked
    DismissToast(u64),
}

impl TotpBoard {
    pub fn new() -> (Self, Task<Message>) {
        let config = Config::default();

        (
            Self {
                now: Instant::now(),
                state: State::Loading,
                toasts: Toasts::new(config.toast_duration()),
                config: Arc::new(Mutex::new(config)),
            },
            Task::perform(
                async move { Config::load(APP_ID).await },
                Message::ConfigLoaded,
            ),
        )
    }

    pub fn update(&mut self, message: Message, now: Instant) -> Task<Message> {
        self.now = now;

        match message {
            Message::ConfigLoaded(result) => {
                let config = match result {
                    Ok(config) => config,
                    Err(err) => {
                        tracing::warn!("Falling back to the default config: {err}");
                        self.toasts.push(
                            Toast::error_toast(format!("Invalid config, using defaults: {err}")),
                            now,
                        );
                        Config::default()
                    }
                };

                self.toasts.set_duration(config.toast_duration());
                if let Ok(mut cfg) = self.config.lock() {
                    *cfg = config;
                }

                let (screen, task) = Screen::from_config(Arc::clone(&self.config));
                self.state = State::Ready { screen };
                task
            }
            Message::Dashboard(message) => {
                let State::Ready {
                    screen: Screen::Dashboard(dashboard),
                } = &mut self.state
                else {
                    return Task::none();
                };

                match dashboard.update(message) {
                    dashboard::Action::None => Task::none(),
                    dashboard::Action::Run(task) => task.map(Message::Dashboard),
                    dashboard::Action::AddToast(toast) => {
                        self.toasts.push(toast, now);
                        Task::none()
                    }
                    dashboard::Action::RunAndToast(task, toast) => {
                        self.toasts.push(toast, now);
                        task.map(Message::Dashboard)
                    }
                }
            }
            Message::ExpireToasts => {
                self.toasts.expire(now);
                Task::none()
            }
            Message::DismissToast(id) => {
                self.toasts.dismiss(id);
                Task::none()
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let content: Element<Message> = match &self.state {
            State::Loading => center(text("Loading...")).into(),
            State::Ready { screen } => match screen {
                Screen::Error(err) => center(
                    column![
                        text("Something went wrong").size(style::font_size::TITLE),
                        text(err)
                            .size(style::font_size::BODY)
                            .style(style::muted_text),
                    ]
                    .spacing(style::spacing::MEDIUM)
                    .align_x(iced::Alignment::Center),
                )
                .into(),
                Screen::Dashboard(dashboard) => dashboard.view().map(Message::Dashboard),
            },
        };

        if self.toasts.is_empty() {
            content
        } else {
            stack![content, self.toasts.view(Message::DismissToast)]
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let screen = match &self.state {
            State::Ready {
                screen: Screen::Dashboard(dashboard),
            } => dashboard.subscription().map(Message::Dashboard),
            _ => Subscription::none(),
        };

        if self.toasts.is_empty() {
            screen
        } else {
            Subscription::batch([
                screen,
                iced::time::every(std::time::Duration::from_millis(250))
                    .map(|_| Message::ExpireToasts),
            ])
        }
    }

    pub fn theme(&self) -> Theme {
        self.config
            .lock()
            .map(|cfg| cfg.theme())
            .unwrap_or(Theme::CatppuccinMocha)
    }
}
