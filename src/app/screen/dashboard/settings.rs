// SPDX-License-Identifier: GPL-3.0-only

use std::sync::{Arc, Mutex};

use iced::{
    Alignment, Element,
    Length::{self},
    Task, Theme,
    widget::{button, column, container, pick_list, row, scrollable, space, text, text_input},
};

use crate::{
    APP_ID,
    app::{utils::style, widgets::Toast},
    config::Config,
    icons,
};

pub struct SettingsPage {
    config: Arc<Mutex<Config>>,
    server_url: String,
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Go back a screen
    Back,
    /// Callback after the user changes the current theme
    ChangedTheme(Theme),
    /// Server url input update
    ServerUrlInput(String),
    /// Persist the typed server url
    ApplyServer,
    /// Configuration Saved
    ConfigurationSaved(Result<(), anywho::Error>),
}

pub enum Action {
    /// Does nothing
    None,
    /// Go back a screen
    Back,
    /// Ask parent to run an [`iced::Task`]
    Run(Task<Message>),
    /// Add a new [`Toast`] to show
    AddToast(Toast),
    /// Ask parent to run an [`iced::Task`] and add a [`Toast`] to show
    RunAndToast(Task<Message>, Toast),
}

impl SettingsPage {
    pub fn new(config: Arc<Mutex<Config>>) -> (Self, Task<Message>) {
        let server_url = config
            .lock()
            .map(|cfg| cfg.server.base_url.clone())
            .unwrap_or_default();

        (Self { config, server_url }, Task::none())
    }

    pub fn view(&self) -> Element<'_, Message> {
        let header = header_view();
        let content = settings_view(&self.config, &self.server_url);

        container(
            container(column![header, content])
                .padding(5.)
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .center(Length::Fill)
        .into()
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::Back => Action::Back,
            Message::ChangedTheme(theme) => {
                let Ok(mut cfg) = self.config.lock() else {
                    tracing::warn!("Config mutex poisoned, cannot change theme");
                    return Action::None;
                };
                cfg.theme = theme.to_string();
                let cfg_clone = cfg.clone();

                Action::Run(save(cfg_clone))
            }
            Message::ServerUrlInput(value) => {
                self.server_url = value;
                Action::None
            }
            Message::ApplyServer => {
                let Ok(mut cfg) = self.config.lock() else {
                    tracing::warn!("Config mutex poisoned, cannot change server");
                    return Action::None;
                };

                let mut candidate = cfg.clone();
                candidate.server.base_url = self.server_url.trim().to_string();
                if let Err(err) = candidate.validate() {
                    return Action::AddToast(Toast::error_toast(err));
                }

                tracing::info!("Server changed to {}", candidate.server.base_url);
                *cfg = candidate.clone();

                Action::RunAndToast(save(candidate), Toast::success_toast("Server updated"))
            }
            Message::ConfigurationSaved(result) => match result {
                Ok(_) => Action::None,
                Err(e) => Action::AddToast(Toast::error_toast(e)),
            },
        }
    }
}

fn save(config: Config) -> Task<Message> {
    Task::perform(async move { config.save(APP_ID).await }, Message::ConfigurationSaved)
}

/// View of the header of this screen
fn header_view<'a>() -> Element<'a, Message> {
    row![
        button(
            row![
                icons::get_icon("go-previous-symbolic", 21),
                text("Back").size(style::font_size::BODY)
            ]
            .spacing(style::spacing::TINY)
            .align_y(Alignment::Center)
        )
        .on_press(Message::Back)
        .padding(8)
        .style(style::secondary_button),
        column![
            text("Settings").size(style::font_size::TITLE),
            text("Application preferences")
                .size(style::font_size::SMALL)
                .style(style::muted_text),
        ]
        .spacing(style::spacing::TINY),
        space().width(Length::Fill),
    ]
    .spacing(style::spacing::LARGE)
    .padding(10)
    .align_y(Alignment::Center)
    .width(Length::Fill)
    .into()
}

fn settings_view<'a>(
    config: &'a Arc<Mutex<Config>>,
    server_url: &'a str,
) -> Element<'a, Message> {
    let current_theme = config
        .lock()
        .map(|cfg| cfg.theme())
        .unwrap_or(Theme::CatppuccinMocha);

    let settings_form = column![
        column![
            text("Server")
                .size(style::font_size::BODY)
                .style(style::label_text),
            row![
                text_input("http://localhost:5000/api", server_url)
                    .on_input(Message::ServerUrlInput)
                    .on_submit(Message::ApplyServer)
                    .padding(12)
                    .size(style::font_size::MEDIUM),
                button(text("Apply").size(style::font_size::MEDIUM))
                    .on_press(Message::ApplyServer)
                    .padding(12)
                    .style(style::primary_button),
            ]
            .spacing(style::spacing::MEDIUM)
            .align_y(Alignment::Center),
        ]
        .spacing(style::spacing::TINY),
        column![
            text("Theme")
                .size(style::font_size::BODY)
                .style(style::label_text),
            pick_list(Theme::ALL, Some(current_theme), Message::ChangedTheme)
                .width(Length::Fill)
                .padding(12)
        ]
        .spacing(style::spacing::TINY),
    ]
    .spacing(style::spacing::XLARGE)
    .padding(10)
    .max_width(600);

    container(
        column![
            scrollable(container(settings_form).center_x(Length::Fill))
                .width(Length::Fill)
                .height(Length::Fill),
            container(
                text(format!("Version {}", env!("CARGO_PKG_VERSION")))
                    .size(style::font_size::SMALL)
                    .style(style::muted_text)
            )
            .width(Length::Fill)
            .align_x(Alignment::Center)
            .padding(10),
        ]
        .height(Length::Fill),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}
