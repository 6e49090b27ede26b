// SPDX-License-Identifier: GPL-3.0-only

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use arboard::Clipboard;
use iced::{
    Alignment, Element,
    Length::{self},
    Subscription, Task, event,
    keyboard::{self, Key, key::Named},
    task,
    widget::{Column, button, column, container, row, scrollable, space, text},
};

use crate::{
    app::{
        core::{
            ApiClient, ApiError, Authenticator, AuthenticatorId, NewAuthenticator, Snapshot,
            sync::{RefreshMode, RefreshOutcome, RefreshTicket, SyncEngine, SystemClock},
        },
        utils::style,
        widgets::{Toast, countdown_badge},
    },
    config::Config,
    icons,
};

mod add;
mod settings;

/// The code board: lists the authenticators of the server and keeps their
/// countdown and codes in step with it while the home view is shown.
pub struct Dashboard {
    config: Arc<Mutex<Config>>,
    api: Arc<ApiClient>,
    clipboard: Option<Clipboard>,
    engine: SyncEngine,
    subscreen: SubScreen,
    /// Authenticator whose delete button is waiting for confirmation
    pending_delete: Option<AuthenticatorId>,
    refresh_handle: Option<task::Handle>,
    sync_handle: Option<task::Handle>,
    sync_interval: Duration,
    trigger_delay: Duration,
}

pub enum SubScreen {
    Home,
    AddPage(add::AddPage),
    SettingsPage(settings::SettingsPage),
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Once per second while the home view is shown
    Tick,
    /// Ask to sample the server clock
    SyncClock,
    /// Callback of a clock sample started at the given local time
    ClockSynced(i64, Result<i64, ApiError>),

    /// Manual refresh asked by the user
    Refresh,
    /// Callback of the listing fetch started with the given ticket
    Refreshed(RefreshTicket, Result<Snapshot, ApiError>),

    /// Attempt to copy some [`String`] to the user clipboard
    CopyToClipboard(String),
    /// Delete button of an authenticator pressed, the second press confirms
    DeletePressed(AuthenticatorId),
    /// Forget the pending delete confirmation
    CancelDelete,
    /// Callback after deleting an authenticator
    Deleted(Result<(), ApiError>),

    /// Messages of the [`add::AddPage`]
    AddPage(add::Message),
    /// Ask to open the [`add::AddPage`]
    OpenAddPage,
    /// Callback after creating an authenticator
    Created(Result<(), ApiError>),

    /// Messages of the [`settings::SettingsPage`]
    SettingsPage(settings::Message),
    /// Ask to open the [`settings::SettingsPage`]
    OpenSettingsPage,
}

pub enum Action {
    /// Does nothing
    None,
    /// Ask parent to run an [`iced::Task`]
    Run(Task<Message>),
    /// Add a new [`Toast`] to show
    AddToast(Toast),
    /// Ask parent to run an [`iced::Task`] and add a [`Toast`] to show
    RunAndToast(Task<Message>, Toast),
}

impl Dashboard {
    pub fn new(config: Arc<Mutex<Config>>, api: Arc<ApiClient>) -> (Self, Task<Message>) {
        let clipboard = Clipboard::new();
        if let Err(clip_err) = &clipboard {
            tracing::warn!("Clipboard unavailable: {clip_err}");
        };

        let mut dashboard = Self::with_clipboard(config, api, clipboard.ok());
        let task = dashboard.start();

        (dashboard, task)
    }

    fn with_clipboard(
        config: Arc<Mutex<Config>>,
        api: Arc<ApiClient>,
        clipboard: Option<Clipboard>,
    ) -> Self {
        let settings = config
            .lock()
            .map(|cfg| cfg.clone())
            .unwrap_or_default();

        Self {
            config,
            api,
            clipboard,
            engine: SyncEngine::new(SystemClock, settings.window(), settings.sync.guard_margin),
            subscreen: SubScreen::Home,
            pending_delete: None,
            refresh_handle: None,
            sync_handle: None,
            sync_interval: settings.offset_sync_interval(),
            trigger_delay: settings.trigger_delay(),
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let content: Element<Message> = match &self.subscreen {
            SubScreen::Home => {
                let header = header_view(self.engine.items().len(), self.engine.is_loading());
                let content = if self.engine.is_loading() {
                    container(text("Loading codes...").size(style::font_size::LARGE))
                        .center(Length::Fill)
                        .into()
                } else {
                    content_view(self)
                };

                container(column![header, content])
                    .padding(5.)
                    .width(Length::Fill)
                    .height(Length::Fill)
                    .into()
            }
            SubScreen::AddPage(add_page) => add_page.view().map(Message::AddPage),
            SubScreen::SettingsPage(settings_page) => {
                settings_page.view().map(Message::SettingsPage)
            }
        };

        container(content).center(Length::Fill).into()
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::Tick => match self.engine.tick() {
                Some(ticket) => Action::Run(self.fetch(ticket)),
                None => Action::None,
            },
            Message::SyncClock => Action::Run(self.sync_clock()),
            Message::ClockSynced(local_at_call, result) => {
                self.engine.finish_sync(local_at_call, result);
                Action::None
            }

            Message::Refresh => match self.engine.manual_refresh() {
                Some(ticket) => Action::Run(self.fetch(ticket)),
                None => Action::AddToast(Toast::info_toast("Codes are already refreshing")),
            },
            Message::Refreshed(ticket, result) => {
                let outcome = self.engine.complete_refresh(ticket, result);
                let follow_up = match outcome.next() {
                    Some(next) => self.fetch(next),
                    None => Task::none(),
                };

                match outcome {
                    RefreshOutcome::Applied { .. } => {
                        if let Some(id) = self.pending_delete
                            && !self.engine.items().iter().any(|item| item.id == id)
                        {
                            self.pending_delete = None;
                        }
                        Action::Run(follow_up)
                    }
                    RefreshOutcome::Failed { error, .. } => Action::RunAndToast(
                        follow_up,
                        Toast::error_toast(format!("Failed to load codes: {error}")),
                    ),
                    RefreshOutcome::Discarded => Action::None,
                }
            }

            Message::CopyToClipboard(value) => {
                let Some(clipboard) = &mut self.clipboard else {
                    return Action::AddToast(Toast::error_toast("Clipboard unavailable"));
                };

                match clipboard.set_text(value) {
                    Ok(_) => Action::AddToast(Toast::success_toast("Copied to clipboard")),
                    Err(err) => {
                        Action::AddToast(Toast::error_toast(format!("Failed to copy: {err}")))
                    }
                }
            }
            Message::DeletePressed(id) => {
                if self.pending_delete != Some(id) {
                    self.pending_delete = Some(id);
                    return Action::None;
                }

                self.pending_delete = None;
                tracing::info!("Deleting authenticator {id}");
                let api = Arc::clone(&self.api);
                Action::Run(Task::perform(
                    async move { api.delete_authenticator(id).await },
                    Message::Deleted,
                ))
            }
            Message::CancelDelete => {
                self.pending_delete = None;
                Action::None
            }
            Message::Deleted(result) => {
                let refresh = self.refresh(RefreshMode::Manual);
                match result {
                    Ok(()) => {
                        Action::RunAndToast(refresh, Toast::success_toast("Authenticator deleted"))
                    }
                    Err(err) => Action::RunAndToast(
                        refresh,
                        Toast::error_toast(format!("Failed to delete: {err}")),
                    ),
                }
            }

            Message::AddPage(message) => {
                let SubScreen::AddPage(add_page) = &mut self.subscreen else {
                    return Action::None;
                };

                match add_page.update(message) {
                    add::Action::None => Action::None,
                    add::Action::Back => Action::Run(self.resume()),
                    add::Action::Run(task) => Action::Run(task.map(Message::AddPage)),
                    add::Action::AddToast(toast) => Action::AddToast(toast),
                    add::Action::Create(new) => Action::Run(self.create(new)),
                }
            }
            Message::OpenAddPage => {
                self.suspend();
                let (add_page, task) = add::AddPage::new();
                self.subscreen = SubScreen::AddPage(add_page);
                Action::Run(task.map(Message::AddPage))
            }
            Message::Created(result) => match result {
                Ok(()) => {
                    Action::RunAndToast(self.resume(), Toast::success_toast("Authenticator added"))
                }
                Err(err) => {
                    if let SubScreen::AddPage(add_page) = &mut self.subscreen {
                        add_page.submit_failed();
                    }
                    Action::AddToast(Toast::error_toast(format!("Failed to add: {err}")))
                }
            },

            Message::SettingsPage(message) => {
                let SubScreen::SettingsPage(settings_page) = &mut self.subscreen else {
                    return Action::None;
                };

                match settings_page.update(message) {
                    settings::Action::None => Action::None,
                    settings::Action::Back => Action::Run(self.resume()),
                    settings::Action::Run(task) => Action::Run(task.map(Message::SettingsPage)),
                    settings::Action::AddToast(toast) => Action::AddToast(toast),
                    settings::Action::RunAndToast(task, toast) => {
                        Action::RunAndToast(task.map(Message::SettingsPage), toast)
                    }
                }
            }
            Message::OpenSettingsPage => {
                self.suspend();
                let (settings_page, task) = settings::SettingsPage::new(Arc::clone(&self.config));
                self.subscreen = SubScreen::SettingsPage(settings_page);
                Action::Run(task.map(Message::SettingsPage))
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        match &self.subscreen {
            SubScreen::Home => Subscription::batch([
                iced::time::every(Duration::from_secs(1)).map(|_| Message::Tick),
                iced::time::every(self.sync_interval).map(|_| Message::SyncClock),
                event::listen_with(handle_event),
            ]),
            SubScreen::AddPage(add_page) => add_page.subscription().map(Message::AddPage),
            SubScreen::SettingsPage(_) => Subscription::none(),
        }
    }

    /// Initial load of the home view: a manual refresh and an immediate clock sample
    fn start(&mut self) -> Task<Message> {
        Task::batch([self.refresh(RefreshMode::Manual), self.sync_clock()])
    }

    /// Back to the home view from one of the pages
    fn resume(&mut self) -> Task<Message> {
        self.reconnect_if_changed();
        self.subscreen = SubScreen::Home;
        self.start()
    }

    /// Leaving the home view: every periodic activity and in-flight fetch stops
    fn suspend(&mut self) {
        tracing::debug!("Suspending code board");
        self.engine.cancel_all();
        self.refresh_handle = None;
        self.sync_handle = None;
        self.pending_delete = None;
    }

    /// Picks up a server change made on the settings page
    fn reconnect_if_changed(&mut self) {
        let Ok(settings) = self.config.lock().map(|cfg| cfg.clone()) else {
            return;
        };
        let base_url = settings.server.base_url.trim().trim_end_matches('/');
        if base_url == self.api.base_url() {
            return;
        }

        match ApiClient::new(base_url, settings.request_timeout()) {
            Ok(api) => {
                tracing::info!("Switched to server {}", api.base_url());
                self.api = Arc::new(api);
            }
            Err(err) => tracing::error!("Keeping server {}: {}", self.api.base_url(), err),
        }
    }

    fn refresh(&mut self, mode: RefreshMode) -> Task<Message> {
        match self.engine.request_refresh(mode) {
            Some(ticket) => self.fetch(ticket),
            None => Task::none(),
        }
    }

    /// Runs the listing fetch of `ticket`. An automatic one waits a moment so
    /// the server has rolled over to the new window.
    fn fetch(&mut self, ticket: RefreshTicket) -> Task<Message> {
        let api = Arc::clone(&self.api);
        let delay = fetch_delay(ticket.mode(), self.trigger_delay);

        let (task, handle) = Task::perform(
            async move {
                if !delay.is_zero() {
                    smol::Timer::after(delay).await;
                }
                api.list_authenticators().await
            },
            move |result| Message::Refreshed(ticket, result),
        )
        .abortable();

        self.refresh_handle = Some(handle.abort_on_drop());
        task
    }

    fn sync_clock(&mut self) -> Task<Message> {
        let Some(local_at_call) = self.engine.begin_sync() else {
            return Task::none();
        };

        let api = Arc::clone(&self.api);
        let (task, handle) = Task::perform(
            async move { api.server_time().await },
            move |result| Message::ClockSynced(local_at_call, result),
        )
        .abortable();

        self.sync_handle = Some(handle.abort_on_drop());
        task
    }

    fn create(&self, new: NewAuthenticator) -> Task<Message> {
        tracing::info!("Adding authenticator {}", new.name());
        let api = Arc::clone(&self.api);

        Task::perform(
            async move { api.create_authenticator(&new).await },
            Message::Created,
        )
    }
}

/// View of the header of this screen
/// How long a fetch of `mode` waits before hitting the server
fn fetch_delay(mode: RefreshMode, trigger_delay: Duration) -> Duration {
    match mode {
        RefreshMode::Automatic => trigger_delay,
        RefreshMode::Manual => Duration::ZERO,
    }
}

fn header_view<'a>(count: usize, loading: bool) -> Element<'a, Message> {
    let subtitle = match count {
        1 => String::from("1 authenticator"),
        n => format!("{n} authenticators"),
    };

    row![
        column![
            text("TOTP Board").size(style::font_size::TITLE),
            text(subtitle)
                .size(style::font_size::SMALL)
                .style(style::muted_text),
        ]
        .spacing(style::spacing::TINY),
        space().width(Length::Fill),
        row![
            button(icons::get_icon("view-refresh-symbolic", 21))
                .on_press_maybe((!loading).then_some(Message::Refresh))
                .padding(8)
                .style(style::secondary_button),
            button(icons::get_icon("list-add-symbolic", 21))
                .on_press(Message::OpenAddPage)
                .padding(8)
                .style(style::primary_button),
            button(icons::get_icon("emblem-system-symbolic", 21))
                .on_press(Message::OpenSettingsPage)
                .padding(8)
                .style(style::secondary_button),
        ]
        .spacing(style::spacing::SMALL)
    ]
    .spacing(style::spacing::LARGE)
    .padding(20)
    .align_y(Alignment::Center)
    .width(Length::Fill)
    .into()
}

/// View of the contents of this screen
fn content_view(dashboard: &Dashboard) -> Element<'_, Message> {
    let items = dashboard.engine.items();

    if items.is_empty() {
        return container(
            column![
                text("No authenticators yet").size(style::font_size::TITLE),
                text("Add your first one to get started").size(style::font_size::BODY),
            ]
            .align_x(Alignment::Center)
            .spacing(style::spacing::MEDIUM),
        )
        .center(Length::Fill)
        .into();
    }

    let cards = items.iter().fold(
        Column::new()
            .height(Length::Fill)
            .spacing(style::spacing::MEDIUM)
            .padding(20),
        |col, item| col.push(card_view(dashboard, item)),
    );

    scrollable(cards).height(Length::Fill).into()
}

fn card_view<'a>(dashboard: &Dashboard, item: &'a Authenticator) -> Element<'a, Message> {
    let remaining = dashboard
        .engine
        .countdown(item.id)
        .unwrap_or(dashboard.engine.window().seconds());
    let confirming = dashboard.pending_delete == Some(item.id);

    let delete_button = if confirming {
        button(text("Confirm").size(style::font_size::BODY))
            .on_press(Message::DeletePressed(item.id))
            .padding(8)
            .style(style::danger_button)
    } else {
        button(icons::get_icon("user-trash-full-symbolic", 21))
            .on_press(Message::DeletePressed(item.id))
            .padding(8)
            .style(style::secondary_button)
    };

    container(
        row![
            column![
                text(&item.name).size(style::font_size::LARGE),
                text(&item.email)
                    .size(style::font_size::SMALL)
                    .style(style::muted_text),
            ]
            .spacing(style::spacing::TINY)
            .width(Length::Fill),
            column![
                text(&item.totp_code)
                    .size(style::font_size::HERO)
                    .font(iced::Font::MONOSPACE),
                countdown_badge(remaining, dashboard.engine.is_auto_updating()),
            ]
            .spacing(style::spacing::TINY)
            .align_x(Alignment::End),
            button(icons::get_icon("edit-copy-symbolic", 21))
                .on_press(Message::CopyToClipboard(item.totp_code.clone()))
                .padding(8)
                .style(style::primary_button),
            delete_button,
        ]
        .spacing(style::spacing::SMALL)
        .padding(16)
        .align_y(Alignment::Center),
    )
    .style(style::entry_card)
    .into()
}

//
// SUBSCRIPTIONS
//

fn handle_event(event: event::Event, _: event::Status, _: iced::window::Id) -> Option<Message> {
    match event {
        event::Event::Keyboard(keyboard::Event::KeyPressed {
            key: Key::Named(Named::Escape),
            ..
        }) => Some(Message::CancelDelete),
        event::Event::Keyboard(keyboard::Event::KeyPressed {
            key: Key::Named(Named::F5),
            ..
        }) => Some(Message::Refresh),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::app::widgets::ToastLevel;

    fn dashboard() -> Dashboard {
        let config = Arc::new(Mutex::new(Config::default()));
        let api =
            ApiClient::new("http://127.0.0.1:9/api", Duration::from_secs(1)).expect("client");

        Dashboard::with_clipboard(config, Arc::new(api), None)
    }

    fn snapshot() -> Snapshot {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let item = |id: u64| Authenticator {
            id: AuthenticatorId(id),
            name: format!("item {id}"),
            email: String::from("me@example.com"),
            totp_code: String::from("123456"),
            remaining_time: 12,
        };

        Snapshot {
            items: vec![item(1), item(2)],
            server_time: now,
        }
    }

    /// Loads two items through a manual refresh
    fn loaded() -> Dashboard {
        let mut dashboard = dashboard();
        let ticket = dashboard.engine.manual_refresh().expect("idle");
        assert!(dashboard.engine.is_loading());

        dashboard.update(Message::Refreshed(ticket, Ok(snapshot())));
        assert!(!dashboard.engine.is_loading());
        dashboard
    }

    #[test]
    fn refreshed_snapshot_replaces_items() {
        let dashboard = loaded();

        assert_eq!(dashboard.engine.items().len(), 2);
        assert_eq!(dashboard.engine.countdown(AuthenticatorId(1)), Some(12));
    }

    #[test]
    fn failed_refresh_keeps_items_and_toasts() {
        let mut dashboard = loaded();
        let ticket = dashboard.engine.manual_refresh().expect("idle");

        let action = dashboard.update(Message::Refreshed(
            ticket,
            Err(ApiError::Network(String::from("connection refused"))),
        ));

        assert!(matches!(action, Action::RunAndToast(_, _)));
        assert_eq!(dashboard.engine.items().len(), 2);
        assert!(!dashboard.engine.is_loading());
    }

    #[test]
    fn delete_needs_confirmation() {
        let mut dashboard = loaded();

        assert!(matches!(
            dashboard.update(Message::DeletePressed(AuthenticatorId(1))),
            Action::None
        ));
        assert_eq!(dashboard.pending_delete, Some(AuthenticatorId(1)));

        // pressing another row moves the confirmation there
        dashboard.update(Message::DeletePressed(AuthenticatorId(2)));
        assert_eq!(dashboard.pending_delete, Some(AuthenticatorId(2)));

        assert!(matches!(
            dashboard.update(Message::DeletePressed(AuthenticatorId(2))),
            Action::Run(_)
        ));
        assert_eq!(dashboard.pending_delete, None);
    }

    #[test]
    fn escape_cancels_delete() {
        let mut dashboard = loaded();

        dashboard.update(Message::DeletePressed(AuthenticatorId(1)));
        dashboard.update(Message::CancelDelete);

        assert_eq!(dashboard.pending_delete, None);
    }

    #[test]
    fn leaving_home_tears_down_and_drops_late_results() {
        let mut dashboard = loaded();
        let ticket = dashboard.engine.manual_refresh().expect("idle");

        dashboard.update(Message::OpenSettingsPage);
        assert!(matches!(dashboard.subscreen, SubScreen::SettingsPage(_)));
        assert!(!dashboard.engine.is_loading());

        let action = dashboard.update(Message::Refreshed(ticket, Ok(Snapshot::default())));
        assert!(matches!(action, Action::None));
        assert_eq!(dashboard.engine.items().len(), 2);
    }

    #[test]
    fn returning_home_starts_manual_refresh() {
        let mut dashboard = loaded();

        dashboard.update(Message::OpenAddPage);
        dashboard.update(Message::AddPage(add::Message::Back));

        assert!(matches!(dashboard.subscreen, SubScreen::Home));
        assert!(dashboard.engine.is_loading());
    }

    #[test]
    fn failed_create_stays_on_add_page() {
        let mut dashboard = loaded();
        dashboard.update(Message::OpenAddPage);

        let action = dashboard.update(Message::Created(Err(ApiError::Rejected(String::from(
            "Invalid secret key",
        )))));

        assert!(matches!(action, Action::AddToast(_)));
        assert!(matches!(dashboard.subscreen, SubScreen::AddPage(_)));
    }

    #[test]
    fn copy_without_clipboard_reports_error() {
        let mut dashboard = loaded();

        assert!(matches!(
            dashboard.update(Message::CopyToClipboard(String::from("123456"))),
            Action::AddToast(_)
        ));
    }

    #[test]
    fn server_change_is_picked_up_on_return() {
        let mut dashboard = loaded();

        dashboard.update(Message::OpenSettingsPage);
        if let Ok(mut cfg) = dashboard.config.lock() {
            cfg.server.base_url = String::from("http://10.0.0.2:5000/api/");
        }
        dashboard.update(Message::SettingsPage(settings::Message::Back));

        assert_eq!(dashboard.api.base_url(), "http://10.0.0.2:5000/api");
    }

    #[test]
    fn only_automatic_fetches_wait_for_the_rollover() {
        let dashboard = dashboard();

        assert_eq!(
            fetch_delay(RefreshMode::Automatic, dashboard.trigger_delay),
            Duration::from_millis(50)
        );
        assert_eq!(fetch_delay(RefreshMode::Manual, dashboard.trigger_delay), Duration::ZERO);
    }

    #[test]
    fn refresh_while_busy_only_informs() {
        let mut dashboard = loaded();
        let ticket = dashboard.engine.manual_refresh().expect("idle");

        let Action::AddToast(toast) = dashboard.update(Message::Refresh) else {
            panic!("expected a toast");
        };
        assert_eq!(toast.level(), ToastLevel::Info);

        // the running fetch still owns the result
        dashboard.update(Message::Refreshed(ticket, Ok(snapshot())));
        assert!(!dashboard.engine.is_loading());
    }
}
