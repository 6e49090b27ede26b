// SPDX-License-Identifier: GPL-3.0-only

use iced::{
    Alignment, Element,
    Length::{self},
    Subscription, Task, event,
    keyboard::{self, Key, Modifiers, key::Named},
    widget::{
        button, column, container,
        operation::{focus_next, focus_previous},
        row, scrollable, space, text, text_input,
    },
};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    app::{
        core::NewAuthenticator,
        utils::{InputableAuthenticator, style},
        widgets::Toast,
    },
    icons,
};

pub struct AddPage {
    form: InputableAuthenticator,
    /// A create request for this form is in flight
    submitting: bool,
}

#[derive(Debug, Clone)]
pub enum Message {
    /// Callback after pressing a [`Hotkey`] of this page
    Hotkey(Hotkey),
    /// Go back a screen
    Back,
    /// Input update of the various available fields
    InputUpdated(AuthenticatorInput),
    /// Submit the form
    Submit,
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
    /// Ask the parent to send the given [`NewAuthenticator`] to the server
    Create(NewAuthenticator),
}

#[derive(Debug, Clone)]
pub enum AuthenticatorInput {
    Name(String),
    Email(String),
    Secret(String),
}

impl AddPage {
    pub fn new() -> (Self, Task<Message>) {
        (
            Self {
                form: InputableAuthenticator::default(),
                submitting: false,
            },
            Task::none(),
        )
    }

    pub fn view(&self) -> Element<'_, Message> {
        container(
            container(column![header_view(), form_view(&self.form, self.submitting)])
                .padding(5.)
                .width(Length::Fill)
                .height(Length::Fill),
        )
        .center(Length::Fill)
        .into()
    }

    pub fn update(&mut self, message: Message) -> Action {
        match message {
            Message::Hotkey(hotkey) => match hotkey {
                Hotkey::Tab(modifiers) => {
                    if modifiers.shift() {
                        Action::Run(focus_previous())
                    } else {
                        Action::Run(focus_next())
                    }
                }
                Hotkey::Esc => Action::Back,
                Hotkey::Enter => self.update(Message::Submit),
            },
            Message::Back => Action::Back,

            Message::InputUpdated(input) => {
                match input {
                    AuthenticatorInput::Name(v) => self.form.name = v,
                    AuthenticatorInput::Email(v) => self.form.email = v,
                    AuthenticatorInput::Secret(v) => self.form.secret = SecretString::from(v),
                }
                Action::None
            }
            Message::Submit => {
                if self.submitting {
                    return Action::None;
                }

                match NewAuthenticator::try_from(&self.form) {
                    Ok(new) => {
                        self.submitting = true;
                        Action::Create(new)
                    }
                    Err(err) => Action::AddToast(Toast::error_toast(err)),
                }
            }
        }
    }

    /// The server refused the last submission, the form can be sent again
    pub fn submit_failed(&mut self) {
        self.submitting = false;
    }

    pub fn subscription(&self) -> Subscription<Message> {
        event::listen_with(handle_event)
    }
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
            text("New Authenticator").size(style::font_size::TITLE),
            text("The server generates the codes")
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

fn form_view<'a>(form: &'a InputableAuthenticator, submitting: bool) -> Element<'a, Message> {
    let button_text = if submitting {
        "Adding..."
    } else {
        "Add Authenticator"
    };

    let form = column![
        column![
            text("Name")
                .size(style::font_size::BODY)
                .style(style::label_text),
            text_input("e.g., GitHub", &form.name)
                .on_input(|v| Message::InputUpdated(AuthenticatorInput::Name(v)))
                .on_submit(Message::Submit)
                .padding(12)
                .size(style::font_size::MEDIUM)
        ]
        .spacing(style::spacing::TINY),
        column![
            text("Email")
                .size(style::font_size::BODY)
                .style(style::label_text),
            text_input("e.g., user@example.com", &form.email)
                .on_input(|v| Message::InputUpdated(AuthenticatorInput::Email(v)))
                .on_submit(Message::Submit)
                .padding(12)
                .size(style::font_size::MEDIUM)
        ]
        .spacing(style::spacing::TINY),
        column![
            text("Secret Key")
                .size(style::font_size::BODY)
                .style(style::label_text),
            text_input("Base32 secret", form.secret.expose_secret())
                .on_input(|v| Message::InputUpdated(AuthenticatorInput::Secret(v)))
                .on_submit(Message::Submit)
                .secure(true)
                .padding(12)
                .size(style::font_size::MEDIUM)
        ]
        .spacing(style::spacing::TINY),
        button(
            text(button_text)
                .size(style::font_size::MEDIUM)
                .width(Length::Fill)
                .align_x(Alignment::Center)
        )
        .on_press_maybe((form.valid() && !submitting).then_some(Message::Submit))
        .padding(16)
        .width(Length::Fill)
        .style(style::primary_submit_button),
    ]
    .spacing(style::spacing::XLARGE)
    .padding(10)
    .max_width(600);

    scrollable(container(form).center_x(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

//
// SUBSCRIPTIONS
//

#[derive(Debug, Clone)]
pub enum Hotkey {
    Tab(Modifiers),
    Esc,
    Enter,
}

fn handle_event(
    event: event::Event,
    status: event::Status,
    _: iced::window::Id,
) -> Option<Message> {
    let event::Event::Keyboard(keyboard::Event::KeyPressed { key, modifiers, .. }) = event else {
        return None;
    };

    match key {
        Key::Named(Named::Tab) => Some(Message::Hotkey(Hotkey::Tab(modifiers))),
        Key::Named(Named::Escape) => Some(Message::Hotkey(Hotkey::Esc)),
        // a focused input already submits through `on_submit`
        Key::Named(Named::Enter) if status == event::Status::Ignored => {
            Some(Message::Hotkey(Hotkey::Enter))
        }
        _ => None,
    }
}
