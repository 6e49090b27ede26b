// SPDX-License-Identifier: GPL-3.0-only

use std::fmt::Display;
use std::time::Duration;

use iced::time::Instant;
use iced::widget::{Column, container, mouse_area, text};
use iced::{Alignment, Border, Element, Length, Theme};

use crate::app::utils::style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

/// A short notification shown over the current screen
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    level: ToastLevel,
    message: String,
}

impl Toast {
    pub fn new(level: ToastLevel, message: impl Display) -> Self {
        Self {
            level,
            message: message.to_string(),
        }
    }

    pub fn info_toast(message: impl Display) -> Self {
        Self::new(ToastLevel::Info, message)
    }

    pub fn success_toast(message: impl Display) -> Self {
        Self::new(ToastLevel::Success, message)
    }

    pub fn error_toast(message: impl Display) -> Self {
        Self::new(ToastLevel::Error, message)
    }

    pub fn level(&self) -> ToastLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
struct Shown {
    id: u64,
    toast: Toast,
    expires_at: Instant,
}

/// Stack of visible toasts, oldest first
#[derive(Debug)]
pub struct Toasts {
    next_id: u64,
    duration: Duration,
    shown: Vec<Shown>,
}

impl Toasts {
    pub fn new(duration: Duration) -> Self {
        Self {
            next_id: 0,
            duration,
            shown: Vec::new(),
        }
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn push(&mut self, toast: Toast, now: Instant) {
        match toast.level {
            ToastLevel::Error => tracing::error!("{}", toast.message),
            ToastLevel::Info | ToastLevel::Success => tracing::debug!("{}", toast.message),
        }

        self.next_id += 1;
        self.shown.push(Shown {
            id: self.next_id,
            toast,
            expires_at: now + self.duration,
        });
    }

    /// Drops every toast whose time is up
    pub fn expire(&mut self, now: Instant) {
        self.shown.retain(|shown| shown.expires_at > now);
    }

    pub fn dismiss(&mut self, id: u64) {
        self.shown.retain(|shown| shown.id != id);
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.shown.len()
    }

    pub fn view<'a, Message: Clone + 'a>(
        &'a self,
        on_dismiss: fn(u64) -> Message,
    ) -> Element<'a, Message> {
        let stack = self.shown.iter().fold(
            Column::new()
                .spacing(style::spacing::SMALL)
                .align_x(Alignment::Center),
            |col, shown| {
                let level = shown.toast.level();
                let card = container(text(shown.toast.message()).size(style::font_size::BODY))
                    .padding(12)
                    .max_width(360.0)
                    .style(move |theme| toast_container(theme, level));

                col.push(mouse_area(card).on_press(on_dismiss(shown.id)))
            },
        );

        container(stack)
            .padding(20)
            .center_x(Length::Fill)
            .align_bottom(Length::Fill)
            .into()
    }
}

fn toast_container(theme: &Theme, level: ToastLevel) -> container::Style {
    let palette = theme.palette();
    let accent = match level {
        ToastLevel::Info => palette.primary,
        ToastLevel::Success => palette.success,
        ToastLevel::Error => palette.danger,
    };

    container::Style {
        background: Some(palette.background.into()),
        text_color: Some(palette.text),
        border: Border {
            color: accent,
            width: 2.0,
            radius: style::radius::MEDIUM.into(),
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_expire_after_duration() {
        let start = Instant::now();
        let mut toasts = Toasts::new(Duration::from_secs(3));

        toasts.push(Toast::success_toast("Copied to clipboard"), start);
        toasts.push(Toast::error_toast("Failed"), start + Duration::from_secs(2));

        toasts.expire(start + Duration::from_secs(2));
        assert_eq!(toasts.len(), 2);

        toasts.expire(start + Duration::from_secs(3));
        assert_eq!(toasts.len(), 1);

        toasts.expire(start + Duration::from_secs(5));
        assert!(toasts.is_empty());
    }

    #[test]
    fn dismiss_removes_only_that_toast() {
        let now = Instant::now();
        let mut toasts = Toasts::new(Duration::from_secs(3));

        toasts.push(Toast::info_toast("one"), now);
        toasts.push(Toast::info_toast("two"), now);
        let first = toasts.shown[0].id;

        toasts.dismiss(first);

        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts.shown[0].toast.message(), "two");
    }

    #[test]
    fn error_toast_keeps_message() {
        let toast = Toast::error_toast(format!("Server unreachable: {}", 503));

        assert_eq!(toast.level(), ToastLevel::Error);
        assert_eq!(toast.message(), "Server unreachable: 503");
    }
}
