// SPDX-License-Identifier: GPL-3.0-only

use iced::widget::{button, container, text};
use iced::{Border, Theme};

/// Standard spacing values
pub mod spacing {
    pub const TINY: f32 = 4.0;
    pub const SMALL: f32 = 8.0;
    pub const MEDIUM: f32 = 12.0;
    pub const LARGE: f32 = 16.0;
    pub const XLARGE: f32 = 20.0;
}

/// Standard border radius values
pub mod radius {
    pub const SMALL: f32 = 6.0;
    pub const MEDIUM: f32 = 8.0;
}

/// Standard font sizes
pub mod font_size {
    pub const SMALL: f32 = 12.0;
    pub const BODY: f32 = 14.0;
    pub const MEDIUM: f32 = 16.0;
    pub const LARGE: f32 = 18.0;
    pub const TITLE: f32 = 24.0;
    pub const HERO: f32 = 28.0;
}

/// One authenticator row
pub fn entry_card(theme: &Theme) -> container::Style {
    container::Style {
        background: Some(theme.palette().background.into()),
        border: Border {
            color: theme.palette().text.scale_alpha(0.1),
            width: 1.0,
            radius: radius::MEDIUM.into(),
        },
        ..Default::default()
    }
}

/// Full width form submit button
pub fn primary_submit_button(theme: &Theme, status: button::Status) -> button::Style {
    rounded(button::primary(theme, status), radius::MEDIUM)
}

pub fn primary_button(theme: &Theme, status: button::Status) -> button::Style {
    rounded(button::primary(theme, status), radius::SMALL)
}

pub fn secondary_button(theme: &Theme, status: button::Status) -> button::Style {
    rounded(button::secondary(theme, status), radius::SMALL)
}

/// Delete confirmation
pub fn danger_button(theme: &Theme, status: button::Status) -> button::Style {
    rounded(button::danger(theme, status), radius::SMALL)
}

fn rounded(style: button::Style, radius: f32) -> button::Style {
    button::Style {
        border: Border {
            radius: radius.into(),
            ..style.border
        },
        ..style
    }
}

/// Label text style (subdued color)
pub fn label_text(theme: &Theme) -> text::Style {
    text::Style {
        color: Some(theme.palette().text.scale_alpha(0.8)),
    }
}

/// Muted text style (for hints, subtitles, etc.)
pub fn muted_text(theme: &Theme) -> text::Style {
    text::Style {
        color: Some(theme.palette().text.scale_alpha(0.6)),
    }
}
