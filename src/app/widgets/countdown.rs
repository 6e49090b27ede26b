// SPDX-License-Identifier: GPL-3.0-only

use iced::advanced::layout::{self, Layout};
use iced::advanced::renderer::{self, Renderer as _};
use iced::advanced::widget::{self, Tree, Widget};
use iced::mouse;
use iced::widget::{row, text};
use iced::{Alignment, Border, Color, Element, Length, Rectangle, Renderer, Size, Theme};

use crate::app::utils::style;

const BADGE_SIZE: f32 = 12.0;
const DIMMED_ALPHA: f32 = 0.35;

/// Filled circle coloured by how close the code is to rotating
pub struct Badge {
    remaining: u64,
    dimmed: bool,
}

impl Badge {
    pub fn new(remaining: u64, dimmed: bool) -> Self {
        Self { remaining, dimmed }
    }

    fn color(&self, theme: &Theme) -> Color {
        let palette = theme.palette();

        let color = if self.remaining > 10 {
            palette.success
        } else if self.remaining > 5 {
            palette.warning
        } else {
            palette.danger
        };

        if self.dimmed {
            color.scale_alpha(DIMMED_ALPHA)
        } else {
            color
        }
    }
}

impl<Message> Widget<Message, Theme, Renderer> for Badge {
    fn size(&self) -> Size<Length> {
        Size {
            width: Length::Fixed(BADGE_SIZE),
            height: Length::Fixed(BADGE_SIZE),
        }
    }

    fn layout(
        &mut self,
        _tree: &mut Tree,
        _renderer: &Renderer,
        _limits: &layout::Limits,
    ) -> layout::Node {
        layout::Node::new(Size::new(BADGE_SIZE, BADGE_SIZE))
    }

    fn draw(
        &self,
        _tree: &Tree,
        renderer: &mut Renderer,
        theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        let center = layout.bounds().center();
        let radius = BADGE_SIZE / 2.0;

        renderer.fill_quad(
            renderer::Quad {
                bounds: Rectangle {
                    x: center.x - radius,
                    y: center.y - radius,
                    width: BADGE_SIZE,
                    height: BADGE_SIZE,
                },
                border: Border {
                    radius: radius.into(),
                    ..Default::default()
                },
                ..Default::default()
            },
            self.color(theme),
        );
    }

    fn tag(&self) -> widget::tree::Tag {
        struct Marker;
        widget::tree::Tag::of::<Marker>()
    }

    fn state(&self) -> widget::tree::State {
        widget::tree::State::None
    }
}

impl<'a, Message> From<Badge> for Element<'a, Message>
where
    Message: 'a,
{
    fn from(badge: Badge) -> Self {
        Element::new(badge)
    }
}

/// Badge followed by the seconds left. `dimmed` while the codes are being
/// swapped for the ones of the next window.
pub fn countdown_badge<'a, Message: 'a>(remaining: u64, dimmed: bool) -> Element<'a, Message> {
    let label = text(format!("{remaining}s"))
        .size(style::font_size::SMALL)
        .style(move |theme| {
            if dimmed {
                style::muted_text(theme)
            } else {
                style::label_text(theme)
            }
        });

    row![Badge::new(remaining, dimmed), label]
        .spacing(style::spacing::TINY)
        .align_y(Alignment::Center)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_follows_remaining_seconds() {
        let theme = Theme::CatppuccinMocha;
        let palette = theme.palette();

        assert_eq!(Badge::new(30, false).color(&theme), palette.success);
        assert_eq!(Badge::new(11, false).color(&theme), palette.success);
        assert_eq!(Badge::new(10, false).color(&theme), palette.warning);
        assert_eq!(Badge::new(6, false).color(&theme), palette.warning);
        assert_eq!(Badge::new(5, false).color(&theme), palette.danger);
        assert_eq!(Badge::new(1, false).color(&theme), palette.danger);
    }

    #[test]
    fn dimmed_badge_keeps_hue() {
        let theme = Theme::CatppuccinMocha;
        let palette = theme.palette();

        let dimmed = Badge::new(20, true).color(&theme);

        assert_eq!(dimmed, palette.success.scale_alpha(DIMMED_ALPHA));
        assert!(dimmed.a < palette.success.a);
    }
}
