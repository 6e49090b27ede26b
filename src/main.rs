// SPDX-License-Identifier: GPL-3.0-only

use app::TotpBoard;
use iced::Font;

mod app;
mod config;
mod icons;
mod logging;

pub const APP_ID: &str = "dev.totpboard.TotpBoard";

fn main() -> iced::Result {
    logging::init();
    icons::init();
    tracing::info!("Starting {} {}", APP_ID, env!("CARGO_PKG_VERSION"));

    iced::application::timed(
        TotpBoard::new,
        TotpBoard::update,
        TotpBoard::subscription,
        TotpBoard::view,
    )
    .theme(TotpBoard::theme)
    .title("TOTP Board")
    .default_font(Font::MONOSPACE)
    .window_size((480., 720.))
    .run()
}
