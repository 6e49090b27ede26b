// SPDX-License-Identifier: GPL-3.0-only

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "totp_board=info";

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// default filter.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    if let Err(err) = result {
        eprintln!("Failed to install logger: {err}");
    }
}
