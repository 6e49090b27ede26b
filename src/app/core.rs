// SPDX-License-Identifier: GPL-3.0-only

mod api;
mod authenticator;
pub mod sync;

pub use api::ApiClient;
pub use api::ApiError;
pub use authenticator::Authenticator;
pub use authenticator::AuthenticatorId;
pub use authenticator::NewAuthenticator;
pub use authenticator::Snapshot;
