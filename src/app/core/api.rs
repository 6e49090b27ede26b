// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::authenticator::{Authenticator, AuthenticatorId, NewAuthenticator, Snapshot};

/// Everything that can go wrong talking to the code server.
///
/// Cloneable so results can travel inside UI messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Transport failure, including the request timeout expiring
    #[error("Network error: {0}")]
    Network(String),
    /// Non-success status that did not carry a usable envelope
    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Not found")]
    NotFound,
    /// The server understood the request and refused it (validation etc.)
    #[error("{0}")]
    Rejected(String),
    /// Undecodable body or a required field missing
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Every response of the server is wrapped in this envelope
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    server_time: Option<i64>,
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    name: &'a str,
    email: &'a str,
    secret_key: &'a str,
}

/// HTTP client for the code server
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for `base_url` (e.g. `http://localhost:5000/api`).
    /// Every request gives up after `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Reads the server clock, in unix seconds.
    ///
    /// Servers without a dedicated time endpoint still stamp their listings,
    /// so a 404 falls back to the listing's timestamp.
    pub async fn server_time(&self) -> Result<i64, ApiError> {
        match self.send(self.http.get(self.url("time"))).await {
            Ok(envelope) => require_server_time(&envelope),
            Err(ApiError::NotFound) => {
                tracing::debug!("No time endpoint on {}, using the listing", self.base_url);
                self.list_authenticators()
                    .await
                    .map(|snapshot| snapshot.server_time)
            }
            Err(err) => Err(err),
        }
    }

    /// Fetches every authenticator with its current code
    pub async fn list_authenticators(&self) -> Result<Snapshot, ApiError> {
        let envelope = self.send(self.http.get(self.url("authenticators"))).await?;
        parse_snapshot(envelope)
    }

    pub async fn create_authenticator(&self, new: &NewAuthenticator) -> Result<(), ApiError> {
        let body = CreateRequest {
            name: new.name(),
            email: new.email(),
            secret_key: new.secret(),
        };

        self.send(self.http.post(self.url("authenticators")).json(&body))
            .await
            .map(|_| ())
    }

    pub async fn delete_authenticator(&self, id: AuthenticatorId) -> Result<(), ApiError> {
        self.send(self.http.delete(self.url(&format!("authenticators/{id}"))))
            .await
            .map(|_| ())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Envelope, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        decode_envelope(status, &body)
    }
}

/// Maps a raw response onto the error taxonomy
fn decode_envelope(status: StatusCode, body: &str) -> Result<Envelope, ApiError> {
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound);
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) if envelope.success && status.is_success() => Ok(envelope),
        Ok(envelope) if status.is_server_error() => Err(ApiError::Status {
            status: status.as_u16(),
            message: envelope.error.unwrap_or_default(),
        }),
        Ok(envelope) => Err(ApiError::Rejected(
            envelope
                .error
                .unwrap_or_else(|| String::from("Request failed")),
        )),
        Err(_) if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            message: status.canonical_reason().unwrap_or_default().to_string(),
        }),
        Err(err) => Err(ApiError::Malformed(err.to_string())),
    }
}

fn require_server_time(envelope: &Envelope) -> Result<i64, ApiError> {
    envelope
        .server_time
        .ok_or_else(|| ApiError::Malformed(String::from("missing server_time")))
}

fn parse_snapshot(envelope: Envelope) -> Result<Snapshot, ApiError> {
    let server_time = require_server_time(&envelope)?;
    let data = envelope
        .data
        .ok_or_else(|| ApiError::Malformed(String::from("missing data")))?;
    let items: Vec<Authenticator> =
        serde_json::from_value(data).map_err(|e| ApiError::Malformed(e.to_string()))?;

    Ok(Snapshot { items, server_time })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "success": true,
        "server_time": 1700000010,
        "data": [
            {"id": 1, "name": "GitHub", "email": "a@b.c", "totp_code": "123456", "remaining_time": 20, "server_time": 1700000010},
            {"id": 2, "name": "Mail", "email": "d@e.f", "totp_code": "Error", "remaining_time": 0, "server_time": 1700000010}
        ]
    }"#;

    fn decode_snapshot(status: StatusCode, body: &str) -> Result<Snapshot, ApiError> {
        decode_envelope(status, body).and_then(parse_snapshot)
    }

    #[test]
    fn listing_decodes_into_snapshot() {
        let snapshot = decode_snapshot(StatusCode::OK, LISTING).expect("valid listing");

        assert_eq!(snapshot.server_time, 1_700_000_010);
        assert_eq!(snapshot.items.len(), 2);
        assert_eq!(snapshot.items[0].id, AuthenticatorId(1));
        assert_eq!(snapshot.items[1].totp_code, "Error");
    }

    #[test]
    fn listing_without_server_time_is_malformed() {
        let body = r#"{"success": true, "data": []}"#;

        assert!(matches!(
            decode_snapshot(StatusCode::OK, body),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn listing_with_missing_item_fields_is_malformed() {
        let body = r#"{"success": true, "server_time": 1, "data": [{"id": 1, "name": "x"}]}"#;

        assert!(matches!(
            decode_snapshot(StatusCode::OK, body),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert!(matches!(
            decode_envelope(StatusCode::OK, "<html>oops</html>"),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn validation_failure_is_rejected_with_server_message() {
        let body = r#"{"success": false, "error": "Invalid secret key format"}"#;

        assert_eq!(
            decode_envelope(StatusCode::BAD_REQUEST, body).err(),
            Some(ApiError::Rejected(String::from("Invalid secret key format")))
        );
    }

    #[test]
    fn server_failure_keeps_status_and_message() {
        let body = r#"{"success": false, "error": "database gone"}"#;

        assert_eq!(
            decode_envelope(StatusCode::INTERNAL_SERVER_ERROR, body).err(),
            Some(ApiError::Status {
                status: 500,
                message: String::from("database gone"),
            })
        );
    }

    #[test]
    fn html_error_page_maps_to_status() {
        assert!(matches!(
            decode_envelope(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            Err(ApiError::Status { status: 502, .. })
        ));
    }

    #[test]
    fn missing_resource_is_not_found() {
        assert_eq!(
            decode_envelope(StatusCode::NOT_FOUND, "<html>404</html>").err(),
            Some(ApiError::NotFound)
        );
    }

    #[test]
    fn time_envelope_requires_server_time() {
        let ok = decode_envelope(StatusCode::OK, r#"{"success": true, "server_time": 42}"#)
            .expect("valid envelope");
        assert_eq!(require_server_time(&ok), Ok(42));

        let missing = decode_envelope(StatusCode::OK, r#"{"success": true}"#)
            .expect("valid envelope");
        assert!(matches!(
            require_server_time(&missing),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = ApiClient::new(" http://localhost:5000/api/ ", Duration::from_secs(1))
            .expect("client builds");

        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(
            client.url("authenticators"),
            "http://localhost:5000/api/authenticators"
        );
    }
}
