//! Clients for the Google Sheets, Drive and Gmail REST APIs.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::Quota;
use governor::RateLimiter;
use governor::clock::QuantaClock;
use governor::state::InMemoryState;
use governor::state::direct::NotKeyed;
use log::debug;
use log::info;
use serde_json::Value;
use wreq::Client;
use wreq::header::AUTHORIZATION;
use wreq::header::CONTENT_TYPE;
use wreq::header::HeaderMap;
use wreq::header::HeaderValue;
use wreq::header::USER_AGENT;

use crate::backend::error::BackendError;
use crate::google::auth::TokenSource;

pub mod auth;
pub mod drive;
pub mod gmail;
pub mod sheets;

/// Authenticated, rate-limited HTTP client shared by the three API clients.
///
/// All APIs draw from one limiter so the combined request rate stays under
/// the project quota.
pub struct GoogleClient {
    client: Client,
    limiter: RateLimiter<NotKeyed, InMemoryState, QuantaClock>,
    tokens: Arc<dyn TokenSource>,
}

impl GoogleClient {
    pub fn new(
        tokens: Arc<dyn TokenSource>,
        requests_per_second: u32,
    ) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("finz-requests/0.1"));
        let client = Client::builder().default_headers(headers).build()?;

        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            limiter,
            tokens,
        })
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Sends `request` with a bearer token and optional JSON body, returning
    /// the parsed response. An empty response body yields `Value::Null`.
    pub async fn send_json(
        &self,
        request: wreq::RequestBuilder,
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        if self.limiter.check().is_err() {
            info!("Google API is ratelimited. Waiting...");
        }
        self.limiter.until_ready().await;

        let token = self.tokens.access_token().await?;
        let mut request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_string(body)?);
        }

        let req = request.build()?;
        debug!("Making {} request to: {}", req.method(), req.url());
        let response = self.client.execute(req).await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::ApiError {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Pulls `error.message` out of a Google error envelope, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Extracts a string field from a JSON response.
fn get_str<'a>(resp: &'a Value, field: &str) -> Result<&'a str, BackendError> {
    resp.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| BackendError::MissingField {
            field: field.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        assert_eq!(error_message(body), "Requested entity was not found.");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
