//! Gmail v1 message sending.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lettre::Message;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use log::info;
use serde_json::json;

use crate::backend::Mailer;
use crate::backend::error::BackendError;
use crate::google::GoogleClient;
use crate::model::EmailMessage;

pub struct GmailClient {
    base: Arc<GoogleClient>,
    pub api_url: String,
    from: Mailbox,
}

impl GmailClient {
    /// `from` must be the authenticated mailbox or one of its send-as aliases.
    pub fn new(base: Arc<GoogleClient>, api_url: &str, from: &str) -> Result<Self, BackendError> {
        Ok(Self {
            base,
            api_url: api_url.trim_end_matches('/').to_string(),
            from: from.parse()?,
        })
    }
}

/// Builds a plain-text MIME message. Fails when the recipient is not a single valid address.
pub fn to_mime(message: &EmailMessage, from: &Mailbox) -> Result<Message, BackendError> {
    let to: Mailbox = message.to.parse()?;
    Ok(Message::builder()
        .from(from.clone())
        .to(to)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())?)
}

#[async_trait]
impl Mailer for GmailClient {
    async fn send_email(&self, message: EmailMessage) -> Result<(), BackendError> {
        let raw = URL_SAFE_NO_PAD.encode(to_mime(&message, &self.from)?.formatted());
        let request = self
            .base
            .http()
            .post(format!("{}/gmail/v1/users/me/messages/send", self.api_url));
        self.base
            .send_json(request, Some(&json!({ "raw": raw })))
            .await?;
        info!("Sent \"{}\" to {}", message.subject, message.to);
        Ok(())
    }
}
