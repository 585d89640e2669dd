//! SendGrid v3 `mail/send` transport.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use courier_common::config::AppConfig;
use courier_common::error::TransportError;
use courier_common::types::NotificationDocument;

use crate::Transport;

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    mime: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct MailSend<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Address<'a>>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

impl<'a> MailSend<'a> {
    fn from_document(document: &'a NotificationDocument) -> Self {
        let to: Vec<Address<'a>> = document
            .to
            .iter()
            .map(|email| Address { email })
            .collect();
        // SendGrid rejects an address that appears in both `to` and `cc`.
        let cc = document
            .cc
            .iter()
            .filter(|email| !document.to.iter().any(|t| t.eq_ignore_ascii_case(email)))
            .map(|email| Address { email })
            .collect();

        Self {
            personalizations: vec![Personalization { to, cc }],
            from: Address {
                email: &document.from,
            },
            reply_to: document.reply_to.as_deref().map(|email| Address { email }),
            subject: &document.subject,
            content: vec![
                Content {
                    mime: "text/plain",
                    value: &document.text,
                },
                Content {
                    mime: "text/html",
                    value: &document.html,
                },
            ],
        }
    }
}

/// Sends documents through SendGrid's HTTP API.
#[derive(Clone)]
pub struct SendGridTransport {
    client: Client,
    api_url: String,
    api_key: String,
}

impl SendGridTransport {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from configuration. Fails when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, TransportError> {
        let api_key = config
            .sendgrid_api_key
            .clone()
            .ok_or_else(|| TransportError::NotConfigured("SENDGRID_API_KEY is not set".into()))?;
        Ok(Self::new(config.sendgrid_api_url.clone(), api_key))
    }
}

#[async_trait]
impl Transport for SendGridTransport {
    async fn send(&self, document: &NotificationDocument) -> Result<(), TransportError> {
        let payload = MailSend::from_document(document);
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|b| !b.is_empty());
            return Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(unit = %document.unit, status = status.as_u16(), "Email accepted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sendgrid"
    }
}
