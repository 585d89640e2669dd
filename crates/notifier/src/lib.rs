//! Notification delivery.
//!
//! Rendered documents are handed to a [`Transport`]. The only production
//! transport is SendGrid's v3 mail API.

pub mod sendgrid;

use async_trait::async_trait;

use courier_common::error::TransportError;
use courier_common::types::NotificationDocument;

pub use sendgrid::SendGridTransport;

/// Delivers a rendered notification document.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, document: &NotificationDocument) -> Result<(), TransportError>;

    /// Human-readable name for logs (e.g. "sendgrid").
    fn name(&self) -> &'static str;
}
