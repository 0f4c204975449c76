//! Outbound notifications.
//!
//! Delivery is never part of a business operation: callers hand the message to
//! [`dispatch`], which sends it on a background task and only logs failures.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub mod otp;

pub use otp::OtpStore;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("publish failed: {0}")]
    Publish(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: Notification) -> Result<(), NotifyError>;
}

/// Writes messages to the log; used when no mail relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: Notification) -> Result<(), NotifyError> {
        tracing::info!(recipient = %message.recipient, subject = %message.subject, body = %message.body, "notification (log only)");
        Ok(())
    }
}

/// Publishes JSON-encoded notifications for an external mailer.
#[derive(Clone)]
pub struct NatsNotifier {
    client: async_nats::Client,
    subject: String,
}

impl NatsNotifier {
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
        Self { client, subject: subject.into() }
    }
}

#[async_trait]
impl Notifier for NatsNotifier {
    async fn send(&self, message: Notification) -> Result<(), NotifyError> {
        let payload = serde_json::to_vec(&message)?;
        self.client
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| NotifyError::Publish(e.to_string()))
    }
}

/// Fire-and-forget send.
pub fn dispatch(notifier: Arc<dyn Notifier>, message: Notification) {
    tokio::spawn(async move {
        let recipient = message.recipient.clone();
        if let Err(e) = notifier.send(message).await {
            tracing::warn!(%recipient, error = %e, "notification delivery failed");
        }
    });
}

pub fn order_accepted(recipient: &str, order_id: &str) -> Notification {
    Notification {
        recipient: recipient.to_string(),
        subject: format!("Your order {order_id} has been accepted - EazzyMart"),
        body: format!("Good news! Your order {order_id} has been accepted and is now being prepared."),
    }
}

pub fn otp_code(recipient: &str, code: &str, ttl_minutes: u64) -> Notification {
    Notification {
        recipient: recipient.to_string(),
        subject: "Your OTP Code - EazzyMart".to_string(),
        body: format!("Your OTP code is {code}. This code will expire in {ttl_minutes} minutes."),
    }
}
