//! Outbound notification seam
//!
//! Actual delivery (SMTP, provider API) is an external collaborator; this
//! crate only hands a finished message across the trait.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A message handed to the delivery collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery seam for feedback and similar one-shot sends
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> anyhow::Result<()>;
}

/// Logs the message instead of delivering it; the development default
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: OutboundMessage) -> anyhow::Result<()> {
        tracing::info!(
            to = %message.to,
            reply_to = %message.reply_to,
            subject = %message.subject,
            "outbound notification (log-only delivery)"
        );
        Ok(())
    }
}

/// Captures messages for inspection in tests
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages handed over so far
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: OutboundMessage) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|e| anyhow::anyhow!("notifier lock poisoned: {e}"))?
            .push(message);
        Ok(())
    }
}
