//! Outbound message types and the notify channel abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;

/// A message the bot sends to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Plain text.
    Text { text: String },
    /// Text with tappable options. Each option doubles as its own payload.
    QuickReply { text: String, options: Vec<String> },
    /// Caption with a single URL button.
    Link {
        caption: String,
        title: String,
        url: String,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn quick_reply<I, S>(text: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::QuickReply {
            text: text.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn link(
        caption: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self::Link {
            caption: caption.into(),
            title: title.into(),
            url: url.into(),
        }
    }

    /// The human-readable body of the message.
    pub fn body(&self) -> &str {
        match self {
            Self::Text { text } | Self::QuickReply { text, .. } => text,
            Self::Link { caption, .. } => caption,
        }
    }
}

/// Delivers messages to users.
///
/// Delivery is fire-and-forget from the conversation's point of view: errors
/// are reported to the caller (the outbox) which logs them and moves on.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name for logging.
    fn name(&self) -> &str;

    async fn send(&self, user_id: &str, message: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Writes outbound messages to the log instead of delivering them. Used when
/// no transport is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, user_id: &str, message: &OutboundMessage) -> Result<(), ChannelError> {
        tracing::info!(user_id, message = ?message, "Outbound message");
        Ok(())
    }
}
