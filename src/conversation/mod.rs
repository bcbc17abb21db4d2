//! Conversation flow — inbound events in, paced replies out.

pub mod orchestrator;
pub mod prompts;
pub mod routes;

use serde::{Deserialize, Serialize};

pub use orchestrator::{Orchestrator, spawn_prune_task};
pub use routes::{WebhookState, webhook_routes};

/// One message from a user, already authenticated and parsed upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub sender_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_reply_payload: Option<String>,
    #[serde(default)]
    pub has_attachment: bool,
}

impl InboundEvent {
    pub fn text(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn quick_reply(sender_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            quick_reply_payload: Some(payload.into()),
            ..Self::default()
        }
    }

    pub fn attachment(sender_id: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            has_attachment: true,
            ..Self::default()
        }
    }

    /// The answer this event carries: a quick-reply payload wins over text.
    pub fn input(&self) -> Option<&str> {
        self.quick_reply_payload
            .as_deref()
            .or(self.text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_wins_over_text() {
        let event = InboundEvent {
            sender_id: "u".into(),
            text: Some("3000到4000".into()),
            quick_reply_payload: Some("3000-4000".into()),
            has_attachment: false,
        };
        assert_eq!(event.input(), Some("3000-4000"));
    }

    #[test]
    fn attachment_has_no_input() {
        assert_eq!(InboundEvent::attachment("u").input(), None);
    }

    #[test]
    fn deserializes_with_defaults() {
        let event: InboundEvent =
            serde_json::from_str(r#"{"sender_id": "u1", "text": "開始"}"#).unwrap();
        assert_eq!(event, InboundEvent::text("u1", "開始"));
    }
}
