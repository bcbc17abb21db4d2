//! Messenger channel — delivers messages through the Graph API Send endpoint.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use crate::channels::{Notifier, OutboundMessage};
use crate::config::MessengerConfig;
use crate::error::ChannelError;

/// Maximum text length for a single Messenger message (characters).
const MESSENGER_MAX_TEXT_CHARS: usize = 2000;

/// Messenger allows at most this many quick replies per message.
const MESSENGER_MAX_QUICK_REPLIES: usize = 13;

/// Maximum quick reply title length (characters).
const MESSENGER_MAX_QUICK_REPLY_TITLE: usize = 20;

/// Messenger Send API client.
pub struct MessengerNotifier {
    config: MessengerConfig,
    client: reqwest::Client,
}

impl MessengerNotifier {
    pub fn new(config: MessengerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn send_url(&self) -> String {
        format!("{}/me/messages", self.config.api_base.trim_end_matches('/'))
    }

    async fn post(&self, body: &Value) -> Result<(), ChannelError> {
        let resp = self
            .client
            .post(self.send_url())
            .query(&[("access_token", self.config.page_token.expose_secret())])
            .json(body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "messenger".into(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err = resp.text().await.unwrap_or_default();
            return Err(ChannelError::Http(format!("send failed ({status}): {err}")));
        }
        Ok(())
    }
}

/// Build the Send API request bodies for one outbound message.
///
/// Long text is split into several plain messages; options or buttons ride on
/// the last chunk.
pub fn request_bodies(user_id: &str, message: &OutboundMessage) -> Result<Vec<Value>, ChannelError> {
    let recipient = json!({ "id": user_id });

    match message {
        OutboundMessage::Text { text } => Ok(split_message(text, MESSENGER_MAX_TEXT_CHARS)
            .into_iter()
            .map(|chunk| json!({ "recipient": recipient, "message": { "text": chunk } }))
            .collect()),

        OutboundMessage::QuickReply { text, options } => {
            if options.is_empty() || options.len() > MESSENGER_MAX_QUICK_REPLIES {
                return Err(ChannelError::InvalidMessage(format!(
                    "quick reply needs 1..={MESSENGER_MAX_QUICK_REPLIES} options, got {}",
                    options.len()
                )));
            }
            let quick_replies: Vec<Value> = options
                .iter()
                .map(|option| {
                    json!({
                        "content_type": "text",
                        "title": truncate_chars(option, MESSENGER_MAX_QUICK_REPLY_TITLE),
                        "payload": option,
                    })
                })
                .collect();

            let mut chunks = split_message(text, MESSENGER_MAX_TEXT_CHARS);
            let last = chunks.pop().unwrap_or_default();
            let mut bodies: Vec<Value> = chunks
                .into_iter()
                .map(|chunk| json!({ "recipient": recipient, "message": { "text": chunk } }))
                .collect();
            bodies.push(json!({
                "recipient": recipient,
                "message": { "text": last, "quick_replies": quick_replies },
            }));
            Ok(bodies)
        }

        OutboundMessage::Link {
            caption,
            title,
            url,
        } => Ok(vec![json!({
            "recipient": recipient,
            "message": {
                "attachment": {
                    "type": "template",
                    "payload": {
                        "template_type": "button",
                        "text": truncate_chars(caption, 640),
                        "buttons": [{ "type": "web_url", "url": url, "title": title }],
                    }
                }
            }
        })]),
    }
}

#[async_trait]
impl Notifier for MessengerNotifier {
    fn name(&self) -> &str {
        "messenger"
    }

    async fn send(&self, user_id: &str, message: &OutboundMessage) -> Result<(), ChannelError> {
        for body in request_bodies(user_id, message)? {
            self.post(&body).await?;
        }
        tracing::debug!(user_id, "Messenger message sent");
        Ok(())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Split text into chunks of at most `max_chars` characters, preferring
/// newline then space boundaries.
fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.chars().count() <= max_chars {
            chunks.push(remaining.to_string());
            break;
        }

        // Byte offset of the first character past the limit.
        let limit = remaining
            .char_indices()
            .nth(max_chars)
            .map(|(i, _)| i)
            .unwrap_or(remaining.len());
        let chunk = &remaining[..limit];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .filter(|&i| i > 0)
            .unwrap_or(limit);

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_body() {
        let bodies = request_bodies("42", &OutboundMessage::text("哈囉")).unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["recipient"]["id"], "42");
        assert_eq!(bodies[0]["message"]["text"], "哈囉");
    }

    #[test]
    fn quick_reply_body() {
        let message = OutboundMessage::quick_reply("要看下一筆嗎？", ["繼續", "不用了"]);
        let bodies = request_bodies("42", &message).unwrap();
        let replies = bodies[0]["message"]["quick_replies"].as_array().unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["title"], "繼續");
        assert_eq!(replies[0]["payload"], "繼續");
        assert_eq!(replies[1]["content_type"], "text");
    }

    #[test]
    fn quick_reply_rejects_bad_option_counts() {
        let empty = OutboundMessage::quick_reply("q", Vec::<String>::new());
        assert!(matches!(
            request_bodies("42", &empty),
            Err(ChannelError::InvalidMessage(_))
        ));
        let many = OutboundMessage::quick_reply("q", (0..14).map(|i| i.to_string()));
        assert!(request_bodies("42", &many).is_err());
    }

    #[test]
    fn link_body() {
        let message = OutboundMessage::link("地址：新竹市", "查看地圖", "https://maps.example/x");
        let bodies = request_bodies("42", &message).unwrap();
        let payload = &bodies[0]["message"]["attachment"]["payload"];
        assert_eq!(payload["template_type"], "button");
        assert_eq!(payload["buttons"][0]["url"], "https://maps.example/x");
        assert_eq!(payload["buttons"][0]["title"], "查看地圖");
    }

    #[test]
    fn long_text_is_split_on_char_boundaries() {
        let text = "房".repeat(4500);
        let bodies = request_bodies("42", &OutboundMessage::text(text)).unwrap();
        assert_eq!(bodies.len(), 3);
        let lengths: Vec<usize> = bodies
            .iter()
            .map(|b| b["message"]["text"].as_str().unwrap().chars().count())
            .collect();
        assert_eq!(lengths, vec![2000, 2000, 500]);
    }

    #[test]
    fn split_prefers_newlines() {
        let msg = format!("{}\n{}", "a".repeat(1500), "b".repeat(1000));
        let chunks = split_message(&msg, 2000);
        assert_eq!(chunks, vec!["a".repeat(1500), "b".repeat(1000)]);
    }

    #[test]
    fn options_ride_on_last_chunk() {
        let message = OutboundMessage::quick_reply("x".repeat(2500), ["是", "否"]);
        let bodies = request_bodies("42", &message).unwrap();
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0]["message"].get("quick_replies").is_none());
        assert!(bodies[1]["message"]["quick_replies"].is_array());
    }

    #[test]
    fn long_quick_reply_titles_are_truncated() {
        let option = "一".repeat(30);
        let message = OutboundMessage::quick_reply("q", [option.clone()]);
        let bodies = request_bodies("42", &message).unwrap();
        let reply = &bodies[0]["message"]["quick_replies"][0];
        assert_eq!(reply["title"].as_str().unwrap().chars().count(), 20);
        assert_eq!(reply["payload"], option.as_str());
    }
}
