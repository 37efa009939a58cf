//! Slack Web API client and Events API payloads.

use async_trait::async_trait;
use lurch_core::config::SlackConfig;
use lurch_core::text::truncate;
use serde::Deserialize;
use tracing::warn;

use crate::chat::{Conversation, Inbound};

// ─── Outbound ─────────────────────────────────────────────────────────────

/// Minimal `chat.postMessage` client.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    max_message_len: usize,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            max_message_len: config.max_message_len,
        }
    }

    pub fn max_message_len(&self) -> usize {
        self.max_message_len
    }

    /// Post `text` to `channel`, into `thread_ts` when given.
    ///
    /// Slack answers API errors with HTTP 200 and `ok: false`, so both layers
    /// are checked.
    pub async fn post_message(
        &self,
        channel: &str,
        text: &str,
        thread_ts: Option<&str>,
    ) -> anyhow::Result<()> {
        let mut body = serde_json::json!({ "channel": channel, "text": text });
        if let Some(ts) = thread_ts {
            body["thread_ts"] = serde_json::Value::String(ts.to_string());
        }

        let res: ApiResponse = self
            .http
            .post(format!("{}/chat.postMessage", self.api_base))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !res.ok {
            anyhow::bail!(
                "chat.postMessage failed: {}",
                res.error.as_deref().unwrap_or("unknown error")
            );
        }
        Ok(())
    }
}

/// A [`Conversation`] over one Slack channel, optionally anchored to the
/// thread of the message being answered.
pub struct SlackConversation {
    client: SlackClient,
    channel: String,
    thread_ts: Option<String>,
}

impl SlackConversation {
    /// Answer the message `msg`: replies go into its thread.
    pub fn thread(client: SlackClient, msg: &Inbound) -> Self {
        Self {
            client,
            channel: msg.channel.clone(),
            thread_ts: Some(msg.thread_ts.clone()),
        }
    }

    /// Talk to a channel with no triggering message, e.g. at startup.
    pub fn channel(client: SlackClient, channel: &str) -> Self {
        Self {
            client,
            channel: channel.to_string(),
            thread_ts: None,
        }
    }

    async fn post(&self, text: &str, thread_ts: Option<&str>) {
        let text = truncate(text, self.client.max_message_len);
        if let Err(e) = self.client.post_message(&self.channel, &text, thread_ts).await {
            warn!(channel = %self.channel, error = %e, "slack delivery failed");
        }
    }
}

#[async_trait]
impl Conversation for SlackConversation {
    async fn reply(&self, text: &str) {
        self.post(text, self.thread_ts.as_deref()).await;
    }

    async fn send(&self, text: &str) {
        self.post(text, None).await;
    }

    fn max_message_len(&self) -> usize {
        self.client.max_message_len
    }
}

// ─── Inbound ──────────────────────────────────────────────────────────────

/// Top-level Events API request body.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    UrlVerification { challenge: String },
    EventCallback { event: SlackEvent },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

impl SlackEvent {
    /// The message addressed to lurch, if this event is one.
    ///
    /// Mentions in channels and direct messages count. Bot messages (lurch's
    /// own included) and edits or other subtypes do not.
    pub fn into_inbound(self) -> Option<Inbound> {
        if self.bot_id.is_some() || self.subtype.is_some() {
            return None;
        }
        let addressed = match self.kind.as_str() {
            "app_mention" => true,
            "message" => self.channel_type.as_deref() == Some("im"),
            _ => false,
        };
        if !addressed {
            return None;
        }
        let user = self.user?;
        Some(Inbound {
            channel: self.channel,
            user,
            text: self.text,
            thread_ts: self.thread_ts.unwrap_or(self.ts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: serde_json::Value) -> SlackEvent {
        serde_json::from_value(json).unwrap()
    }

    fn client(base: &str, max: usize) -> SlackClient {
        SlackClient::new(&SlackConfig {
            token: "xoxb-test".into(),
            api_base: base.to_string(),
            max_message_len: max,
            ..SlackConfig::default()
        })
    }

    #[test]
    fn envelope_variants() {
        let v: Envelope =
            serde_json::from_str(r#"{"type":"url_verification","challenge":"abc","token":"x"}"#)
                .unwrap();
        assert!(matches!(v, Envelope::UrlVerification { challenge } if challenge == "abc"));

        let v: Envelope = serde_json::from_str(r#"{"type":"app_rate_limited"}"#).unwrap();
        assert!(matches!(v, Envelope::Unknown));
    }

    #[test]
    fn mention_becomes_inbound_threaded_on_its_ts() {
        let inbound = event(serde_json::json!({
            "type": "app_mention",
            "channel": "C1",
            "user": "U1",
            "text": "<@ULURCH> list",
            "ts": "1.000"
        }))
        .into_inbound()
        .unwrap();
        assert_eq!(inbound.channel, "C1");
        assert_eq!(inbound.thread_ts, "1.000");
    }

    #[test]
    fn reply_inside_existing_thread_stays_there() {
        let inbound = event(serde_json::json!({
            "type": "app_mention", "channel": "C1", "user": "U1",
            "text": "list", "ts": "2.000", "thread_ts": "1.000"
        }))
        .into_inbound()
        .unwrap();
        assert_eq!(inbound.thread_ts, "1.000");
    }

    #[test]
    fn ignored_events() {
        let bot = event(serde_json::json!({
            "type": "app_mention", "channel": "C1", "bot_id": "B1", "text": "hi", "ts": "1"
        }));
        assert!(bot.into_inbound().is_none());

        let edit = event(serde_json::json!({
            "type": "message", "subtype": "message_changed", "channel": "D1",
            "channel_type": "im", "ts": "1"
        }));
        assert!(edit.into_inbound().is_none());

        let channel_chatter = event(serde_json::json!({
            "type": "message", "channel": "C1", "channel_type": "channel",
            "user": "U1", "text": "deploy shop web", "ts": "1"
        }));
        assert!(channel_chatter.into_inbound().is_none());

        let dm = event(serde_json::json!({
            "type": "message", "channel": "D1", "channel_type": "im",
            "user": "U1", "text": "help", "ts": "1"
        }));
        assert!(dm.into_inbound().is_some());
    }

    #[tokio::test]
    async fn post_message_sends_thread_and_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_header("authorization", "Bearer xoxb-test")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "channel": "C1", "text": "hello", "thread_ts": "1.000"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        client(&server.url(), 4000)
            .post_message("C1", "hello", Some("1.000"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn post_message_surfaces_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat.postMessage")
            .with_status(200)
            .with_body(r#"{"ok":false,"error":"channel_not_found"}"#)
            .create_async()
            .await;

        let err = client(&server.url(), 4000)
            .post_message("C1", "hello", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("channel_not_found"));
    }

    #[tokio::test]
    async fn conversation_truncates_and_routes_send_to_channel() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat.postMessage")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "channel": "C1", "text": "0123456…"
            })))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let msg = Inbound {
            channel: "C1".into(),
            user: "U1".into(),
            text: String::new(),
            thread_ts: "1.000".into(),
        };
        let conv = SlackConversation::thread(client(&server.url(), 10), &msg);
        conv.send("0123456789abcdef").await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat.postMessage")
            .with_status(500)
            .create_async()
            .await;

        let conv = SlackConversation::channel(client(&server.url(), 4000), "C1");
        conv.reply("still fine").await;
    }
}
