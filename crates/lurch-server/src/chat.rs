//! The chat side of a conversation, independent of the platform behind it.

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

/// Somewhere lurch can answer a message.
///
/// Delivery problems are the implementation's concern: callers fire and
/// forget, so every method is infallible.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Answer in the context of the triggering message (a thread reply).
    async fn reply(&self, text: &str);

    /// Post to the channel the message came from.
    async fn send(&self, text: &str);

    /// Largest message the platform accepts, in bytes.
    fn max_message_len(&self) -> usize;
}

/// A message addressed to lurch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub channel: String,
    pub user: String,
    pub text: String,
    /// Timestamp of the thread to reply into.
    pub thread_ts: String,
}

static MENTION_RE: OnceLock<Regex> = OnceLock::new();

fn mention_re() -> &'static Regex {
    MENTION_RE.get_or_init(|| Regex::new(r"<@[A-Z0-9]+(\|[^>]*)?>").unwrap())
}

/// Split a chat line into command words.
///
/// User mentions are dropped and the first word is lowercased so `Deploy`
/// and `deploy` mean the same thing. Project and service names keep their
/// case.
pub fn command_words(text: &str) -> Vec<String> {
    let cleaned = mention_re().replace_all(text, " ");
    let mut words: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();
    if let Some(first) = words.first_mut() {
        *first = first.to_lowercase();
    }
    words
}
