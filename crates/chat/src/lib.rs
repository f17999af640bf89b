use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Greeting the suggestion screens open with.
pub const DEFAULT_GREETING: &str =
    "Hi there! Type a message and I'll give you some rewrite suggestions.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub from_user: bool,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, from_user: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            from_user,
            sent_at: Utc::now(),
        }
    }
}

/// Ordered record of exchanged messages.
///
/// Storage order is append order; there is no removal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log seeded with an assistant greeting.
    pub fn with_greeting(text: impl Into<String>) -> Self {
        let mut log = Self::new();
        log.append(text, false);
        log
    }

    /// Append a message. Blank text is ignored and returns false.
    pub fn append(&mut self, text: impl Into<String>, from_user: bool) -> bool {
        let text = text.into();
        if text.trim().is_empty() {
            return false;
        }
        self.messages.push(ChatMessage::new(text, from_user));
        true
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Messages in display order for a bottom-anchored list.
    pub fn newest_first(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().rev()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts<'a>(messages: impl Iterator<Item = &'a ChatMessage>) -> Vec<&'a str> {
        messages.map(|m| m.text.as_str()).collect()
    }

    #[test]
    fn test_blank_append_is_ignored() {
        let mut log = ChatLog::new();
        assert!(!log.append("", true));
        assert!(!log.append("   ", false));
        assert!(log.is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut log = ChatLog::new();
        assert!(log.append("hi", true));
        assert!(log.append("there", false));

        assert_eq!(texts(log.iter()), vec!["hi", "there"]);
        assert!(log.messages()[0].from_user);
        assert!(!log.messages()[1].from_user);
    }

    #[test]
    fn test_newest_first_does_not_reorder_storage() {
        let mut log = ChatLog::with_greeting(DEFAULT_GREETING);
        log.append("fix dis isu", true);
        log.append("Fix this issue.", false);

        assert_eq!(
            texts(log.newest_first()),
            vec!["Fix this issue.", "fix dis isu", DEFAULT_GREETING]
        );
        assert_eq!(log.messages()[0].text, DEFAULT_GREETING);
        assert_eq!(log.last().map(|m| m.text.as_str()), Some("Fix this issue."));
    }

    #[test]
    fn test_serializes_in_append_order() {
        let mut log = ChatLog::new();
        log.append("one", true);
        log.append("two", false);

        let json = serde_json::to_value(&log).unwrap();
        let texts: Vec<&str> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }
}
