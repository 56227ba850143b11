//! Role-tagged message input
//!
//! The decision path consumes a parsed list of role-tagged messages; the
//! proxy layer outside this crate owns wire-format parsing.

use serde::{Deserialize, Serialize};

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Convert to string representation for logging and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single conversation message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Get the message role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Get the message content
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Estimate token count from text (simple heuristic: chars / 4, at least 1
/// for non-empty text)
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    ((text.chars().count() / 4).max(1)) as u32
}

/// Estimate the combined token count of a message list
pub fn estimate_message_tokens(messages: &[Message]) -> u32 {
    messages
        .iter()
        .map(|m| estimate_tokens(m.content()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(
            serde_json::from_str::<Role>(r#""user""#).unwrap(),
            Role::User
        );
        assert_eq!(
            serde_json::from_str::<Role>(r#""system""#).unwrap(),
            Role::System
        );
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("hello");
        assert_eq!(msg.role(), Role::User);
        assert_eq!(msg.content(), "hello");

        let msg = Message::system("you are terse");
        assert_eq!(msg.role(), Role::System);
    }

    #[test]
    fn test_estimate_tokens() {
        // "Hello, world!" = 13 chars / 4 = 3 tokens
        assert_eq!(estimate_tokens("Hello, world!"), 3);

        let long = "a".repeat(1000);
        assert_eq!(estimate_tokens(&long), 250);
    }

    #[test]
    fn test_estimate_tokens_empty_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_estimate_tokens_short_text_is_at_least_one() {
        assert_eq!(estimate_tokens("hi"), 1);
    }

    #[test]
    fn test_estimate_message_tokens_sums_contents() {
        let messages = vec![
            Message::system("be brief"),
            Message::user("a".repeat(400)),
        ];
        assert_eq!(estimate_message_tokens(&messages), 2 + 100);
    }
}
