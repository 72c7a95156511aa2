//! UI-agnostic session state types
//!
//! These are the values the session controller publishes after every
//! transition. Any front-end (TUI, tests, a future GUI) renders from a
//! snapshot of [`SessionState`] and never mutates it.

use serde::{Deserialize, Serialize};

/// A chat message in the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Where the session is in the search -> completion cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingSearch,
    /// The completion request is in flight or streaming.
    AwaitingCompletion,
    Failed,
}

impl Phase {
    /// Whether a new submission may start an exchange from this phase.
    pub fn accepts_submit(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Failed)
    }

    pub fn is_busy(&self) -> bool {
        !self.accepts_submit()
    }
}

/// Snapshot of a chat session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Append-only; entries are never removed or reordered.
    pub history: Vec<ChatMessage>,
    /// Cumulative text of the in-flight stream, empty when idle.
    pub pending_text: String,
    pub phase: Phase,
    /// User-safe failure description, only set while `phase` is `Failed`.
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle_and_empty() {
        let state = SessionState::new();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.history.is_empty());
        assert!(state.pending_text.is_empty());
        assert!(state.last_error.is_none());
    }

    #[test]
    fn test_submit_only_accepted_when_idle_or_failed() {
        assert!(Phase::Idle.accepts_submit());
        assert!(Phase::Failed.accepts_submit());
        assert!(!Phase::AwaitingSearch.accepts_submit());
        assert!(!Phase::AwaitingCompletion.accepts_submit());
        assert!(Phase::AwaitingCompletion.is_busy());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
