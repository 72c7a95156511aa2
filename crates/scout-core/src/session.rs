//! The session state machine.
//!
//! ```text
//! Idle|Failed --submit--> AwaitingSearch --results--> AwaitingCompletion --complete--> Idle
//!                              |                            |
//!                              +--------- failure ----------+--> Failed
//! ```
//!
//! Every transition publishes a fresh [`SessionState`] snapshot on a
//! `watch` channel. Network I/O lives in the controller; this type only
//! mutates state, which keeps every transition testable without a server.

use tokio::sync::watch;

use crate::completion::PromptMessage;
use crate::error::{DecodeError, ExchangeError, USER_FACING_ERROR};
use crate::prompt;
use crate::search::SearchResult;
use crate::state::{ChatMessage, Phase, SessionState};
use crate::stream::StreamObserver;

pub struct Session {
    state: SessionState,
    publisher: watch::Sender<SessionState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let state = SessionState::new();
        let (publisher, _) = watch::channel(state.clone());
        Self { state, publisher }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.publisher.subscribe()
    }

    /// Start an exchange. Returns the trimmed question to search for, or
    /// `None` (with no state change) when the input is blank or an exchange
    /// is already running.
    pub fn submit(&mut self, input: &str) -> Option<String> {
        let question = input.trim();
        if question.is_empty() {
            return None;
        }
        if !self.state.phase.accepts_submit() {
            tracing::debug!(phase = ?self.state.phase, "submission ignored while busy");
            return None;
        }

        self.state.history.push(ChatMessage::user(question));
        self.state.last_error = None;
        self.state.pending_text.clear();
        self.state.phase = Phase::AwaitingSearch;
        self.publish();

        Some(question.to_string())
    }

    /// Search finished: move on to the completion and hand back its messages.
    pub fn search_resolved(
        &mut self,
        question: &str,
        results: &[SearchResult],
    ) -> Option<Vec<PromptMessage>> {
        if self.state.phase != Phase::AwaitingSearch {
            tracing::warn!(phase = ?self.state.phase, "search result outside of a search");
            return None;
        }

        let messages = prompt::build_messages(question, results);
        self.state.phase = Phase::AwaitingCompletion;
        self.publish();

        Some(messages)
    }

    /// Any failure of the running exchange. The user message stays in history.
    pub fn fail(&mut self, error: &ExchangeError) {
        if !self.state.phase.is_busy() {
            tracing::warn!(phase = ?self.state.phase, "failure reported with no exchange running: {error}");
            return;
        }

        tracing::error!(phase = ?self.state.phase, "exchange failed: {error}");
        self.state.last_error = Some(USER_FACING_ERROR.to_string());
        self.state.pending_text.clear();
        self.state.phase = Phase::Failed;
        self.publish();
    }

    fn publish(&self) {
        // send_replace stores the snapshot even when nobody is subscribed yet.
        self.publisher.send_replace(self.state.clone());
    }
}

impl StreamObserver for Session {
    fn on_progress(&mut self, text: &str) {
        if self.state.phase != Phase::AwaitingCompletion {
            tracing::warn!(phase = ?self.state.phase, "stream progress outside of a completion");
            return;
        }
        self.state.pending_text.clear();
        self.state.pending_text.push_str(text);
        self.publish();
    }

    fn on_complete(&mut self, text: String) {
        if self.state.phase != Phase::AwaitingCompletion {
            tracing::warn!(phase = ?self.state.phase, "stream completion outside of a completion");
            return;
        }
        tracing::info!(len = text.len(), "exchange complete");
        self.state.history.push(ChatMessage::assistant(text));
        self.state.pending_text.clear();
        self.state.phase = Phase::Idle;
        self.publish();
    }

    fn on_error(&mut self, error: DecodeError) {
        self.fail(&ExchangeError::Stream(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChatRole;

    fn awaiting_completion() -> Session {
        let mut session = Session::new();
        let question = session.submit("weather today").unwrap();
        session
            .search_resolved(&question, &[SearchResult::new("Forecast", "Sunny")])
            .unwrap();
        session
    }

    #[test]
    fn test_submit_appends_user_message_and_awaits_search() {
        let mut session = Session::new();

        let question = session.submit("  weather today \n");

        assert_eq!(question.as_deref(), Some("weather today"));
        assert_eq!(session.phase(), Phase::AwaitingSearch);
        assert_eq!(session.state().history, vec![ChatMessage::user("weather today")]);
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut session = Session::new();
        let receiver = session.subscribe();

        assert_eq!(session.submit(""), None);
        assert_eq!(session.submit("   \t\n"), None);

        assert_eq!(session.state(), &SessionState::new());
        assert!(!receiver.has_changed().unwrap());
    }

    #[test]
    fn test_submit_while_busy_is_noop() {
        let mut session = Session::new();
        session.submit("first").unwrap();
        let before = session.state().clone();

        assert_eq!(session.submit("second"), None);
        assert_eq!(session.state(), &before);

        let mut session = awaiting_completion();
        session.on_progress("It ");
        let before = session.state().clone();

        assert_eq!(session.submit("second"), None);
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_successful_exchange() {
        let mut session = awaiting_completion();
        assert_eq!(session.phase(), Phase::AwaitingCompletion);

        session.on_progress("It ");
        session.on_progress("It is ");
        assert_eq!(session.state().pending_text, "It is ");
        assert_eq!(session.phase(), Phase::AwaitingCompletion);

        session.on_complete("It is sunny.".to_string());

        let state = session.state();
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.pending_text.is_empty());
        assert!(state.last_error.is_none());
        assert_eq!(
            state.history,
            vec![
                ChatMessage::user("weather today"),
                ChatMessage::assistant("It is sunny."),
            ]
        );
    }

    #[test]
    fn test_search_failure_keeps_user_message() {
        let mut session = Session::new();
        session.submit("weather today").unwrap();

        session.fail(&ExchangeError::Search("status 500".to_string()));

        let state = session.state();
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.last_error.as_deref(), Some(USER_FACING_ERROR));
        assert_eq!(state.history, vec![ChatMessage::user("weather today")]);
    }

    #[test]
    fn test_stream_error_clears_pending_text() {
        let mut session = awaiting_completion();
        session.on_progress("It ");

        session.on_error(DecodeError::UnexpectedEof);

        let state = session.state();
        assert_eq!(state.phase, Phase::Failed);
        assert!(state.pending_text.is_empty());
        assert!(state.last_error.is_some());
        assert!(state.history.iter().all(|m| m.role == ChatRole::User));
    }

    #[test]
    fn test_failed_session_rearms_on_submit() {
        let mut session = Session::new();
        session.submit("first").unwrap();
        session.fail(&ExchangeError::Search("timeout".to_string()));

        let question = session.submit("second");

        assert_eq!(question.as_deref(), Some("second"));
        let state = session.state();
        assert_eq!(state.phase, Phase::AwaitingSearch);
        assert!(state.last_error.is_none());
        // The unanswered first question stays
        assert_eq!(
            state.history,
            vec![ChatMessage::user("first"), ChatMessage::user("second")]
        );
    }

    #[test]
    fn test_out_of_phase_events_are_ignored() {
        let mut session = Session::new();

        session.on_progress("stray");
        session.on_complete("stray".to_string());
        session.fail(&ExchangeError::Search("stray".to_string()));
        assert!(session.search_resolved("q", &[]).is_none());

        assert_eq!(session.state(), &SessionState::new());
    }

    #[test]
    fn test_every_transition_is_published() {
        let mut session = Session::new();
        let mut receiver = session.subscribe();

        session.submit("weather today").unwrap();
        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().phase, Phase::AwaitingSearch);

        session.search_resolved("weather today", &[]).unwrap();
        assert_eq!(receiver.borrow_and_update().phase, Phase::AwaitingCompletion);

        session.on_progress("It");
        assert_eq!(receiver.borrow_and_update().pending_text, "It");

        session.on_complete("It".to_string());
        let snapshot = receiver.borrow_and_update().clone();
        assert_eq!(snapshot, *session.state());
        assert_eq!(snapshot.phase, Phase::Idle);
    }
}
