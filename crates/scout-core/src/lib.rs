//! Search-grounded chat sessions with streamed answers.
//!
//! A [`SessionController`] runs each exchange as: search for the question,
//! put the top results into a prompt, stream the completion back, and fold
//! the stream into the session history. Front-ends only read published
//! [`SessionState`] snapshots and call `submit`.

pub mod completion;
pub mod config;
pub mod controller;
pub mod error;
pub mod prompt;
pub mod search;
pub mod session;
pub mod state;
pub mod stream;

// Re-export main types for convenience
pub use completion::{CompletionClient, CompletionRequest, PromptMessage, PromptRole};
pub use config::Config;
pub use controller::{SessionController, SessionHandle};
pub use error::{ConfigError, DecodeError, ExchangeError, USER_FACING_ERROR};
pub use search::{SearchClient, SearchResult};
pub use session::Session;
pub use state::{ChatMessage, ChatRole, Phase, SessionState};
pub use stream::{Fragment, StreamAccumulator, StreamObserver, StreamOutcome};
