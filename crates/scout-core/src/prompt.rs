//! Turning search results and a question into completion messages.

use crate::completion::PromptMessage;
use crate::search::SearchResult;

/// How many search results are placed in the prompt.
pub const CONTEXT_RESULT_LIMIT: usize = 3;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful AI assistant. Use the provided search results \
to give accurate and up-to-date information. Be concise and friendly in your responses.";

/// Format the top results as `title\nsnippet` blocks separated by a blank line.
pub fn context_block(results: &[SearchResult]) -> String {
    results
        .iter()
        .take(CONTEXT_RESULT_LIMIT)
        .map(|result| format!("{}\n{}", result.title, result.snippet))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The system instruction followed by a single user turn carrying the
/// context block and the question.
pub fn build_messages(question: &str, results: &[SearchResult]) -> Vec<PromptMessage> {
    let user_turn = format!(
        "Search results:\n{}\n\nUser question: {}",
        context_block(results),
        question
    );

    vec![
        PromptMessage::system(SYSTEM_INSTRUCTION),
        PromptMessage::user(user_turn),
    ]
}
