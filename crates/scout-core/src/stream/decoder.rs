//! Server-sent event decoding for streamed completions.
//!
//! The body is a sequence of SSE events whose `data` is either an
//! OpenAI-style chunk (`{"choices":[{"delta":{"content":"..."}}]}`) or the
//! `[DONE]` end marker. Anything that ends the body before `[DONE]` is an
//! error, never a silent completion.

use std::fmt;
use std::time::Duration;

use async_stream::stream;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use tokio::time::timeout;

use crate::error::DecodeError;

pub const DONE_MARKER: &str = "[DONE]";

/// One decoded piece of a completion stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Text to append; may end mid-word.
    Delta(String),
    End,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Default, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

impl StreamChunk {
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
    }
}

enum BodyError<E> {
    Transport(E),
    Stalled,
}

impl<E: fmt::Display> fmt::Display for BodyError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyError::Transport(e) => e.fmt(f),
            BodyError::Stalled => f.write_str("stalled"),
        }
    }
}

enum BodyChunk<B> {
    Data(B),
    /// Blank line fed at EOF so a final event missing its terminator still
    /// dispatches.
    Flush,
}

impl<B: AsRef<[u8]>> AsRef<[u8]> for BodyChunk<B> {
    fn as_ref(&self) -> &[u8] {
        match self {
            BodyChunk::Data(bytes) => bytes.as_ref(),
            BodyChunk::Flush => b"\n\n",
        }
    }
}

/// Raw body with a per-chunk idle timeout.
fn watch_body<S, B, E>(
    body: S,
    idle_timeout: Duration,
) -> impl Stream<Item = Result<BodyChunk<B>, BodyError<E>>>
where
    S: Stream<Item = Result<B, E>>,
{
    stream! {
        let mut body = Box::pin(body);
        loop {
            match timeout(idle_timeout, body.next()).await {
                Ok(Some(Ok(bytes))) => yield Ok(BodyChunk::Data(bytes)),
                Ok(Some(Err(e))) => {
                    yield Err(BodyError::Transport(e));
                    return;
                }
                Ok(None) => {
                    yield Ok(BodyChunk::Flush);
                    return;
                }
                Err(_) => {
                    yield Err(BodyError::Stalled);
                    return;
                }
            }
        }
    }
}

/// Decode a raw body into fragments.
///
/// The returned stream is finite: it ends right after yielding
/// [`Fragment::End`] or the first error. `idle_timeout` bounds the wait for
/// each chunk of the raw body, so keep-alive comments count as activity.
pub fn decode<S, B, E>(
    body: S,
    idle_timeout: Duration,
) -> impl Stream<Item = Result<Fragment, DecodeError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: fmt::Display,
{
    stream! {
        let mut events = Box::pin(watch_body(body, idle_timeout).eventsource());

        loop {
            match events.next().await {
                Some(Ok(event)) => {
                    let data = event.data.trim();
                    if data.is_empty() {
                        continue;
                    }
                    if data == DONE_MARKER {
                        yield Ok(Fragment::End);
                        return;
                    }
                    match serde_json::from_str::<StreamChunk>(data) {
                        Ok(chunk) => {
                            if let Some(content) = chunk.into_content() {
                                tracing::trace!(len = content.len(), "decoded delta");
                                yield Ok(Fragment::Delta(content));
                            }
                        }
                        Err(e) => {
                            yield Err(DecodeError::Malformed(e.to_string()));
                            return;
                        }
                    }
                }
                Some(Err(EventStreamError::Transport(BodyError::Stalled))) => {
                    yield Err(DecodeError::Stalled(idle_timeout));
                    return;
                }
                Some(Err(EventStreamError::Transport(BodyError::Transport(e)))) => {
                    yield Err(DecodeError::Transport(e.to_string()));
                    return;
                }
                Some(Err(e)) => {
                    yield Err(DecodeError::Malformed(e.to_string()));
                    return;
                }
                None => {
                    yield Err(DecodeError::UnexpectedEof);
                    return;
                }
            }
        }
    }
}
