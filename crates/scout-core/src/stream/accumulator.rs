//! Folds decoded fragments into one growing answer.

use futures_util::{Stream, StreamExt};

use crate::error::DecodeError;
use crate::stream::decoder::Fragment;

/// Receives the accumulated text of a single stream.
///
/// `on_progress` may fire any number of times; then exactly one of
/// `on_complete` or `on_error` fires and nothing follows it.
pub trait StreamObserver {
    /// Called with the cumulative text after each delta, never the delta alone.
    fn on_progress(&mut self, text: &str);
    fn on_complete(&mut self, text: String);
    fn on_error(&mut self, error: DecodeError);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed,
}

#[derive(Debug, Default)]
pub struct StreamAccumulator {
    text: String,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `fragments` to its terminal event, reporting to `observer`.
    ///
    /// Takes `self` by value: an accumulator serves exactly one stream.
    pub async fn run<S, O>(mut self, fragments: S, observer: &mut O) -> StreamOutcome
    where
        S: Stream<Item = Result<Fragment, DecodeError>>,
        O: StreamObserver + ?Sized,
    {
        let mut fragments = std::pin::pin!(fragments);

        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(Fragment::Delta(delta)) => {
                    self.text.push_str(&delta);
                    observer.on_progress(&self.text);
                }
                Ok(Fragment::End) => {
                    tracing::debug!(len = self.text.len(), "stream complete");
                    observer.on_complete(self.text);
                    return StreamOutcome::Completed;
                }
                Err(e) => {
                    tracing::debug!(received = self.text.len(), "stream failed: {e}");
                    observer.on_error(e);
                    return StreamOutcome::Failed;
                }
            }
        }

        // A decoder that just stops still owes the observer a terminal event.
        observer.on_error(DecodeError::UnexpectedEof);
        StreamOutcome::Failed
    }
}
