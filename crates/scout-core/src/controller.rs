//! Drives the session through the network: search, then a streamed completion.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::completion::CompletionClient;
use crate::config::Config;
use crate::search::SearchClient;
use crate::session::Session;
use crate::state::SessionState;
use crate::stream::StreamAccumulator;

pub struct SessionController {
    session: Session,
    search: SearchClient,
    completion: CompletionClient,
}

impl SessionController {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;

        let search = SearchClient::with_client(client.clone(), &config.search_url);
        let completion = CompletionClient::with_client(client, &config.completion_url)
            .model(config.model.clone())
            .idle_timeout(config.stream_idle_timeout());

        Ok(Self::with_clients(search, completion))
    }

    pub fn with_clients(search: SearchClient, completion: CompletionClient) -> Self {
        Self {
            session: Session::new(),
            search,
            completion,
        }
    }

    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    /// Run one full exchange for `input`.
    ///
    /// Returns `false` without touching state or the network when the
    /// submission is rejected. Every failure ends in the `Failed` phase rather
    /// than an `Err`.
    pub async fn submit(&mut self, input: &str) -> bool {
        let Some(question) = self.session.submit(input) else {
            return false;
        };
        tracing::info!(len = question.len(), "exchange started");

        let results = match self.search.search(&question).await {
            Ok(results) => results,
            Err(e) => {
                self.session.fail(&e);
                return true;
            }
        };

        let Some(messages) = self.session.search_resolved(&question, &results) else {
            return true;
        };

        let fragments = match self.completion.stream(messages).await {
            Ok(fragments) => fragments,
            Err(e) => {
                self.session.fail(&e);
                return true;
            }
        };

        StreamAccumulator::new()
            .run(fragments, &mut self.session)
            .await;
        true
    }

    /// Move the controller onto its own task.
    ///
    /// Cancelling `shutdown` drops any in-flight exchange, which aborts its
    /// HTTP requests; no snapshot is published after that.
    pub fn spawn(self, shutdown: CancellationToken) -> (SessionHandle, JoinHandle<()>) {
        // The in-flight claim admits one submission at a time
        let (submissions, receiver) = mpsc::channel(1);
        let in_flight = Arc::new(AtomicBool::new(false));
        let handle = SessionHandle {
            submissions,
            snapshots: self.subscribe(),
            in_flight: in_flight.clone(),
        };
        let task = tokio::spawn(self.run(receiver, in_flight, shutdown));
        (handle, task)
    }

    async fn run(
        mut self,
        mut submissions: mpsc::Receiver<String>,
        in_flight: Arc<AtomicBool>,
        shutdown: CancellationToken,
    ) {
        loop {
            let input = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = submissions.recv() => match next {
                    Some(input) => input,
                    None => break,
                },
            };

            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("session shut down with an exchange in flight");
                    return;
                }
                accepted = self.submit(&input) => {
                    if !accepted {
                        tracing::debug!(len = input.len(), "submission rejected");
                    }
                }
            }
            in_flight.store(false, Ordering::Release);
        }
        tracing::debug!("session task finished");
    }
}

/// Cloneable front-end side of a spawned [`SessionController`].
#[derive(Clone)]
pub struct SessionHandle {
    submissions: mpsc::Sender<String>,
    snapshots: watch::Receiver<SessionState>,
    in_flight: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Ask the controller to start an exchange.
    ///
    /// Returns `false` when the submission is rejected: blank input, an
    /// exchange already claimed or running, or the controller is gone. A
    /// `true` submission always reaches the session; nothing is dropped.
    pub fn submit(&self, input: impl Into<String>) -> bool {
        let input = input.into();
        if input.trim().is_empty() || !self.snapshots.borrow().phase.accepts_submit() {
            return false;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        if self.submissions.try_send(input).is_err() {
            self.in_flight.store(false, Ordering::Release);
            return false;
        }
        true
    }

    pub fn snapshot(&self) -> SessionState {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.snapshots.clone()
    }
}
