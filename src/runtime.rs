//! Runtime for driving a session
//!
//! The runtime task owns the session state. Views talk to it through a
//! [`SessionHandle`]: actions go in over a channel, snapshots come out over
//! a watch channel.

mod executor;
pub mod traits;


pub use executor::SessionRuntime;
pub use traits::*;

use crate::service::ReportService;
use crate::state_machine::{Event, SessionContext, SessionState, TransitionError};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A user action waiting to be applied
#[derive(Debug)]
pub struct Action {
    pub event: Event,
    pub reply: oneshot::Sender<Result<(), TransitionError>>,
}

/// Errors returned to callers of handle actions
#[derive(Debug, Error)]
pub enum SessionError {
    /// The action did not apply in the current state; nothing changed
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session controller has stopped")]
    Stopped,
}

/// Handle to interact with a running session controller
///
/// Dropping the handle tears the controller down.
pub struct SessionHandle {
    action_tx: mpsc::Sender<Action>,
    state_rx: watch::Receiver<SessionState>,
    lifetime: CancellationToken,
    runtime: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Start a controller in the background
    pub fn spawn<S, A>(context: SessionContext, service: S, sink: A) -> Self
    where
        S: ReportService + 'static,
        A: ArtifactSink + 'static,
    {
        let (action_tx, action_rx) = mpsc::channel(8);
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let lifetime = CancellationToken::new();

        let runtime = SessionRuntime::new(
            context,
            service,
            sink,
            action_rx,
            state_tx,
            lifetime.clone(),
        );
        let task = tokio::spawn(runtime.run());

        Self {
            action_tx,
            state_rx,
            lifetime,
            runtime: Some(task),
        }
    }

    async fn send(&self, event: Event) -> Result<(), SessionError> {
        let (reply, ack) = oneshot::channel();
        self.action_tx
            .send(Action { event, reply })
            .await
            .map_err(|_| SessionError::Stopped)?;
        ack.await.map_err(|_| SessionError::Stopped)??;
        Ok(())
    }

    /// Begin a session about `topic`. Blank topics are rejected without effect.
    pub async fn start(&self, topic: impl Into<String>) -> Result<(), SessionError> {
        self.send(Event::StartRequested {
            topic: topic.into(),
        })
        .await
    }

    /// Answer the pending question
    pub async fn answer(&self, text: impl Into<String>) -> Result<(), SessionError> {
        self.send(Event::AnswerSubmitted { text: text.into() }).await
    }

    /// Fetch and save the report
    pub async fn download(&self) -> Result<(), SessionError> {
        self.send(Event::DownloadRequested).await
    }

    /// Current state, as last published
    pub fn snapshot(&self) -> SessionState {
        self.state_rx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Tear the controller down and wait for it to stop
    pub async fn shutdown(mut self) {
        self.lifetime.cancel();
        if let Some(task) = self.runtime.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Session runtime panicked");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}
