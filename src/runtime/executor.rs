//! Session runtime executor

use super::traits::ArtifactSink;
use super::Action;

use crate::service::{ReportService, StartReply};
use crate::state_machine::{
    transition, Effect, Event, PhaseKind, SessionContext, SessionState, TransitionError,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long teardown waits for outstanding cleanup requests
const CLEANUP_GRACE: Duration = Duration::from_secs(2);

/// Generic session runtime that can work with any service and sink implementations
pub struct SessionRuntime<S, A>
where
    S: ReportService + 'static,
    A: ArtifactSink + 'static,
{
    context: SessionContext,
    state: SessionState,
    service: Arc<S>,
    sink: Arc<A>,
    /// User actions, each acknowledged once applied
    action_rx: mpsc::Receiver<Action>,
    /// Outcomes of effects
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    state_tx: watch::Sender<SessionState>,
    /// Cancelled when the controller is torn down
    lifetime: CancellationToken,
    /// Fire-and-forget cleanups, given a short grace period at teardown
    cleanup_tasks: Vec<JoinHandle<()>>,
}

impl<S, A> SessionRuntime<S, A>
where
    S: ReportService + 'static,
    A: ArtifactSink + 'static,
{
    pub fn new(
        context: SessionContext,
        service: S,
        sink: A,
        action_rx: mpsc::Receiver<Action>,
        state_tx: watch::Sender<SessionState>,
        lifetime: CancellationToken,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);
        let state = state_tx.borrow().clone();
        Self {
            context,
            state,
            service: Arc::new(service),
            sink: Arc::new(sink),
            action_rx,
            event_rx,
            event_tx,
            state_tx,
            lifetime,
            cleanup_tasks: Vec::new(),
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting session runtime");

        loop {
            tokio::select! {
                biased;

                () = self.lifetime.cancelled() => break,

                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::warn!(error = %e, "Dropped event");
                    }
                }

                action = self.action_rx.recv() => {
                    let Some(Action { event, reply }) = action else {
                        // Every handle is gone
                        break;
                    };
                    let result = self.process_event(event);
                    match &result {
                        Err(e) if e.is_user_rejection() => {
                            tracing::debug!(error = %e, "Action ignored");
                        }
                        Err(e) => tracing::warn!(error = %e, "Action rejected"),
                        Ok(()) => {}
                    }
                    let _ = reply.send(result);
                }
            }
        }

        self.lifetime.cancel();
        self.drain_cleanups().await;
        tracing::info!(
            session_id = ?self.state.session_id(),
            phase = ?self.state.phase_kind(),
            "Session runtime stopped"
        );
    }

    fn process_event(&mut self, event: Event) -> Result<(), TransitionError> {
        // Pure state transition
        let result = transition(&self.state, &self.context, event)?;

        let old_phase = self.state.phase_kind();
        self.state = result.new_state;
        if old_phase != self.state.phase_kind() {
            tracing::info!(
                from = ?old_phase,
                to = ?self.state.phase_kind(),
                session_id = ?self.state.session_id(),
                questions_asked = self.state.questions_asked(),
                "Phase changed"
            );
            if self.state.phase_kind() == PhaseKind::ReportPending {
                tracing::info!(
                    topic_chars = self.state.topic().map_or(0, |t| t.chars().count()),
                    report_chars = self.state.report().map_or(0, |r| r.chars().count()),
                    "Report received"
                );
            }
        }
        self.state_tx.send_replace(self.state.clone());

        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    /// Run `request` in the background and feed its event back, unless the
    /// controller is torn down first.
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Event> + Send + 'static,
    {
        let event_tx = self.event_tx.clone();
        let lifetime = self.lifetime.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;

                () = lifetime.cancelled() => {
                    tracing::debug!("Request abandoned, session torn down");
                }

                event = request => {
                    let _ = event_tx.send(event).await;
                }
            }
        });
    }

    /// Execute an effect. Every effect completes in the background.
    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestStart { topic } => {
                let service = self.service.clone();
                self.spawn_request(async move {
                    tracing::info!(topic_chars = topic.chars().count(), "Starting session");
                    let result = service.start(&topic).await;
                    if let Ok(StartReply::Started {
                        session_id,
                        question: None,
                    }) = &result
                    {
                        tracing::warn!(
                            session_id = %session_id,
                            "Session started without a first question"
                        );
                    }
                    match result {
                        Ok(reply) => Event::StartResolved(reply),
                        Err(e) => Event::StartFailed { message: e.message },
                    }
                });
            }

            Effect::RequestChat { session_id, answer } => {
                let service = self.service.clone();
                self.spawn_request(async move {
                    match service.chat(&session_id, &answer).await {
                        Ok(reply) => Event::ChatResolved(reply),
                        Err(e) => Event::ChatFailed { message: e.message },
                    }
                });
            }

            Effect::ScheduleReportReady { delay } => {
                tracing::debug!(delay_ms = %delay.as_millis(), "Report ready timer scheduled");
                self.spawn_request(async move {
                    tokio::time::sleep(delay).await;
                    Event::ReportDelayElapsed
                });
            }

            Effect::FetchArtifact {
                session_id,
                file_name,
            } => {
                let service = self.service.clone();
                let sink = self.sink.clone();
                self.spawn_request(async move {
                    let bytes = match service.download(&session_id).await {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            return Event::DownloadFailed {
                                message: e.message,
                                kind: e.kind,
                            }
                        }
                    };
                    match sink.save(&file_name, &bytes).await {
                        Ok(path) => {
                            tracing::info!(path = %path.display(), "Report saved");
                            Event::ArtifactSaved { path }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, file = %file_name, "Failed to save report");
                            Event::ArtifactSaveFailed {
                                message: e.to_string(),
                            }
                        }
                    }
                });
            }

            Effect::RequestCleanup { session_id } => {
                let service = self.service.clone();
                self.cleanup_tasks.retain(|task| !task.is_finished());
                self.cleanup_tasks.push(tokio::spawn(async move {
                    if let Err(e) = service.cleanup(&session_id).await {
                        tracing::warn!(session_id = %session_id, error = %e, "Cleanup failed");
                    }
                }));
            }
        }
    }

    async fn drain_cleanups(&mut self) {
        let deadline = tokio::time::Instant::now() + CLEANUP_GRACE;
        for task in self.cleanup_tasks.drain(..) {
            if tokio::time::timeout_at(deadline, task).await.is_err() {
                tracing::warn!("Cleanup still running at teardown");
                break;
            }
        }
    }
}
