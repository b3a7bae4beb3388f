//! Pure state transition function

use super::state::{artifact_file_name, Phase, Session, SessionContext, SessionState};
use super::{Effect, Event};
use crate::service::{ChatReply, StartReply};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition. None of them changes state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Input is empty")]
    EmptyInput,
    #[error("A session has already been started")]
    SessionExists,
    #[error("No session to answer in")]
    NoSession,
    #[error("The interview is over")]
    InterviewOver,
    #[error("{0} already in progress")]
    Busy(&'static str),
    #[error("Report is not ready for download")]
    ReportNotReady,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl TransitionError {
    /// Rejections of a user action, as opposed to an event nobody should have sent
    pub fn is_user_rejection(&self) -> bool {
        !matches!(self, TransitionError::InvalidTransition(_))
    }
}

/// Start reply that carried a session but nothing to ask
pub(crate) const NO_QUESTION: &str = "service returned no question";

pub(crate) fn remote_error_message(message: &str) -> String {
    format!("Error: {message}")
}

pub(crate) fn connection_error_message(message: &str) -> String {
    format!("Connection error: {message}")
}

pub(crate) fn download_error_message(message: &str) -> String {
    format!("Download error: {message}")
}

pub(crate) fn save_error_message(message: &str) -> String {
    format!("Error: could not save report: {message}")
}

fn chatting(session: &Session, question: String, questions_asked: u32) -> Phase {
    Phase::Chatting {
        session: session.clone(),
        question,
        answer_in_flight: false,
        questions_asked,
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs. All I/O is
/// described by the returned effects.
#[allow(clippy::too_many_lines)] // One arm per row of the phase table
pub fn transition(
    state: &SessionState,
    context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    let mut transcript = state.transcript.clone();

    match (&state.phase, event) {
        // ============================================================
        // Session creation
        // ============================================================
        (Phase::Idle, Event::StartRequested { topic }) => {
            if topic.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            Ok(TransitionResult::new(SessionState {
                phase: Phase::Starting {
                    topic: topic.clone(),
                },
                transcript,
            })
            .with_effect(Effect::RequestStart { topic }))
        }

        (Phase::Starting { .. }, Event::StartRequested { .. }) => {
            Err(TransitionError::Busy("Session start"))
        }

        (_, Event::StartRequested { .. }) => Err(TransitionError::SessionExists),

        (
            Phase::Starting { topic },
            Event::StartResolved(StartReply::Started {
                session_id,
                question: Some(question),
            }),
        ) => {
            transcript.push_agent(question.clone());
            let session = Session {
                session_id,
                topic: topic.clone(),
            };
            Ok(TransitionResult::new(SessionState {
                phase: chatting(&session, question, 1),
                transcript,
            }))
        }

        // Nothing to answer: back to Idle and release the orphaned session
        (
            Phase::Starting { .. },
            Event::StartResolved(StartReply::Started {
                session_id,
                question: None,
            }),
        ) => {
            transcript.push_agent(remote_error_message(NO_QUESTION));
            Ok(TransitionResult::new(SessionState {
                phase: Phase::Idle,
                transcript,
            })
            .with_effect(Effect::RequestCleanup { session_id }))
        }

        (Phase::Starting { .. }, Event::StartResolved(StartReply::Failure(message))) => {
            transcript.push_agent(remote_error_message(&message));
            Ok(TransitionResult::new(SessionState {
                phase: Phase::Idle,
                transcript,
            }))
        }

        (Phase::Starting { .. }, Event::StartFailed { message }) => {
            transcript.push_agent(connection_error_message(&message));
            Ok(TransitionResult::new(SessionState {
                phase: Phase::Idle,
                transcript,
            }))
        }

        // ============================================================
        // Chat turns
        // ============================================================
        (
            Phase::Chatting {
                session,
                question,
                answer_in_flight: false,
                questions_asked,
            },
            Event::AnswerSubmitted { text },
        ) => {
            if text.trim().is_empty() {
                return Err(TransitionError::EmptyInput);
            }
            // Shown before the reply arrives, whatever the reply turns out to be
            transcript.push_user(text.clone());
            Ok(TransitionResult::new(SessionState {
                phase: Phase::Chatting {
                    session: session.clone(),
                    question: question.clone(),
                    answer_in_flight: true,
                    questions_asked: *questions_asked,
                },
                transcript,
            })
            .with_effect(Effect::RequestChat {
                session_id: session.session_id.clone(),
                answer: text,
            }))
        }

        (
            Phase::Chatting {
                answer_in_flight: true,
                ..
            },
            Event::AnswerSubmitted { .. },
        ) => Err(TransitionError::Busy("Answer")),

        (Phase::Idle | Phase::Starting { .. }, Event::AnswerSubmitted { .. }) => {
            Err(TransitionError::NoSession)
        }

        (_, Event::AnswerSubmitted { .. }) => Err(TransitionError::InterviewOver),

        (
            Phase::Chatting {
                session,
                question,
                answer_in_flight: true,
                questions_asked,
            },
            Event::ChatResolved(reply),
        ) => match reply {
            ChatReply::NextQuestion(next) => {
                transcript.push_agent(next.clone());
                Ok(TransitionResult::new(SessionState {
                    phase: chatting(session, next, questions_asked.saturating_add(1)),
                    transcript,
                }))
            }
            ChatReply::Report(report) => Ok(TransitionResult::new(SessionState {
                phase: Phase::ReportPending {
                    session: session.clone(),
                    report,
                },
                transcript,
            })
            .with_effect(Effect::ScheduleReportReady {
                delay: context.transition_delay,
            })),
            ChatReply::Failure(message) => {
                transcript.push_agent(remote_error_message(&message));
                Ok(TransitionResult::new(SessionState {
                    phase: chatting(session, question.clone(), *questions_asked),
                    transcript,
                }))
            }
        },

        (
            Phase::Chatting {
                session,
                question,
                answer_in_flight: true,
                questions_asked,
            },
            Event::ChatFailed { message },
        ) => {
            transcript.push_agent(connection_error_message(&message));
            Ok(TransitionResult::new(SessionState {
                phase: chatting(session, question.clone(), *questions_asked),
                transcript,
            }))
        }

        // ============================================================
        // Report
        // ============================================================
        (Phase::ReportPending { session, report }, Event::ReportDelayElapsed) => {
            Ok(TransitionResult::new(SessionState {
                phase: Phase::ReportReady {
                    session: session.clone(),
                    report: report.clone(),
                    downloading: false,
                    last_saved: None,
                },
                transcript,
            }))
        }

        (
            Phase::ReportReady {
                session,
                report,
                downloading: false,
                last_saved,
            },
            Event::DownloadRequested,
        ) => Ok(TransitionResult::new(SessionState {
            phase: Phase::ReportReady {
                session: session.clone(),
                report: report.clone(),
                downloading: true,
                last_saved: last_saved.clone(),
            },
            transcript,
        })
        .with_effect(Effect::FetchArtifact {
            session_id: session.session_id.clone(),
            file_name: artifact_file_name(&session.session_id),
        })),

        (
            Phase::ReportReady {
                downloading: true, ..
            },
            Event::DownloadRequested,
        ) => Err(TransitionError::Busy("Download")),

        (_, Event::DownloadRequested) => Err(TransitionError::ReportNotReady),

        (
            Phase::ReportReady {
                session,
                report,
                downloading: true,
                ..
            },
            Event::ArtifactSaved { path },
        ) => Ok(TransitionResult::new(SessionState {
            phase: Phase::ReportReady {
                session: session.clone(),
                report: report.clone(),
                downloading: false,
                last_saved: Some(path),
            },
            transcript,
        })
        .with_effect(Effect::RequestCleanup {
            session_id: session.session_id.clone(),
        })),

        (
            Phase::ReportReady {
                session,
                report,
                downloading: true,
                last_saved,
            },
            Event::DownloadFailed { message, kind },
        ) => {
            if kind.is_transport() {
                transcript.push_agent(connection_error_message(&message));
            } else {
                transcript.push_agent(download_error_message(&message));
            }
            Ok(TransitionResult::new(SessionState {
                phase: Phase::ReportReady {
                    session: session.clone(),
                    report: report.clone(),
                    downloading: false,
                    last_saved: last_saved.clone(),
                },
                transcript,
            }))
        }

        (
            Phase::ReportReady {
                session,
                report,
                downloading: true,
                last_saved,
            },
            Event::ArtifactSaveFailed { message },
        ) => {
            transcript.push_agent(save_error_message(&message));
            Ok(TransitionResult::new(SessionState {
                phase: Phase::ReportReady {
                    session: session.clone(),
                    report: report.clone(),
                    downloading: false,
                    last_saved: last_saved.clone(),
                },
                transcript,
            }))
        }

        // ============================================================
        // Anything else is an event the phase cannot receive
        // ============================================================
        (phase, event) => Err(TransitionError::InvalidTransition(format!(
            "{:?} cannot handle {event:?}",
            phase.kind()
        ))),
    }
}
