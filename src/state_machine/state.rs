//! Session state types

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Transcript
// ============================================================================

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Agent,
    User,
}

/// One exchanged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry {
    pub origin: Origin,
    pub text: String,
}

/// Ordered record of the conversation. Append-only: insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Transcript(Vec<TranscriptEntry>);

impl Transcript {
    pub fn push_agent(&mut self, text: impl Into<String>) {
        self.0.push(TranscriptEntry {
            origin: Origin::Agent,
            text: text.into(),
        });
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.0.push(TranscriptEntry {
            origin: Origin::User,
            text: text.into(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.0.last()
    }
}

// ============================================================================
// Session Phase
// ============================================================================

/// A conversation the remote service knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub session_id: String,
    pub topic: String,
}

/// Controller phase. Each variant carries only the data valid in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// No session yet
    #[default]
    Idle,

    /// Session-creation request in flight
    Starting { topic: String },

    /// Interview in progress
    Chatting {
        session: Session,
        /// Latest question from the service
        question: String,
        /// An answer to `question` has been sent and the reply is outstanding
        answer_in_flight: bool,
        /// Questions received so far, including the current one
        questions_asked: u32,
    },

    /// Report received; waiting out the transitional delay
    ReportPending { session: Session, report: String },

    /// Report can be downloaded
    ReportReady {
        session: Session,
        report: String,
        downloading: bool,
        /// Where the last successful download was written
        last_saved: Option<PathBuf>,
    },
}

/// Phase discriminant for views that only need to know which screen to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    Starting,
    Chatting,
    ReportPending,
    ReportReady,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Starting { .. } => PhaseKind::Starting,
            Phase::Chatting { .. } => PhaseKind::Chatting,
            Phase::ReportPending { .. } => PhaseKind::ReportPending,
            Phase::ReportReady { .. } => PhaseKind::ReportReady,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Phase::Idle | Phase::Starting { .. } => None,
            Phase::Chatting { session, .. }
            | Phase::ReportPending { session, .. }
            | Phase::ReportReady { session, .. } => Some(session),
        }
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Everything the controller owns. Replaced wholesale on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub phase: Phase,
    pub transcript: Transcript,
}

impl SessionState {
    pub fn phase_kind(&self) -> PhaseKind {
        self.phase.kind()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.phase.session().map(|s| s.session_id.as_str())
    }

    pub fn topic(&self) -> Option<&str> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Starting { topic } => Some(topic.as_str()),
            _ => self.phase.session().map(|s| s.topic.as_str()),
        }
    }

    /// The question awaiting an answer; `None` while an answer is in flight.
    pub fn pending_question(&self) -> Option<&str> {
        match &self.phase {
            Phase::Chatting {
                question,
                answer_in_flight: false,
                ..
            } => Some(question.as_str()),
            _ => None,
        }
    }

    pub fn questions_asked(&self) -> u32 {
        match &self.phase {
            Phase::Chatting {
                questions_asked, ..
            } => *questions_asked,
            _ => 0,
        }
    }

    pub fn report(&self) -> Option<&str> {
        match &self.phase {
            Phase::ReportPending { report, .. } | Phase::ReportReady { report, .. } => {
                Some(report.as_str())
            }
            _ => None,
        }
    }

    pub fn last_saved(&self) -> Option<&PathBuf> {
        match &self.phase {
            Phase::ReportReady { last_saved, .. } => last_saved.as_ref(),
            _ => None,
        }
    }

    pub fn is_starting(&self) -> bool {
        matches!(self.phase, Phase::Starting { .. })
    }

    pub fn is_answering(&self) -> bool {
        matches!(
            self.phase,
            Phase::Chatting {
                answer_in_flight: true,
                ..
            }
        )
    }

    pub fn is_downloading(&self) -> bool {
        matches!(
            self.phase,
            Phase::ReportReady {
                downloading: true,
                ..
            }
        )
    }
}

// ============================================================================
// Context
// ============================================================================

/// Default wait between report receipt and enabling download
pub const DEFAULT_TRANSITION_DELAY: Duration = Duration::from_millis(4000);

/// Immutable configuration for one controller
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Client-side delay that masks report rendering on the service
    pub transition_delay: Duration,
}

impl SessionContext {
    pub fn new(transition_delay: Duration) -> Self {
        Self { transition_delay }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSITION_DELAY)
    }
}

/// File name a downloaded report is saved under
pub fn artifact_file_name(session_id: &str) -> String {
    let prefix: String = session_id.chars().take(8).collect();
    format!("report_{prefix}.pdf")
}
