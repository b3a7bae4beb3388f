//! Events that can occur in a session

use crate::service::{ChatReply, ServiceErrorKind, StartReply};
use std::path::PathBuf;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User actions
    StartRequested {
        topic: String,
    },
    AnswerSubmitted {
        text: String,
    },
    DownloadRequested,

    // Session creation
    StartResolved(StartReply),
    StartFailed {
        message: String,
    },

    // Chat turns
    ChatResolved(ChatReply),
    ChatFailed {
        message: String,
    },

    // Report
    ReportDelayElapsed,
    ArtifactSaved {
        path: PathBuf,
    },
    DownloadFailed {
        message: String,
        kind: ServiceErrorKind,
    },
    ArtifactSaveFailed {
        message: String,
    },
}
