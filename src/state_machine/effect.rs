//! Effects produced by state transitions

use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Create a session on the service
    RequestStart { topic: String },

    /// Send an answer for the current question
    RequestChat { session_id: String, answer: String },

    /// Deliver `ReportDelayElapsed` after `delay`, unless the controller is torn down first
    ScheduleReportReady { delay: Duration },

    /// Fetch the report and save it locally
    FetchArtifact {
        session_id: String,
        file_name: String,
    },

    /// Release the session on the service; outcome is only logged
    RequestCleanup { session_id: String },
}
