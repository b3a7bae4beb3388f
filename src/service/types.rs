//! Wire types for the report service and their decoded forms
//!
//! Responses are decoded exactly once, here, into tagged unions so the
//! state machine never inspects optional fields itself.

use super::ServiceError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct StartRequest<'a> {
    pub topic: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub answer: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StartResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub report: Option<String>,
    #[allow(dead_code)] // Echoed by the service on completion, not needed client-side
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error payload returned with non-success statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Outcome of a session-creation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartReply {
    Started {
        session_id: String,
        question: Option<String>,
    },
    Failure(String),
}

/// Outcome of one chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    NextQuestion(String),
    Report(String),
    Failure(String),
}

/// Message used when a chat reply carries none of question, report or error
pub const EMPTY_CHAT_REPLY: &str = "empty response from service";

/// Empty strings count as absent, the same way the service's own web client treats them.
fn present(field: Option<String>) -> Option<String> {
    field.filter(|s| !s.is_empty())
}

impl StartResponse {
    /// An error field wins; otherwise a session id is mandatory.
    pub fn decode(self) -> Result<StartReply, ServiceError> {
        if let Some(error) = present(self.error) {
            return Ok(StartReply::Failure(error));
        }
        match present(self.session_id) {
            Some(session_id) => Ok(StartReply::Started {
                session_id,
                question: present(self.question),
            }),
            None => Err(ServiceError::decode("start response carried no session id")),
        }
    }
}

impl ChatResponse {
    /// Priority is question, then report, then error.
    ///
    /// A reply carrying both a question and an error is therefore a continuation.
    /// The service contract offers no way to express "continue, but warn"; revisit
    /// with the service owner before changing this order.
    pub fn decode(self) -> ChatReply {
        if let Some(question) = present(self.question) {
            ChatReply::NextQuestion(question)
        } else if let Some(report) = present(self.report) {
            ChatReply::Report(report)
        } else if let Some(error) = present(self.error) {
            ChatReply::Failure(error)
        } else {
            ChatReply::Failure(EMPTY_CHAT_REPLY.to_string())
        }
    }
}
