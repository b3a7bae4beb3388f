//! Remote report service abstraction
//!
//! The service runs the interview and produces the report; this crate only
//! talks to it over four HTTP endpoints.

mod client;
mod error;
mod types;

pub use client::HttpReportService;
pub use error::{ServiceError, ServiceErrorKind};
pub use types::{ChatReply, StartReply};

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for the report service
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Create a session for `topic`
    async fn start(&self, topic: &str) -> Result<StartReply, ServiceError>;

    /// Send one answer and receive the next turn
    async fn chat(&self, session_id: &str, answer: &str) -> Result<ChatReply, ServiceError>;

    /// Fetch the generated report document
    async fn download(&self, session_id: &str) -> Result<Vec<u8>, ServiceError>;

    /// Ask the service to drop the session and its files
    async fn cleanup(&self, session_id: &str) -> Result<(), ServiceError>;
}

#[async_trait]
impl<T: ReportService + ?Sized> ReportService for Arc<T> {
    async fn start(&self, topic: &str) -> Result<StartReply, ServiceError> {
        (**self).start(topic).await
    }

    async fn chat(&self, session_id: &str, answer: &str) -> Result<ChatReply, ServiceError> {
        (**self).chat(session_id, answer).await
    }

    async fn download(&self, session_id: &str) -> Result<Vec<u8>, ServiceError> {
        (**self).download(session_id).await
    }

    async fn cleanup(&self, session_id: &str) -> Result<(), ServiceError> {
        (**self).cleanup(session_id).await
    }
}

/// Logging wrapper for report services
pub struct LoggingService<T> {
    inner: T,
}

impl<T: ReportService> LoggingService<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

fn log_outcome<R>(operation: &str, started: std::time::Instant, result: &Result<R, ServiceError>) {
    let duration = started.elapsed();
    match result {
        Ok(_) => {
            tracing::info!(
                operation,
                duration_ms = %duration.as_millis(),
                "Report service request completed"
            );
        }
        Err(e) => {
            tracing::error!(
                operation,
                duration_ms = %duration.as_millis(),
                error = %e.message,
                transport = e.kind.is_transport(),
                "Report service request failed"
            );
        }
    }
}

#[async_trait]
impl<T: ReportService> ReportService for LoggingService<T> {
    async fn start(&self, topic: &str) -> Result<StartReply, ServiceError> {
        let started = std::time::Instant::now();
        let result = self.inner.start(topic).await;
        log_outcome("start", started, &result);
        result
    }

    async fn chat(&self, session_id: &str, answer: &str) -> Result<ChatReply, ServiceError> {
        let started = std::time::Instant::now();
        let result = self.inner.chat(session_id, answer).await;
        log_outcome("chat", started, &result);
        if let Ok(reply) = &result {
            let outcome = match reply {
                ChatReply::NextQuestion(_) => "next_question",
                ChatReply::Report(_) => "report",
                ChatReply::Failure(_) => "failure",
            };
            tracing::debug!(session_id = %session_id, outcome, "Chat turn decoded");
        }
        result
    }

    async fn download(&self, session_id: &str) -> Result<Vec<u8>, ServiceError> {
        let started = std::time::Instant::now();
        let result = self.inner.download(session_id).await;
        log_outcome("download", started, &result);
        if let Ok(bytes) = &result {
            tracing::info!(session_id = %session_id, bytes = bytes.len(), "Report fetched");
        }
        result
    }

    async fn cleanup(&self, session_id: &str) -> Result<(), ServiceError> {
        let started = std::time::Instant::now();
        let result = self.inner.cleanup(session_id).await;
        log_outcome("cleanup", started, &result);
        result
    }
}
