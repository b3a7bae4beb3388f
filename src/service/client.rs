//! HTTP implementation of the report service contract

use super::types::{ChatRequest, ChatResponse, ErrorBody, StartRequest, StartResponse};
use super::{ChatReply, ReportService, ServiceError, StartReply};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Report service reached over HTTP/JSON
pub struct HttpReportService {
    client: Client,
    base_url: Url,
}

impl HttpReportService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::unknown(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ServiceError::unknown(format!("Invalid service URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::unknown(format!(
                "Service URL {base_url} cannot carry a path"
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Endpoint URL with each segment percent-encoded on its own
    fn url(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ServiceError::unknown("Service URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `/start` and `/chat` report failures as JSON with a 4xx/5xx status,
    /// so the body is decoded whatever the status.
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e))?;

        serde_json::from_str(&body).map_err(|e| {
            ServiceError::decode(format!("HTTP {status}: unreadable response ({e}): {body}"))
        })
    }

    fn classify_download_error(status: StatusCode, body: &str) -> ServiceError {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error }) => ServiceError::remote(error),
            Err(_) => ServiceError::remote(format!("HTTP {status}")),
        }
    }
}

#[async_trait]
impl ReportService for HttpReportService {
    async fn start(&self, topic: &str) -> Result<StartReply, ServiceError> {
        let response = self
            .client
            .post(self.url(&["start"])?)
            .json(&StartRequest { topic })
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e))?;

        Self::read_json::<StartResponse>(response).await?.decode()
    }

    async fn chat(&self, session_id: &str, answer: &str) -> Result<ChatReply, ServiceError> {
        let response = self
            .client
            .post(self.url(&["chat"])?)
            .json(&ChatRequest { session_id, answer })
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e))?;

        Ok(Self::read_json::<ChatResponse>(response).await?.decode())
    }

    async fn download(&self, session_id: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .client
            .get(self.url(&["download", session_id])?)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| ServiceError::from_reqwest(&e))?;
            return Err(Self::classify_download_error(status, &body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e))?;
        Ok(bytes.to_vec())
    }

    async fn cleanup(&self, session_id: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(self.url(&["cleanup", session_id])?)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(&e))?;

        tracing::debug!(session_id = %session_id, status = %response.status(), "Cleanup acknowledged");
        Ok(())
    }
}
