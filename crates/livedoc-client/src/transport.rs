//! Typed lower-level transport for the execution backend.
//!
//! Non-2xx responses become a [`BackendError`] variant rather than a magic
//! status range at the call site: `Fault` means the service itself failed
//! (the only class that triggers the isolation→plain degradation),
//! `Rejected` means the request was refused, `Transport` covers everything
//! that never produced a response.

use async_trait::async_trait;

use livedoc_core::config::BackendConfig;
use livedoc_core::protocol::{ApiErrorBody, ExecuteCodeRequest, ExecuteCodeResponse};

#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The service itself is unavailable (HTTP 5xx), not the user's code.
    #[error("backend fault (HTTP {status})")]
    Fault { status: u16 },
    /// The request was refused (other non-2xx). Never masked by a fallback.
    #[error("request rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
    /// Network/DNS/decode failure; no usable response.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Which execution endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecEndpoint {
    /// POST `/execute` — subprocess isolation.
    Plain,
    /// POST `/execute-docker` — container isolation.
    Isolated,
}

impl ExecEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            ExecEndpoint::Plain => "/execute",
            ExecEndpoint::Isolated => "/execute-docker",
        }
    }
}

/// Classification of an HTTP status for the execution backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Fault,
    Rejected,
}

/// Pure status classification; the only place the 5xx range is spelled out.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        500..=599 => StatusClass::Fault,
        _ => StatusClass::Rejected,
    }
}

/// Transport seam for [`crate::RemoteExecutionClient`]; mocked in tests.
#[async_trait]
pub trait ExecutionTransport: Send + Sync {
    async fn post_execute(
        &self,
        endpoint: ExecEndpoint,
        request: &ExecuteCodeRequest,
    ) -> Result<ExecuteCodeResponse, BackendError>;

    async fn probe_health(&self) -> Result<(), BackendError>;
}

/// reqwest-backed transport against the configured backend.
pub struct HttpExecutionTransport {
    http: reqwest::Client,
    api_base: String,
}

impl HttpExecutionTransport {
    pub fn new(cfg: &BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
        }
    }
}

/// Best-effort extraction of the FastAPI `detail` message from an error body.
pub(crate) async fn error_detail(resp: reqwest::Response, status: u16) -> String {
    match resp.text().await {
        Ok(body) => serde_json::from_str::<ApiErrorBody>(&body)
            .map(|e| e.detail)
            .unwrap_or_else(|_| format!("HTTP {status}")),
        Err(_) => format!("HTTP {status}"),
    }
}

#[async_trait]
impl ExecutionTransport for HttpExecutionTransport {
    async fn post_execute(
        &self,
        endpoint: ExecEndpoint,
        request: &ExecuteCodeRequest,
    ) -> Result<ExecuteCodeResponse, BackendError> {
        let url = format!("{}{}", self.api_base, endpoint.path());
        let resp = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        match classify_status(status) {
            StatusClass::Success => resp
                .json()
                .await
                .map_err(|e| BackendError::Transport(format!("decode response: {e}"))),
            StatusClass::Fault => Err(BackendError::Fault { status }),
            StatusClass::Rejected => Err(BackendError::Rejected {
                status,
                message: error_detail(resp, status).await,
            }),
        }
    }

    async fn probe_health(&self) -> Result<(), BackendError> {
        let url = format!("{}/health", self.api_base);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        match classify_status(status) {
            StatusClass::Success => Ok(()),
            StatusClass::Fault => Err(BackendError::Fault { status }),
            StatusClass::Rejected => Err(BackendError::Rejected {
                status,
                message: format!("HTTP {status}"),
            }),
        }
    }
}
