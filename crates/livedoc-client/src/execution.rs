//! Remote execution client.
//!
//! `execute` and `execute_isolated` are a boundary that never throws to the
//! widget layer: every failure collapses into a `{success: false, error}`
//! response. The isolation endpoint degrades to the plain one only when the
//! isolation backend itself is unavailable — a rejected request (bad input,
//! out-of-range timeout) is surfaced as-is, never masked by a silent retry
//! on the weaker path.

use livedoc_core::config::{BackendConfig, ExecutionConfig};
use livedoc_core::protocol::{ExecuteCodeRequest, ExecuteCodeResponse};

use crate::transport::{BackendError, ExecEndpoint, ExecutionTransport, HttpExecutionTransport};

pub struct RemoteExecutionClient<T: ExecutionTransport> {
    transport: T,
    limits: ExecutionConfig,
}

impl RemoteExecutionClient<HttpExecutionTransport> {
    pub fn from_config(backend: &BackendConfig, limits: ExecutionConfig) -> Self {
        Self::new(HttpExecutionTransport::new(backend), limits)
    }
}

impl<T: ExecutionTransport> RemoteExecutionClient<T> {
    pub fn new(transport: T, limits: ExecutionConfig) -> Self {
        Self { transport, limits }
    }

    /// Timeout is advisory metadata for the backend (the backend is the
    /// timeout authority); clamp into its accepted range so a widget can
    /// never produce a request rejected for range alone.
    fn request(&self, code: &str, timeout_secs: Option<u64>) -> ExecuteCodeRequest {
        let timeout = timeout_secs
            .unwrap_or(self.limits.default_timeout_secs)
            .clamp(1, self.limits.max_timeout_secs);
        ExecuteCodeRequest {
            code: code.to_string(),
            timeout,
        }
    }

    /// Run code on the default execution endpoint. Never errors.
    pub async fn execute(&self, code: &str, timeout_secs: Option<u64>) -> ExecuteCodeResponse {
        let request = self.request(code, timeout_secs);
        match self.transport.post_execute(ExecEndpoint::Plain, &request).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!("execution request failed: {e}");
                ExecuteCodeResponse::failure(e.to_string())
            }
        }
    }

    /// Run code on the stronger-isolation endpoint, degrading transparently
    /// to [`execute`](Self::execute) when the isolation backend is down.
    pub async fn execute_isolated(
        &self,
        code: &str,
        timeout_secs: Option<u64>,
    ) -> ExecuteCodeResponse {
        let request = self.request(code, timeout_secs);
        match self
            .transport
            .post_execute(ExecEndpoint::Isolated, &request)
            .await
        {
            Ok(resp) => resp,
            Err(BackendError::Fault { status }) => {
                tracing::warn!("isolation backend unavailable (HTTP {status}), falling back");
                self.execute(code, timeout_secs).await
            }
            Err(BackendError::Transport(e)) => {
                tracing::warn!("isolation endpoint unreachable ({e}), falling back");
                self.execute(code, timeout_secs).await
            }
            Err(e @ BackendError::Rejected { .. }) => {
                tracing::error!("isolated execution rejected: {e}");
                ExecuteCodeResponse::failure(e.to_string())
            }
        }
    }

    /// Best-effort liveness probe; any failure collapses to `false`.
    pub async fn health_check(&self) -> bool {
        self.transport.probe_health().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn limits() -> ExecutionConfig {
        ExecutionConfig {
            default_timeout_secs: 10,
            max_timeout_secs: 30,
        }
    }

    fn ok_response(output: &str) -> ExecuteCodeResponse {
        ExecuteCodeResponse {
            success: true,
            output: Some(output.to_string()),
            error: None,
            execution_time: Some(0.01),
        }
    }

    fn failed_response(error: &str) -> ExecuteCodeResponse {
        ExecuteCodeResponse {
            success: false,
            output: None,
            error: Some(error.to_string()),
            execution_time: Some(0.01),
        }
    }

    /// Scripted transport: one canned result per endpoint, call counters,
    /// last request captured for timeout assertions.
    struct FakeTransport {
        plain: Result<ExecuteCodeResponse, BackendError>,
        isolated: Result<ExecuteCodeResponse, BackendError>,
        plain_calls: AtomicUsize,
        isolated_calls: AtomicUsize,
        healthy: bool,
        last_request: Mutex<Option<ExecuteCodeRequest>>,
    }

    impl FakeTransport {
        fn new(
            plain: Result<ExecuteCodeResponse, BackendError>,
            isolated: Result<ExecuteCodeResponse, BackendError>,
        ) -> Self {
            Self {
                plain,
                isolated,
                plain_calls: AtomicUsize::new(0),
                isolated_calls: AtomicUsize::new(0),
                healthy: true,
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ExecutionTransport for &FakeTransport {
        async fn post_execute(
            &self,
            endpoint: ExecEndpoint,
            request: &ExecuteCodeRequest,
        ) -> Result<ExecuteCodeResponse, BackendError> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            match endpoint {
                ExecEndpoint::Plain => {
                    self.plain_calls.fetch_add(1, Ordering::SeqCst);
                    self.plain.clone()
                }
                ExecEndpoint::Isolated => {
                    self.isolated_calls.fetch_add(1, Ordering::SeqCst);
                    self.isolated.clone()
                }
            }
        }

        async fn probe_health(&self) -> Result<(), BackendError> {
            if self.healthy {
                Ok(())
            } else {
                Err(BackendError::Transport("connection refused".to_string()))
            }
        }
    }

    #[tokio::test]
    async fn backend_fault_falls_back_to_plain_execution() {
        let transport = FakeTransport::new(
            Ok(failed_response("ZeroDivisionError")),
            Err(BackendError::Fault { status: 500 }),
        );
        let client = RemoteExecutionClient::new(&transport, limits());

        let resp = client.execute_isolated("x=1/0", None).await;
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("ZeroDivisionError"));
        assert_eq!(transport.isolated_calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.plain_calls.load(Ordering::SeqCst), 1);

        // Same result as calling the plain endpoint directly.
        let direct = client.execute("x=1/0", None).await;
        assert_eq!(direct.error, resp.error);
        assert_eq!(direct.success, resp.success);
    }

    #[tokio::test]
    async fn rejected_request_is_surfaced_without_fallback() {
        let transport = FakeTransport::new(
            Ok(ok_response("unreachable")),
            Err(BackendError::Rejected {
                status: 422,
                message: "timeout out of range".to_string(),
            }),
        );
        let client = RemoteExecutionClient::new(&transport, limits());

        let resp = client.execute_isolated("print(1)", None).await;
        assert!(!resp.success);
        assert!(resp.error.as_deref().unwrap().contains("timeout out of range"));
        // The fallback endpoint was never touched.
        assert_eq!(transport.plain_calls.load(Ordering::SeqCst), 0);
        assert_eq!(transport.isolated_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unreachable_isolation_endpoint_degrades_too() {
        let transport = FakeTransport::new(
            Ok(ok_response("2\n")),
            Err(BackendError::Transport("dns error".to_string())),
        );
        let client = RemoteExecutionClient::new(&transport, limits());

        let resp = client.execute_isolated("print(1+1)", None).await;
        assert!(resp.success);
        assert_eq!(resp.output.as_deref(), Some("2\n"));
        assert_eq!(transport.plain_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn execute_never_errors() {
        let transport = FakeTransport::new(
            Err(BackendError::Transport("connection refused".to_string())),
            Ok(ok_response("unused")),
        );
        let client = RemoteExecutionClient::new(&transport, limits());

        let resp = client.execute("print(1)", None).await;
        assert!(!resp.success);
        assert!(resp.error.as_deref().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn successful_isolated_execution_skips_fallback() {
        let transport = FakeTransport::new(
            Ok(failed_response("unreachable")),
            Ok(ok_response("4\n")),
        );
        let client = RemoteExecutionClient::new(&transport, limits());

        let resp = client.execute_isolated("print(2+2)", None).await;
        assert!(resp.success);
        assert_eq!(transport.plain_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn timeout_defaults_and_clamps() {
        let transport = FakeTransport::new(Ok(ok_response("")), Ok(ok_response("")));
        let client = RemoteExecutionClient::new(&transport, limits());

        client.execute("pass", None).await;
        assert_eq!(
            transport.last_request.lock().unwrap().as_ref().unwrap().timeout,
            10
        );
        client.execute("pass", Some(99)).await;
        assert_eq!(
            transport.last_request.lock().unwrap().as_ref().unwrap().timeout,
            30
        );
        client.execute("pass", Some(0)).await;
        assert_eq!(
            transport.last_request.lock().unwrap().as_ref().unwrap().timeout,
            1
        );
    }

    #[tokio::test]
    async fn health_check_collapses_failures_to_false() {
        let mut transport = FakeTransport::new(Ok(ok_response("")), Ok(ok_response("")));
        {
            let client = RemoteExecutionClient::new(&transport, limits());
            assert!(client.health_check().await);
        }
        transport.healthy = false;
        let client = RemoteExecutionClient::new(&transport, limits());
        assert!(!client.health_check().await);
    }
}
