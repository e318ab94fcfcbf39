//! RuntimePlatform trait: the asynchronous environment seam.
//!
//! Implement this trait to bind the loader to a concrete host (a headless
//! browser bridge, a WASM interpreter, a subprocess pool). The loader calls
//! `inject_script` then `bootstrap` exactly once per successful load cycle.

use std::sync::Arc;

use async_trait::async_trait;

use crate::loader::LoadError;

/// Error from running code on an already-loaded runtime instance.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("runtime execution failed: {0}")]
    Execution(String),
}

/// Capability surface of the single live runtime instance.
///
/// At most one instance exists per process lifetime; it is never reloaded.
/// Callers hold it as a shared read-only [`RuntimeHandle`].
#[async_trait]
pub trait RuntimeInstance: Send + Sync {
    /// Runtime version string (diagnostics, ready message).
    fn version(&self) -> &str;

    /// Run one snippet, returning its captured output.
    async fn run(&self, code: &str) -> Result<String, RuntimeError>;
}

/// Shared read-only reference to the loaded runtime.
pub type RuntimeHandle = Arc<dyn RuntimeInstance>;

/// Extension point for the host environment that fetches and boots the
/// runtime. Both steps are suspension points; neither is cancellable once
/// started.
#[async_trait]
pub trait RuntimePlatform: Send + Sync + 'static {
    /// Fetch and evaluate the platform bootstrap script.
    async fn inject_script(&self, script_url: &str) -> Result<(), LoadError>;

    /// Boot the runtime against its companion asset base URL.
    async fn bootstrap(&self, asset_base: &str) -> Result<RuntimeHandle, LoadError>;
}
