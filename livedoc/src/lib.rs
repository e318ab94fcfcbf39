//! Live, executable code blocks for documentation sites.
//!
//! Three pieces working together: a single-flight loader for the embedded
//! code runtime ([`RuntimeLoader`]), an idempotent enhancer that turns
//! marked code blocks into live widgets ([`CodeBlockEnhancer`]), and a
//! remote execution client with isolation fallback
//! ([`RemoteExecutionClient`]). [`Livedoc`] is the composition root that
//! wires them up; [`LiveCodeWidget`] is what a mounted block becomes.

pub mod app;
pub mod widget;

pub use app::{Livedoc, LivedocBuilder};
pub use widget::{ExecutableWidgetResolver, ExecutionMode, LiveCodeWidget, MountedWidgets};

pub use livedoc_client::{
    AuthError, AuthenticatedFileClient, BackendError, ExecEndpoint, ExecutionTransport,
    HttpExecutionTransport, RemoteExecutionClient,
};
pub use livedoc_core::config::{
    BackendConfig, EnhanceConfig, ExecutionConfig, ObservabilityConfig, RuntimeAssetConfig,
    StorageConfig,
};
pub use livedoc_core::protocol::{
    AuthSession, ExecuteCodeRequest, ExecuteCodeResponse, FileUpdateResponse, GitHubAuthResponse,
    GitHubUser,
};
pub use livedoc_core::storage::{FileSessionStore, MemorySessionStore, SessionStore};
pub use livedoc_enhance::{
    page_events, CodeBlockEnhancer, Document, EnhanceError, NodeId, PageEvent, PageEvents,
    ScanDriver, SharedDocument, WidgetFactory, WidgetResolver, ENHANCED_ATTR, WIDGET_ATTR,
};
pub use livedoc_runtime::{
    ListenerId, LoadError, LoadState, LoadingStatus, RuntimeHandle, RuntimeInstance,
    RuntimeLoader, RuntimePlatform,
};
