pub mod execution;
pub mod github;
pub mod transport;

pub use execution::RemoteExecutionClient;
pub use github::{AuthenticatedFileClient, AuthError};
pub use transport::{
    BackendError, ExecEndpoint, ExecutionTransport, HttpExecutionTransport, StatusClass,
};
