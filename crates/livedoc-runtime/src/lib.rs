pub mod listener;
pub mod loader;
pub mod platform;

pub use listener::{ListenerId, ListenerRegistry};
pub use loader::{LoadError, LoadState, LoadingStatus, RuntimeLoader};
pub use platform::{RuntimeError, RuntimeHandle, RuntimeInstance, RuntimePlatform};
