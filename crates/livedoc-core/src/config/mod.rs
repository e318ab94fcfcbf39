//! Unified configuration layer.
//!
//! All environment variable reads live in this module; the rest of the
//! codebase goes through structured config instead of `std::env::var`.
//!
//! - `loader`: env_or / env_optional / env_bool helpers, `.env` loading
//! - `schema`: BackendConfig, RuntimeAssetConfig, EnhanceConfig, ...
//! - `env_keys`: key name constants

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_optional, env_or, load_dotenv};
pub use schema::{
    BackendConfig, EnhanceConfig, ExecutionConfig, ObservabilityConfig, RuntimeAssetConfig,
    StorageConfig,
};
