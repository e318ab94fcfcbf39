//! Environment variable key constants.
//!
//! Primary variables use the `LIVEDOC_*` namespace; a small set of aliases
//! keeps parity with the names the docs site's build tooling exports.

/// Execution / auth backend
pub mod backend {
    /// Base URL of the backend service (execution + auth share one service)
    pub const API_BASE: &str = "LIVEDOC_API_BASE";
    pub const API_BASE_ALIASES: &[&str] = &["VITE_API_URL", "API_BASE"];
}

/// Runtime asset source (CDN-hosted platform script + companion assets)
pub mod runtime {
    pub const VERSION: &str = "LIVEDOC_RUNTIME_VERSION";
    pub const CDN_BASE: &str = "LIVEDOC_RUNTIME_CDN";
}

/// Code block enhancement
pub mod enhance {
    pub const MARKER_CLASS: &str = "LIVEDOC_MARKER_CLASS";
    pub const LANGUAGE: &str = "LIVEDOC_LANGUAGE";
}

/// Remote execution limits
pub mod execution {
    pub const DEFAULT_TIMEOUT: &str = "LIVEDOC_EXEC_TIMEOUT";
    pub const MAX_TIMEOUT: &str = "LIVEDOC_EXEC_MAX_TIMEOUT";
}

/// Local persistent storage
pub mod storage {
    pub const DATA_DIR: &str = "LIVEDOC_DATA_DIR";
}

/// Observability and logging
pub mod observability {
    pub const QUIET: &str = "LIVEDOC_QUIET";
    pub const LOG_LEVEL: &str = "LIVEDOC_LOG_LEVEL";
    pub const LOG_JSON: &str = "LIVEDOC_LOG_JSON";
}
