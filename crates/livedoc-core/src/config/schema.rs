//! Config structs grouped by domain, loaded from environment variables.

use std::path::PathBuf;

use super::env_keys::{backend, enhance, execution, observability as obv_keys, runtime, storage};
use super::loader::{env_bool, env_optional, env_or, env_u64, load_dotenv};

/// Execution / auth backend location.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_base: String,
}

impl BackendConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            api_base: env_or(backend::API_BASE, backend::API_BASE_ALIASES, || {
                "http://localhost:8000".to_string()
            }),
        }
    }
}

/// Versioned, content-addressed runtime asset source. The pinned version is
/// configuration; nothing else in the codebase hard-codes it.
#[derive(Debug, Clone)]
pub struct RuntimeAssetConfig {
    pub version: String,
    pub cdn_base: String,
}

impl RuntimeAssetConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            version: env_or(runtime::VERSION, &[], || "0.26.4".to_string()),
            cdn_base: env_or(runtime::CDN_BASE, &[], || {
                "https://cdn.jsdelivr.net/pyodide".to_string()
            }),
        }
    }

    /// URL of the platform bootstrap script.
    pub fn script_url(&self) -> String {
        format!(
            "{}/v{}/full/pyodide.js",
            self.cdn_base.trim_end_matches('/'),
            self.version
        )
    }

    /// Base URL the bootstrapped runtime fetches its companion assets from.
    pub fn asset_base(&self) -> String {
        format!(
            "{}/v{}/full/",
            self.cdn_base.trim_end_matches('/'),
            self.version
        )
    }
}

/// Code block enhancement: which blocks are eligible.
#[derive(Debug, Clone)]
pub struct EnhanceConfig {
    /// Marker class carried by eligible blocks (container or code element).
    pub marker_class: String,
    /// Language tag handed to mounted widgets.
    pub language: String,
}

impl EnhanceConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            marker_class: env_or(enhance::MARKER_CLASS, &[], || {
                "language-python".to_string()
            }),
            language: env_or(enhance::LANGUAGE, &[], || "python".to_string()),
        }
    }
}

/// Remote execution timeout bounds. The backend clamps timeouts to 1..=30s;
/// the client clamps before sending so requests are never rejected for range.
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    pub default_timeout_secs: u64,
    pub max_timeout_secs: u64,
}

impl ExecutionConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self {
            default_timeout_secs: env_u64(execution::DEFAULT_TIMEOUT, &[], 10),
            max_timeout_secs: env_u64(execution::MAX_TIMEOUT, &[], 30),
        }
    }
}

/// Local persistent storage root (session, cached state).
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        let dir = env_optional(storage::DATA_DIR, &[])
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".livedoc")
            });
        Self { dir }
    }
}

/// Logging behavior.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: Option<String>,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self {
            quiet: env_bool(obv_keys::QUIET, &[], false),
            log_level: env_optional(obv_keys::LOG_LEVEL, &[]),
            log_json: env_bool(obv_keys::LOG_JSON, &[], false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_asset_urls_pin_version() {
        let cfg = RuntimeAssetConfig {
            version: "0.26.4".to_string(),
            cdn_base: "https://cdn.jsdelivr.net/pyodide".to_string(),
        };
        assert_eq!(
            cfg.script_url(),
            "https://cdn.jsdelivr.net/pyodide/v0.26.4/full/pyodide.js"
        );
        assert_eq!(
            cfg.asset_base(),
            "https://cdn.jsdelivr.net/pyodide/v0.26.4/full/"
        );
    }

    #[test]
    fn runtime_asset_urls_tolerate_trailing_slash() {
        let cfg = RuntimeAssetConfig {
            version: "1.0.0".to_string(),
            cdn_base: "https://mirror.example/pyodide/".to_string(),
        };
        assert_eq!(
            cfg.script_url(),
            "https://mirror.example/pyodide/v1.0.0/full/pyodide.js"
        );
    }
}
