//! Single-flight runtime loader.
//!
//! Owns the lifecycle of the embedded runtime: exactly one script fetch and
//! one bootstrap regardless of how many callers race `initialize()`. The
//! in-flight load is memoized as a shared future; every caller that arrives
//! before it settles awaits the same result. The cycle itself runs on a
//! spawned task, so a caller that stops awaiting does not cancel the load —
//! its settlement still updates loader state.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;

use livedoc_core::config::RuntimeAssetConfig;

use crate::listener::{ListenerId, ListenerRegistry};
use crate::platform::{RuntimeHandle, RuntimePlatform};

/// Terminal failure for one load cycle. No internal retry; a fresh
/// `initialize()` call starts over from scratch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load platform script: {0}")]
    ScriptInjection(String),
    #[error("runtime bootstrap failed: {0}")]
    Bootstrap(String),
    #[error("load task failed: {0}")]
    TaskFailed(String),
}

/// Loader lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Error,
}

/// Broadcast payload: phase, progress in [0,100], human-readable message.
/// Within one cycle the observed sequence is idle → loading (progress
/// non-decreasing) → ready | error.
#[derive(Debug, Clone)]
pub struct LoadingStatus {
    pub state: LoadState,
    pub progress: u8,
    pub message: String,
}

impl LoadingStatus {
    fn idle() -> Self {
        Self {
            state: LoadState::Idle,
            progress: 0,
            message: String::new(),
        }
    }
}

type LoadFuture = Shared<BoxFuture<'static, Result<RuntimeHandle, LoadError>>>;

enum Cycle {
    Idle,
    Loading(LoadFuture),
    Ready(RuntimeHandle),
    Failed(LoadError),
}

struct LoaderInner {
    platform: Arc<dyn RuntimePlatform>,
    assets: RuntimeAssetConfig,
    listeners: ListenerRegistry<LoadingStatus>,
    cycle: Mutex<Cycle>,
    last_status: Mutex<LoadingStatus>,
}

/// Sole owner of the [`RuntimeHandle`] and its loading state. Construct one
/// at the composition root and share it.
pub struct RuntimeLoader {
    inner: Arc<LoaderInner>,
}

impl RuntimeLoader {
    pub fn new(platform: Arc<dyn RuntimePlatform>, assets: RuntimeAssetConfig) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                platform,
                assets,
                listeners: ListenerRegistry::new(),
                cycle: Mutex::new(Cycle::Idle),
                last_status: Mutex::new(LoadingStatus::idle()),
            }),
        }
    }

    /// Idempotent entry point. Returns the existing handle immediately,
    /// joins an in-flight load, or starts a new cycle. Concurrent callers
    /// observe the same resolution or the same rejection.
    pub async fn initialize(&self) -> Result<RuntimeHandle, LoadError> {
        let fut = {
            let mut cycle = self.inner.cycle.lock().unwrap();
            match &*cycle {
                Cycle::Ready(handle) => return Ok(handle.clone()),
                Cycle::Loading(fut) => fut.clone(),
                Cycle::Idle | Cycle::Failed(_) => {
                    let fut = LoaderInner::start_cycle(self.inner.clone());
                    *cycle = Cycle::Loading(fut.clone());
                    fut
                }
            }
        };
        fut.await
    }

    /// Alias for [`initialize`](Self::initialize) for consumers that only
    /// care about the handle, not progress.
    pub async fn get_runtime(&self) -> Result<RuntimeHandle, LoadError> {
        self.initialize().await
    }

    /// True once a handle exists. Pure query, no side effects.
    pub fn is_ready(&self) -> bool {
        matches!(&*self.inner.cycle.lock().unwrap(), Cycle::Ready(_))
    }

    /// Most recently broadcast status. Pure query, no side effects.
    pub fn status(&self) -> LoadingStatus {
        self.inner.last_status.lock().unwrap().clone()
    }

    pub fn add_listener(
        &self,
        callback: impl Fn(&LoadingStatus) + Send + Sync + 'static,
    ) -> ListenerId {
        self.inner.listeners.add(callback)
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.inner.listeners.remove(id);
    }
}

impl LoaderInner {
    fn start_cycle(inner: Arc<LoaderInner>) -> LoadFuture {
        let task = tokio::spawn({
            let inner = inner.clone();
            async move { LoaderInner::run_cycle(inner).await }
        });
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    // The cycle task itself died (panic/abort); record the
                    // failure so a later call can retry.
                    let err = LoadError::TaskFailed(e.to_string());
                    *inner.cycle.lock().unwrap() = Cycle::Failed(err.clone());
                    inner.notify(LoadState::Error, 0, format!("Runtime load failed: {err}"));
                    Err(err)
                }
            }
        }
        .boxed()
        .shared()
    }

    async fn run_cycle(inner: Arc<LoaderInner>) -> Result<RuntimeHandle, LoadError> {
        let started = Instant::now();
        inner.notify(LoadState::Loading, 0, "Loading runtime...".to_string());

        match inner.checkpoints().await {
            Ok(handle) => {
                *inner.cycle.lock().unwrap() = Cycle::Ready(handle.clone());
                let elapsed = started.elapsed().as_secs_f64();
                inner.notify(
                    LoadState::Ready,
                    100,
                    format!("Runtime ready ({elapsed:.2}s)"),
                );
                tracing::info!(version = handle.version(), "runtime loaded in {elapsed:.2}s");
                Ok(handle)
            }
            Err(e) => {
                *inner.cycle.lock().unwrap() = Cycle::Failed(e.clone());
                inner.notify(LoadState::Error, 0, format!("Runtime load failed: {e}"));
                tracing::error!("runtime load failed: {e}");
                Err(e)
            }
        }
    }

    /// The fixed checkpoints of one cycle: inject (10), script ready (30),
    /// bootstrap (90). The ready broadcast at 100 happens in `run_cycle`.
    async fn checkpoints(&self) -> Result<RuntimeHandle, LoadError> {
        self.notify(
            LoadState::Loading,
            10,
            "Fetching platform script...".to_string(),
        );
        self.platform.inject_script(&self.assets.script_url()).await?;

        self.notify(
            LoadState::Loading,
            30,
            "Initializing runtime environment...".to_string(),
        );
        let handle = self.platform.bootstrap(&self.assets.asset_base()).await?;

        self.notify(LoadState::Loading, 90, "Almost ready...".to_string());
        Ok(handle)
    }

    fn notify(&self, state: LoadState, progress: u8, message: String) {
        let status = LoadingStatus {
            state,
            progress,
            message,
        };
        *self.last_status.lock().unwrap() = status.clone();
        self.listeners.notify(&status);
    }
}
