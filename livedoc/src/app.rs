//! Composition root.
//!
//! One `Livedoc` per application. The runtime loader, the enhancer, the
//! execution client, and the file client are all explicitly constructed,
//! dependency-injected service objects — shared from here, never looked up
//! ambiently.

use std::sync::Arc;

use tokio::task::JoinHandle;

use livedoc_client::{AuthenticatedFileClient, HttpExecutionTransport, RemoteExecutionClient};
use livedoc_core::config::{
    BackendConfig, EnhanceConfig, ExecutionConfig, RuntimeAssetConfig, StorageConfig,
};
use livedoc_core::observability;
use livedoc_core::storage::{FileSessionStore, SessionStore};
use livedoc_enhance::{page_events, CodeBlockEnhancer, PageEvents, ScanDriver, SharedDocument};
use livedoc_runtime::{RuntimeLoader, RuntimePlatform};

use crate::widget::{ExecutableWidgetResolver, MountedWidgets};

pub struct Livedoc {
    pub loader: Arc<RuntimeLoader>,
    pub enhancer: Arc<CodeBlockEnhancer>,
    pub executor: Arc<RemoteExecutionClient<HttpExecutionTransport>>,
    pub files: Arc<AuthenticatedFileClient>,
    pub widgets: Arc<MountedWidgets>,
}

impl Livedoc {
    /// Start building; only the platform binding has no sensible default.
    pub fn builder(platform: Arc<dyn RuntimePlatform>) -> LivedocBuilder {
        LivedocBuilder {
            platform,
            store: None,
            backend: None,
            assets: None,
            enhance: None,
            limits: None,
        }
    }

    /// Spawn the scan driver over `doc`. The returned [`PageEvents`] handle
    /// goes to the host's lifecycle hooks (load, route change, mutation
    /// observer); dropping every handle stops the driver.
    pub fn attach(&self, doc: SharedDocument) -> (PageEvents, JoinHandle<()>) {
        let (events, rx) = page_events();
        let driver = ScanDriver::new(self.enhancer.clone(), doc);
        let handle = tokio::spawn(driver.run(rx));
        (events, handle)
    }
}

pub struct LivedocBuilder {
    platform: Arc<dyn RuntimePlatform>,
    store: Option<Arc<dyn SessionStore>>,
    backend: Option<BackendConfig>,
    assets: Option<RuntimeAssetConfig>,
    enhance: Option<EnhanceConfig>,
    limits: Option<ExecutionConfig>,
}

impl LivedocBuilder {
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn backend(mut self, cfg: BackendConfig) -> Self {
        self.backend = Some(cfg);
        self
    }

    pub fn runtime_assets(mut self, cfg: RuntimeAssetConfig) -> Self {
        self.assets = Some(cfg);
        self
    }

    pub fn enhance(mut self, cfg: EnhanceConfig) -> Self {
        self.enhance = Some(cfg);
        self
    }

    pub fn execution_limits(mut self, cfg: ExecutionConfig) -> Self {
        self.limits = Some(cfg);
        self
    }

    /// Anything not injected comes from the environment.
    pub fn build(self) -> Livedoc {
        observability::init();

        let backend = self.backend.unwrap_or_else(BackendConfig::from_env);
        let assets = self.assets.unwrap_or_else(RuntimeAssetConfig::from_env);
        let enhance = self.enhance.unwrap_or_else(EnhanceConfig::from_env);
        let limits = self.limits.unwrap_or_else(ExecutionConfig::from_env);
        let store = self.store.unwrap_or_else(|| {
            Arc::new(FileSessionStore::new(&StorageConfig::from_env()))
        });

        let loader = Arc::new(RuntimeLoader::new(self.platform, assets));
        let executor = Arc::new(RemoteExecutionClient::from_config(&backend, limits));
        let widgets = Arc::new(MountedWidgets::new());
        let resolver = Arc::new(ExecutableWidgetResolver::new(
            loader.clone(),
            executor.clone(),
            widgets.clone(),
        ));
        let enhancer = Arc::new(CodeBlockEnhancer::new(resolver, enhance));
        let files = Arc::new(AuthenticatedFileClient::new(&backend, store));

        tracing::debug!(api_base = %backend.api_base, "livedoc assembled");
        Livedoc {
            loader,
            enhancer,
            executor,
            files,
            widgets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::ExecutionMode;
    use async_trait::async_trait;
    use livedoc_core::storage::MemorySessionStore;
    use livedoc_enhance::{Document, PageEvent, WIDGET_ATTR};
    use livedoc_runtime::{LoadError, RuntimeError, RuntimeHandle, RuntimeInstance};
    use std::time::Duration;

    struct EchoRuntime;

    #[async_trait]
    impl RuntimeInstance for EchoRuntime {
        fn version(&self) -> &str {
            "echo-1"
        }

        async fn run(&self, code: &str) -> Result<String, RuntimeError> {
            Ok(format!("ran: {code}"))
        }
    }

    struct EchoPlatform;

    #[async_trait]
    impl RuntimePlatform for EchoPlatform {
        async fn inject_script(&self, _script_url: &str) -> Result<(), LoadError> {
            Ok(())
        }

        async fn bootstrap(&self, _asset_base: &str) -> Result<RuntimeHandle, LoadError> {
            Ok(Arc::new(EchoRuntime))
        }
    }

    fn test_app() -> Livedoc {
        Livedoc::builder(Arc::new(EchoPlatform))
            .session_store(Arc::new(MemorySessionStore::new()))
            .backend(BackendConfig {
                // Unroutable: remote runs must degrade, not hang or panic.
                api_base: "http://127.0.0.1:9".to_string(),
            })
            .runtime_assets(RuntimeAssetConfig {
                version: "0.26.4".to_string(),
                cdn_base: "https://cdn.example/pyodide".to_string(),
            })
            .enhance(EnhanceConfig {
                marker_class: "language-python".to_string(),
                language: "python".to_string(),
            })
            .execution_limits(ExecutionConfig {
                default_timeout_secs: 10,
                max_timeout_secs: 30,
            })
            .build()
    }

    fn page_with_block(code: &str) -> SharedDocument {
        let mut doc = Document::new();
        let root = doc.root();
        let block = doc.create_element("div");
        doc.add_class(block, "language-python");
        let pre = doc.create_element("pre");
        let code_el = doc.create_element("code");
        doc.set_text(code_el, code);
        doc.append_child(block, pre);
        doc.append_child(pre, code_el);
        doc.append_child(root, block);
        doc.into_shared()
    }

    async fn wait_for_widgets(app: &Livedoc, expected: usize) {
        for _ in 0..200 {
            if app.widgets.len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("expected {expected} widgets, saw {}", app.widgets.len());
    }

    #[tokio::test]
    async fn page_lifecycle_mounts_once_and_runs_in_browser() {
        let app = test_app();
        let doc = page_with_block("print(1+1)");

        let (events, driver) = app.attach(doc.clone());
        events.emit(PageEvent::Loaded);
        events.emit(PageEvent::RouteChanged);
        events.emit(PageEvent::SubtreeChanged);
        wait_for_widgets(&app, 1).await;
        drop(events);
        driver.await.unwrap();

        assert_eq!(app.widgets.len(), 1);
        assert_eq!(doc.lock().unwrap().select_by_attr(WIDGET_ATTR).len(), 1);

        let widget = app.widgets.get("live-widget-0").unwrap();
        assert_eq!(widget.code(), "print(1+1)");
        assert_eq!(widget.language(), "python");

        let result = widget.run(ExecutionMode::InBrowser).await;
        assert!(result.success);
        assert_eq!(result.output.as_deref(), Some("ran: print(1+1)"));
        assert!(app.loader.is_ready());
    }

    #[tokio::test]
    async fn remote_run_against_dead_backend_degrades_to_failure_response() {
        let app = test_app();
        let doc = page_with_block("print(2)");

        let (events, _driver) = app.attach(doc);
        events.emit(PageEvent::Loaded);
        wait_for_widgets(&app, 1).await;

        let widget = app.widgets.get("live-widget-0").unwrap();
        let result = widget.run(ExecutionMode::Remote).await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn mounted_widget_markup_is_not_reenhanced() {
        let app = test_app();
        let doc = page_with_block("x = 1");

        let (events, _driver) = app.attach(doc.clone());
        events.emit(PageEvent::Loaded);
        wait_for_widgets(&app, 1).await;

        // The widget's own `code.language-python` is now in the tree; the
        // mutation observer would re-fire on exactly this kind of insertion.
        events.emit(PageEvent::SubtreeChanged);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(app.widgets.len(), 1);
        assert_eq!(doc.lock().unwrap().select_by_attr(WIDGET_ATTR).len(), 1);
    }
}
