//! The executable widget a code block becomes, and the resolver that mounts
//! it.
//!
//! Visual chrome (editor, buttons, output panel) lives with the host; this
//! layer provides the hooks it calls: the captured code, the language tag,
//! and `run` with a client-side choice of execution mode.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use livedoc_client::{HttpExecutionTransport, RemoteExecutionClient};
use livedoc_core::protocol::ExecuteCodeResponse;
use livedoc_enhance::{EnhanceError, NodeId, SharedDocument, WidgetFactory, WidgetResolver};
use livedoc_runtime::RuntimeLoader;

/// Where a widget's code runs; chosen per run, client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// On the lazily-loaded embedded runtime.
    InBrowser,
    /// On the remote execution backend (isolated, with fallback).
    Remote,
}

/// One mounted live code block.
pub struct LiveCodeWidget {
    placeholder: NodeId,
    code: String,
    language: String,
    loader: Arc<RuntimeLoader>,
    executor: Arc<RemoteExecutionClient<HttpExecutionTransport>>,
}

impl LiveCodeWidget {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn placeholder(&self) -> NodeId {
        self.placeholder
    }

    /// Run the captured code. Never errors: every failure — runtime load,
    /// runtime execution, backend — renders as a failure response the host
    /// can display inside the widget.
    pub async fn run(&self, mode: ExecutionMode) -> ExecuteCodeResponse {
        match mode {
            ExecutionMode::Remote => self.executor.execute_isolated(&self.code, None).await,
            ExecutionMode::InBrowser => match self.loader.get_runtime().await {
                Ok(runtime) => match runtime.run(&self.code).await {
                    Ok(output) => ExecuteCodeResponse {
                        success: true,
                        output: Some(output),
                        error: None,
                        execution_time: None,
                    },
                    Err(e) => ExecuteCodeResponse::failure(e.to_string()),
                },
                Err(e) => ExecuteCodeResponse::failure(format!("runtime unavailable: {e}")),
            },
        }
    }
}

/// Widgets mounted so far, keyed by placeholder DOM id (`live-widget-{n}`).
/// The host's visual layer looks its widget up here.
#[derive(Default)]
pub struct MountedWidgets {
    map: Mutex<HashMap<String, Arc<LiveCodeWidget>>>,
}

impl MountedWidgets {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, dom_id: String, widget: Arc<LiveCodeWidget>) {
        self.map.lock().unwrap().insert(dom_id, widget);
    }

    pub fn get(&self, dom_id: &str) -> Option<Arc<LiveCodeWidget>> {
        self.map.lock().unwrap().get(dom_id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.map.lock().unwrap().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolver handed to the enhancer: produces factories that mount
/// [`LiveCodeWidget`]s wired to the shared loader and executor.
pub struct ExecutableWidgetResolver {
    loader: Arc<RuntimeLoader>,
    executor: Arc<RemoteExecutionClient<HttpExecutionTransport>>,
    mounted: Arc<MountedWidgets>,
}

impl ExecutableWidgetResolver {
    pub fn new(
        loader: Arc<RuntimeLoader>,
        executor: Arc<RemoteExecutionClient<HttpExecutionTransport>>,
        mounted: Arc<MountedWidgets>,
    ) -> Self {
        Self {
            loader,
            executor,
            mounted,
        }
    }
}

#[async_trait]
impl WidgetResolver for ExecutableWidgetResolver {
    async fn resolve(&self, _language: &str) -> Result<Arc<dyn WidgetFactory>, EnhanceError> {
        // Factories are cheap here; the seam exists so hosts with heavier
        // component loading can swap in their own resolver.
        Ok(Arc::new(LiveCodeWidgetFactory {
            loader: self.loader.clone(),
            executor: self.executor.clone(),
            mounted: self.mounted.clone(),
        }))
    }
}

struct LiveCodeWidgetFactory {
    loader: Arc<RuntimeLoader>,
    executor: Arc<RemoteExecutionClient<HttpExecutionTransport>>,
    mounted: Arc<MountedWidgets>,
}

#[async_trait]
impl WidgetFactory for LiveCodeWidgetFactory {
    async fn mount(
        &self,
        doc: &SharedDocument,
        placeholder: NodeId,
        code: &str,
        language: &str,
    ) -> Result<(), EnhanceError> {
        let dom_id = {
            let mut guard = doc.lock().unwrap();
            if !guard.is_attached(placeholder) {
                return Err(EnhanceError::Mount("placeholder is detached".to_string()));
            }
            let root = guard.create_element("div");
            guard.add_class(root, "live-code-widget");
            let pre = guard.create_element("pre");
            let code_el = guard.create_element("code");
            // The widget re-renders the block with its marker class; the
            // enhancer's output-container guard keeps re-scans out of it.
            guard.add_class(code_el, &format!("language-{language}"));
            guard.set_text(code_el, code);
            guard.append_child(root, pre);
            guard.append_child(pre, code_el);
            guard.append_child(placeholder, root);
            guard
                .attr(placeholder, "id")
                .unwrap_or_default()
                .to_string()
        };

        let widget = Arc::new(LiveCodeWidget {
            placeholder,
            code: code.to_string(),
            language: language.to_string(),
            loader: self.loader.clone(),
            executor: self.executor.clone(),
        });
        self.mounted.insert(dom_id, widget);
        Ok(())
    }
}
