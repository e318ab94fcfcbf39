//! Code block enhancer: find marked blocks, replace each with a live widget
//! exactly once.
//!
//! The scan is synchronous up to and including the idempotency marking and
//! the placeholder swap; only widget resolution and mounting are
//! asynchronous. That ordering is what makes re-entrant scans safe: a
//! re-scan triggered mid-mount sees the registry entry and the durable
//! attribute and skips the block.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use livedoc_core::config::EnhanceConfig;

use crate::dom::{Document, NodeId, SharedDocument};
use crate::registry::ProcessedElementRegistry;

/// Durable "already transformed" marker. Survives unrelated mutation events;
/// does not survive a full element replacement (new identity, new scan).
pub const ENHANCED_ATTR: &str = "data-live-enhanced";

/// Marks enhancement output containers (placeholders). Blocks nested under
/// one are never enhanced, which also prevents self-recursion when a mounted
/// widget contains a preformatted block of its own.
pub const WIDGET_ATTR: &str = "data-live-widget";

#[derive(Debug, Clone, thiserror::Error)]
pub enum EnhanceError {
    #[error("failed to resolve widget for {language}: {reason}")]
    Resolve { language: String, reason: String },
    #[error("failed to mount widget: {0}")]
    Mount(String),
}

/// Mounts one widget into its placeholder. Implementations lock the document
/// only around tree edits, never across an await.
#[async_trait]
pub trait WidgetFactory: Send + Sync {
    async fn mount(
        &self,
        doc: &SharedDocument,
        placeholder: NodeId,
        code: &str,
        language: &str,
    ) -> Result<(), EnhanceError>;
}

/// Lazily resolves the widget implementation for a language — the dynamic
/// component-loading seam. Injected at the composition root, mocked in tests.
#[async_trait]
pub trait WidgetResolver: Send + Sync {
    async fn resolve(&self, language: &str) -> Result<Arc<dyn WidgetFactory>, EnhanceError>;
}

pub struct CodeBlockEnhancer {
    registry: ProcessedElementRegistry,
    resolver: Arc<dyn WidgetResolver>,
    config: EnhanceConfig,
    widget_seq: AtomicUsize,
}

impl CodeBlockEnhancer {
    pub fn new(resolver: Arc<dyn WidgetResolver>, config: EnhanceConfig) -> Self {
        Self {
            registry: ProcessedElementRegistry::new(),
            resolver,
            config,
            widget_seq: AtomicUsize::new(0),
        }
    }

    pub fn registry(&self) -> &ProcessedElementRegistry {
        &self.registry
    }

    /// Run one full scan. Returns the number of newly enhanced blocks and
    /// spawns one independent mount task per block; no block's mount blocks
    /// another's. Requires a tokio runtime context.
    pub fn scan(&self, doc: &SharedDocument) -> usize {
        let pending = {
            let mut guard = doc.lock().unwrap();
            self.scan_document(&mut guard)
        };
        let count = pending.len();

        for (placeholder, code) in pending {
            let resolver = self.resolver.clone();
            let doc = doc.clone();
            let language = self.config.language.clone();
            tokio::spawn(async move {
                let factory = match resolver.resolve(&language).await {
                    Ok(f) => f,
                    Err(e) => {
                        tracing::warn!("widget resolve failed: {e}");
                        return;
                    }
                };
                if let Err(e) = factory.mount(&doc, placeholder, &code, &language).await {
                    tracing::warn!("widget mount failed: {e}");
                }
            });
        }
        count
    }

    /// The synchronous scan pass: select, guard, mark, swap. Pure with
    /// respect to the document — testable against a static snapshot without
    /// any observer or runtime. Returns (placeholder, captured code) pairs
    /// in document order.
    pub fn scan_document(&self, doc: &mut Document) -> Vec<(NodeId, String)> {
        let marker = &self.config.marker_class;

        // Documents may carry the marker on the wrapping container or on the
        // code element itself; fall back when the primary yields nothing.
        let mut matches = doc.select_by_class_and_tag(marker, "div");
        if matches.is_empty() {
            matches = doc.select_by_class(marker);
        }

        let mut pending = Vec::new();
        for matched in matches {
            // An earlier replacement in this same pass may have detached us.
            if !doc.is_attached(matched) {
                continue;
            }
            let unit = self.renderable_unit(doc, matched);

            if self.registry.is_marked(unit) || doc.has_attr(unit, ENHANCED_ATTR) {
                continue;
            }
            let ancestors = doc.ancestors(unit);
            if ancestors.iter().any(|a| doc.has_attr(*a, WIDGET_ATTR)) {
                continue; // nested in enhancement output
            }
            if ancestors.iter().any(|a| self.registry.is_marked(*a)) {
                continue; // nested in a previously mounted widget's markup
            }

            // Mark before anything can yield: registry insert plus durable
            // attribute, then the swap. A racing re-scan sees both.
            self.registry.mark(unit);
            doc.set_attr(unit, ENHANCED_ATTR, "true");

            let code = doc.text_content(unit);
            let seq = self.widget_seq.fetch_add(1, Ordering::Relaxed);
            let placeholder = doc.create_element("div");
            doc.set_attr(placeholder, "id", &format!("live-widget-{seq}"));
            doc.set_attr(placeholder, WIDGET_ATTR, "true");

            if let Err(e) = doc.replace_with(unit, placeholder) {
                // Unit vanished between selection and swap; the registry
                // entry keeps it from being retried against stale identity.
                tracing::warn!("code block replacement failed: {e}");
                continue;
            }
            pending.push((placeholder, code));
        }
        pending
    }

    /// The enclosing renderable unit of a match: the match itself when it is
    /// a container, else its nearest `div` ancestor, else the match.
    fn renderable_unit(&self, doc: &Document, matched: NodeId) -> NodeId {
        if doc.tag(matched) == "div" {
            return matched;
        }
        doc.ancestors(matched)
            .into_iter()
            .find(|a| doc.tag(*a) == "div")
            .unwrap_or(matched)
    }
}
