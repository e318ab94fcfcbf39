//! Observation plumbing: an explicit stream of page events feeding the scan.
//!
//! The host (page lifecycle hooks, a mutation observer bridge) emits
//! [`PageEvent`]s; [`ScanDriver`] re-runs the full scan per event. The scan
//! algorithm itself lives in [`crate::enhancer`] and is testable without any
//! of this.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dom::SharedDocument;
use crate::enhancer::CodeBlockEnhancer;

/// Why a re-scan is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Initial page load.
    Loaded,
    /// Client-side route change.
    RouteChanged,
    /// Subtree insertion somewhere under the document body. Unrelated
    /// mutations fire this too; idempotency makes the repeat scan cheap.
    SubtreeChanged,
}

/// Sending half handed to the host environment.
#[derive(Clone)]
pub struct PageEvents {
    tx: mpsc::UnboundedSender<PageEvent>,
}

impl PageEvents {
    /// Fire-and-forget; events after the driver stops are dropped.
    pub fn emit(&self, event: PageEvent) {
        let _ = self.tx.send(event);
    }
}

/// Create the event channel: the sender goes to the host, the receiver to
/// [`ScanDriver::run`].
pub fn page_events() -> (PageEvents, mpsc::UnboundedReceiver<PageEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (PageEvents { tx }, rx)
}

/// Consumes page events and re-scans the shared document for each one.
pub struct ScanDriver {
    enhancer: Arc<CodeBlockEnhancer>,
    doc: SharedDocument,
}

impl ScanDriver {
    pub fn new(enhancer: Arc<CodeBlockEnhancer>, doc: SharedDocument) -> Self {
        Self { enhancer, doc }
    }

    /// Run until every [`PageEvents`] handle is dropped.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<PageEvent>) {
        while let Some(event) = events.recv().await {
            let count = self.enhancer.scan(&self.doc);
            if count > 0 {
                tracing::info!(?event, "enhanced {count} code block(s)");
            } else {
                tracing::debug!(?event, "scan found nothing new");
            }
        }
    }
}
