//! Idempotency guard: which nodes have already been transformed.
//!
//! Identity-based in-memory marker; the durable counterpart is the
//! `data-live-enhanced` attribute the enhancer writes alongside. Mutated
//! only by the enhancer, synchronously, before any suspension point.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::dom::NodeId;

#[derive(Default)]
pub struct ProcessedElementRegistry {
    set: Mutex<HashSet<NodeId>>,
}

impl ProcessedElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as processed. Returns false if it already was.
    pub fn mark(&self, id: NodeId) -> bool {
        self.set.lock().unwrap().insert(id)
    }

    pub fn is_marked(&self, id: NodeId) -> bool {
        self.set.lock().unwrap().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.set.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
