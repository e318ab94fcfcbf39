//! Arena-backed document tree.
//!
//! An in-process analogue of the host page's DOM, rich enough for the scan
//! algorithm and its tests: tags, classes, attributes, text, parent links,
//! and in-place replacement. Node identity is the arena index; a replacement
//! detaches the old subtree, and any fresh content the host inserts later is
//! new nodes with new ids — which is exactly why a replaced element becomes
//! eligible for enhancement again.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Document shared between the scanner and asynchronous widget mounts.
/// Lock only around tree edits, never across an await.
pub type SharedDocument = Arc<Mutex<Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, thiserror::Error)]
pub enum DomError {
    #[error("node is detached from the document")]
    Detached,
    #[error("document root cannot be replaced")]
    RootReplacement,
}

#[derive(Debug)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: None,
            children: Vec::new(),
            parent: None,
        }
    }
}

/// Document tree. `NodeId`s are only meaningful for the document that
/// created them.
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Document {
    /// Empty document with a `body` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new("body")],
            root: NodeId(0),
        }
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached element; attach it with [`append_child`](Self::append_child).
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData::new(tag));
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.nodes[id.0].text = Some(text.to_string());
    }

    /// Concatenated text of the node and its descendants, document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = &self.nodes[id.0].text {
            out.push_str(text);
        }
        for child in self.nodes[id.0].children.clone() {
            self.collect_text(child, out);
        }
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        let classes = &mut self.nodes[id.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.nodes[id.0].classes.iter().any(|c| c == class)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.nodes[id.0]
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attrs.get(name).map(|s| s.as_str())
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.nodes[id.0].attrs.contains_key(name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Parent chain from nearest to root. Works on detached subtrees too
    /// (the chain just stops at the detachment point).
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.nodes[id.0].parent;
        while let Some(p) = cur {
            out.push(p);
            cur = self.nodes[p.0].parent;
        }
        out
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut cur = id;
        loop {
            if cur == self.root {
                return true;
            }
            match self.nodes[cur.0].parent {
                Some(p) => cur = p,
                None => return false,
            }
        }
    }

    /// Swap `new` into `old`'s position; `old`'s subtree is detached.
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        if old == self.root {
            return Err(DomError::RootReplacement);
        }
        let parent = self.nodes[old.0].parent.ok_or(DomError::Detached)?;
        let slot = self.nodes[parent.0]
            .children
            .iter()
            .position(|c| *c == old)
            .ok_or(DomError::Detached)?;
        self.nodes[parent.0].children[slot] = new;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        Ok(())
    }

    /// Attached elements carrying `class`, document (pre-)order.
    pub fn select_by_class(&self, class: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |doc, id| {
            if doc.has_class(id, class) {
                out.push(id);
            }
        });
        out
    }

    /// Attached elements carrying `class` with the given tag, document order.
    pub fn select_by_class_and_tag(&self, class: &str, tag: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |doc, id| {
            if doc.tag(id) == tag && doc.has_class(id, class) {
                out.push(id);
            }
        });
        out
    }

    /// Attached elements carrying the attribute, document order.
    pub fn select_by_attr(&self, name: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(self.root, &mut |doc, id| {
            if doc.has_attr(id, name) {
                out.push(id);
            }
        });
        out
    }

    fn walk(&self, id: NodeId, visit: &mut impl FnMut(&Document, NodeId)) {
        visit(self, id);
        for child in self.nodes[id.0].children.clone() {
            self.walk(child, visit);
        }
    }

    /// Total nodes ever created (attached or not).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build the structure the site renderer produces for one code block:
    /// `div.language-python > pre > code` with the literal text.
    fn code_block(doc: &mut Document, parent: NodeId, code_text: &str) -> NodeId {
        let block = doc.create_element("div");
        doc.add_class(block, "language-python");
        let pre = doc.create_element("pre");
        let code = doc.create_element("code");
        doc.set_text(code, code_text);
        doc.append_child(block, pre);
        doc.append_child(pre, code);
        doc.append_child(parent, block);
        block
    }

    #[test]
    fn text_content_concatenates_descendants() {
        let mut doc = Document::new();
        let root = doc.root();
        let block = code_block(&mut doc, root, "print(1+1)");
        assert_eq!(doc.text_content(block), "print(1+1)");
        assert_eq!(doc.text_content(root), "print(1+1)");
    }

    #[test]
    fn select_is_document_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let a = code_block(&mut doc, root, "a");
        let b = code_block(&mut doc, root, "b");
        assert_eq!(doc.select_by_class("language-python"), vec![a, b]);
        assert_eq!(
            doc.select_by_class_and_tag("language-python", "div"),
            vec![a, b]
        );
    }

    #[test]
    fn replace_detaches_old_subtree() {
        let mut doc = Document::new();
        let root = doc.root();
        let block = code_block(&mut doc, root, "x = 1");
        let placeholder = doc.create_element("div");
        doc.replace_with(block, placeholder).unwrap();

        assert!(doc.is_attached(placeholder));
        assert!(!doc.is_attached(block));
        assert_eq!(doc.children(root), &[placeholder]);
        // The detached subtree no longer matches any selector.
        assert!(doc.select_by_class("language-python").is_empty());
    }

    #[test]
    fn replace_of_detached_node_errors() {
        let mut doc = Document::new();
        let orphan = doc.create_element("div");
        let other = doc.create_element("div");
        assert!(matches!(
            doc.replace_with(orphan, other),
            Err(DomError::Detached)
        ));
        let root = doc.root();
        assert!(matches!(
            doc.replace_with(root, other),
            Err(DomError::RootReplacement)
        ));
    }
}
