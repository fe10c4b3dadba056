//! Host tree abstraction consumed by the reconciler, plus an in-memory host.
//!
//! The reconciler and the content inserter only ever touch the tree through
//! [`HostTree`]. Node handles are opaque [`NodeId`]s compared by identity; a host
//! never has to expose node content.

use std::fmt;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    Missing { id: NodeId },
    NotAChild { parent: NodeId, child: NodeId },
    NotText { id: NodeId },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Missing { id } => write!(f, "node {id} missing"),
            TreeError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of node {parent}")
            }
            TreeError::NotText { id } => write!(f, "node {id} is not a text node"),
        }
    }
}

impl std::error::Error for TreeError {}

/// Mutation and navigation surface of the host tree.
///
/// `insert_before` moves `node` when it is already attached somewhere, exactly like
/// the DOM operation of the same name; a `reference` of `None` appends.
pub trait HostTree {
    fn create_text(&mut self, text: &str) -> NodeId;
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), TreeError>;
    fn is_text(&self, node: NodeId) -> bool;

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TreeError>;

    fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.insert_before(parent, node, None)
    }

    fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError>;
    fn replace_child(
        &mut self,
        parent: NodeId,
        new_node: NodeId,
        old_node: NodeId,
    ) -> Result<(), TreeError>;

    /// Detach every child of `parent` in one operation.
    fn clear_children(&mut self, parent: NodeId) -> Result<(), TreeError>;

    fn parent_node(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;
    fn first_child(&self, parent: NodeId) -> Option<NodeId>;
    fn last_child(&self, parent: NodeId) -> Option<NodeId>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryNodeKind {
    Element(String),
    Text(String),
}

#[derive(Debug)]
struct MemoryNode {
    kind: MemoryNodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed [`HostTree`]. Detached nodes stay in the arena and can be
/// reattached later, mirroring how a DOM keeps detached nodes alive.
#[derive(Debug, Default)]
pub struct MemoryTree {
    nodes: Vec<MemoryNode>, // FUTURE(no_std): migrate to arena-backed node storage.
    mutations: usize,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(MemoryNodeKind::Element(tag.to_owned()))
    }

    fn push(&mut self, kind: MemoryNodeKind) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(MemoryNode {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> Option<&MemoryNodeKind> {
        self.nodes.get(id).map(|node| &node.kind)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            MemoryNodeKind::Text(text) => Some(text),
            MemoryNodeKind::Element(_) => None,
        }
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Number of structural mutations (insert, remove, replace, clear) applied so far.
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn reset_mutations(&mut self) {
        self.mutations = 0;
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.nodes.get(id) {
            Some(node) => {
                match &node.kind {
                    MemoryNodeKind::Element(tag) => {
                        output.push_str(&format!("{indent}[{id}] <{tag}>\n"))
                    }
                    MemoryNodeKind::Text(text) => {
                        output.push_str(&format!("{indent}[{id}] {text:?}\n"))
                    }
                }
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
            None => output.push_str(&format!("{indent}[{id}] (missing)\n")),
        }
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, TreeError> {
        self.nodes.get(id).ok_or(TreeError::Missing { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, TreeError> {
        self.nodes.get_mut(id).ok_or(TreeError::Missing { id })
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize, TreeError> {
        self.node(parent)?
            .children
            .iter()
            .position(|&c| c == child)
            .ok_or(TreeError::NotAChild { parent, child })
    }

    fn detach(&mut self, node: NodeId) -> Result<(), TreeError> {
        if let Some(parent) = self.node(node)?.parent {
            let index = self.child_index(parent, node)?;
            self.node_mut(parent)?.children.remove(index);
            self.node_mut(node)?.parent = None;
        }
        Ok(())
    }
}

impl HostTree for MemoryTree {
    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(MemoryNodeKind::Text(text.to_owned()))
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), TreeError> {
        match &mut self.node_mut(node)?.kind {
            MemoryNodeKind::Text(current) => {
                current.clear();
                current.push_str(text);
                Ok(())
            }
            MemoryNodeKind::Element(_) => Err(TreeError::NotText { id: node }),
        }
    }

    fn is_text(&self, node: NodeId) -> bool {
        matches!(self.kind(node), Some(MemoryNodeKind::Text(_)))
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TreeError> {
        self.node(parent)?;
        self.node(node)?;
        if reference == Some(node) {
            return Ok(());
        }
        if let Some(reference) = reference {
            self.child_index(parent, reference)?;
        }
        self.detach(node)?;
        let index = match reference {
            Some(reference) => self.child_index(parent, reference)?,
            None => self.node(parent)?.children.len(),
        };
        self.node_mut(parent)?.children.insert(index, node);
        self.node_mut(node)?.parent = Some(parent);
        self.mutations += 1;
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        let index = self.child_index(parent, node)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(node)?.parent = None;
        self.mutations += 1;
        Ok(())
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_node: NodeId,
        old_node: NodeId,
    ) -> Result<(), TreeError> {
        self.node(new_node)?;
        self.child_index(parent, old_node)?;
        if new_node == old_node {
            return Ok(());
        }
        self.detach(new_node)?;
        let index = self.child_index(parent, old_node)?;
        self.node_mut(parent)?.children[index] = new_node;
        self.node_mut(old_node)?.parent = None;
        self.node_mut(new_node)?.parent = Some(parent);
        self.mutations += 1;
        Ok(())
    }

    fn clear_children(&mut self, parent: NodeId) -> Result<(), TreeError> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in children {
            self.node_mut(child)?.parent = None;
        }
        self.mutations += 1;
        Ok(())
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node)?.parent
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(node)?.parent?;
        let siblings = &self.nodes.get(parent)?.children;
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.get(index + 1).copied()
    }

    fn first_child(&self, parent: NodeId) -> Option<NodeId> {
        self.nodes.get(parent)?.children.first().copied()
    }

    fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self.nodes.get(parent)?.children.last().copied()
    }
}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod tests;
