//! Inserting dynamic content into a parent node.
//!
//! [`insert_content`] takes what is currently mounted and the next [`Content`]
//! value, and brings the tree in line: text is patched in place when possible,
//! single nodes replace what was there, lists are flattened and reconciled.
//!
//! A [`Region`] says how much of the parent the content owns. `Region::Whole`
//! owns every child and may clear the parent outright. `Region::Before(marker)`
//! owns only the run of children ending right before `marker`, so it never clears
//! wholesale and leaves an empty text node behind as a position holder when the
//! content becomes empty.

use std::fmt;
use std::rc::Rc;

use crate::node::{HostTree, NodeId, TreeError};
use crate::reconcile::reconcile_children;

#[derive(Clone, Default)]
pub enum Content {
    #[default]
    Empty,
    Text(String),
    Node(NodeId),
    Fragment(Vec<Content>),
    /// Evaluated every time the content is inserted or flattened.
    Dynamic(Rc<dyn Fn() -> Content>),
}

impl Content {
    pub fn dynamic(f: impl Fn() -> Content + 'static) -> Self {
        Content::Dynamic(Rc::new(f))
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Empty => f.write_str("Empty"),
            Content::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Content::Node(id) => f.debug_tuple("Node").field(id).finish(),
            Content::Fragment(items) => f.debug_tuple("Fragment").field(items).finish(),
            Content::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_owned())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Vec<Content>> for Content {
    fn from(items: Vec<Content>) -> Self {
        Content::Fragment(items)
    }
}

impl<C: Into<Content>> From<Option<C>> for Content {
    fn from(value: Option<C>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// What a previous [`insert_content`] call left in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mounted {
    #[default]
    Nothing,
    Text(NodeId),
    Node(NodeId),
    Nodes(Vec<NodeId>),
}

impl Mounted {
    pub fn nodes(&self) -> Vec<NodeId> {
        match self {
            Mounted::Nothing => Vec::new(),
            Mounted::Text(id) | Mounted::Node(id) => vec![*id],
            Mounted::Nodes(ids) => ids.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Whole,
    Before(Option<NodeId>),
}

pub fn insert_content<H: HostTree + ?Sized>(
    tree: &mut H,
    parent: NodeId,
    value: &Content,
    current: Mounted,
    region: Region,
) -> Result<Mounted, TreeError> {
    let current_nodes = current.nodes();
    let parent = match (region, current_nodes.first()) {
        (Region::Before(_), Some(&first)) => tree.parent_node(first).unwrap_or(parent),
        _ => parent,
    };

    match value {
        Content::Dynamic(f) => insert_content(tree, parent, &f(), current, region),
        Content::Text(text) => match region {
            Region::Before(marker) => {
                let node = match current_nodes.first() {
                    Some(&first) if tree.is_text(first) => {
                        tree.set_text(first, text)?;
                        first
                    }
                    _ => tree.create_text(text),
                };
                let nodes = clean_children(tree, parent, &current_nodes, marker, Some(node))?;
                Ok(Mounted::Nodes(nodes))
            }
            Region::Whole => {
                if let Mounted::Text(node) = current {
                    tree.set_text(node, text)?;
                    return Ok(Mounted::Text(node));
                }
                tree.clear_children(parent)?;
                let node = tree.create_text(text);
                tree.append_child(parent, node)?;
                Ok(Mounted::Text(node))
            }
        },
        Content::Empty => clear_region(tree, parent, &current_nodes, region),
        Content::Node(node) => {
            let node = *node;
            match (region, &current) {
                (_, Mounted::Node(existing)) if *existing == node => Ok(Mounted::Node(node)),
                (Region::Before(marker), _) => {
                    let nodes = clean_children(tree, parent, &current_nodes, marker, Some(node))?;
                    Ok(Mounted::Nodes(nodes))
                }
                (Region::Whole, Mounted::Nodes(existing)) => {
                    clean_children(tree, parent, existing, None, Some(node))?;
                    Ok(Mounted::Node(node))
                }
                (Region::Whole, Mounted::Nothing) => {
                    tree.append_child(parent, node)?;
                    Ok(Mounted::Node(node))
                }
                (Region::Whole, Mounted::Text(existing) | Mounted::Node(existing)) => {
                    tree.replace_child(parent, node, *existing)?;
                    Ok(Mounted::Node(node))
                }
            }
        }
        Content::Fragment(_) => {
            let mut nodes = Vec::new();
            flatten(tree, value, &mut nodes);
            if nodes.is_empty() {
                return clear_region(tree, parent, &current_nodes, region);
            }
            let marker = match region {
                Region::Before(marker) => marker,
                Region::Whole => None,
            };
            if current_nodes.is_empty() {
                for &node in &nodes {
                    tree.insert_before(parent, node, marker)?;
                }
            } else {
                reconcile_children(tree, parent, &current_nodes, &nodes, marker)?;
            }
            Ok(Mounted::Nodes(nodes))
        }
    }
}

fn clear_region<H: HostTree + ?Sized>(
    tree: &mut H,
    parent: NodeId,
    current: &[NodeId],
    region: Region,
) -> Result<Mounted, TreeError> {
    match region {
        Region::Whole => {
            if !current.is_empty() {
                tree.clear_children(parent)?;
            }
            Ok(Mounted::Nothing)
        }
        Region::Before(marker) => Ok(Mounted::Nodes(clean_children(
            tree, parent, current, marker, None,
        )?)),
    }
}

/// Replace the run `current` with a single node and return it as the new run.
///
/// The replacement defaults to a fresh empty text node. With an empty `current`
/// the replacement is inserted before `marker`.
pub fn clean_children<H: HostTree + ?Sized>(
    tree: &mut H,
    parent: NodeId,
    current: &[NodeId],
    marker: Option<NodeId>,
    replacement: Option<NodeId>,
) -> Result<Vec<NodeId>, TreeError> {
    let node = match replacement {
        Some(node) => node,
        None => tree.create_text(""),
    };
    match current.split_first() {
        Some((&first, rest)) => {
            if node != first {
                tree.replace_child(parent, node, first)?;
            }
            for &stale in rest.iter().rev() {
                if stale != node {
                    tree.remove_child(parent, stale)?;
                }
            }
        }
        None => tree.insert_before(parent, node, marker)?,
    }
    Ok(vec![node])
}

/// Flatten nested content into host nodes, creating text nodes as needed.
fn flatten<H: HostTree + ?Sized>(tree: &mut H, content: &Content, out: &mut Vec<NodeId>) {
    match content {
        Content::Empty => {}
        Content::Text(text) => out.push(tree.create_text(text)),
        Content::Node(node) => out.push(*node),
        Content::Fragment(items) => {
            for item in items {
                flatten(tree, item, out);
            }
        }
        Content::Dynamic(f) => flatten(tree, &f(), out),
    }
}

#[cfg(test)]
#[path = "tests/insert_tests.rs"]
mod tests;
