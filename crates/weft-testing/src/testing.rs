//! Doubles for the host tree and the reactive engine.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use weft_core::{
    on_cleanup, HostTree, MemoryNodeKind, MemoryTree, NodeId, ReactiveCell, TreeError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOp {
    CreateText(NodeId),
    SetText(NodeId),
    InsertBefore {
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    },
    RemoveChild {
        parent: NodeId,
        node: NodeId,
    },
    ReplaceChild {
        parent: NodeId,
        new_node: NodeId,
        old_node: NodeId,
    },
    ClearChildren(NodeId),
}

impl TreeOp {
    /// Whether the operation changes where nodes sit in the tree.
    pub fn is_structural(&self) -> bool {
        !matches!(self, TreeOp::CreateText(_) | TreeOp::SetText(_))
    }
}

/// [`MemoryTree`] that logs every call made through [`HostTree`].
///
/// Failed calls are not logged.
#[derive(Debug, Default)]
pub struct RecordingTree {
    tree: MemoryTree,
    ops: Vec<TreeOp>,
}

impl RecordingTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &MemoryTree {
        &self.tree
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create_element(tag)
    }

    /// Element with one text child per label. Built on the inner tree, so nothing
    /// is recorded.
    pub fn mounted_list(&mut self, labels: &[&str]) -> Result<(NodeId, Vec<NodeId>), TreeError> {
        let parent = self.tree.create_element("list");
        let mut children = Vec::with_capacity(labels.len());
        for label in labels {
            let child = self.tree.create_text(label);
            self.tree.append_child(parent, child)?;
            children.push(child);
        }
        Ok((parent, children))
    }

    /// Detached text nodes, one per label. Not recorded.
    pub fn detached(&mut self, labels: &[&str]) -> Vec<NodeId> {
        labels
            .iter()
            .map(|label| self.tree.create_text(label))
            .collect()
    }

    pub fn ops(&self) -> &[TreeOp] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<TreeOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn structural_ops(&self) -> usize {
        self.ops.iter().filter(|op| op.is_structural()).count()
    }

    pub fn clears(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, TreeOp::ClearChildren(_)))
            .count()
    }

    pub fn children(&self, parent: NodeId) -> &[NodeId] {
        self.tree.children(parent)
    }

    /// Text of every child of `parent`; elements show as `<tag>`.
    pub fn labels(&self, parent: NodeId) -> Vec<String> {
        self.tree
            .children(parent)
            .iter()
            .map(|&id| match self.tree.kind(id) {
                Some(MemoryNodeKind::Text(text)) => text.clone(),
                Some(MemoryNodeKind::Element(tag)) => format!("<{tag}>"),
                None => format!("<missing {id}>"),
            })
            .collect()
    }

    fn record(&mut self, result: Result<(), TreeError>, op: TreeOp) -> Result<(), TreeError> {
        if result.is_ok() {
            self.ops.push(op);
        }
        result
    }
}

impl HostTree for RecordingTree {
    fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.tree.create_text(text);
        self.ops.push(TreeOp::CreateText(id));
        id
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), TreeError> {
        let result = self.tree.set_text(node, text);
        self.record(result, TreeOp::SetText(node))
    }

    fn is_text(&self, node: NodeId) -> bool {
        self.tree.is_text(node)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), TreeError> {
        let result = self.tree.insert_before(parent, node, reference);
        self.record(
            result,
            TreeOp::InsertBefore {
                parent,
                node,
                reference,
            },
        )
    }

    fn remove_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        let result = self.tree.remove_child(parent, node);
        self.record(result, TreeOp::RemoveChild { parent, node })
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_node: NodeId,
        old_node: NodeId,
    ) -> Result<(), TreeError> {
        let result = self.tree.replace_child(parent, new_node, old_node);
        self.record(
            result,
            TreeOp::ReplaceChild {
                parent,
                new_node,
                old_node,
            },
        )
    }

    fn clear_children(&mut self, parent: NodeId) -> Result<(), TreeError> {
        let result = self.tree.clear_children(parent);
        self.record(result, TreeOp::ClearChildren(parent))
    }

    fn parent_node(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent_node(node)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        self.tree.next_sibling(node)
    }

    fn first_child(&self, parent: NodeId) -> Option<NodeId> {
        self.tree.first_child(parent)
    }

    fn last_child(&self, parent: NodeId) -> Option<NodeId> {
        self.tree.last_child(parent)
    }
}

/// Manually driven [`ReactiveCell`]: `set` notifies every listener synchronously.
pub struct TestCell<T> {
    value: RefCell<T>,
    listeners: RefCell<Vec<Rc<dyn Fn()>>>,
    evaluations: Cell<usize>,
    disposed: Cell<bool>,
}

impl<T: Clone + 'static> TestCell<T> {
    pub fn new(value: T) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(value),
            listeners: RefCell::new(Vec::new()),
            evaluations: Cell::new(0),
            disposed: Cell::new(false),
        })
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
        self.notify();
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        self.notify();
    }

    fn notify(&self) {
        if self.disposed.get() {
            return;
        }
        // Listeners may subscribe or read while being notified.
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

impl<T: Clone + 'static> ReactiveCell for TestCell<T> {
    type Value = T;

    fn evaluate(&self) -> T {
        self.evaluations.set(self.evaluations.get() + 1);
        self.get()
    }

    fn subscribe(&self, listener: Rc<dyn Fn()>) {
        self.listeners.borrow_mut().push(listener);
    }

    fn dispose(&self) {
        self.disposed.set(true);
        self.listeners.borrow_mut().clear();
    }
}

impl<T: fmt::Debug> fmt::Debug for TestCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCell")
            .field("value", &self.value.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}

/// Shared counter for closures that must count their own invocations.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Rc<Cell<usize>>);

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn count(&self) -> usize {
        self.0.get()
    }

    /// Return the count and start over from zero.
    pub fn take(&self) -> usize {
        self.0.replace(0)
    }
}

/// Records which values had their owning scope disposed, in disposal order.
#[derive(Debug)]
pub struct DisposeLog<T> {
    entries: Rc<RefCell<Vec<T>>>,
}

impl<T> Clone for DisposeLog<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<T> Default for DisposeLog<T> {
    fn default() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T: Clone + 'static> DisposeLog<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `value` when the active scope is disposed.
    pub fn track(&self, value: T) -> bool {
        let entries = Rc::clone(&self.entries);
        on_cleanup(move || entries.borrow_mut().push(value))
    }

    pub fn entries(&self) -> Vec<T> {
        self.entries.borrow().clone()
    }

    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
