//! Keyed child lists bound to the host tree.
//!
//! [`KeyedChildren`] maps items to host nodes with a [`KeyedListMapper`] and then
//! reconciles the parent's children against the mapped nodes. [`bind_keyed_children`]
//! drives one from a [`ReactiveCell`] and releases it with the active scope.

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use crate::cell::ReactiveCell;
use crate::map_keyed::KeyedListMapper;
use crate::node::{HostTree, NodeId, TreeError};
use crate::owner::{current_scope, on_cleanup, Scope};
use crate::reconcile::reconcile_children;

pub struct KeyedChildren<T, K> {
    mapper: KeyedListMapper<T, K, NodeId>,
    parent: NodeId,
    marker: Option<NodeId>,
    current: Vec<NodeId>,
    disposed: bool,
}

impl<T, K> KeyedChildren<T, K>
where
    K: Eq + Hash + 'static,
{
    /// Children of `parent` placed before `marker` (or at the end), keyed by `key_fn`.
    pub fn new(
        parent: NodeId,
        marker: Option<NodeId>,
        key_fn: impl Fn(&T) -> K + 'static,
    ) -> Self {
        Self {
            mapper: KeyedListMapper::with_key(key_fn),
            parent,
            marker,
            current: Vec::new(),
            disposed: false,
        }
    }

    /// Bring the managed children in line with `items`.
    ///
    /// `render` builds the node for an item the mapper has not seen in place; it runs
    /// inside that item's scope. When it fails, the items rendered before the failure
    /// are still mounted and the error is returned.
    pub fn update<H: HostTree + ?Sized>(
        &mut self,
        tree: &mut H,
        items: &[T],
        mut render: impl FnMut(&mut H, &T, usize) -> Result<NodeId, TreeError>,
    ) -> Result<&[NodeId], TreeError> {
        if self.disposed {
            log::warn!("update on disposed keyed children of node {}", self.parent);
            return Ok(&self.current);
        }
        let mapped = self
            .mapper
            .try_update(items, |item, index| render(tree, item, index))
            .map(|_| ());
        let target = self.mapper.mapped().to_vec();
        reconcile_children(tree, self.parent, &self.current, &target, self.marker)?;
        self.current = target;
        mapped?;
        Ok(&self.current)
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.current
    }

    pub fn parent(&self) -> NodeId {
        self.parent
    }

    /// Release every item scope. Mounted nodes stay where they are.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.mapper.dispose_all();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl<T, K: fmt::Debug> fmt::Debug for KeyedChildren<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedChildren")
            .field("parent", &self.parent)
            .field("marker", &self.marker)
            .field("current", &self.current)
            .field("disposed", &self.disposed)
            .finish()
    }
}

fn run_in<R>(owner: Option<&Scope>, f: impl FnOnce() -> R) -> R {
    match owner {
        Some(owner) => owner.run(f),
        None => f(),
    }
}

/// Render `cell`'s items into `children` now and again after every change.
///
/// Updates triggered by the cell run with the scope that was active at bind time, so
/// item scopes keep the same parent and see the same contexts. Disposing that scope
/// disposes the list. Failures after the initial render are logged.
pub fn bind_keyed_children<C, T, K, H, R>(
    cell: Rc<C>,
    tree: Rc<RefCell<H>>,
    children: KeyedChildren<T, K>,
    render: R,
) -> Result<Rc<RefCell<KeyedChildren<T, K>>>, TreeError>
where
    C: ReactiveCell<Value = Vec<T>> + 'static,
    T: 'static,
    K: Eq + Hash + 'static,
    H: HostTree + 'static,
    R: FnMut(&mut H, &T, usize) -> Result<NodeId, TreeError> + 'static,
{
    let owner = current_scope();
    let children = Rc::new(RefCell::new(children));
    let render = Rc::new(RefCell::new(render));

    let owned = Rc::clone(&children);
    on_cleanup(move || match owned.try_borrow_mut() {
        Ok(mut children) => children.dispose(),
        Err(_) => log::error!("keyed children disposed while updating"),
    });

    children
        .borrow_mut()
        .update(&mut *tree.borrow_mut(), &cell.evaluate(), &mut *render.borrow_mut())?;

    let weak_children = Rc::downgrade(&children);
    let weak_tree = Rc::downgrade(&tree);
    let weak_cell = Rc::downgrade(&cell);
    cell.subscribe(Rc::new(move || {
        let (Some(children), Some(tree), Some(cell)) = (
            weak_children.upgrade(),
            weak_tree.upgrade(),
            weak_cell.upgrade(),
        ) else {
            return;
        };
        let items = cell.evaluate();
        let (Ok(mut children), Ok(mut tree), Ok(mut render)) = (
            children.try_borrow_mut(),
            tree.try_borrow_mut(),
            render.try_borrow_mut(),
        ) else {
            log::warn!("keyed children update re-entered; change skipped");
            return;
        };
        if children.is_disposed() {
            return;
        }
        let result = run_in(owner.as_ref(), || {
            children.update(&mut *tree, &items, &mut *render).map(|_| ())
        });
        if let Err(err) = result {
            log::error!("keyed children update failed: {err}");
        }
    }));

    Ok(children)
}

#[cfg(test)]
#[path = "tests/binding_tests.rs"]
mod tests;
