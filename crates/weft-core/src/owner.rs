//! Ownership tree.
//!
//! A [`Scope`] owns an ordered list of disposers and an optional context map. Scopes
//! only reference their parent weakly; a parent owns a child exclusively through a
//! disposer the child (or whoever created it) registered, so disposal cascades down
//! the disposer chain rather than through a separate tree walk.
//!
//! The scope currently executing is tracked per thread. Every entry point that
//! switches it ([`Scope::run`], [`create_scope`], [`create_root`], computation runs)
//! restores the previous value through a drop guard, so nesting stays correct even
//! when a callback unwinds.
//!
//! Roots are the exception to handle-based lifetime: [`create_root`] keeps its scope
//! in a per-thread registry until it is disposed, so dropping the [`Dispose`] handle
//! leaves everything the root owns running.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collections::{fast_map_with_capacity, FastMap};
use crate::context::ContextKey;

pub type ScopeId = usize;

pub(crate) type Disposer = Box<dyn FnOnce()>;

static NEXT_SCOPE_ID: AtomicUsize = AtomicUsize::new(1);

fn next_scope_id() -> ScopeId {
    NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)
}

thread_local! {
    static ACTIVE_SCOPE: RefCell<Option<Scope>> = RefCell::new(None);
    static UNTRACKED_DEPTH: Cell<usize> = Cell::new(0);
    static LIVE_ROOTS: RefCell<FastMap<ScopeId, Scope>> = RefCell::new(fast_map_with_capacity(0));
}

struct ScopeInner {
    id: ScopeId,
    parent: Option<Weak<ScopeInner>>,
    root: bool,
    disposers: RefCell<Vec<Disposer>>,
    contexts: RefCell<Option<FastMap<ContextKey, Rc<dyn Any>>>>,
}

/// Handle to an ownership node. Cloning the handle shares the node.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    fn new(parent: Option<&Scope>) -> Self {
        Self::with_root_flag(parent, false)
    }

    fn with_root_flag(parent: Option<&Scope>, root: bool) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                id: next_scope_id(),
                parent: parent.map(|parent| Rc::downgrade(&parent.inner)),
                root,
                disposers: RefCell::new(Vec::new()),
                contexts: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    /// Parent scope, if it is still alive.
    pub fn parent(&self) -> Option<Scope> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Scope { inner })
    }

    /// Run `f` with this scope as the active scope.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        let _active = ActiveScopeGuard::enter(Some(self.clone()));
        f()
    }

    pub fn on_cleanup(&self, f: impl FnOnce() + 'static) {
        self.inner.disposers.borrow_mut().push(Box::new(f));
    }

    pub fn is_root(&self) -> bool {
        self.inner.root
    }

    pub fn pending_disposers(&self) -> usize {
        self.inner.disposers.borrow().len()
    }

    /// Run and clear the disposer list in registration order.
    ///
    /// Disposers registered while this runs land in a fresh list and run on the next
    /// call. A panicking disposer skips the rest of the list. A root leaves the
    /// live-root registry here.
    pub fn dispose(&self) {
        if self.inner.root {
            // The registry may already be gone while the thread's roots are torn down.
            let released = LIVE_ROOTS
                .try_with(|roots| roots.borrow_mut().remove(&self.id()))
                .ok()
                .flatten();
            drop(released);
        }
        let disposers = mem::take(&mut *self.inner.disposers.borrow_mut());
        if !disposers.is_empty() {
            log::trace!("disposing scope {} ({} disposers)", self.id(), disposers.len());
        }
        for disposer in disposers {
            disposer();
        }
    }

    pub(crate) fn set_context(&self, key: ContextKey, value: Rc<dyn Any>) {
        self.inner
            .contexts
            .borrow_mut()
            .get_or_insert_with(|| fast_map_with_capacity(1))
            .insert(key, value);
    }

    pub(crate) fn lookup_context(&self, key: ContextKey) -> Option<Rc<dyn Any>> {
        let mut scope = Some(self.clone());
        while let Some(current) = scope {
            let found = current
                .inner
                .contexts
                .borrow()
                .as_ref()
                .and_then(|contexts| contexts.get(&key).cloned());
            if found.is_some() {
                return found;
            }
            scope = current.parent();
        }
        None
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Scope {}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("id", &self.inner.id)
            .field("pending_disposers", &self.pending_disposers())
            .finish()
    }
}

struct ActiveScopeGuard {
    previous: Option<Scope>,
}

impl ActiveScopeGuard {
    fn enter(scope: Option<Scope>) -> Self {
        let previous = ACTIVE_SCOPE.with(|active| active.replace(scope));
        Self { previous }
    }
}

impl Drop for ActiveScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        let replaced = ACTIVE_SCOPE.with(|active| active.replace(previous));
        drop(replaced);
    }
}

struct TrackingGuard {
    previous: usize,
}

impl TrackingGuard {
    fn set(depth: usize) -> Self {
        let previous = UNTRACKED_DEPTH.with(|current| current.replace(depth));
        Self { previous }
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        UNTRACKED_DEPTH.with(|current| current.set(self.previous));
    }
}

/// The scope currently executing on this thread.
pub fn current_scope() -> Option<Scope> {
    ACTIVE_SCOPE.with(|active| active.borrow().clone())
}

/// Run `f` with dependency tracking suspended.
///
/// The core does not track dependencies itself; an external reactive engine reads
/// [`is_tracking`] to decide whether a read should subscribe.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let depth = UNTRACKED_DEPTH.with(Cell::get);
    let _tracking = TrackingGuard::set(depth + 1);
    f()
}

pub fn is_tracking() -> bool {
    UNTRACKED_DEPTH.with(Cell::get) == 0
}

fn tracked<R>(f: impl FnOnce() -> R) -> R {
    let _tracking = TrackingGuard::set(0);
    f()
}

/// Releases a scope created by [`create_scope`] or [`create_root`].
#[derive(Clone, Debug)]
pub struct Dispose {
    scope: Scope,
}

impl Dispose {
    /// Run the scope's disposers. Safe to call any number of times.
    pub fn dispose(&self) {
        self.scope.dispose();
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

/// Run `f` in a new scope parented to the active one and hand back its disposer.
///
/// `f` runs untracked. The new scope is not registered with its parent; callers
/// that want it released with the parent register the returned [`Dispose`].
pub fn create_scope<R>(f: impl FnOnce() -> R) -> (R, Dispose) {
    let scope = Scope::new(current_scope().as_ref());
    let result = untrack(|| scope.run(f));
    (result, Dispose { scope })
}

/// Like [`create_scope`], but `f` receives the disposer directly.
///
/// The root stays alive until it is disposed, whether or not anyone keeps the
/// [`Dispose`] handle.
pub fn create_root<R>(f: impl FnOnce(Dispose) -> R) -> R {
    let scope = Scope::with_root_flag(current_scope().as_ref(), true);
    LIVE_ROOTS.with(|roots| roots.borrow_mut().insert(scope.id(), scope.clone()));
    let dispose = Dispose {
        scope: scope.clone(),
    };
    untrack(|| scope.run(|| f(dispose)))
}

/// Number of roots on this thread that have not been disposed yet.
pub fn live_roots() -> usize {
    LIVE_ROOTS.with(|roots| roots.borrow().len())
}

/// Register `f` with the active scope.
///
/// Without an active scope nothing could ever release the callback: the misuse is
/// logged, `f` is dropped and `false` is returned.
pub fn on_cleanup(f: impl FnOnce() + 'static) -> bool {
    match current_scope() {
        Some(scope) => {
            scope.on_cleanup(f);
            true
        }
        None => {
            log::warn!("cleanup registered outside of any scope will never run");
            false
        }
    }
}

struct ComputationInner<T> {
    scope: Scope,
    compute: RefCell<Box<dyn FnMut(Option<T>) -> T>>,
    value: RefCell<Option<T>>,
    running: Cell<bool>,
    disposed: Cell<bool>,
    runs: Cell<usize>,
}

/// An owned, re-runnable computation.
///
/// Every run first releases whatever the previous run registered, then evaluates
/// the function with the computation's own scope active and tracking enabled.
pub struct Computation<T> {
    inner: Rc<ComputationInner<T>>,
}

impl<T> Clone for Computation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Non-owning handle to a [`Computation`].
pub struct WeakComputation<T> {
    inner: Weak<ComputationInner<T>>,
}

impl<T> WeakComputation<T> {
    pub fn upgrade(&self) -> Option<Computation<T>> {
        self.inner.upgrade().map(|inner| Computation { inner })
    }
}

impl<T> Clone for WeakComputation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Create a computation owned by the active scope and run it once.
pub fn create_computation<T: 'static>(
    compute: impl FnMut(Option<T>) -> T + 'static,
) -> Computation<T> {
    let computation = Computation {
        inner: Rc::new(ComputationInner {
            scope: Scope::new(current_scope().as_ref()),
            compute: RefCell::new(Box::new(compute)),
            value: RefCell::new(None),
            running: Cell::new(false),
            disposed: Cell::new(false),
            runs: Cell::new(0),
        }),
    };
    let owned = computation.clone();
    on_cleanup(move || owned.dispose());
    computation.run();
    computation
}

impl<T: 'static> Computation<T> {
    /// Re-run the computation. Returns `false` when it was disposed or is already running.
    pub fn run(&self) -> bool {
        let inner = &self.inner;
        if inner.disposed.get() {
            return false;
        }
        if inner.running.replace(true) {
            log::warn!(
                "computation in scope {} re-entered while running; skipping",
                inner.scope.id()
            );
            return false;
        }
        let _running = RunningGuard(&inner.running);

        inner.scope.dispose();
        let previous = inner.value.borrow_mut().take();
        let next = {
            let mut compute = inner.compute.borrow_mut();
            inner.scope.run(|| tracked(|| (*compute)(previous)))
        };
        *inner.value.borrow_mut() = Some(next);
        inner.runs.set(inner.runs.get() + 1);
        true
    }

    pub fn with_value<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        f(self.inner.value.borrow().as_ref())
    }

    pub fn downgrade(&self) -> WeakComputation<T> {
        WeakComputation {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn runs(&self) -> usize {
        self.inner.runs.get()
    }

    pub fn scope(&self) -> &Scope {
        &self.inner.scope
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Release everything the last run registered and stop future runs.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        self.inner.scope.dispose();
    }
}

impl<T: Clone + 'static> Computation<T> {
    pub fn value(&self) -> Option<T> {
        self.inner.value.borrow().clone()
    }
}

impl<T> fmt::Debug for Computation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("scope", &self.inner.scope)
            .field("runs", &self.inner.runs.get())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/owner_tests.rs"]
mod tests;
