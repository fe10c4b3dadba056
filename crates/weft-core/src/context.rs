//! Context values propagated down the ownership tree.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::owner::{create_scope, current_scope, on_cleanup};

pub(crate) type ContextKey = usize;

static NEXT_CONTEXT_KEY: AtomicUsize = AtomicUsize::new(1);

fn next_context_key() -> ContextKey {
    NEXT_CONTEXT_KEY.fetch_add(1, Ordering::Relaxed)
}

/// Typed key for a value provided to every scope below a provider.
#[derive(Clone)]
pub struct Context<T: Clone + 'static> {
    key: ContextKey,
    default: Rc<dyn Fn() -> T>, // FUTURE(no_std): store default provider in arena-managed cell.
}

impl<T: Clone + 'static> PartialEq for Context<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: Clone + 'static> Eq for Context<T> {}

impl<T: Clone + 'static> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("key", &self.key)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Clone + 'static> Context<T> {
    pub fn new(default: impl Fn() -> T + 'static) -> Self {
        Self {
            key: next_context_key(),
            default: Rc::new(default),
        }
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }

    /// Value visible from the active scope.
    pub fn current(&self) -> T {
        use_context(self)
    }
}

pub fn create_context<T: Clone + 'static>(default: T) -> Context<T> {
    Context::new(move || default.clone())
}

/// Store `value` for `context` on the active scope.
///
/// Returns `false` (and logs) when no scope is active.
pub fn provide_context<T: Clone + 'static>(context: &Context<T>, value: T) -> bool {
    match current_scope() {
        Some(scope) => {
            scope.set_context(context.key, Rc::new(value) as Rc<dyn Any>);
            true
        }
        None => {
            log::warn!(
                "context {} provided outside of any scope; value dropped",
                std::any::type_name::<T>()
            );
            false
        }
    }
}

/// Walk from the active scope towards the root and return the nearest provided
/// value, or the context default.
pub fn use_context<T: Clone + 'static>(context: &Context<T>) -> T {
    current_scope()
        .and_then(|scope| scope.lookup_context(context.key))
        .and_then(|value| value.downcast_ref::<T>().cloned())
        .unwrap_or_else(|| context.default_value())
}

/// Run `content` in a child scope that provides `value`.
///
/// The child scope is released together with the active scope.
pub fn provide<T: Clone + 'static, R>(
    context: &Context<T>,
    value: T,
    content: impl FnOnce() -> R,
) -> R {
    let (result, dispose) = create_scope(|| {
        provide_context(context, value);
        content()
    });
    on_cleanup(move || dispose.dispose());
    result
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
