//! Seam to an external reactive engine.
//!
//! The core never tracks dependencies itself. It only needs something it can read,
//! be told about changes to, and release; anything implementing [`ReactiveCell`]
//! qualifies.

use std::rc::Rc;

use crate::owner::{create_computation, on_cleanup, Computation};

pub trait ReactiveCell {
    type Value;

    fn evaluate(&self) -> Self::Value;

    /// Call `listener` after every change. Listeners are released by [`dispose`].
    ///
    /// [`dispose`]: ReactiveCell::dispose
    fn subscribe(&self, listener: Rc<dyn Fn()>);

    fn dispose(&self);
}

/// Tie `cell` to the active scope: disposing the scope disposes the cell.
pub fn adopt<C: ReactiveCell + 'static>(cell: Rc<C>) -> bool {
    on_cleanup(move || cell.dispose())
}

/// Re-run `f` with the cell's value on every change, inside an owned computation.
///
/// The listener only holds the computation weakly, so it goes quiet once the
/// computation is dropped or disposed.
pub fn watch<C, T>(
    cell: Rc<C>,
    mut f: impl FnMut(C::Value, Option<T>) -> T + 'static,
) -> Computation<T>
where
    C: ReactiveCell + 'static,
    T: 'static,
{
    let source = Rc::clone(&cell);
    let computation = create_computation(move |previous| f(source.evaluate(), previous));
    let weak = computation.downgrade();
    cell.subscribe(Rc::new(move || {
        if let Some(computation) = weak.upgrade() {
            computation.run();
        }
    }));
    computation
}

#[cfg(test)]
#[path = "tests/cell_tests.rs"]
mod tests;
