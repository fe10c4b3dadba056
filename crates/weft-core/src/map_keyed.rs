//! Keyed incremental list mapping.
//!
//! [`KeyedListMapper`] turns a sequence of source values into a sequence of mapped
//! results, one owned scope per item. Between updates it keeps three parallel
//! vectors (last-seen keys, mapped results, per-item disposers) and only runs the
//! map function for items whose key it has not seen in the matching position.

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem;
use std::ops::Range;
use std::rc::Rc;

use crate::collections::{fast_map_with_capacity, FastMap};
use crate::owner::{create_scope, on_cleanup, Dispose};

type Slot<U> = Option<(U, Dispose)>;

/// Reference-identity key for `Rc` values.
///
/// Two `RcKey`s are equal only when they point at the same allocation, so
/// structurally equal but distinct values map to different items. The key keeps
/// its allocation alive, which rules out address reuse between updates.
pub struct RcKey<T: ?Sized>(pub Rc<T>);

impl<T: ?Sized> RcKey<T> {
    pub fn of(value: &Rc<T>) -> Self {
        Self(Rc::clone(value))
    }
}

impl<T: ?Sized> Clone for RcKey<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for RcKey<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Eq for RcKey<T> {}

impl<T: ?Sized> Hash for RcKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as *const () as usize).hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for RcKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RcKey({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

pub struct KeyedListMapper<T, K, U> {
    key_fn: Box<dyn Fn(&T) -> K>,
    items: Vec<K>,
    mapped: Vec<U>,
    disposers: Vec<Dispose>,
}

impl<T, U> KeyedListMapper<T, T, U>
where
    T: Clone + Eq + Hash + 'static,
{
    /// Mapper keyed by the values themselves.
    pub fn new() -> Self {
        Self::with_key(T::clone)
    }
}

impl<T, U> Default for KeyedListMapper<T, T, U>
where
    T: Clone + Eq + Hash + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ?Sized + 'static, U> KeyedListMapper<Rc<V>, RcKey<V>, U> {
    /// Mapper keyed by allocation identity.
    pub fn by_rc() -> Self {
        Self::with_key(RcKey::of)
    }
}

impl<T, K, U> KeyedListMapper<T, K, U> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn mapped(&self) -> &[U] {
        &self.mapped
    }

    pub fn keys(&self) -> &[K] {
        &self.items
    }

    /// Dispose every item scope and forget all state.
    pub fn dispose_all(&mut self) {
        for dispose in self.disposers.drain(..) {
            dispose.dispose();
        }
        self.items.clear();
        self.mapped.clear();
    }
}

impl<T, K, U> KeyedListMapper<T, K, U>
where
    K: Eq + Hash + 'static,
{
    pub fn with_key(key_fn: impl Fn(&T) -> K + 'static) -> Self {
        Self {
            key_fn: Box::new(key_fn),
            items: Vec::new(),
            mapped: Vec::new(),
            disposers: Vec::new(),
        }
    }

    /// Shared mapper whose item scopes are disposed together with the active scope.
    pub fn owned(key_fn: impl Fn(&T) -> K + 'static) -> Rc<RefCell<Self>>
    where
        T: 'static,
        U: 'static,
    {
        let mapper = Rc::new(RefCell::new(Self::with_key(key_fn)));
        let weak = Rc::downgrade(&mapper);
        on_cleanup(move || {
            if let Some(mapper) = weak.upgrade() {
                mapper.borrow_mut().dispose_all();
            }
        });
        mapper
    }

    pub fn update(&mut self, new_items: &[T], mut map_fn: impl FnMut(&T, usize) -> U) -> &[U] {
        match self.try_update(new_items, |item, index| {
            Ok::<U, Infallible>(map_fn(item, index))
        }) {
            Ok(mapped) => mapped,
            Err(never) => match never {},
        }
    }

    /// Diff `new_items` against the previous snapshot and return the mapped results.
    ///
    /// `map_fn` runs inside a fresh scope for every item that cannot be reused. When
    /// it fails, the failing item's scope is disposed and the error is returned; the
    /// items mapped so far in this pass stay in the mapper and stay disposable, so
    /// the state is not rolled back.
    pub fn try_update<E>(
        &mut self,
        new_items: &[T],
        mut map_fn: impl FnMut(&T, usize) -> Result<U, E>,
    ) -> Result<&[U], E> {
        let new_len = new_items.len();
        let len = self.items.len();

        if new_len == 0 {
            if len != 0 {
                log::debug!("keyed update: cleared {len} items");
                self.dispose_all();
            }
            return Ok(&self.mapped);
        }

        let new_keys: Vec<K> = new_items.iter().map(|item| (self.key_fn)(item)).collect();

        if len == 0 {
            log::debug!("keyed update: created {new_len} items");
            let slots = (0..new_len).map(|_| None).collect();
            self.fill(new_items, new_keys, slots, 0..new_len, &mut map_fn)?;
            return Ok(&self.mapped);
        }

        let limit = len.min(new_len);
        let mut start = 0;
        while start < limit && self.items[start] == new_keys[start] {
            start += 1;
        }

        // Dirty ranges are `start..end` (old) and `start..new_end` (new).
        let mut end = len;
        let mut new_end = new_len;
        while end > start && new_end > start && self.items[end - 1] == new_keys[new_end - 1] {
            end -= 1;
            new_end -= 1;
        }
        log::debug!(
            "keyed update: {len} -> {new_len} items, dirty old {start}..{end}, new {start}..{new_end}"
        );

        if start == new_end {
            for dispose in self.disposers[start..end].iter().rev() {
                dispose.dispose();
            }
            self.mapped.drain(start..end);
            self.disposers.drain(start..end);
            self.items = new_keys;
            return Ok(&self.mapped);
        }

        let mut old: Vec<Slot<U>> = mem::take(&mut self.mapped)
            .into_iter()
            .zip(mem::take(&mut self.disposers))
            .map(Some)
            .collect();
        let mut slots: Vec<Slot<U>> = Vec::with_capacity(new_len);
        slots.extend(old[..start].iter_mut().map(Option::take));
        slots.resize_with(new_end, || None);

        if start < end {
            // Smallest new index per key, plus a chain to the next new index holding the
            // same key, so duplicates pair up left to right.
            let mut new_indices: FastMap<&K, Option<usize>> =
                fast_map_with_capacity(new_end - start);
            let mut next: Vec<Option<usize>> = vec![None; new_end - start];
            for j in (start..new_end).rev() {
                next[j - start] = new_indices.insert(&new_keys[j], Some(j)).flatten();
            }

            for i in start..end {
                let target = new_indices.get_mut(&self.items[i]).and_then(|entry| {
                    let j = (*entry)?;
                    *entry = next[j - start];
                    Some(j)
                });
                match target {
                    Some(j) => slots[j] = old[i].take(),
                    None => {
                        if let Some((_, dispose)) = old[i].take() {
                            dispose.dispose();
                        }
                    }
                }
            }
        }

        slots.extend(old[end..].iter_mut().map(Option::take));
        self.fill(new_items, new_keys, slots, start..new_end, &mut map_fn)?;
        Ok(&self.mapped)
    }

    fn fill<E>(
        &mut self,
        new_items: &[T],
        keys: Vec<K>,
        mut slots: Vec<Slot<U>>,
        dirty: Range<usize>,
        map_fn: &mut impl FnMut(&T, usize) -> Result<U, E>,
    ) -> Result<(), E> {
        for j in dirty {
            if slots[j].is_some() {
                continue;
            }
            let (result, dispose) = create_scope(|| map_fn(&new_items[j], j));
            match result {
                Ok(value) => slots[j] = Some((value, dispose)),
                Err(err) => {
                    dispose.dispose();
                    self.commit(keys, slots);
                    return Err(err);
                }
            }
        }
        self.commit(keys, slots);
        Ok(())
    }

    /// Rebuild the parallel vectors from the live slots, keeping keys aligned.
    fn commit(&mut self, keys: Vec<K>, slots: Vec<Slot<U>>) {
        self.items.clear();
        self.mapped.clear();
        self.disposers.clear();
        for (key, slot) in keys.into_iter().zip(slots) {
            if let Some((value, dispose)) = slot {
                self.items.push(key);
                self.mapped.push(value);
                self.disposers.push(dispose);
            }
        }
        debug_assert_eq!(self.items.len(), self.mapped.len());
        debug_assert_eq!(self.items.len(), self.disposers.len());
    }
}

impl<T, K: fmt::Debug, U> fmt::Debug for KeyedListMapper<T, K, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedListMapper")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl<T, K, U> Drop for KeyedListMapper<T, K, U> {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

#[cfg(test)]
#[path = "tests/map_keyed_tests.rs"]
mod tests;
