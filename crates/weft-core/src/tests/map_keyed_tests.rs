use super::*;
use crate::owner::{create_root, current_scope};
use std::cell::{Cell, RefCell};

/// Maps an item to `(item, serial)` and logs every disposal by item.
struct Harness {
    created: Rc<Cell<usize>>,
    disposed: Rc<RefCell<Vec<&'static str>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            created: Rc::new(Cell::new(0)),
            disposed: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn map_fn(&self) -> impl FnMut(&&'static str, usize) -> (&'static str, usize) + '_ {
        move |item: &&'static str, _: usize| {
            let item = *item;
            let serial = self.created.get();
            self.created.set(serial + 1);
            let disposed = Rc::clone(&self.disposed);
            on_cleanup(move || disposed.borrow_mut().push(item));
            (item, serial)
        }
    }

    fn update(
        &self,
        mapper: &mut KeyedListMapper<&'static str, &'static str, (&'static str, usize)>,
        items: &[&'static str],
    ) -> Vec<(&'static str, usize)> {
        self.created.set(0);
        self.disposed.borrow_mut().clear();
        mapper.update(items, self.map_fn()).to_vec()
    }

    fn created(&self) -> usize {
        self.created.get()
    }

    fn disposed(&self) -> Vec<&'static str> {
        self.disposed.borrow().clone()
    }
}

#[test]
fn initial_update_maps_every_item_in_order() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();

    let mapped = harness.update(&mut mapper, &["a", "b", "c"]);

    assert_eq!(mapped, vec![("a", 0), ("b", 1), ("c", 2)]);
    assert_eq!(mapper.keys(), &["a", "b", "c"]);
    assert_eq!(mapper.len(), 3);
}

#[test]
fn disjoint_replacement_disposes_all_old_and_maps_all_new() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    harness.update(&mut mapper, &["a", "b", "c"]);

    let mapped = harness.update(&mut mapper, &["x", "y"]);

    assert_eq!(harness.created(), 2);
    assert_eq!(harness.disposed(), vec!["a", "b", "c"]);
    assert_eq!(mapped.iter().map(|m| m.0).collect::<Vec<_>>(), vec!["x", "y"]);
}

#[test]
fn single_removal_disposes_only_that_item() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    let before = harness.update(&mut mapper, &["a", "b", "c", "d"]);

    let after = harness.update(&mut mapper, &["a", "b", "d"]);

    assert_eq!(harness.created(), 0);
    assert_eq!(harness.disposed(), vec!["c"]);
    assert_eq!(after, vec![before[0], before[1], before[3]]);
}

#[test]
fn permutation_reuses_everything() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    let before = harness.update(&mut mapper, &["a", "b", "c", "d", "e"]);

    let after = harness.update(&mut mapper, &["e", "c", "a", "d", "b"]);

    assert_eq!(harness.created(), 0);
    assert!(harness.disposed().is_empty());
    assert_eq!(
        after,
        vec![before[4], before[2], before[0], before[3], before[1]]
    );
}

#[test]
fn insertion_in_the_middle_maps_only_new_item() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    let before = harness.update(&mut mapper, &["a", "c"]);

    let after = harness.update(&mut mapper, &["a", "b", "c"]);

    assert_eq!(harness.created(), 1);
    assert!(harness.disposed().is_empty());
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1].0, "b");
    assert_eq!(after[2], before[1]);
}

#[test]
fn duplicates_reuse_left_to_right() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    let before = harness.update(&mut mapper, &["a", "a"]);

    let after = harness.update(&mut mapper, &["a", "a", "a"]);

    assert_eq!(harness.created(), 1);
    assert!(harness.disposed().is_empty());
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1], before[1]);
    assert_eq!(after[2], ("a", 0));
}

#[test]
fn duplicates_shrink_prefers_trailing_match() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    let before = harness.update(&mut mapper, &["a", "b", "a", "a"]);

    let after = harness.update(&mut mapper, &["b", "a"]);

    assert_eq!(harness.created(), 0);
    assert_eq!(harness.disposed(), vec!["a", "a"]);
    assert_eq!(after, vec![before[1], before[3]]);
}

#[test]
fn duplicates_in_shuffled_range_claim_occurrences_in_order() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    let before = harness.update(&mut mapper, &["a", "b", "a", "c"]);

    let after = harness.update(&mut mapper, &["c", "a", "a", "b"]);

    assert_eq!(harness.created(), 0);
    assert!(harness.disposed().is_empty());
    assert_eq!(after, vec![before[3], before[0], before[2], before[1]]);
}

#[test]
fn empty_update_disposes_everything() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    harness.update(&mut mapper, &["a", "b"]);

    let mapped = harness.update(&mut mapper, &[]);

    assert!(mapped.is_empty());
    assert!(mapper.is_empty());
    assert_eq!(harness.disposed(), vec!["a", "b"]);
}

#[test]
fn unchanged_update_does_nothing() {
    let harness = Harness::new();
    let mut mapper = KeyedListMapper::new();
    let before = harness.update(&mut mapper, &["a", "b"]);

    let after = harness.update(&mut mapper, &["a", "b"]);

    assert_eq!(after, before);
    assert_eq!(harness.created(), 0);
    assert!(harness.disposed().is_empty());
}

#[test]
fn map_fn_receives_index_and_runs_in_parent_scope() {
    create_root(|root| {
        let mut mapper: KeyedListMapper<u32, u32, (usize, bool)> = KeyedListMapper::new();
        let mapped = mapper
            .update(&[10, 20], |_, index| {
                let parent = current_scope().and_then(|scope| scope.parent());
                (index, parent.as_ref() == Some(root.scope()))
            })
            .to_vec();
        assert_eq!(mapped, vec![(0, true), (1, true)]);
    });
}

#[test]
fn rc_identity_keys_distinguish_equal_values() {
    let first = Rc::new(String::from("same"));
    let second = Rc::new(String::from("same"));
    let created = Cell::new(0);
    let mut mapper = KeyedListMapper::by_rc();

    mapper.update(&[Rc::clone(&first)], |_, _| created.set(created.get() + 1));
    mapper.update(&[Rc::clone(&first), Rc::clone(&second)], |_, _| {
        created.set(created.get() + 1)
    });

    assert_eq!(created.get(), 2);
    assert_eq!(mapper.keys()[0], RcKey::of(&first));
    assert_ne!(mapper.keys()[1], RcKey::of(&first));
}

#[test]
fn custom_key_function() {
    struct Row {
        id: u32,
        label: &'static str,
    }
    let mut mapper = KeyedListMapper::with_key(|row: &Row| row.id);
    let rows = [Row { id: 1, label: "one" }, Row { id: 2, label: "two" }];
    mapper.update(&rows, |row, _| row.label);

    let relabeled = [Row { id: 2, label: "zwei" }, Row { id: 1, label: "eins" }];
    let mapped = mapper.update(&relabeled, |row, _| row.label);

    assert_eq!(mapped, &["two", "one"]);
}

#[test]
fn failing_map_fn_keeps_committed_items_disposable() {
    let disposed = Rc::new(RefCell::new(Vec::new()));
    let mut mapper: KeyedListMapper<u32, u32, u32> = KeyedListMapper::new();
    let record = |item: u32| {
        let disposed = Rc::clone(&disposed);
        on_cleanup(move || disposed.borrow_mut().push(item));
    };

    let err = mapper
        .try_update(&[1, 2, 3], |&item, _| {
            record(item);
            if item == 2 {
                Err("boom")
            } else {
                Ok(item * 10)
            }
        })
        .expect_err("second item fails");

    assert_eq!(err, "boom");
    assert_eq!(*disposed.borrow(), vec![2]);
    assert_eq!(mapper.keys(), &[1]);
    assert_eq!(mapper.mapped(), &[10]);

    mapper.dispose_all();
    assert_eq!(*disposed.borrow(), vec![2, 1]);
}

#[test]
fn owned_mapper_released_with_scope() {
    let disposed = Rc::new(Cell::new(0));
    let (mapper, dispose) = create_scope(|| KeyedListMapper::owned(|item: &u32| *item));
    let counter = Rc::clone(&disposed);
    mapper.borrow_mut().update(&[1, 2], move |_, _| {
        let counter = Rc::clone(&counter);
        on_cleanup(move || counter.set(counter.get() + 1));
    });

    dispose.dispose();
    assert_eq!(disposed.get(), 2);
    assert!(mapper.borrow().is_empty());
}

#[test]
fn drop_disposes_item_scopes() {
    let disposed = Rc::new(Cell::new(0));
    {
        let mut mapper: KeyedListMapper<u32, u32, ()> = KeyedListMapper::new();
        let counter = Rc::clone(&disposed);
        mapper.update(&[1, 2, 3], move |_, _| {
            let counter = Rc::clone(&counter);
            on_cleanup(move || counter.set(counter.get() + 1));
        });
    }
    assert_eq!(disposed.get(), 3);
}
