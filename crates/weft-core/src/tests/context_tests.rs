use super::*;
use crate::owner::create_root;
use std::cell::Cell;

#[test]
fn default_used_without_provider() {
    let theme = create_context("light");
    assert_eq!(use_context(&theme), "light");
    create_root(|_| assert_eq!(theme.current(), "light"));
}

#[test]
fn nearest_provider_wins() {
    let depth = create_context(0usize);
    create_root(|_| {
        provide_context(&depth, 1);
        let ((), _inner) = create_scope(|| {
            assert_eq!(use_context(&depth), 1);
            provide_context(&depth, 2);
            let ((), _innermost) = create_scope(|| assert_eq!(use_context(&depth), 2));
        });
        assert_eq!(use_context(&depth), 1);
    });
}

#[test]
fn contexts_are_distinct_even_with_same_type() {
    let first = create_context(String::from("a"));
    let second = create_context(String::from("b"));
    assert_ne!(first, second);

    create_root(|_| {
        provide_context(&first, String::from("provided"));
        assert_eq!(use_context(&first), "provided");
        assert_eq!(use_context(&second), "b");
    });
}

#[test]
fn provide_outside_scope_is_rejected() {
    let ctx = create_context(1);
    assert!(!provide_context(&ctx, 5));
    assert_eq!(use_context(&ctx), 1);
}

#[test]
fn provide_runs_content_in_child_scope_released_with_parent() {
    let ctx = create_context(0);
    let released = Rc::new(Cell::new(false));
    let root = create_root(|dispose| {
        let flag = Rc::clone(&released);
        let seen = provide(&ctx, 7, || {
            on_cleanup(move || flag.set(true));
            use_context(&ctx)
        });
        assert_eq!(seen, 7);
        assert_eq!(use_context(&ctx), 0);
        dispose
    });

    assert!(!released.get());
    root.dispose();
    assert!(released.get());
}

#[test]
fn default_is_evaluated_lazily() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let ctx = Context::new(move || {
        counter.set(counter.get() + 1);
        counter.get()
    });

    assert_eq!(calls.get(), 0);
    assert_eq!(ctx.default_value(), 1);
    assert_eq!(use_context(&ctx), 2);
}
