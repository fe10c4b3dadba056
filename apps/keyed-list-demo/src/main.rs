use std::cell::RefCell;
use std::error::Error;
use std::rc::Rc;

use weft_core::{
    adopt, bind_keyed_children, create_context, create_root, on_cleanup, provide, use_context,
    HostTree, KeyedChildren, MemoryTree, ReactiveCell,
};

#[derive(Debug, Clone)]
struct Row {
    id: u32,
    label: String,
}

impl Row {
    fn new(id: u32, label: &str) -> Self {
        Self {
            id,
            label: label.to_owned(),
        }
    }
}

/// A list value that pushes every change to its subscribers.
#[derive(Default)]
struct RowStore {
    rows: RefCell<Vec<Row>>,
    listeners: RefCell<Vec<Rc<dyn Fn()>>>,
}

impl RowStore {
    fn replace(&self, rows: Vec<Row>) {
        *self.rows.borrow_mut() = rows;
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }

    fn edit(&self, f: impl FnOnce(&mut Vec<Row>)) {
        let mut rows = self.rows.borrow().clone();
        f(&mut rows);
        self.replace(rows);
    }
}

impl ReactiveCell for RowStore {
    type Value = Vec<Row>;

    fn evaluate(&self) -> Vec<Row> {
        self.rows.borrow().clone()
    }

    fn subscribe(&self, listener: Rc<dyn Fn()>) {
        self.listeners.borrow_mut().push(listener);
    }

    fn dispose(&self) {
        log::debug!("row store released");
        self.listeners.borrow_mut().clear();
    }
}

fn print_step(title: &str, tree: &MemoryTree, root: usize) {
    println!("--- {title} (mutations: {})", tree.mutations());
    print!("{}", tree.dump_tree(Some(root)));
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    println!("=== weft keyed list demo ===");
    println!("Set RUST_LOG=weft_core=trace to see reconcile decisions.");
    println!();

    let tree = Rc::new(RefCell::new(MemoryTree::new()));
    let (root, footer) = {
        let mut tree = tree.borrow_mut();
        let root = tree.create_element("ul");
        let footer = tree.create_text("-- end --");
        tree.append_child(root, footer)?;
        (root, footer)
    };
    let store = Rc::new(RowStore::default());
    store.replace(vec![
        Row::new(1, "alpha"),
        Row::new(2, "beta"),
        Row::new(3, "gamma"),
    ]);
    let bullet = create_context("-");

    let dispose = create_root(|dispose| -> Result<_, Box<dyn Error>> {
        adopt(Rc::clone(&store));
        provide(&bullet, "*", || {
            let bullet = bullet.clone();
            bind_keyed_children(
                Rc::clone(&store),
                Rc::clone(&tree),
                KeyedChildren::new(root, Some(footer), |row: &Row| row.id),
                move |tree: &mut MemoryTree, row: &Row, index| {
                    log::info!("rendering row {} at {index}", row.id);
                    let id = row.id;
                    on_cleanup(move || log::info!("row {id} released"));
                    Ok(tree.create_text(&format!("{} {}", use_context(&bullet), row.label)))
                },
            )
        })?;
        Ok(dispose)
    })?;
    print_step("initial", &tree.borrow(), root);

    tree.borrow_mut().reset_mutations();
    store.edit(|rows| rows.reverse());
    print_step("reversed", &tree.borrow(), root);

    tree.borrow_mut().reset_mutations();
    store.edit(|rows| {
        rows.retain(|row| row.id != 2);
        rows.insert(1, Row::new(4, "delta"));
    });
    print_step("removed beta, inserted delta", &tree.borrow(), root);

    tree.borrow_mut().reset_mutations();
    store.replace(vec![Row::new(10, "x"), Row::new(11, "y")]);
    print_step("replaced everything", &tree.borrow(), root);

    dispose.dispose();
    println!("--- disposed; later edits are ignored");
    store.replace(vec![Row::new(99, "ignored")]);
    print!("{}", tree.borrow().dump_tree(Some(root)));
    Ok(())
}
