#![doc = r"Core of the weft renderer: ownership scopes, keyed list mapping and child reconciliation."]

pub mod binding;
pub mod cell;
pub mod collections;
pub mod context;
pub mod insert;
pub mod lis;
pub mod map_keyed;
pub mod node;
pub mod owner;
pub mod reconcile;

pub use binding::{bind_keyed_children, KeyedChildren};
pub use cell::{adopt, watch, ReactiveCell};
pub use context::{create_context, provide, provide_context, use_context, Context};
pub use insert::{clean_children, insert_content, Content, Mounted, Region};
pub use lis::longest_increasing_subsequence;
pub use map_keyed::{KeyedListMapper, RcKey};
pub use node::{HostTree, MemoryNodeKind, MemoryTree, NodeId, TreeError};
pub use owner::{
    create_computation, create_root, create_scope, current_scope, is_tracking, live_roots,
    on_cleanup, untrack, Computation, Dispose, Scope, ScopeId, WeakComputation,
};
pub use reconcile::reconcile_children;
