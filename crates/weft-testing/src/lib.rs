//! Testing utilities and harness for weft

pub mod testing;

// Re-export testing utilities
pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use weft_core::{HostTree, NodeId, ReactiveCell};
}
