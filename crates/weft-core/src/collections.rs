#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};

    pub type RandomState = std::collections::hash_map::RandomState;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};

    pub type RandomState = ahash::RandomState;
}

/// Hash map used on the hot paths of the mapper and the reconciler.
pub type FastMap<K, V> = map::HashMap<K, V, map::RandomState>;

#[inline]
pub fn fast_map_with_capacity<K, V>(capacity: usize) -> FastMap<K, V> {
    FastMap::with_capacity_and_hasher(capacity, map::RandomState::default())
}
