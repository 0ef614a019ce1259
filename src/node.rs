//! Chain cells stored in the node arena.
//!
//! A chain is a singly linked list threaded through the arena by
//! [`NodeKey`]s. Bucket slots hold the key of their chain head; each node
//! holds the key of its successor. `None` terminates a chain.

use core::sync::atomic::{AtomicU64, Ordering};
use slotmap::new_key_type;

new_key_type! {
    /// Stable, generational index of a node in the arena.
    pub struct NodeKey;
}

/// Link to a node, or the end of a chain.
pub type Link = Option<NodeKey>;

/// Identity of one node arena. Every fresh arena starts its slotmap keys
/// over, so a key is only meaningful next to the id of the arena that
/// issued it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct TableId(u64);

impl TableId {
    pub(crate) fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        TableId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Node<V> {
    pub(crate) value: V,
    pub(crate) next: Link,
}

impl<V> Node<V> {
    #[inline]
    pub(crate) fn new(value: V, next: Link) -> Self {
        Self { value, next }
    }
}
