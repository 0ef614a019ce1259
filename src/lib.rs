//! chain-hashtable: a single-threaded separate-chaining hash table with
//! set, map, multiset and multimap flavours.
//!
//! Internal Design:
//!
//! Summary
//! - One engine, [`HashTable<P, S, E>`], parameterized by a [`TablePolicy`]
//!   `P` (key extraction, mutable projection, unique vs. multi), a
//!   `BuildHasher` `S` and a [`KeyEquality`] `E`.
//! - Layers:
//!   - `primes`: the static list of bucket counts and `next_prime`.
//!   - `Chains<P, S, E>`: bucket directory (`Vec<Option<NodeKey>>`) plus a
//!     slotmap arena of `{ value, next }` nodes. All chain surgery lives
//!     here and never calls back into the public layer.
//!   - `HashTable<P, S, E>`: public API, debug reentrancy guard, config.
//!   - `iter`: global iterator (hops buckets), local iterator (one chain).
//!
//! Constraints
//! - Single-threaded; no interior locking.
//! - Bucket counts are always tabulated primes and only grow.
//! - Rehash re-links existing nodes; values are never moved or cloned, so
//!   [`Position`]s stay valid across it.
//! - Unique policies reject duplicate inserts by returning the existing
//!   position with `inserted == false`; multi policies always link.
//!
//! Capacity ceiling
//! - The largest bucket count is [`MAX_BUCKET_COUNT`]. Unchecked paths
//!   (`with_capacity`, `rehash`, `reserve`, automatic growth) clamp to it
//!   and log a warning; `try_*` paths return [`TableError::CapacityExceeded`].
//!
//! Notes and non-goals
//! - No open addressing, no incremental rehash, no shrinking.
//! - `Clone` reverses the order of elements within each bucket.
//! - A stale position, or one issued by a different table (a clone
//!   included), resolves to `None`.

mod chains;
pub mod config;
pub mod error;
pub mod hash_table;
#[cfg(test)]
mod hash_table_proptest;
pub mod iter;
mod node;
pub mod policy;
pub mod primes;
mod reentrancy;

pub use config::{OverflowPolicy, TableConfig};
pub use error::{Result, TableError};
pub use hash_table::{HashTable, Position};
pub use hashbrown::hash_map::DefaultHashBuilder;
pub use iter::{EqualRange, IntoIter, Iter, IterMut, LocalIter};
pub use policy::{
    DefaultEq, KeyEquality, MapPolicy, Multi, Multiplicity, SetPolicy, TablePolicy, Unique,
};
pub use primes::{next_prime, try_next_prime, MAX_BUCKET_COUNT};

/// Unique-key set.
pub type ChainSet<K, S = DefaultHashBuilder> = HashTable<SetPolicy<K, Unique>, S>;
/// Unique-key map storing `(K, V)` pairs.
pub type ChainMap<K, V, S = DefaultHashBuilder> = HashTable<MapPolicy<K, V, Unique>, S>;
/// Set allowing equal keys.
pub type ChainMultiSet<K, S = DefaultHashBuilder> = HashTable<SetPolicy<K, Multi>, S>;
/// Map allowing equal keys.
pub type ChainMultiMap<K, V, S = DefaultHashBuilder> = HashTable<MapPolicy<K, V, Multi>, S>;
