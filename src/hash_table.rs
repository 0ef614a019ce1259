//! HashTable: the public separate-chaining table.
//!
//! One implementation serves sets, maps, multisets and multimaps; the
//! [`TablePolicy`] type parameter picks which. Bucket counts come from the
//! prime table, the directory grows once `len > bucket_count * max_load_factor`,
//! and it never shrinks.
//!
//! Positions
//! - [`Position`] names one element of the table that issued it. It stays
//!   valid across inserts and rehashes (nodes are re-linked, never moved)
//!   and stops resolving once its element is erased.
//! - A position carries its table's identity. Handed to any other table
//!   (a clone, the emptied source of [`HashTable::take`], an unrelated
//!   table) it resolves to `None`. The identity travels with the contents
//!   through `swap` and `take`.
//! - Iterators borrow the table, so the borrow checker rejects mutation
//!   while one is live.
//!
//! Reentrancy
//! - Each entry point that runs user hashing or key equality takes a
//!   debug-only guard; user code that calls back into the same table
//!   panics in debug builds. `Iter` and `EqualRange` hash and compare
//!   lazily, so they take the guard inside every `next` call.

use crate::chains::{min_buckets_for, Chains};
use crate::config::{validate_load_factor, OverflowPolicy, TableConfig};
use crate::error::Result;
use crate::iter::{EqualRange, IntoIter, Iter, IterMut, LocalIter};
use crate::node::{NodeKey, TableId};
use crate::policy::{DefaultEq, KeyEquality, MapPolicy, Multiplicity, SetPolicy, TablePolicy};
use crate::primes::{try_next_prime, MAX_BUCKET_COUNT};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;
use log::debug;

/// Handle to one element of a table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Position {
    owner: TableId,
    key: NodeKey,
}

impl Position {
    pub(crate) fn new(owner: TableId, key: NodeKey) -> Self {
        Position { owner, key }
    }

    /// Node key, if this position was issued by a table with identity `id`.
    pub(crate) fn key_in(&self, id: TableId) -> Option<NodeKey> {
        (self.owner == id).then_some(self.key)
    }

    pub fn value<'a, P, S, E>(&self, table: &'a HashTable<P, S, E>) -> Option<&'a P::Value>
    where
        P: TablePolicy,
    {
        table.chains.value(self.key_in(table.chains.id)?)
    }

    /// Mutable view of the element, shaped by the policy: `&K` for sets,
    /// `(&K, &mut V)` for maps.
    pub fn value_mut<'a, P, S, E>(&self, table: &'a mut HashTable<P, S, E>) -> Option<P::Mut<'a>>
    where
        P: TablePolicy + 'a,
    {
        let key = self.key_in(table.chains.id)?;
        let value = table.chains.value_mut(key)?;
        Some(P::project_mut(value))
    }
}

pub struct HashTable<P: TablePolicy, S = DefaultHashBuilder, E = DefaultEq> {
    chains: Chains<P, S, E>,
    reentrancy: DebugReentrancy,
}

impl<P, S, E> HashTable<P, S, E>
where
    P: TablePolicy,
    S: Default,
    E: Default,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Table with `next_prime(n)` buckets. Capacities past
    /// [`MAX_BUCKET_COUNT`] are clamped with a warning.
    pub fn with_capacity(n: usize) -> Self {
        Self::with_capacity_hasher_and_eq(n, S::default(), E::default())
    }

    /// Like [`with_capacity`](Self::with_capacity) but fails past the ceiling.
    pub fn try_with_capacity(n: usize) -> Result<Self> {
        try_next_prime(n)?;
        Ok(Self::with_capacity(n))
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_hasher_and_eq(config, S::default(), E::default())
    }
}

impl<P, S, E> HashTable<P, S, E>
where
    P: TablePolicy,
    E: Default,
{
    pub fn with_capacity_and_hasher(n: usize, hasher: S) -> Self {
        Self::with_capacity_hasher_and_eq(n, hasher, E::default())
    }
}

impl<P: TablePolicy, S, E> HashTable<P, S, E> {
    pub fn with_hasher_and_eq(hasher: S, equals: E) -> Self {
        Self::with_capacity_hasher_and_eq(0, hasher, equals)
    }

    pub fn with_capacity_hasher_and_eq(n: usize, hasher: S, equals: E) -> Self {
        Self::from_parts(n, hasher, equals, TableConfig::default().max_load_factor)
    }

    pub fn with_config_hasher_and_eq(config: TableConfig, hasher: S, equals: E) -> Result<Self> {
        config.validate()?;
        if config.overflow == OverflowPolicy::Reject {
            try_next_prime(config.initial_capacity)?;
        }
        let table = Self::from_parts(
            config.initial_capacity,
            hasher,
            equals,
            config.max_load_factor,
        );
        debug!(
            "built table from config: {} buckets, max load factor {}",
            table.bucket_count(),
            config.max_load_factor
        );
        Ok(table)
    }

    fn from_parts(n: usize, hasher: S, equals: E, max_load_factor: f32) -> Self {
        Self {
            chains: Chains::new(n, hasher, equals, max_load_factor),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.len() == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.chains.bucket_count()
    }

    pub fn max_bucket_count(&self) -> usize {
        MAX_BUCKET_COUNT
    }

    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.chains.max_load_factor
    }

    /// Takes effect on the next insert or rehash; does not rehash by itself.
    pub fn set_max_load_factor(&mut self, f: f32) -> Result<()> {
        validate_load_factor(f)?;
        self.chains.max_load_factor = f;
        Ok(())
    }

    pub fn hasher(&self) -> &S {
        &self.chains.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.chains.equals
    }

    /// Iterate over bucket `i`'s chain, most recently linked first. An
    /// out-of-range index yields an empty iterator.
    pub fn bucket(&self, i: usize) -> LocalIter<'_, P::Value> {
        debug_assert!(i < self.bucket_count(), "bucket index {i} out of range");
        LocalIter::new(self.chains.id, &self.chains.nodes, self.chains.head(i))
    }

    pub fn bucket_len(&self, i: usize) -> usize {
        self.chains.chain_len(i)
    }

    /// Drop every element. The bucket count is kept.
    pub fn clear(&mut self) {
        let _g = self.reentrancy.enter("clear");
        self.chains.clear();
    }

    /// Exchange contents, hasher, equality and load factor in O(1).
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(&mut self.chains, &mut other.chains);
    }

    /// Move the contents out, leaving `self` empty with `next_prime(0)`
    /// buckets and copies of its hasher and equality. Positions follow the
    /// contents into the returned table; `self` gets a fresh identity.
    pub fn take(&mut self) -> Self
    where
        S: Clone,
        E: Clone,
    {
        let empty = Self::from_parts(
            0,
            self.chains.hasher.clone(),
            self.chains.equals.clone(),
            self.chains.max_load_factor,
        );
        core::mem::replace(self, empty)
    }

    /// Mutable iteration in arena order (not bucket order).
    pub fn iter_mut(&mut self) -> IterMut<'_, P> {
        IterMut::new(&mut self.chains.nodes)
    }
}

impl<P, S, E> HashTable<P, S, E>
where
    P: TablePolicy,
    P::Key: Hash,
    S: BuildHasher,
{
    /// Global iteration in bucket order.
    pub fn iter(&self) -> Iter<'_, P, S, E> {
        Iter::new(&self.chains, &self.reentrancy)
    }

    /// Bucket a key maps to under the current bucket count.
    pub fn bucket_index<Q>(&self, q: &Q) -> usize
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let _g = self.reentrancy.enter("bucket_index");
        self.chains.bucket_index(q)
    }

    pub fn find<Q>(&self, q: &Q) -> Option<Position>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let _g = self.reentrancy.enter("find");
        let id = self.chains.id;
        self.chains.find(q).map(|k| Position::new(id, k))
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let _g = self.reentrancy.enter("contains");
        self.chains.find(q).is_some()
    }

    pub fn count<Q>(&self, q: &Q) -> usize
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let _g = self.reentrancy.enter("count");
        self.chains.count(q)
    }

    /// Elements whose key equals `q`; at most one under a unique policy.
    pub fn equal_range<'a, Q>(&'a self, q: &'a Q) -> EqualRange<'a, P, S, E, Q>
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let head = {
            let _g = self.reentrancy.enter("equal_range");
            self.chains.head(self.chains.bucket_index(q))
        };
        EqualRange::new(&self.chains, &self.reentrancy, head, q)
    }

    /// Insert `value`. Under a unique policy an equal key already present
    /// wins: `value` is dropped and `(existing, false)` is returned. Under a
    /// multi policy this always returns `(new, true)`.
    pub fn insert(&mut self, value: P::Value) -> (Position, bool)
    where
        E: KeyEquality<P::Key>,
    {
        let _g = self.reentrancy.enter("insert");
        let (k, inserted) = self.chains.insert(value);
        (Position::new(self.chains.id, k), inserted)
    }

    /// Remove the element with key `q` (unique) or every such element
    /// (multi). Returns how many were removed.
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let _g = self.reentrancy.enter("erase");
        self.chains.erase(q)
    }

    /// Remove exactly the element at `pos`. `None` if it is already gone
    /// or `pos` came from another table.
    pub fn erase_at(&mut self, pos: Position) -> Option<P::Value> {
        let _g = self.reentrancy.enter("erase_at");
        let key = pos.key_in(self.chains.id)?;
        self.chains.erase_at(key)
    }

    /// Grow to at least `next_prime(n)` buckets, or more if the current
    /// element count needs it. Never shrinks. Requests past
    /// [`MAX_BUCKET_COUNT`] are clamped with a warning.
    pub fn rehash(&mut self, n: usize) {
        let _g = self.reentrancy.enter("rehash");
        self.chains.rehash(n);
    }

    /// Like [`rehash`](Self::rehash) but fails instead of clamping.
    pub fn try_rehash(&mut self, n: usize) -> Result<()> {
        let _g = self.reentrancy.enter("rehash");
        try_next_prime(n)?;
        self.chains.rehash(n);
        Ok(())
    }

    /// Make room for `additional` more elements without further growth.
    pub fn reserve(&mut self, additional: usize) {
        let _g = self.reentrancy.enter("reserve");
        let wanted = min_buckets_for(
            self.len().saturating_add(additional),
            self.chains.max_load_factor,
        );
        self.chains.rehash(wanted);
    }
}

impl<K, V, M, S, E> HashTable<MapPolicy<K, V, M>, S, E>
where
    K: Hash,
    M: Multiplicity,
    S: BuildHasher,
{
    /// Mapped value for `q`; under a multi policy, the most recently
    /// linked one.
    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let _g = self.reentrancy.enter("get");
        let k = self.chains.find(q)?;
        self.chains.value(k).map(|(_, v)| v)
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let _g = self.reentrancy.enter("get_mut");
        let k = self.chains.find(q)?;
        self.chains.value_mut(k).map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        self.contains(q)
    }
}

impl<P, S, E> Default for HashTable<P, S, E>
where
    P: TablePolicy,
    S: Default,
    E: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, S, E> Clone for HashTable<P, S, E>
where
    P: TablePolicy,
    P::Value: Clone,
    S: Clone,
    E: Clone,
{
    /// Deep copy with its own identity. Within each bucket the copy's chain
    /// order is the reverse of the source's; positions from the source
    /// resolve to `None` in the copy.
    fn clone(&self) -> Self {
        Self {
            chains: self.chains.clone(),
            reentrancy: DebugReentrancy::new(),
        }
    }
}

/// Sets print as `{a, b}`, arena order.
impl<K, M, S, E> fmt::Debug for HashTable<SetPolicy<K, M>, S, E>
where
    K: fmt::Debug,
    M: Multiplicity,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.chains.nodes.values().map(|n| &n.value))
            .finish()
    }
}

/// Maps print as `{k: v}`, arena order. Multimaps repeat keys.
impl<K, V, M, S, E> fmt::Debug for HashTable<MapPolicy<K, V, M>, S, E>
where
    K: fmt::Debug,
    V: fmt::Debug,
    M: Multiplicity,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.chains.nodes.values().map(|n| (&n.value.0, &n.value.1)))
            .finish()
    }
}

impl<P, S, E> Extend<P::Value> for HashTable<P, S, E>
where
    P: TablePolicy,
    P::Key: Hash,
    S: BuildHasher,
    E: KeyEquality<P::Key>,
{
    fn extend<I: IntoIterator<Item = P::Value>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<P, S, E> FromIterator<P::Value> for HashTable<P, S, E>
where
    P: TablePolicy,
    P::Key: Hash,
    S: BuildHasher + Default,
    E: KeyEquality<P::Key> + Default,
{
    fn from_iter<I: IntoIterator<Item = P::Value>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut table = Self::new();
        table.reserve(iter.size_hint().0);
        table.extend(iter);
        table
    }
}

impl<P: TablePolicy, S, E> IntoIterator for HashTable<P, S, E> {
    type Item = P::Value;
    type IntoIter = IntoIter<P>;

    fn into_iter(self) -> IntoIter<P> {
        IntoIter::new(self.chains.nodes)
    }
}

impl<'a, P, S, E> IntoIterator for &'a HashTable<P, S, E>
where
    P: TablePolicy,
    P::Key: Hash,
    S: BuildHasher,
{
    type Item = &'a P::Value;
    type IntoIter = Iter<'a, P, S, E>;

    fn into_iter(self) -> Iter<'a, P, S, E> {
        self.iter()
    }
}
