//! Iteration protocol.
//!
//! - [`Iter`] is the global iterator. It keeps a borrow of the whole table
//!   and, on reaching the end of a chain, re-derives the bucket it was in
//!   from the last element's key and scans forward to the next occupied
//!   bucket.
//! - [`LocalIter`] walks a single chain and never leaves it. It only
//!   borrows the node arena, not the bucket directory.
//! - [`IterMut`] and [`IntoIter`] visit nodes in arena order, which is
//!   unrelated to bucket order.
//!
//! The shared borrow held by `Iter`/`LocalIter`/`EqualRange` rules out
//! structural mutation (and so rehashing) for as long as they live.
//! `Iter` and `EqualRange` run user hashing or equality inside `next`, so
//! each `next` holds the table's reentrancy guard. Calling back into the
//! table between steps is fine.

use crate::chains::Chains;
use crate::hash_table::Position;
use crate::node::{Link, Node, NodeKey, TableId};
use crate::policy::{KeyEquality, TablePolicy};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use slotmap::SlotMap;

pub struct Iter<'a, P: TablePolicy, S, E> {
    chains: &'a Chains<P, S, E>,
    reentrancy: &'a DebugReentrancy,
    cur: Link,
    remaining: usize,
}

impl<'a, P: TablePolicy, S, E> Iter<'a, P, S, E> {
    pub(crate) fn new(chains: &'a Chains<P, S, E>, reentrancy: &'a DebugReentrancy) -> Self {
        let cur = if chains.len() == 0 {
            None
        } else {
            chains.first_occupied_from(0)
        };
        Self {
            chains,
            reentrancy,
            cur,
            remaining: chains.len(),
        }
    }

    /// Position of the element the next call to `next` yields, or `None` at the end.
    pub fn position(&self) -> Option<Position> {
        let id = self.chains.id;
        self.cur.map(|k| Position::new(id, k))
    }
}

impl<'a, P, S, E> Iterator for Iter<'a, P, S, E>
where
    P: TablePolicy,
    P::Key: Hash,
    S: BuildHasher,
{
    type Item = &'a P::Value;

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.cur?;
        let chains = self.chains;
        let node = chains.nodes.get(k)?;
        let _g = self.reentrancy.enter("iter");
        self.cur = chains.successor(k);
        self.remaining -= 1;
        Some(&node.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P, S, E> ExactSizeIterator for Iter<'_, P, S, E>
where
    P: TablePolicy,
    P::Key: Hash,
    S: BuildHasher,
{
}

impl<P, S, E> FusedIterator for Iter<'_, P, S, E>
where
    P: TablePolicy,
    P::Key: Hash,
    S: BuildHasher,
{
}

impl<P: TablePolicy, S, E> Clone for Iter<'_, P, S, E> {
    fn clone(&self) -> Self {
        Self {
            chains: self.chains,
            reentrancy: self.reentrancy,
            cur: self.cur,
            remaining: self.remaining,
        }
    }
}

/// Iterator over one bucket's chain.
pub struct LocalIter<'a, V> {
    owner: TableId,
    nodes: &'a SlotMap<NodeKey, Node<V>>,
    cur: Link,
}

impl<'a, V> LocalIter<'a, V> {
    pub(crate) fn new(owner: TableId, nodes: &'a SlotMap<NodeKey, Node<V>>, head: Link) -> Self {
        Self {
            owner,
            nodes,
            cur: head,
        }
    }

    pub fn position(&self) -> Option<Position> {
        let owner = self.owner;
        self.cur.map(|k| Position::new(owner, k))
    }
}

impl<'a, V> Iterator for LocalIter<'a, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<&'a V> {
        let node = self.nodes.get(self.cur?)?;
        self.cur = node.next;
        Some(&node.value)
    }
}

impl<V> FusedIterator for LocalIter<'_, V> {}

impl<V> Clone for LocalIter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            nodes: self.nodes,
            cur: self.cur,
        }
    }
}

/// Every element whose key equals the probe.
pub struct EqualRange<'a, P: TablePolicy, S, E, Q: ?Sized> {
    chains: &'a Chains<P, S, E>,
    reentrancy: &'a DebugReentrancy,
    cur: Link,
    key: &'a Q,
}

impl<'a, P: TablePolicy, S, E, Q: ?Sized> EqualRange<'a, P, S, E, Q> {
    pub(crate) fn new(
        chains: &'a Chains<P, S, E>,
        reentrancy: &'a DebugReentrancy,
        head: Link,
        key: &'a Q,
    ) -> Self {
        Self {
            chains,
            reentrancy,
            cur: head,
            key,
        }
    }
}

impl<'a, P, S, E, Q> Iterator for EqualRange<'a, P, S, E, Q>
where
    P: TablePolicy,
    P::Key: Borrow<Q>,
    E: KeyEquality<Q>,
    Q: ?Sized,
{
    type Item = &'a P::Value;

    fn next(&mut self) -> Option<Self::Item> {
        let chains = self.chains;
        let _g = self.reentrancy.enter("equal_range");
        while let Some(k) = self.cur {
            let node = &chains.nodes[k];
            self.cur = node.next;
            if chains
                .equals
                .equal(Borrow::<Q>::borrow(P::key(&node.value)), self.key)
            {
                if !P::IS_MULTI {
                    self.cur = None;
                }
                return Some(&node.value);
            }
        }
        None
    }
}

impl<P, S, E, Q> FusedIterator for EqualRange<'_, P, S, E, Q>
where
    P: TablePolicy,
    P::Key: Borrow<Q>,
    E: KeyEquality<Q>,
    Q: ?Sized,
{
}

/// Mutable iteration in arena order. Map policies yield `(&K, &mut V)`;
/// set policies yield `&K`.
pub struct IterMut<'a, P: TablePolicy + 'a> {
    it: slotmap::basic::IterMut<'a, NodeKey, Node<P::Value>>,
}

impl<'a, P: TablePolicy + 'a> IterMut<'a, P> {
    pub(crate) fn new(nodes: &'a mut SlotMap<NodeKey, Node<P::Value>>) -> Self {
        Self {
            it: nodes.iter_mut(),
        }
    }
}

impl<'a, P: TablePolicy + 'a> Iterator for IterMut<'a, P> {
    type Item = P::Mut<'a>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let (_, node) = self.it.next()?;
        Some(P::project_mut(&mut node.value))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, P: TablePolicy + 'a> ExactSizeIterator for IterMut<'a, P> {}

/// Owning iterator, arena order.
pub struct IntoIter<P: TablePolicy> {
    it: slotmap::basic::IntoIter<NodeKey, Node<P::Value>>,
}

impl<P: TablePolicy> IntoIter<P> {
    pub(crate) fn new(nodes: SlotMap<NodeKey, Node<P::Value>>) -> Self {
        Self {
            it: nodes.into_iter(),
        }
    }
}

impl<P: TablePolicy> Iterator for IntoIter<P> {
    type Item = P::Value;

    #[inline]
    fn next(&mut self) -> Option<P::Value> {
        self.it.next().map(|(_, node)| node.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<P: TablePolicy> ExactSizeIterator for IntoIter<P> {}
