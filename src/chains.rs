//! Chains: the bucket directory plus the node arena.
//!
//! Invariants between calls:
//! - `buckets.len()` is a tabulated prime.
//! - Every node reachable from `buckets[i]` has a key hashing to `i`
//!   modulo `buckets.len()`.
//! - Every node in `nodes` is reachable from exactly one bucket, so
//!   `nodes.len()` is the element count.
//! - Under a `Unique` policy no chain holds two equal keys.
//!
//! Rehashing re-links nodes into a fresh directory without touching the
//! arena, so node keys (and therefore `Position`s) survive it.
//!
//! Nothing in here guards against reentrancy; `HashTable` does that.

use crate::node::{Link, Node, NodeKey, TableId};
use crate::policy::{KeyEquality, TablePolicy};
use crate::primes::{next_prime, MAX_BUCKET_COUNT};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use log::{debug, trace, warn};
use slotmap::SlotMap;

pub(crate) struct Chains<P: TablePolicy, S, E> {
    pub(crate) id: TableId,
    pub(crate) hasher: S,
    pub(crate) equals: E,
    pub(crate) buckets: Vec<Link>,
    pub(crate) nodes: SlotMap<NodeKey, Node<P::Value>>,
    pub(crate) max_load_factor: f32,
}

#[inline]
fn bucket_of<S, Q>(hasher: &S, q: &Q, bucket_count: usize) -> usize
where
    S: BuildHasher,
    Q: ?Sized + Hash,
{
    (hasher.hash_one(q) % bucket_count as u64) as usize
}

/// Bucket count for a requested capacity, clamped to the ceiling.
pub(crate) fn bucket_count_for(requested: usize) -> usize {
    if requested > MAX_BUCKET_COUNT {
        warn!(
            "requested {} buckets; clamping to maximum bucket count {}",
            requested, MAX_BUCKET_COUNT
        );
    }
    next_prime(requested)
}

/// Fewest buckets that keep `len` elements within `max_load_factor`.
#[inline]
pub(crate) fn min_buckets_for(len: usize, max_load_factor: f32) -> usize {
    // Float-to-int casts saturate.
    (len as f64 / max_load_factor as f64).ceil() as usize
}

/// Bucket count to grow to once `len` overflows `bucket_count`: the larger
/// of doubling and the load-factor minimum, clamped to the ceiling.
pub(crate) fn growth_target(bucket_count: usize, len: usize, max_load_factor: f32) -> usize {
    bucket_count_for(bucket_count.saturating_mul(2))
        .max(bucket_count_for(min_buckets_for(len, max_load_factor)))
}

impl<P: TablePolicy, S, E> Chains<P, S, E> {
    pub(crate) fn new(requested: usize, hasher: S, equals: E, max_load_factor: f32) -> Self {
        let mut chains = Self {
            id: TableId::fresh(),
            hasher,
            equals,
            buckets: Vec::new(),
            nodes: SlotMap::with_key(),
            max_load_factor,
        };
        chains.init_buckets(requested);
        chains
    }

    fn init_buckets(&mut self, requested: usize) {
        let n = bucket_count_for(requested);
        self.buckets.resize(n, None);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn head(&self, slot: usize) -> Link {
        self.buckets.get(slot).copied().flatten()
    }

    /// First chain head at or after `slot`.
    pub(crate) fn first_occupied_from(&self, slot: usize) -> Link {
        self.buckets.get(slot..)?.iter().find_map(|&l| l)
    }

    pub(crate) fn value(&self, k: NodeKey) -> Option<&P::Value> {
        self.nodes.get(k).map(|n| &n.value)
    }

    pub(crate) fn value_mut(&mut self, k: NodeKey) -> Option<&mut P::Value> {
        self.nodes.get_mut(k).map(|n| &mut n.value)
    }

    pub(crate) fn chain_len(&self, slot: usize) -> usize {
        let mut n = 0;
        let mut cur = self.head(slot);
        while let Some(k) = cur {
            n += 1;
            cur = self.nodes[k].next;
        }
        n
    }

    /// Drop every node, chain by chain, and null every slot.
    pub(crate) fn clear(&mut self) {
        let dropped = self.nodes.len();
        for slot in self.buckets.iter_mut() {
            let mut cur = slot.take();
            while let Some(k) = cur {
                cur = self.nodes.remove(k).and_then(|node| node.next);
            }
        }
        debug_assert!(self.nodes.is_empty());
        debug!(
            "cleared {} elements; keeping {} buckets",
            dropped,
            self.buckets.len()
        );
    }

    fn unlink(&mut self, slot: usize, prev: Link, k: NodeKey) -> Option<P::Value> {
        let node = self.nodes.remove(k)?;
        match prev {
            None => self.buckets[slot] = node.next,
            Some(p) => self.nodes[p].next = node.next,
        }
        Some(node.value)
    }
}

impl<P, S, E> Chains<P, S, E>
where
    P: TablePolicy,
    P::Key: Hash,
    S: BuildHasher,
{
    #[inline]
    pub(crate) fn bucket_index<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        bucket_of(&self.hasher, q, self.buckets.len())
    }

    /// Next element after `k` in global order: its successor in the chain,
    /// or the head of the next occupied bucket.
    pub(crate) fn successor(&self, k: NodeKey) -> Link {
        let node = self.nodes.get(k)?;
        match node.next {
            Some(next) => Some(next),
            None => {
                let slot = self.bucket_index(P::key(&node.value));
                self.first_occupied_from(slot + 1)
            }
        }
    }

    pub(crate) fn find<Q>(&self, q: &Q) -> Link
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        self.find_in_bucket(self.bucket_index(q), q)
    }

    fn find_in_bucket<Q>(&self, slot: usize, q: &Q) -> Link
    where
        P::Key: Borrow<Q>,
        Q: ?Sized,
        E: KeyEquality<Q>,
    {
        let mut cur = self.buckets[slot];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if self.equals.equal(Borrow::<Q>::borrow(P::key(&node.value)), q) {
                return Some(k);
            }
            cur = node.next;
        }
        None
    }

    pub(crate) fn count<Q>(&self, q: &Q) -> usize
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let mut n = 0;
        let mut cur = self.buckets[self.bucket_index(q)];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if self.equals.equal(Borrow::<Q>::borrow(P::key(&node.value)), q) {
                n += 1;
                if !P::IS_MULTI {
                    break;
                }
            }
            cur = node.next;
        }
        n
    }

    /// Insert under the policy's multiplicity. Returns the node holding the
    /// key and whether `value` was linked in.
    pub(crate) fn insert(&mut self, value: P::Value) -> (NodeKey, bool)
    where
        E: KeyEquality<P::Key>,
    {
        let slot = self.bucket_index(P::key(&value));
        if !P::IS_MULTI {
            if let Some(existing) = self.find_in_bucket(slot, P::key(&value)) {
                return (existing, false);
            }
        }
        let k = self.nodes.insert(Node::new(value, self.buckets[slot]));
        self.buckets[slot] = Some(k);
        self.grow_if_needed();
        (k, true)
    }

    fn grow_if_needed(&mut self) {
        let len = self.len();
        let bucket_count = self.bucket_count();
        if (len as f64) <= bucket_count as f64 * self.max_load_factor as f64 {
            return;
        }
        let target = growth_target(bucket_count, len, self.max_load_factor);
        trace!(
            "load factor exceeded: {} elements in {} buckets; growth target {}",
            len,
            bucket_count,
            target
        );
        if target > bucket_count {
            self.relink(target);
        }
    }

    /// Grow to at least `n` buckets (and enough for the current load).
    /// Never shrinks.
    pub(crate) fn rehash(&mut self, n: usize) {
        let wanted = n.max(min_buckets_for(self.len(), self.max_load_factor));
        let target = bucket_count_for(wanted);
        if target > self.bucket_count() {
            self.relink(target);
        }
    }

    /// Move every node into a fresh directory of `new_count` buckets.
    /// Nodes are re-linked as chain heads; no value is moved or cloned.
    fn relink(&mut self, new_count: usize) {
        let old_count = self.buckets.len();
        let mut fresh: Vec<Link> = vec![None; new_count];
        for slot in 0..old_count {
            let mut cur = self.buckets[slot];
            while let Some(k) = cur {
                let node = &self.nodes[k];
                let next = node.next;
                let target = bucket_of(&self.hasher, P::key(&node.value), new_count);
                self.nodes[k].next = fresh[target];
                fresh[target] = Some(k);
                cur = next;
            }
        }
        self.buckets = fresh;
        debug!(
            "rehashed {} elements from {} to {} buckets",
            self.len(),
            old_count,
            new_count
        );
    }

    /// Unlink the first matching node (unique) or every matching node (multi).
    pub(crate) fn erase<Q>(&mut self, q: &Q) -> usize
    where
        P::Key: Borrow<Q>,
        Q: ?Sized + Hash,
        E: KeyEquality<Q>,
    {
        let slot = self.bucket_index(q);
        let mut removed = 0;
        let mut prev: Link = None;
        let mut cur = self.buckets[slot];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            let next = node.next;
            if self.equals.equal(Borrow::<Q>::borrow(P::key(&node.value)), q) {
                // Chain is consistent again before the value drops.
                drop(self.unlink(slot, prev, k));
                removed += 1;
                if !P::IS_MULTI {
                    break;
                }
            } else {
                prev = Some(k);
            }
            cur = next;
        }
        removed
    }

    pub(crate) fn erase_at(&mut self, k: NodeKey) -> Option<P::Value> {
        let slot = self.bucket_index(P::key(&self.nodes.get(k)?.value));
        let mut prev: Link = None;
        let mut cur = self.buckets[slot];
        while let Some(c) = cur {
            if c == k {
                return self.unlink(slot, prev, k);
            }
            prev = Some(c);
            cur = self.nodes[c].next;
        }
        None
    }
}

impl<P, S, E> Clone for Chains<P, S, E>
where
    P: TablePolicy,
    P::Value: Clone,
    S: Clone,
    E: Clone,
{
    /// Deep copy. Each source chain is walked head to tail and every clone
    /// is pushed at the head of the destination chain, so the order inside
    /// a bucket comes out reversed.
    fn clone(&self) -> Self {
        let mut nodes = SlotMap::with_capacity_and_key(self.nodes.len());
        let mut buckets: Vec<Link> = vec![None; self.buckets.len()];
        for (slot, head) in buckets.iter_mut().enumerate() {
            let mut cur = self.buckets[slot];
            while let Some(k) = cur {
                let node = &self.nodes[k];
                *head = Some(nodes.insert(Node::new(node.value.clone(), *head)));
                cur = node.next;
            }
        }
        Self {
            id: TableId::fresh(),
            hasher: self.hasher.clone(),
            equals: self.equals.clone(),
            buckets,
            nodes,
            max_load_factor: self.max_load_factor,
        }
    }
}
