//! Traits policy: how a table instantiation sees its elements.
//!
//! A policy fixes, at the type level:
//! - the stored value type and the key type inside it,
//! - how a key is extracted from a stored value,
//! - what mutable access to a stored value looks like (sets hand out
//!   `&K` only; maps hand out `(&K, &mut V)` so the key never changes
//!   while the value is linked into a chain),
//! - whether equal keys may coexist ([`Unique`] or [`Multi`]).
//!
//! Hashing and key equality are instance state of the table (a
//! `BuildHasher` and a [`KeyEquality`]), not part of the policy.

use core::marker::PhantomData;

/// Compile-time switch between unique-key and multi-key insertion.
pub trait Multiplicity {
    const IS_MULTI: bool;
}

/// At most one element per key; a second insert of the same key is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unique;

/// Any number of elements per key; inserts always succeed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Multi;

impl Multiplicity for Unique {
    const IS_MULTI: bool = false;
}

impl Multiplicity for Multi {
    const IS_MULTI: bool = true;
}

pub trait TablePolicy {
    type Key;
    type Value;
    type Multiplicity: Multiplicity;

    /// Mutable view of a stored value. Must not allow the key to change.
    type Mut<'a>
    where
        Self: 'a;

    const IS_MULTI: bool = <Self::Multiplicity as Multiplicity>::IS_MULTI;

    fn key(value: &Self::Value) -> &Self::Key;

    fn project_mut<'a>(value: &'a mut Self::Value) -> Self::Mut<'a>
    where
        Self: 'a;
}

/// Set-like policy: the value is its own key.
pub struct SetPolicy<K, M = Unique>(PhantomData<fn() -> (K, M)>);

impl<K, M: Multiplicity> TablePolicy for SetPolicy<K, M> {
    type Key = K;
    type Value = K;
    type Multiplicity = M;
    type Mut<'a>
        = &'a K
    where
        Self: 'a;

    #[inline]
    fn key(value: &K) -> &K {
        value
    }

    #[inline]
    fn project_mut<'a>(value: &'a mut K) -> &'a K
    where
        Self: 'a,
    {
        value
    }
}

/// Map-like policy: values are `(key, mapped)` pairs keyed by the first field.
pub struct MapPolicy<K, V, M = Unique>(PhantomData<fn() -> (K, V, M)>);

impl<K, V, M: Multiplicity> TablePolicy for MapPolicy<K, V, M> {
    type Key = K;
    type Value = (K, V);
    type Multiplicity = M;
    type Mut<'a>
        = (&'a K, &'a mut V)
    where
        Self: 'a;

    #[inline]
    fn key(value: &(K, V)) -> &K {
        &value.0
    }

    #[inline]
    fn project_mut<'a>(value: &'a mut (K, V)) -> (&'a K, &'a mut V)
    where
        Self: 'a,
    {
        let (k, v) = value;
        (&*k, v)
    }
}

/// Key equality used by the table. `Q` is the key type or a borrowed form of it.
pub trait KeyEquality<Q: ?Sized> {
    fn equal(&self, a: &Q, b: &Q) -> bool;
}

/// Equality through `Eq`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEq;

impl<Q: ?Sized + Eq> KeyEquality<Q> for DefaultEq {
    #[inline]
    fn equal(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}
