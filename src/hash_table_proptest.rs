#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can reach
// the chain structure through the public bucket API without extra features.

use crate::hash_table::{HashTable, Position};
use crate::policy::{Multi, SetPolicy, TablePolicy, Unique};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations so shrinking moves towards earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize),
    Erase(usize),
    EraseAt(usize),
    Find(usize),
    Rehash(usize),
    Reserve(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=10).prop_flat_map(|pool| {
        let idx = proptest::sample::select((0..pool.len()).collect::<Vec<_>>());
        let op = prop_oneof![
            4 => idx.clone().prop_map(Op::Insert),
            2 => idx.clone().prop_map(Op::Erase),
            1 => idx.clone().prop_map(Op::EraseAt),
            2 => idx.clone().prop_map(Op::Find),
            1 => (0usize..400).prop_map(Op::Rehash),
            1 => (0usize..100).prop_map(Op::Reserve),
            1 => Just(Op::Clear),
            1 => Just(Op::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Forces every key into one bucket to stress chain surgery.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

/// Keys reachable per bucket all hash to that bucket; bucket walk, global
/// walk and `len` agree; bucket_count is tabulated.
fn check_structure<P, S>(t: &HashTable<P, S>) -> Result<(), TestCaseError>
where
    P: TablePolicy<Key = String, Value = String>,
    S: BuildHasher,
{
    prop_assert!(crate::primes::PRIME_LIST.contains(&t.bucket_count()));
    let mut by_bucket: Vec<String> = Vec::new();
    for i in 0..t.bucket_count() {
        for v in t.bucket(i) {
            prop_assert_eq!(t.bucket_index(v), i);
            by_bucket.push(v.clone());
        }
    }
    prop_assert_eq!(by_bucket.len(), t.len());
    let global: Vec<String> = t.iter().cloned().collect();
    // Global order is bucket order.
    prop_assert_eq!(global, by_bucket);
    Ok(())
}

fn run_unique<S: BuildHasher>(
    mut sut: HashTable<SetPolicy<String, Unique>, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: BTreeSet<String> = BTreeSet::new();
    let mut live: HashMap<String, Position> = HashMap::new();
    let mut stale: Vec<Position> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(i) => {
                let k = pool[i].clone();
                let (pos, inserted) = sut.insert(k.clone());
                prop_assert_eq!(inserted, model.insert(k.clone()));
                if inserted {
                    live.insert(k.clone(), pos);
                } else {
                    prop_assert_eq!(Some(&pos), live.get(&k));
                }
                prop_assert_eq!(pos.value(&sut), Some(&k));
            }
            Op::Erase(i) => {
                let k = &pool[i];
                let expected = usize::from(model.remove(k));
                prop_assert_eq!(sut.erase(k.as_str()), expected);
                if let Some(p) = live.remove(k) {
                    stale.push(p);
                }
                prop_assert!(sut.find(k.as_str()).is_none());
            }
            Op::EraseAt(i) => {
                let k = &pool[i];
                if let Some(p) = live.remove(k) {
                    prop_assert_eq!(sut.erase_at(p), Some(k.clone()));
                    model.remove(k);
                    stale.push(p);
                }
            }
            Op::Find(i) => {
                let k = &pool[i];
                let found = sut.find(k.as_str());
                prop_assert_eq!(found.is_some(), model.contains(k));
                // Positions survive rehashes, so the tracked one must match.
                prop_assert_eq!(found.as_ref(), live.get(k));
            }
            Op::Rehash(n) => {
                let before = sut.bucket_count();
                sut.rehash(n);
                prop_assert!(sut.bucket_count() >= before);
                prop_assert!(sut.bucket_count() >= n.min(crate::primes::MAX_BUCKET_COUNT));
            }
            Op::Reserve(n) => {
                sut.reserve(n);
                let buckets = sut.bucket_count();
                let room = buckets as f64 * sut.max_load_factor() as f64;
                prop_assert!((sut.len() + n) as f64 <= room);
            }
            Op::Clear => {
                let before = sut.bucket_count();
                sut.clear();
                model.clear();
                stale.extend(live.drain().map(|(_, p)| p));
                prop_assert_eq!(sut.bucket_count(), before);
            }
            Op::Iterate => {
                let seen: BTreeSet<String> = sut.iter().cloned().collect();
                prop_assert_eq!(&seen, &model);
                prop_assert_eq!(sut.iter().count(), model.len());
            }
        }

        for p in &stale {
            prop_assert!(p.value(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() as f64 <= sut.bucket_count() as f64 * sut.max_load_factor() as f64);
        check_structure(&sut)?;
    }
    Ok(())
}

fn run_multi<S: BuildHasher>(
    mut sut: HashTable<SetPolicy<String, Multi>, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<String, usize> = BTreeMap::new();
    let mut positions: Vec<(String, Position)> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(i) => {
                let k = pool[i].clone();
                let (pos, inserted) = sut.insert(k.clone());
                prop_assert!(inserted, "multi insert always links");
                *model.entry(k.clone()).or_default() += 1;
                positions.push((k, pos));
            }
            Op::Erase(i) => {
                let k = &pool[i];
                let expected = model.remove(k).unwrap_or(0);
                prop_assert_eq!(sut.erase(k.as_str()), expected);
                prop_assert_eq!(sut.count(k.as_str()), 0);
                positions.retain(|(pk, _)| pk != k);
            }
            Op::EraseAt(i) => {
                let k = &pool[i];
                if let Some(at) = positions.iter().position(|(pk, _)| pk == k) {
                    let (_, p) = positions.swap_remove(at);
                    prop_assert_eq!(sut.erase_at(p), Some(k.clone()));
                    prop_assert!(p.value(&sut).is_none());
                    if let Some(c) = model.get_mut(k) {
                        *c -= 1;
                        if *c == 0 {
                            model.remove(k);
                        }
                    }
                }
            }
            Op::Find(i) => {
                let k = &pool[i];
                let expected = model.get(k).copied().unwrap_or(0);
                prop_assert_eq!(sut.count(k.as_str()), expected);
                prop_assert_eq!(sut.equal_range(k.as_str()).count(), expected);
                prop_assert_eq!(sut.find(k.as_str()).is_some(), expected > 0);
            }
            Op::Rehash(n) => sut.rehash(n),
            Op::Reserve(n) => sut.reserve(n),
            Op::Clear => {
                sut.clear();
                model.clear();
                positions.clear();
            }
            Op::Iterate => {
                let mut seen: BTreeMap<String, usize> = BTreeMap::new();
                for v in sut.iter() {
                    *seen.entry(v.clone()).or_default() += 1;
                }
                prop_assert_eq!(&seen, &model);
            }
        }

        for (k, p) in &positions {
            prop_assert_eq!(p.value(&sut), Some(k));
        }
        prop_assert_eq!(sut.len(), model.values().sum::<usize>());
        check_structure(&sut)?;
    }
    Ok(())
}

// Property: a unique set behaves like BTreeSet; duplicate inserts report the
// existing position; positions survive rehash and stop resolving on removal;
// every element sits in the bucket its key hashes to after every step.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unique_state_machine((pool, ops) in arb_scenario()) {
        let sut: HashTable<SetPolicy<String>> = HashTable::new();
        run_unique(sut, pool, ops)?;
    }

    #[test]
    fn prop_unique_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_unique(HashTable::with_capacity_and_hasher(0, ConstBuildHasher), pool, ops)?;
    }

    #[test]
    fn prop_multi_state_machine((pool, ops) in arb_scenario()) {
        let sut: HashTable<SetPolicy<String, Multi>> = HashTable::new();
        run_multi(sut, pool, ops)?;
    }

    #[test]
    fn prop_multi_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_multi(HashTable::with_capacity_and_hasher(0, ConstBuildHasher), pool, ops)?;
    }
}

// Property: a clone holds the same multiset of elements, every chain in
// reverse, and is independent of its source.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_clone_reverses_chains(keys in proptest::collection::vec(0u16..64, 0..120)) {
        let mut t: HashTable<SetPolicy<u16, Multi>> = keys.iter().copied().collect();
        let copy = t.clone();
        prop_assert_eq!(copy.bucket_count(), t.bucket_count());
        for i in 0..t.bucket_count() {
            let mut src: Vec<u16> = t.bucket(i).copied().collect();
            src.reverse();
            let dst: Vec<u16> = copy.bucket(i).copied().collect();
            prop_assert_eq!(src, dst);
        }
        t.clear();
        prop_assert_eq!(copy.len(), keys.len());
    }
}

// Property: `hash(key) % bucket_count` placement holds for any integer key
// set after growth, and every inserted key is found.
proptest! {
    #[test]
    fn prop_growth_keeps_membership(
        keys in proptest::collection::btree_set(any::<u64>(), 0..300),
        start in 0usize..60,
    ) {
        let mut t: HashTable<SetPolicy<u64>> = HashTable::with_capacity(start);
        for &k in &keys {
            prop_assert!(t.insert(k).1);
        }
        for &k in &keys {
            prop_assert!(t.contains(&k));
        }
        for i in 0..t.bucket_count() {
            for v in t.bucket(i) {
                prop_assert_eq!(t.bucket_index(v), i);
            }
        }
        let walked: BTreeSet<u64> = t.iter().copied().collect();
        prop_assert_eq!(walked, keys);
    }
}

#[test]
fn key_hash_matches_policy_key() {
    // A String key and its &str borrow land in the same bucket.
    let t: HashTable<SetPolicy<String>> = HashTable::with_capacity(100);
    let owned = "abc".to_string();
    assert_eq!(t.bucket_index(&owned), t.bucket_index("abc"));
}
