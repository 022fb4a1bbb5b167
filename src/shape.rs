//! Process-wide shape memos keyed by concrete application type
//!
//! Two caches live here, both pure performance memos and never authoritative
//! for correctness:
//!
//! * the *index-map cache*, mapping a decoded type to `{key → last index}`
//!   over its record items, which backs the indexed lookup strategy of
//!   [`Decoder::lookup`](crate::decode::Decoder::lookup);
//! * the *capacity-hint cache*, mapping an encoded type to the item count
//!   observed on its first encode, which pre-sizes nested encoders.
//!
//! Both rely on the fixed-schema contract of
//! [`CerealType`](crate::conv::CerealType): every instance of a type encodes
//! the same ordered key set. Entries are populated lazily on first
//! encode/decode of a type and live for the process lifetime unless cleared.
//!
//! Lock discipline: every acquisition is scoped to a single map operation
//! and released before any recursive encode or decode continues, so a
//! nested codec call on the same thread can never deadlock against its
//! ancestor.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;

use crate::node::Node;

lazy_static! {
    static ref INDEX_MAPS: RwLock<HashMap<TypeId, Arc<HashMap<String, usize>>>> =
        RwLock::new(HashMap::new());
    static ref CAPACITY_HINTS: RwLock<HashMap<TypeId, usize>> = RwLock::new(HashMap::new());
}

/// Key-to-last-index map for `shape`, building and caching it from `items`
/// on first request.
///
/// The map records, for each string key, the **last** item index at which a
/// pair with that key occurs, matching the backward linear scan on
/// duplicate keys.
pub(crate) fn index_map(shape: TypeId, items: &[Node]) -> Arc<HashMap<String, usize>> {
    if let Some(map) = INDEX_MAPS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&shape)
    {
        return Arc::clone(map);
    }

    let mut built: HashMap<String, usize> = HashMap::with_capacity(items.len());
    for (ix, item) in items.iter().enumerate() {
        if let Node::Pair(key, _) = item {
            if let Some(key) = key.as_str() {
                built.insert(key.to_owned(), ix);
            }
        }
    }

    let arc = Arc::new(built);
    let mut maps = INDEX_MAPS.write().unwrap_or_else(PoisonError::into_inner);
    // On a race, the first build wins and later builders adopt it.
    Arc::clone(maps.entry(shape).or_insert(arc))
}

/// Item-count hint recorded for `shape`, if one has been observed.
pub(crate) fn capacity_hint(shape: TypeId) -> Option<usize> {
    CAPACITY_HINTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&shape)
        .copied()
}

/// Records the item count observed for `shape`; first observation wins.
pub(crate) fn note_capacity(shape: TypeId, items: usize) {
    CAPACITY_HINTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(shape)
        .or_insert(items);
}

/// Empties both caches. Test support; production code has no reason to call
/// this.
pub fn clear_caches() {
    INDEX_MAPS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
    CAPACITY_HINTS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    struct UniqueShapeA;
    struct UniqueShapeB;

    #[test]
    fn index_map_records_last_occurrence() {
        let items = vec![
            Node::pair("x", Node::Int32(1)),
            Node::pair("y", Node::Int32(2)),
            Node::pair("x", Node::Int32(3)),
        ];
        let map = index_map(TypeId::of::<UniqueShapeA>(), &items);
        assert_eq!(map.get("x"), Some(&2));
        assert_eq!(map.get("y"), Some(&1));
        assert_eq!(map.get("z"), None);
    }

    #[test]
    fn first_build_is_reused() {
        let _guard = crate::registry::testing::lock();
        let items = vec![Node::pair("k", Node::Int32(1))];
        let first = index_map(TypeId::of::<UniqueShapeB>(), &items);
        // A second call with different items must return the memo, not
        // rebuild: the fixed-schema contract makes the layouts identical in
        // real use.
        let second = index_map(TypeId::of::<UniqueShapeB>(), &[]);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn capacity_hint_first_observation_wins() {
        struct UniqueShapeC;
        let _guard = crate::registry::testing::lock();
        let shape = TypeId::of::<UniqueShapeC>();
        assert_eq!(capacity_hint(shape), None);
        note_capacity(shape, 4);
        note_capacity(shape, 9);
        assert_eq!(capacity_hint(shape), Some(4));
    }

    #[test]
    fn clear_empties_both_caches() {
        struct UniqueShapeD;
        let _guard = crate::registry::testing::lock();
        let shape = TypeId::of::<UniqueShapeD>();
        let _ = index_map(shape, &[Node::pair("k", Node::Int32(1))]);
        note_capacity(shape, 1);
        clear_caches();
        assert_eq!(capacity_hint(shape), None);
        // Rebuilt rather than served from the memo.
        let rebuilt = index_map(shape, &[]);
        assert!(rebuilt.is_empty());
    }
}
