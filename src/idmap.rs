use std::borrow::Borrow;
use std::hash::Hash;

use ahash::HashMap;

pub(crate) trait IdIndex<T> {
    fn to_id(index: usize) -> T;
    fn from_id(id: T) -> usize;
}

/// Interning table: each distinct value gets a small copyable id.
#[derive(Debug, Clone)]
pub(crate) struct IdMap<K: Copy + IdIndex<K>, V: Eq + Hash + Clone> {
    by_id: Vec<V>,
    by_value: HashMap<V, K>,
}

impl<K: Copy + IdIndex<K>, V: Eq + Hash + Clone> IdMap<K, V> {
    pub(crate) fn new() -> Self {
        IdMap {
            by_id: Vec::new(),
            by_value: HashMap::default(),
        }
    }

    pub(crate) fn get_id_mut(&mut self, value: V) -> K {
        if let Some(id) = self.by_value.get(&value) {
            return *id;
        }
        let id = K::to_id(self.by_id.len());
        self.by_value.insert(value.clone(), id);
        self.by_id.push(value);
        id
    }

    pub(crate) fn get_id<Q>(&self, value: &Q) -> Option<K>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.by_value.get(value).copied()
    }

    #[inline]
    pub(crate) fn get_value(&self, id: K) -> &V {
        &self.by_id[K::from_id(id)]
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}
