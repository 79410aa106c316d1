use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::errors::CoreError;

/// Read-only keyed lookup over the implementations of a contract.
///
/// Produced by indexed bulk registration: the container resolves every
/// implementation of `V` and keys each one by a caller supplied function.
pub struct ServiceIndex<K, V: ?Sized> {
    entries: HashMap<K, Arc<V>>,
}

impl<K, V> ServiceIndex<K, V>
where
    K: Eq + Hash + std::fmt::Debug,
    V: ?Sized,
{
    /// Build an index, rejecting key collisions.
    ///
    /// `contract` only names the indexed contract in the error.
    pub fn try_from_instances<F>(
        instances: Vec<Arc<V>>,
        key_fn: F,
        contract: &str,
    ) -> Result<Self, CoreError>
    where
        F: Fn(&V) -> K,
    {
        let mut entries = HashMap::with_capacity(instances.len());
        for instance in instances {
            let key = key_fn(&*instance);
            if entries.contains_key(&key) {
                return Err(CoreError::DuplicateKey {
                    key: format!("{:?}", key),
                    contract: contract.to_string(),
                });
            }
            entries.insert(key, instance);
        }
        Ok(Self { entries })
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&Arc<V>>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<V>)> {
        self.entries.iter()
    }
}

impl<K: std::fmt::Debug, V: ?Sized> std::fmt::Debug for ServiceIndex<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceIndex")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
