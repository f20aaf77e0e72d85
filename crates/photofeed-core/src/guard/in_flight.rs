// ── Keyed exclusivity ──
//
// Many keys may be in flight at once, but each key at most once. Used
// where operations on different entities are independent (likes on
// different photos) yet must not race on the same one.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashSet;

/// Set of keys with an outstanding operation.
pub struct InFlightSet<K: Eq + Hash> {
    keys: Arc<DashSet<K>>,
}

impl<K: Eq + Hash + Clone> InFlightSet<K> {
    pub fn new() -> Self {
        Self {
            keys: Arc::new(DashSet::new()),
        }
    }

    /// Claim `key`. Returns `None` if it is already claimed. The claim is
    /// released when the returned guard drops.
    pub fn try_acquire(&self, key: K) -> Option<InFlightGuard<K>> {
        if !self.keys.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            key,
            keys: Arc::clone(&self.keys),
        })
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for InFlightSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// A claimed key. Releases the claim on drop.
#[must_use = "the claim is released as soon as the guard drops"]
pub struct InFlightGuard<K: Eq + Hash> {
    key: K,
    keys: Arc<DashSet<K>>,
}

impl<K: Eq + Hash> InFlightGuard<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K: Eq + Hash> Drop for InFlightGuard<K> {
    fn drop(&mut self) {
        self.keys.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_is_exclusive() {
        let set = InFlightSet::new();
        let claim = set.try_acquire("42".to_string());
        assert!(claim.is_some());
        assert!(set.try_acquire("42".to_string()).is_none());
        assert!(set.contains(&"42".to_string()));
    }

    #[test]
    fn different_keys_proceed_together() {
        let set = InFlightSet::new();
        let a = set.try_acquire(1u32);
        let b = set.try_acquire(2u32);
        assert!(a.is_some() && b.is_some());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn dropping_the_guard_releases_the_key() {
        let set = InFlightSet::new();
        drop(set.try_acquire('k'));
        assert!(set.is_empty());
        assert!(set.try_acquire('k').is_some());
    }
}
