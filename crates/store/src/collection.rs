use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use gymops_core::{DomainError, DomainResult, ExpectedRevision};

/// A stored document plus its revision.
///
/// The revision increases by one on every committed write; conditional
/// updates compare against it to detect concurrent writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub doc: T,
    pub revision: u64,
}

/// In-process versioned document collection.
///
/// One `RwLock<HashMap>` per collection; every write path goes through the
/// write lock, so check-then-mutate sequences inside a single call are
/// serialized with respect to the whole collection. Intended for a single
/// process; not optimized for large data sets.
#[derive(Debug)]
pub struct Collection<K, V> {
    inner: RwLock<HashMap<K, Versioned<V>>>,
}

impl<K, V> Collection<K, V>
where
    K: Clone + Eq + Hash + core::fmt::Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a new document at revision 1. Fails if the key is taken.
    pub fn insert(&self, key: K, doc: V) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::storage("collection lock poisoned"))?;
        if map.contains_key(&key) {
            return Err(DomainError::conflict(format!("document {key:?} already exists")));
        }
        map.insert(key, Versioned { doc, revision: 1 });
        Ok(())
    }

    pub fn get(&self, key: &K) -> DomainResult<Option<Versioned<V>>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::storage("collection lock poisoned"))?;
        Ok(map.get(key).cloned())
    }

    /// Fetch a document or fail with `NotFound`.
    pub fn fetch(&self, key: &K) -> DomainResult<Versioned<V>> {
        self.get(key)?
            .ok_or_else(|| DomainError::not_found(format!("document {key:?}")))
    }

    /// Conditional update (compare-and-swap on the revision).
    ///
    /// The closure runs against a copy; nothing is committed unless it
    /// returns `Ok`, so a failed update leaves the document untouched.
    pub fn update<F, R>(&self, key: &K, expected: ExpectedRevision, f: F) -> DomainResult<R>
    where
        F: FnOnce(&mut V) -> DomainResult<R>,
    {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::storage("collection lock poisoned"))?;
        let entry = map
            .get_mut(key)
            .ok_or_else(|| DomainError::not_found(format!("document {key:?}")))?;
        expected.check(entry.revision)?;

        let mut doc = entry.doc.clone();
        let out = f(&mut doc)?;
        entry.doc = doc;
        entry.revision += 1;
        Ok(out)
    }

    /// All-or-nothing update across several documents.
    ///
    /// Holds the write lock for the whole batch: every key is resolved
    /// first, then the closure is applied to copies, and only if every
    /// application succeeds are the copies committed. A failure on any
    /// document leaves all of them unchanged.
    pub fn update_batch<F>(&self, keys: &[K], mut f: F) -> DomainResult<()>
    where
        F: FnMut(&K, &mut V) -> DomainResult<()>,
    {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::storage("collection lock poisoned"))?;

        // Stage per key so a key repeated in `keys` (e.g. the same item on
        // two sale lines) sees its earlier staged mutation.
        let mut staged: HashMap<K, V> = HashMap::with_capacity(keys.len());
        for key in keys {
            let mut doc = match staged.remove(key) {
                Some(doc) => doc,
                None => map
                    .get(key)
                    .ok_or_else(|| DomainError::not_found(format!("document {key:?}")))?
                    .doc
                    .clone(),
            };
            f(key, &mut doc)?;
            staged.insert(key.clone(), doc);
        }

        for (key, doc) in staged {
            // Every staged key was resolved against `map` above.
            if let Some(entry) = map.get_mut(&key) {
                entry.doc = doc;
                entry.revision += 1;
            }
        }
        Ok(())
    }

    /// Remove a document, returning it.
    pub fn remove(&self, key: &K) -> DomainResult<V> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::storage("collection lock poisoned"))?;
        map.remove(key)
            .map(|v| v.doc)
            .ok_or_else(|| DomainError::not_found(format!("document {key:?}")))
    }

    /// Point-in-time copy of every document (read paths, list endpoints).
    pub fn snapshot(&self) -> DomainResult<Vec<V>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::storage("collection lock poisoned"))?;
        Ok(map.values().map(|v| v.doc.clone()).collect())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for Collection<K, V>
where
    K: Clone + Eq + Hash + core::fmt::Debug,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_rejects_duplicate_keys() {
        let col: Collection<u32, String> = Collection::new();
        col.insert(1, "a".to_string()).unwrap();
        let err = col.insert(1, "b".to_string()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn update_bumps_revision_and_checks_expectation() {
        let col: Collection<u32, i64> = Collection::new();
        col.insert(1, 10).unwrap();
        assert_eq!(col.fetch(&1).unwrap().revision, 1);

        col.update(&1, ExpectedRevision::Exact(1), |v| {
            *v += 5;
            Ok(())
        })
        .unwrap();
        let stored = col.fetch(&1).unwrap();
        assert_eq!(stored.doc, 15);
        assert_eq!(stored.revision, 2);

        // Stale writer loses.
        let err = col
            .update(&1, ExpectedRevision::Exact(1), |v| {
                *v += 100;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(col.fetch(&1).unwrap().doc, 15);
    }

    #[test]
    fn failed_update_commits_nothing() {
        let col: Collection<u32, i64> = Collection::new();
        col.insert(1, 10).unwrap();
        let err = col
            .update(&1, ExpectedRevision::Any, |v| {
                *v = 999;
                Err::<(), _>(DomainError::validation("nope"))
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        let stored = col.fetch(&1).unwrap();
        assert_eq!(stored.doc, 10);
        assert_eq!(stored.revision, 1);
    }

    #[test]
    fn update_batch_is_all_or_nothing() {
        let col: Collection<u32, i64> = Collection::new();
        col.insert(1, 10).unwrap();
        col.insert(2, 0).unwrap();

        let err = col
            .update_batch(&[1, 2], |key, v| {
                if *key == 2 {
                    return Err(DomainError::insufficient_stock("second doc"));
                }
                *v -= 5;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::InsufficientStock(_)));
        assert_eq!(col.fetch(&1).unwrap().doc, 10);
        assert_eq!(col.fetch(&1).unwrap().revision, 1);

        col.update_batch(&[1, 2], |_, v| {
            *v += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(col.fetch(&1).unwrap().doc, 11);
        assert_eq!(col.fetch(&2).unwrap().doc, 1);
    }

    #[test]
    fn update_batch_accumulates_over_repeated_keys() {
        let col: Collection<u32, i64> = Collection::new();
        col.insert(1, 10).unwrap();
        col.update_batch(&[1, 1], |_, v| {
            if *v < 6 {
                return Err(DomainError::insufficient_stock("short"));
            }
            *v -= 6;
            Ok(())
        })
        .unwrap_err();
        // Second application saw 4 and failed, so neither decrement landed.
        assert_eq!(col.fetch(&1).unwrap().doc, 10);
    }

    #[test]
    fn update_batch_missing_key_fails_before_any_write() {
        let col: Collection<u32, i64> = Collection::new();
        col.insert(1, 10).unwrap();
        let err = col
            .update_batch(&[1, 99], |_, v| {
                *v += 1;
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert_eq!(col.fetch(&1).unwrap().doc, 10);
    }
}
