use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use gymops_core::{DomainError, DomainResult};

/// Explicit unique index: at most one holder per key.
///
/// Uniqueness constraints (SKU, plan name, supplier email, one active
/// subscription per user) are enforced by claiming the key here inside the
/// same operation that writes the document: a reservation under one lock,
/// not a find-then-insert race.
#[derive(Debug)]
pub struct UniqueIndex<K, I> {
    inner: RwLock<HashMap<K, I>>,
}

impl<K, I> UniqueIndex<K, I>
where
    K: Clone + Eq + Hash + core::fmt::Debug,
    I: Clone + Eq,
{
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Claim `key` for `holder`. Idempotent for the same holder; fails with
    /// `Conflict` if a different holder owns the key.
    ///
    /// Returns whether the entry was newly inserted (`false` when the holder
    /// already owned it). A caller that unwinds must release only claims it
    /// actually inserted; re-reading the holder in a separate step races
    /// with concurrent releases.
    pub fn claim(&self, key: K, holder: I) -> DomainResult<bool> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::storage("index lock poisoned"))?;
        match map.get(&key) {
            Some(existing) if *existing != holder => {
                Err(DomainError::conflict(format!("{key:?} is already taken")))
            }
            Some(_) => Ok(false),
            None => {
                map.insert(key, holder);
                Ok(true)
            }
        }
    }

    /// Release `key` only if `holder` owns it; releasing a key held by
    /// someone else (or nobody) is a no-op.
    pub fn release(&self, key: &K, holder: &I) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::storage("index lock poisoned"))?;
        if map.get(key) == Some(holder) {
            map.remove(key);
        }
        Ok(())
    }

    /// Atomically move a holder's claim from `old_key` to `new_key`
    /// (e.g. SKU change on update). Fails without releasing anything if the
    /// new key is taken.
    pub fn reclaim(&self, old_key: &K, new_key: K, holder: I) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::storage("index lock poisoned"))?;
        match map.get(&new_key) {
            Some(existing) if *existing != holder => {
                return Err(DomainError::conflict(format!("{new_key:?} is already taken")));
            }
            _ => {}
        }
        if map.get(old_key) == Some(&holder) {
            map.remove(old_key);
        }
        map.insert(new_key, holder);
        Ok(())
    }

    pub fn holder(&self, key: &K) -> DomainResult<Option<I>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::storage("index lock poisoned"))?;
        Ok(map.get(key).cloned())
    }
}

impl<K, I> Default for UniqueIndex<K, I>
where
    K: Clone + Eq + Hash + core::fmt::Debug,
    I: Clone + Eq,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_idempotent_and_reports_insertion() {
        let idx: UniqueIndex<String, u32> = UniqueIndex::new();
        assert!(idx.claim("WPX-500".to_string(), 1).unwrap());
        assert!(!idx.claim("WPX-500".to_string(), 1).unwrap());
        let err = idx.claim("WPX-500".to_string(), 2).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn release_only_removes_own_claim() {
        let idx: UniqueIndex<String, u32> = UniqueIndex::new();
        idx.claim("gold".to_string(), 1).unwrap();
        idx.release(&"gold".to_string(), &2).unwrap();
        assert_eq!(idx.holder(&"gold".to_string()).unwrap(), Some(1));
        idx.release(&"gold".to_string(), &1).unwrap();
        assert_eq!(idx.holder(&"gold".to_string()).unwrap(), None);
    }

    #[test]
    fn reclaim_moves_the_claim_atomically() {
        let idx: UniqueIndex<String, u32> = UniqueIndex::new();
        idx.claim("a".to_string(), 1).unwrap();
        idx.claim("b".to_string(), 2).unwrap();

        // Target taken by another holder: nothing changes.
        let err = idx.reclaim(&"a".to_string(), "b".to_string(), 1).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(idx.holder(&"a".to_string()).unwrap(), Some(1));

        idx.reclaim(&"a".to_string(), "c".to_string(), 1).unwrap();
        assert_eq!(idx.holder(&"a".to_string()).unwrap(), None);
        assert_eq!(idx.holder(&"c".to_string()).unwrap(), Some(1));
    }
}
