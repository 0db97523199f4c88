use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use hulhe_store::{CFRInfoSet, InfoSetStore};

/// A shared [`hulhe_store::InfoSetStore`] fronted by `num_locks` striped
/// mutexes (spec.md §4.8/§9): each infoset id hashes to exactly one shard,
/// so two workers updating different infosets never block each other, and
/// the lock count stays `O(workers)` rather than one lock per infoset.
pub struct StripedInfoSetStore {
    shards: Vec<Mutex<HashMap<String, CFRInfoSet>>>,
}

impl StripedInfoSetStore {
    /// `num_locks` is typically `2 * workers` rounded up to a power of two
    /// (SPEC_FULL.md §4.8), but any positive count works.
    pub fn new(num_locks: usize) -> Self {
        let num_locks = num_locks.max(1);
        let mut shards = Vec::with_capacity(num_locks);
        for _ in 0..num_locks {
            shards.push(Mutex::new(HashMap::new()));
        }
        Self { shards }
    }

    fn shard_of(&self, id: &str) -> &Mutex<HashMap<String, CFRInfoSet>> {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        let idx = (hasher.finish() as usize) % self.shards.len();
        &self.shards[idx]
    }

    /// Run `f` against the record for `id` while holding only that id's
    /// striped lock, creating a fresh `k`-action record on first touch.
    pub fn with_record<T>(&self, id: &str, k: usize, f: impl FnOnce(&mut CFRInfoSet) -> T) -> T {
        let mut shard = self.shard_of(id).lock().expect("striped lock poisoned");
        let record = shard
            .entry(id.to_owned())
            .or_insert_with(|| CFRInfoSet::new(k));
        f(record)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().unwrap().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten the striped shards into a plain [`InfoSetStore`] for
    /// reporting, checkpointing, or feeding into the single-threaded
    /// stopping controller between iterations.
    pub fn snapshot(&self) -> InfoSetStore {
        let mut store = InfoSetStore::new();
        for shard in &self.shards {
            let guard = shard.lock().expect("striped lock poisoned");
            for (id, record) in guard.iter() {
                *store.get_or_create(id, record.num_actions()) = record.clone();
            }
        }
        store
    }

    /// Delete records whose `last_iteration < current_iter - stale_threshold`
    /// across every shard, mirroring [`InfoSetStore::prune_unused`]. Returns
    /// the number of records removed. Each shard is locked and pruned in
    /// turn, so this never holds more than one shard's lock at a time.
    pub fn prune_unused(&self, current_iter: usize, stale_threshold: usize) -> usize {
        let cutoff = current_iter.saturating_sub(stale_threshold);
        let mut removed = 0;
        for shard in &self.shards {
            let mut guard = shard.lock().expect("striped lock poisoned");
            let before = guard.len();
            guard.retain(|_, rec| rec.last_iteration >= cutoff);
            removed += before - guard.len();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn different_ids_can_map_to_different_shards() {
        let store = StripedInfoSetStore::new(64);
        store.with_record("P0|PRE|AKs|", 2, |_| {});
        store.with_record("P1|FLOP|QJT|", 3, |_| {});
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn repeated_access_reuses_the_same_record() {
        let store = StripedInfoSetStore::new(8);
        store.with_record("a", 2, |rec| rec.regrets[0] += 1.0);
        store.with_record("a", 2, |rec| rec.regrets[0] += 1.0);
        assert_eq!(store.len(), 1);
        let snapshot = store.snapshot();
        assert_eq!(snapshot.get("a").unwrap().regrets[0], 2.0);
    }

    #[test]
    fn prune_unused_removes_stale_records_across_shards() {
        let store = StripedInfoSetStore::new(4);
        store.with_record("a", 2, |rec| rec.last_iteration = 1);
        store.with_record("b", 2, |rec| rec.last_iteration = 100);
        let removed = store.prune_unused(100, 10);
        assert_eq!(removed, 1);
        let snapshot = store.snapshot();
        assert!(snapshot.get("a").is_none());
        assert!(snapshot.get("b").is_some());
    }
}
