use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::key::LockKey;
use crate::lock::Lock;
use crate::LockError;

struct Entry<V> {
    handle: Arc<V>,
    touched: Instant,
}

struct Entries<V> {
    map: HashMap<LockKey, Entry<V>>,
    last_sweep: Instant,
}

/// Memoizing `LockKey -> Arc<handle>` map shared by both registry kinds.
///
/// Creation happens under the map's mutex, so concurrent first requests for
/// a key build exactly one handle. An entry is only evicted when the cache
/// owns the sole `Arc`, the handle is unlocked, and it has not been looked
/// up for `idle`. Nobody else can be holding or about to hold it then,
/// since new references are only handed out under the same mutex.
pub(crate) struct HandleCache<V> {
    entries: Mutex<Entries<V>>,
    idle: Duration,
}

impl<V: Lock> HandleCache<V> {
    pub(crate) fn new(idle: Duration) -> Self {
        HandleCache {
            entries: Mutex::new(Entries {
                map: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            idle,
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, Entries<V>>, LockError> {
        self.entries
            .lock()
            .map_err(|_| LockError::Poisoned("lock registry cache poisoned".into()))
    }

    /// Return the cached handle for `key`, creating it with `create` on a
    /// miss. Misses also sweep idle entries, at most once per idle period.
    pub(crate) fn get_or_try_insert_with<F>(
        &self,
        key: &LockKey,
        create: F,
    ) -> Result<Arc<V>, LockError>
    where
        F: FnOnce() -> Result<V, LockError>,
    {
        let mut entries = self.entries()?;
        let now = Instant::now();
        if let Some(entry) = entries.map.get_mut(key) {
            entry.touched = now;
            return Ok(entry.handle.clone());
        }

        if now.duration_since(entries.last_sweep) >= self.idle {
            sweep(&mut entries.map, now, self.idle);
            entries.last_sweep = now;
        }

        let handle = Arc::new(create()?);
        entries.map.insert(
            key.clone(),
            Entry {
                handle: handle.clone(),
                touched: now,
            },
        );
        Ok(handle)
    }

    /// Evict every idle, unreferenced, unlocked entry. Returns how many went.
    pub(crate) fn purge_idle(&self) -> usize {
        match self.entries() {
            Ok(mut entries) => {
                let now = Instant::now();
                entries.last_sweep = now;
                sweep(&mut entries.map, now, self.idle)
            }
            Err(_) => 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().map(|e| e.map.len()).unwrap_or(0)
    }
}

fn sweep<V: Lock>(map: &mut HashMap<LockKey, Entry<V>>, now: Instant, idle: Duration) -> usize {
    let before = map.len();
    map.retain(|_, entry| {
        Arc::strong_count(&entry.handle) > 1
            || entry.handle.is_locked()
            || now.duration_since(entry.touched) < idle
    });
    before - map.len()
}
