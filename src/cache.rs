use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory cache where every insertion expires on its own timer.
///
/// A slot holds either a value or an explicit "searched, nothing there"
/// marker, so a confirmed miss is remembered just like a hit. Eviction is
/// purely time-driven; there is no capacity bound.
///
/// Each insertion gets a generation number and its expiry task only removes
/// the slot while that generation is still current. A slot overwritten before
/// its timer fires is left alone by the stale timer and lives until its own
/// timer comes due.
pub struct TtlCache<V> {
    entries: Arc<Mutex<HashMap<String, Slot<V>>>>,
    next_generation: AtomicU64,
}

struct Slot<V> {
    value: Option<Arc<V>>,
    generation: u64,
}

impl<V: Send + Sync + 'static> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// `None` means the key was never stored (or already expired);
    /// `Some(None)` is a remembered negative; `Some(Some(v))` is a hit.
    pub fn get(&self, key: &str) -> Option<Option<Arc<V>>> {
        self.entries.lock().get(key).map(|slot| slot.value.clone())
    }

    /// Store a value (or a negative marker) and arm its one-shot expiry.
    ///
    /// Must be called from within a tokio runtime. Same-key races are
    /// last-write-wins; each write's timer only ever clears its own write.
    pub fn insert(&self, key: impl Into<String>, value: Option<Arc<V>>, ttl: Duration) {
        let key = key.into();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        self.entries
            .lock()
            .insert(key.clone(), Slot { value, generation });

        let deadline = tokio::time::Instant::now() + ttl;
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let mut entries = entries.lock();
            // A newer insert under this key owns the slot now; leave it alone.
            if entries.get(&key).map(|slot| slot.generation) == Some(generation) {
                entries.remove(&key);
            }
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<V: Send + Sync + 'static> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
