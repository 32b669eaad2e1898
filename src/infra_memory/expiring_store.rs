use crate::logger::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Below this TTL no sweeper is started and entries live until overwritten
/// or deleted.
pub const MIN_SWEEP_TTL: Duration = Duration::from_secs(5);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(2);

struct Entry<V> {
    value: V,
    created_at: Instant,
}

type Entries<V> = Arc<Mutex<HashMap<String, Entry<V>>>>;

/// Key/value map whose entries are evicted by a background sweeper once
/// they are older than the TTL.
///
/// Reads never check age: eviction is eager, so an entry is either present
/// or swept. `get`, `set`, `delete` and each sweep pass take the same lock.
pub struct ExpiringStore<V> {
    entries: Entries<V>,
    ttl: Duration,
    cancel: CancellationToken,
}

impl<V> ExpiringStore<V>
where
    V: Clone + Send + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn start(ttl: Duration) -> Self {
        Self::start_with_interval(ttl, DEFAULT_SWEEP_INTERVAL)
    }

    pub fn start_with_interval(ttl: Duration, sweep_every: Duration) -> Self {
        let entries: Entries<V> = Arc::new(Mutex::new(HashMap::new()));
        let cancel = CancellationToken::new();

        if ttl >= MIN_SWEEP_TTL {
            tokio::spawn(sweep(entries.clone(), ttl, sweep_every, cancel.clone()));
        } else {
            warn!(?ttl, "expiring store ttl below {:?}, sweeper disabled", MIN_SWEEP_TTL);
        }

        Self {
            entries,
            ttl,
            cancel,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<V> {
        lock(&self.entries).get(key).map(|e| e.value.clone())
    }

    /// Insert or overwrite; either way the entry's age restarts at zero.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let entry = Entry {
            value,
            created_at: Instant::now(),
        };
        lock(&self.entries).insert(key.into(), entry);
    }

    pub fn delete(&self, key: &str) {
        lock(&self.entries).remove(key);
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop the sweeper. Safe to call more than once.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl<V> Drop for ExpiringStore<V> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn lock<V>(entries: &Mutex<HashMap<String, Entry<V>>>) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn sweep<V>(entries: Entries<V>, ttl: Duration, every: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("expiring store sweeper stopped");
                break;
            }
            _ = ticker.tick() => {
                let now = Instant::now();
                let mut guard = lock(&entries);
                let before = guard.len();
                guard.retain(|_, e| now.duration_since(e.created_at) <= ttl);
                let evicted = before - guard.len();
                if evicted > 0 {
                    trace!(evicted, remaining = guard.len(), "expired entries swept");
                }
            }
        }
    }
}
