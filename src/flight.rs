//! Single-flight deduplication of concurrent async work.
//!
//! The first caller for a key starts the work; callers arriving while it is
//! still running await the same shared future instead of starting their own.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

type InFlight<V> = Shared<BoxFuture<'static, V>>;

struct Calls<K, V: Clone> {
    next_id: u64,
    entries: HashMap<K, (u64, InFlight<V>)>,
}

/// Deduplicates concurrent calls keyed by `K`.
pub struct SingleFlight<K, V: Clone> {
    calls: Mutex<Calls<K, V>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Calls {
                next_id: 0,
                entries: HashMap::new(),
            }),
        }
    }

    /// Run `make()` for `key` unless a call for the same key is already in
    /// flight, in which case its result is awaited and returned.
    pub async fn run<F>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> BoxFuture<'static, V> + Send,
    {
        let (id, call) = {
            let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
            match calls.entries.get(&key) {
                Some((id, existing)) => (*id, existing.clone()),
                None => {
                    let id = calls.next_id;
                    calls.next_id += 1;
                    let shared = make().shared();
                    calls.entries.insert(key.clone(), (id, shared.clone()));
                    (id, shared)
                }
            }
        };

        let mut waiter = Waiter {
            flight: self,
            key,
            id,
            call,
        };
        (&mut waiter.call).await
    }

    /// Number of keys with work currently in flight.
    pub fn in_flight(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// One caller's handle on an in-flight call.
///
/// Dropping it removes the entry only once the call has finished or when no
/// other caller is still waiting on it. A cancelled caller must not let the
/// next one start a second execution while the first is still running.
struct Waiter<'a, K: Eq + Hash, V: Clone> {
    flight: &'a SingleFlight<K, V>,
    key: K,
    id: u64,
    call: InFlight<V>,
}

impl<K: Eq + Hash, V: Clone> Drop for Waiter<'_, K, V> {
    fn drop(&mut self) {
        let mut calls = self.flight.calls.lock().unwrap_or_else(|e| e.into_inner());
        let done = match calls.entries.get(&self.key) {
            // The stored copy is never polled, so it still sees the output
            // and counts live handles: itself plus this waiter makes two.
            Some((id, stored)) if *id == self.id => {
                stored.peek().is_some() || stored.strong_count() == Some(2)
            }
            _ => false,
        };
        if done {
            calls.entries.remove(&self.key);
        }
    }
}
