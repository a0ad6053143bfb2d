//! Snapshot bus - ordered broadcast with replay of the last value.
//!
//! Architecture:
//! - `subscribe()` registers a callback and immediately replays the latest value
//! - `publish()` delivers a value to every subscriber, in subscription order
//! - Publishing from inside a callback queues the value; it is delivered after
//!   the current value reached every subscriber (no reordering, no drops)
//! - `Subscription::unsubscribe()` stops delivery immediately, even mid-broadcast
//!
//! Single-threaded use is the expected mode; locks only make the handle
//! shareable between the store, the coordinator and surfaces.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Type-erased subscriber callback
type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Callback<T>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            active: Arc::clone(&self.active),
            callback: Arc::clone(&self.callback),
        }
    }
}

struct BusInner<T> {
    subscribers: RwLock<Vec<Subscriber<T>>>,
    latest: Mutex<Option<T>>,
    queue: Mutex<VecDeque<T>>,
    delivering: AtomicBool,
    next_id: AtomicU64,
}

/// Broadcast channel for state snapshots.
///
/// Cloning yields another handle to the same bus.
pub struct SnapshotBus<T> {
    inner: Arc<BusInner<T>>,
}

impl<T> Clone for SnapshotBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Default for SnapshotBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SnapshotBus<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotBus")
            .field(
                "subscribers",
                &self.inner.subscribers.read().map(|s| s.len()).unwrap_or(0),
            )
            .field(
                "queued",
                &self.inner.queue.lock().map(|q| q.len()).unwrap_or(0),
            )
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> SnapshotBus<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: RwLock::new(Vec::new()),
                latest: Mutex::new(None),
                queue: Mutex::new(VecDeque::new()),
                delivering: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Bus whose late subscribers immediately receive `initial`
    pub fn with_initial(initial: T) -> Self {
        let bus = Self::new();
        *bus.inner.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(initial);
        bus
    }

    /// Subscribe to every future value.
    ///
    /// The callback is invoked right away with the latest delivered value
    /// (if any), then once per published value.
    ///
    /// # Example
    /// ```ignore
    /// let sub = bus.subscribe(move |snapshot| {
    ///     surface.render(snapshot);
    /// });
    /// // later
    /// sub.unsubscribe();
    /// ```
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        let callback: Callback<T> = Arc::new(callback);

        self.inner
            .subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Subscriber {
                id,
                active: Arc::clone(&active),
                callback: Arc::clone(&callback),
            });

        let replay = self
            .inner
            .latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(value) = replay {
            callback(&value);
        }

        let weak = Arc::downgrade(&self.inner);
        Subscription {
            id,
            active,
            detach: Some(Box::new(move |id| {
                if let Some(inner) = weak.upgrade() {
                    inner
                        .subscribers
                        .write()
                        .unwrap_or_else(|e| e.into_inner())
                        .retain(|s| s.id != id);
                }
            })),
        }
    }

    /// Deliver `value` to all subscribers in subscription order.
    ///
    /// Re-entrant calls (from inside a callback) enqueue and return; the
    /// outermost call drains the queue.
    pub fn publish(&self, value: T) {
        self.inner
            .queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(value);

        loop {
            if self
                .inner
                .delivering
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }

            self.drain();
            self.inner.delivering.store(false, Ordering::Release);

            // A value may have slipped in between the last pop and the flag reset
            let empty = self
                .inner
                .queue
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .is_empty();
            if empty {
                return;
            }
        }
    }

    fn drain(&self) {
        loop {
            let next = self
                .inner
                .queue
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front();
            let Some(value) = next else {
                return;
            };

            *self.inner.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(value.clone());

            // Clone the list so callbacks may subscribe/unsubscribe freely
            let subscribers: Vec<Subscriber<T>> = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .clone();

            for sub in &subscribers {
                if sub.active.load(Ordering::Acquire) {
                    (sub.callback)(&value);
                }
            }
        }
    }

    /// Latest delivered value
    pub fn latest(&self) -> Option<T> {
        self.inner
            .latest
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Handle returned by [`SnapshotBus::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call `unsubscribe()`.
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    detach: Option<Box<dyn FnOnce(u64) + Send + Sync>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    /// Stop delivery. Takes effect before the next callback invocation.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn cancel(&mut self) {
        self.active.store(false, Ordering::Release);
        if let Some(detach) = self.detach.take() {
            detach(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn test_replay_latest_on_subscribe() {
        let bus = SnapshotBus::with_initial(7);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);

        let _sub = bus.subscribe(move |v: &i32| s.lock().unwrap().push(*v));
        assert_eq!(*seen.lock().unwrap(), vec![7]);

        bus.publish(8);
        bus.publish(9);
        assert_eq!(*seen.lock().unwrap(), vec![7, 8, 9]);
    }

    #[test]
    fn test_no_replay_without_value() {
        let bus: SnapshotBus<i32> = SnapshotBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        let _sub = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_subscription_order() {
        let bus: SnapshotBus<i32> = SnapshotBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l1 = Arc::clone(&log);
        let _a = bus.subscribe(move |v: &i32| l1.lock().unwrap().push(("a", *v)));
        let l2 = Arc::clone(&log);
        let _b = bus.subscribe(move |v: &i32| l2.lock().unwrap().push(("b", *v)));

        bus.publish(1);
        bus.publish(2);
        assert_eq!(
            *log.lock().unwrap(),
            vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let bus: SnapshotBus<i32> = SnapshotBus::new();
        let counter = Arc::new(AtomicI32::new(0));
        let c = Arc::clone(&counter);

        let sub = bus.subscribe(move |v| {
            c.fetch_add(*v, Ordering::SeqCst);
        });
        bus.publish(10);
        assert_eq!(counter.load(Ordering::SeqCst), 10);

        sub.unsubscribe();
        bus.publish(10);
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_reentrant_publish_keeps_order() {
        let bus: SnapshotBus<i32> = SnapshotBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        // First subscriber republishes once, like a surface issuing a command
        let inner_bus = bus.clone();
        let l1 = Arc::clone(&log);
        let _a = bus.subscribe(move |v: &i32| {
            l1.lock().unwrap().push(("a", *v));
            if *v == 1 {
                inner_bus.publish(2);
            }
        });
        let l2 = Arc::clone(&log);
        let _b = bus.subscribe(move |v: &i32| l2.lock().unwrap().push(("b", *v)));

        bus.publish(1);

        // "b" sees 1 before anyone sees 2
        assert_eq!(
            *log.lock().unwrap(),
            vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]
        );
        assert_eq!(bus.latest(), Some(2));
    }

    #[test]
    fn test_unsubscribe_mid_broadcast() {
        let bus: SnapshotBus<i32> = SnapshotBus::new();
        let counter = Arc::new(AtomicI32::new(0));

        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let s = Arc::clone(&slot);
        let _first = bus.subscribe(move |_| {
            if let Some(sub) = s.lock().unwrap().take() {
                sub.unsubscribe();
            }
        });

        let c = Arc::clone(&counter);
        let second = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        *slot.lock().unwrap() = Some(second);

        // First callback cancels the second before it runs
        bus.publish(1);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
