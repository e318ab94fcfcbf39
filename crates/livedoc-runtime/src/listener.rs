//! Multi-subscriber notification primitive used by the runtime loader.
//!
//! Broadcast iterates over a snapshot taken under the lock and invokes
//! callbacks outside it, so a listener may remove itself (or any other
//! listener) from inside its own callback without affecting delivery of the
//! current batch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned by [`ListenerRegistry::add`]; pass back to `remove`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Generic listener registry. `T` is the broadcast payload.
pub struct ListenerRegistry<T> {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Callback<T>)>>,
}

impl<T> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn add(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap()
            .push((id, Arc::new(callback)));
        id
    }

    pub fn remove(&self, id: ListenerId) {
        self.listeners.lock().unwrap().retain(|(lid, _)| *lid != id);
    }

    /// Deliver `value` to every listener registered at the time of the call.
    pub fn notify(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in snapshot {
            cb(value);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_all_listeners() {
        let registry = ListenerRegistry::<u32>::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for _ in 0..3 {
            let seen = seen.clone();
            registry.add(move |v: &u32| seen.lock().unwrap().push(*v));
        }
        registry.notify(&7);
        assert_eq!(&*seen.lock().unwrap(), &[7, 7, 7]);
    }

    #[test]
    fn removed_listener_no_longer_fires() {
        let registry = ListenerRegistry::<u32>::new();
        let seen = Arc::new(Mutex::new(0u32));
        let id = {
            let seen = seen.clone();
            registry.add(move |_: &u32| *seen.lock().unwrap() += 1)
        };
        registry.notify(&1);
        registry.remove(id);
        registry.notify(&2);
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn listener_can_unsubscribe_itself_mid_broadcast() {
        let registry = Arc::new(ListenerRegistry::<u32>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let id_slot = Arc::new(Mutex::new(None::<ListenerId>));
        let id = {
            let registry_in = registry.clone();
            let seen = seen.clone();
            let id_slot = id_slot.clone();
            registry.add(move |v: &u32| {
                seen.lock().unwrap().push(*v);
                if let Some(id) = *id_slot.lock().unwrap() {
                    registry_in.remove(id);
                }
            })
        };
        *id_slot.lock().unwrap() = Some(id);
        let seen2 = seen.clone();
        registry.add(move |v: &u32| seen2.lock().unwrap().push(*v + 100));

        // Self-removal must not disturb delivery of the current batch.
        registry.notify(&1);
        assert_eq!(&*seen.lock().unwrap(), &[1, 101]);
        assert_eq!(registry.len(), 1);

        registry.notify(&2);
        assert_eq!(&*seen.lock().unwrap(), &[1, 101, 102]);
    }
}
