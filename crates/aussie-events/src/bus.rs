//! Event bus for delivering events to listeners.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use serde_json::Value;
use tracing::{trace, warn};

use crate::error::EventResult;
use crate::event::Event;

type GlobalListener = Arc<dyn Fn(&Event) -> EventResult<()> + Send + Sync>;
type TypedListener = Arc<dyn Fn(&Value) -> EventResult<()> + Send + Sync>;

/// Registration handle for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    global: Vec<(ListenerId, GlobalListener)>,
    typed: HashMap<String, Vec<(ListenerId, TypedListener)>>,
}

impl Registry {
    fn allocate(&mut self) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn remove_global(&mut self, id: ListenerId) -> bool {
        let before = self.global.len();
        self.global.retain(|(lid, _)| *lid != id);
        self.global.len() != before
    }

    fn remove_typed(&mut self, event_type: &str, id: ListenerId) -> bool {
        let Some(list) = self.typed.get_mut(event_type) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.typed.remove(event_type);
        }
        removed
    }
}

/// Synchronous, in-process publish/subscribe hub.
///
/// Clones share the same listener registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<RwLock<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    /// Create a new event bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for every event.
    ///
    /// The returned [`Subscription`] removes the listener when
    /// [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Event) -> EventResult<()> + Send + Sync + 'static,
    {
        let mut registry = self.write();
        let id = registry.allocate();
        registry.global.push((id, Arc::new(listener)));
        trace!(listener_id = id.0, "Global listener registered");
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Register a listener for one event type. It receives only the payload.
    pub fn on<F>(&self, event_type: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&Value) -> EventResult<()> + Send + Sync + 'static,
    {
        let event_type = event_type.into();
        let mut registry = self.write();
        let id = registry.allocate();
        trace!(listener_id = id.0, event_type = %event_type, "Typed listener registered");
        registry
            .typed
            .entry(event_type)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener registered with [`EventBus::on`].
    ///
    /// Returns `true` if the listener was found.
    pub fn off(&self, event_type: &str, id: ListenerId) -> bool {
        self.write().remove_typed(event_type, id)
    }

    /// Deliver an event to all global listeners, then to listeners of its type.
    ///
    /// Listeners are snapshotted before delivery, so a listener may
    /// (un)register listeners from inside its callback; such changes apply
    /// from the next emission.
    ///
    /// Returns the number of listeners invoked.
    ///
    /// # Errors
    ///
    /// Returns the first listener error. Listeners after the failing one are
    /// not invoked.
    pub fn emit(&self, event_type: &str, payload: Value) -> EventResult<usize> {
        let (global, typed) = {
            let registry = self.read();
            let global: Vec<GlobalListener> = registry
                .global
                .iter()
                .map(|(_, l)| Arc::clone(l))
                .collect();
            let typed: Vec<TypedListener> = registry
                .typed
                .get(event_type)
                .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default();
            (global, typed)
        };

        trace!(
            event_type,
            global = global.len(),
            typed = typed.len(),
            "Emitting event"
        );

        let mut delivered: usize = 0;

        if !global.is_empty() {
            let event = Event::new(event_type, payload.clone());
            for listener in &global {
                listener(&event)?;
                delivered = delivered.saturating_add(1);
            }
        }

        for listener in &typed {
            listener(&payload)?;
            delivered = delivered.saturating_add(1);
        }

        Ok(delivered)
    }

    /// Emit, logging instead of propagating listener failures.
    ///
    /// For call sites inside the core that are not allowed to fail.
    pub fn emit_or_log(&self, event_type: &str, payload: Value) {
        if let Err(e) = self.emit(event_type, payload) {
            warn!(event_type, error = %e, "Event listener failed");
        }
    }

    /// Total number of registered listeners (global and typed).
    #[must_use]
    pub fn listener_count(&self) -> usize {
        let registry = self.read();
        registry
            .typed
            .values()
            .map(Vec::len)
            .fold(registry.global.len(), usize::saturating_add)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Registry> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Registry> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[must_use = "dropping a Subscription keeps the listener registered; call unsubscribe() to remove it"]
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<RwLock<Registry>>,
}

impl Subscription {
    /// The listener's registration id.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the listener. Returns `true` if it was still registered.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let mut registry = registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.remove_global(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_on_emit_off() {
        let bus = EventBus::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);

        let id = bus.on("x", move |payload| {
            sink.lock().unwrap().push(payload.clone());
            Ok(())
        });

        bus.emit("x", serde_json::json!(1)).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![serde_json::json!(1)]);

        assert!(bus.off("x", id));
        bus.emit("x", serde_json::json!(2)).unwrap();
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_typed_listener_ignores_other_types() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        bus.on("x", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(bus.emit("y", Value::Null).unwrap(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_global_before_typed_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        bus.on("x", move |_| {
            o.lock().unwrap().push("typed-1");
            Ok(())
        });
        let o = Arc::clone(&order);
        let _sub = bus.subscribe(move |event| {
            assert_eq!(event.event_type, "x");
            o.lock().unwrap().push("global-1");
            Ok(())
        });
        let o = Arc::clone(&order);
        bus.on("x", move |_| {
            o.lock().unwrap().push("typed-2");
            Ok(())
        });
        let o = Arc::clone(&order);
        let _sub2 = bus.subscribe(move |_| {
            o.lock().unwrap().push("global-2");
            Ok(())
        });

        assert_eq!(bus.emit("x", Value::Null).unwrap(), 4);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["global-1", "global-2", "typed-1", "typed-2"]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let sub = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit("a", Value::Null).unwrap();
        assert!(sub.unsubscribe());
        bus.emit("a", Value::Null).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_listener_error_propagates_and_stops_delivery() {
        let bus = EventBus::new();
        let later = Arc::new(AtomicUsize::new(0));

        bus.on("x", |_| Err(EventError::listener("x", "boom")));
        let counter = Arc::clone(&later);
        bus.on("x", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = bus.emit("x", Value::Null).unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(later.load(Ordering::SeqCst), 0);

        // The logging variant swallows the failure.
        bus.emit_or_log("x", Value::Null);
    }

    #[test]
    fn test_reentrant_off_from_listener() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let inner_bus = bus.clone();
        let inner_slot = Arc::clone(&slot);
        let counter = Arc::clone(&count);
        let id = bus.on("x", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *inner_slot.lock().unwrap() {
                inner_bus.off("x", id);
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(id);

        bus.emit("x", Value::Null).unwrap();
        bus.emit("x", Value::Null).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cloned_bus_shares_registry() {
        let bus = EventBus::new();
        let cloned = bus.clone();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        cloned.on("x", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit("x", Value::Null).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = EventBus::new();
        let sub = bus.subscribe(|_| Ok(()));
        drop(bus);
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_off_unknown_is_noop() {
        let bus = EventBus::new();
        let id = bus.on("x", |_| Ok(()));
        assert!(!bus.off("y", id));
        assert!(bus.off("x", id));
        assert!(!bus.off("x", id));
    }
}
