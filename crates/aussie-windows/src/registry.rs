//! The window registry.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use aussie_events::{EventBus, topics};
use serde_json::Value;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{WindowError, WindowResult};
use crate::layout::WindowLayout;
use crate::window::{Bounds, OsWindow};

type Listener = Arc<dyn Fn(&[OsWindow]) + Send + Sync>;

struct Entry {
    window: OsWindow,
    /// Geometry to return to when un-maximising.
    restore: Option<Bounds>,
}

struct State {
    layout: WindowLayout,
    entries: Vec<Entry>,
    next_z: u64,
    cascade: u32,
}

impl State {
    fn bump_z(&mut self) -> u64 {
        let z = self.next_z;
        self.next_z = self.next_z.saturating_add(1);
        z
    }

    fn entry_mut(&mut self, id: &str) -> WindowResult<&mut Entry> {
        self.entries
            .iter_mut()
            .find(|e| e.window.id == id)
            .ok_or_else(|| WindowError::NotFound(id.to_string()))
    }

    fn next_cascade(&mut self) -> Bounds {
        let bounds = self.layout.cascade(self.cascade).or_else(|| {
            self.cascade = 0;
            self.layout.cascade(0)
        });
        self.cascade = self.cascade.saturating_add(1);
        // Zero-step fallback when even the first slot does not fit.
        bounds.unwrap_or_else(|| {
            let area = self.layout.usable_area();
            self.layout.clamp(Bounds::new(
                area.x,
                area.y,
                self.layout.default_width,
                self.layout.default_height,
            ))
        })
    }

    fn sorted(&self) -> Vec<OsWindow> {
        let mut windows: Vec<OsWindow> = self.entries.iter().map(|e| e.window.clone()).collect();
        windows.sort_by_key(|w| w.z_index);
        windows
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    list: Vec<(u64, Listener)>,
}

struct Inner {
    state: Mutex<State>,
    listeners: Arc<Mutex<Listeners>>,
    bus: EventBus,
}

/// Registry of open windows.
///
/// Cheap to clone; clones share state. Each call runs to completion under
/// one lock; listeners are notified after the lock is released, so they
/// may call back into the registry.
#[derive(Clone)]
pub struct WindowRegistry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for WindowRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowRegistry")
            .field("windows", &self.state().entries.len())
            .finish_non_exhaustive()
    }
}

impl WindowRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(layout: WindowLayout, bus: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    layout,
                    entries: Vec::new(),
                    next_z: 1,
                    cascade: 0,
                }),
                listeners: Arc::new(Mutex::new(Listeners::default())),
                bus,
            }),
        }
    }

    /// Open a window for `app_id`, or bring its existing window forward.
    ///
    /// An existing window is restored if minimised and gets a fresh
    /// `z_index`; its title and props are left unchanged.
    pub fn open_window(&self, app_id: &str, title: &str, props: Option<Value>) -> OsWindow {
        let (window, created) = {
            let mut state = self.state();
            let z = state.bump_z();

            if let Some(entry) = state.entries.iter_mut().find(|e| e.window.app_id == app_id) {
                entry.window.is_minimized = false;
                entry.window.z_index = z;
                (entry.window.clone(), false)
            } else {
                let bounds = state.next_cascade();
                let window = OsWindow {
                    id: Uuid::new_v4().to_string(),
                    app_id: app_id.to_string(),
                    title: title.to_string(),
                    x: bounds.x,
                    y: bounds.y,
                    width: bounds.width,
                    height: bounds.height,
                    is_minimized: false,
                    is_maximized: false,
                    z_index: z,
                    props: props.unwrap_or(Value::Null),
                };
                state.entries.push(Entry {
                    window: window.clone(),
                    restore: None,
                });
                (window, true)
            }
        };

        if created {
            debug!(window_id = %window.id, app_id, "Window opened");
            self.inner.bus.emit_or_log(
                topics::WINDOW_OPENED,
                serde_json::json!({ "id": window.id, "appId": window.app_id }),
            );
        } else {
            trace!(window_id = %window.id, app_id, "Focused existing window");
        }
        self.notify();
        window
    }

    /// Close a window.
    ///
    /// # Errors
    ///
    /// [`WindowError::NotFound`] for an unknown id.
    pub fn close_window(&self, id: &str) -> WindowResult<()> {
        let removed = {
            let mut state = self.state();
            let index = state
                .entries
                .iter()
                .position(|e| e.window.id == id)
                .ok_or_else(|| WindowError::NotFound(id.to_string()))?;
            state.entries.remove(index).window
        };

        debug!(window_id = %id, app_id = %removed.app_id, "Window closed");
        self.inner.bus.emit_or_log(
            topics::WINDOW_CLOSED,
            serde_json::json!({ "id": removed.id, "appId": removed.app_id }),
        );
        self.notify();
        Ok(())
    }

    /// Bring a window to the front.
    ///
    /// # Errors
    ///
    /// [`WindowError::NotFound`] for an unknown id.
    pub fn focus_window(&self, id: &str) -> WindowResult<()> {
        self.update(id, |z, entry, _| {
            entry.window.z_index = z;
            Ok(())
        })
    }

    /// Move a window, clamping it into the viewport.
    ///
    /// Moving a maximised window un-maximises it.
    ///
    /// # Errors
    ///
    /// [`WindowError::NotFound`] or [`WindowError::InvalidGeometry`].
    pub fn move_window(&self, id: &str, x: f64, y: f64) -> WindowResult<()> {
        check_finite(&[x, y])?;
        self.update(id, |_, entry, layout| {
            let mut bounds = entry.window.bounds();
            bounds.x = x;
            bounds.y = y;
            entry.window.set_bounds(layout.clamp(bounds));
            entry.window.is_maximized = false;
            entry.restore = None;
            Ok(())
        })
    }

    /// Resize a window, enforcing the minimum size and re-clamping.
    ///
    /// # Errors
    ///
    /// [`WindowError::NotFound`] or [`WindowError::InvalidGeometry`].
    pub fn resize_window(&self, id: &str, width: f64, height: f64) -> WindowResult<()> {
        check_finite(&[width, height])?;
        self.update(id, |_, entry, layout| {
            let mut bounds = entry.window.bounds();
            bounds.width = width;
            bounds.height = height;
            entry.window.set_bounds(layout.clamp(bounds));
            entry.window.is_maximized = false;
            entry.restore = None;
            Ok(())
        })
    }

    /// Set or clear the minimised flag.
    ///
    /// # Errors
    ///
    /// [`WindowError::NotFound`] for an unknown id.
    pub fn minimize_window(&self, id: &str, minimized: bool) -> WindowResult<()> {
        self.update(id, |_, entry, _| {
            entry.window.is_minimized = minimized;
            Ok(())
        })
    }

    /// Toggle maximised state, remembering the previous geometry.
    ///
    /// # Errors
    ///
    /// [`WindowError::NotFound`] for an unknown id.
    pub fn maximize_window(&self, id: &str) -> WindowResult<()> {
        self.update(id, |_, entry, layout| {
            if entry.window.is_maximized {
                let restore = entry.restore.take().unwrap_or_else(|| entry.window.bounds());
                entry.window.set_bounds(layout.clamp(restore));
                entry.window.is_maximized = false;
            } else {
                entry.restore = Some(entry.window.bounds());
                entry.window.set_bounds(layout.usable_area());
                entry.window.is_maximized = true;
            }
            Ok(())
        })
    }

    /// Flip the minimised flag and bring the window to the front.
    ///
    /// # Errors
    ///
    /// [`WindowError::NotFound`] for an unknown id.
    pub fn toggle_minimize(&self, id: &str) -> WindowResult<()> {
        self.update(id, |z, entry, _| {
            entry.window.is_minimized = !entry.window.is_minimized;
            entry.window.z_index = z;
            Ok(())
        })
    }

    /// Minimise every window.
    pub fn minimize_all(&self) {
        {
            let mut state = self.state();
            for entry in &mut state.entries {
                entry.window.is_minimized = true;
            }
        }
        self.notify();
    }

    /// A copy of one window.
    #[must_use]
    pub fn get_window(&self, id: &str) -> Option<OsWindow> {
        self.state()
            .entries
            .iter()
            .find(|e| e.window.id == id)
            .map(|e| e.window.clone())
    }

    /// All windows, back to front.
    #[must_use]
    pub fn list_windows(&self) -> Vec<OsWindow> {
        self.state().sorted()
    }

    /// The front-most window that is not minimised.
    #[must_use]
    pub fn focused_window(&self) -> Option<OsWindow> {
        self.state()
            .entries
            .iter()
            .filter(|e| !e.window.is_minimized)
            .max_by_key(|e| e.window.z_index)
            .map(|e| e.window.clone())
    }

    /// Change the viewport and re-clamp every window.
    ///
    /// # Errors
    ///
    /// [`WindowError::InvalidGeometry`] for non-finite or non-positive sizes.
    pub fn set_viewport(&self, width: f64, height: f64) -> WindowResult<()> {
        check_finite(&[width, height])?;
        if width <= 0.0 || height <= 0.0 {
            return Err(WindowError::InvalidGeometry(format!(
                "viewport {width}x{height}"
            )));
        }
        {
            let mut state = self.state();
            state.layout.viewport_width = width;
            state.layout.viewport_height = height;
            let layout = state.layout.clone();
            for entry in &mut state.entries {
                let bounds = if entry.window.is_maximized {
                    layout.usable_area()
                } else {
                    layout.clamp(entry.window.bounds())
                };
                entry.window.set_bounds(bounds);
            }
        }
        debug!(width, height, "Viewport changed");
        self.notify();
        Ok(())
    }

    /// Register a listener for the full window list.
    ///
    /// The listener is called immediately with the current list, then after
    /// every mutation.
    pub fn subscribe<F>(&self, listener: F) -> WindowSubscription
    where
        F: Fn(&[OsWindow]) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let id = {
            let mut listeners = lock(&self.inner.listeners);
            let id = listeners.next_id;
            listeners.next_id = listeners.next_id.wrapping_add(1);
            listeners.list.push((id, Arc::clone(&listener)));
            id
        };

        listener(&self.list_windows());

        WindowSubscription {
            id,
            listeners: Arc::downgrade(&self.inner.listeners),
        }
    }

    /// Run `op` on one window with a fresh z value and the current layout.
    ///
    /// The z value is only consumed if `op` stores it.
    fn update<F>(&self, id: &str, op: F) -> WindowResult<()>
    where
        F: FnOnce(u64, &mut Entry, &WindowLayout) -> WindowResult<()>,
    {
        {
            let mut state = self.state();
            let z = state.next_z;
            let layout = state.layout.clone();
            let entry = state.entry_mut(id)?;
            op(z, entry, &layout)?;
            if entry.window.z_index == z {
                state.next_z = state.next_z.saturating_add(1);
            }
        }
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = lock(&self.inner.listeners)
            .list
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        if listeners.is_empty() {
            return;
        }
        let windows = self.list_windows();
        for listener in &listeners {
            listener(&windows);
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.inner.state)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_finite(values: &[f64]) -> WindowResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(WindowError::InvalidGeometry(format!("{values:?}")))
    }
}

/// Handle returned by [`WindowRegistry::subscribe`].
#[must_use = "dropping a WindowSubscription keeps the listener registered; call unsubscribe() to remove it"]
#[derive(Debug)]
pub struct WindowSubscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl WindowSubscription {
    /// Remove the listener. Returns `true` if it was still registered.
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut listeners = lock(&listeners);
        let before = listeners.list.len();
        listeners.list.retain(|(id, _)| *id != self.id);
        listeners.list.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> WindowRegistry {
        WindowRegistry::new(WindowLayout::default(), EventBus::new())
    }

    fn max_z(registry: &WindowRegistry) -> u64 {
        registry
            .list_windows()
            .iter()
            .map(|w| w.z_index)
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn test_single_instance_per_app() {
        let reg = registry();
        let first = reg.open_window("chat", "Chat", None);
        reg.open_window("files", "Files", None);
        let again = reg.open_window("chat", "Chat", None);

        assert_eq!(reg.list_windows().len(), 2);
        assert_eq!(again.id, first.id);
        assert_eq!(again.z_index, max_z(&reg));
        assert!(again.z_index > first.z_index);
    }

    #[test]
    fn test_reopen_restores_minimized() {
        let reg = registry();
        let w = reg.open_window("chat", "Chat", None);
        reg.minimize_window(&w.id, true).unwrap();
        assert!(reg.get_window(&w.id).unwrap().is_minimized);

        let again = reg.open_window("chat", "Chat", None);
        assert!(!again.is_minimized);
    }

    #[test]
    fn test_cascade_offsets_successive_windows() {
        let reg = registry();
        let a = reg.open_window("a", "A", None);
        let b = reg.open_window("b", "B", None);
        assert_eq!(b.x - a.x, 32.0);
        assert_eq!(b.y - a.y, 32.0);

        let area = WindowLayout::default().usable_area();
        for i in 0..20 {
            let w = reg.open_window(&format!("app-{i}"), "App", None);
            assert!(area.contains(&w.bounds()), "window {i} escaped viewport");
        }
    }

    #[test]
    fn test_focus_bumps_z_index() {
        let reg = registry();
        let a = reg.open_window("a", "A", None);
        reg.open_window("b", "B", None);
        reg.focus_window(&a.id).unwrap();

        assert_eq!(reg.get_window(&a.id).unwrap().z_index, max_z(&reg));
        assert_eq!(reg.focused_window().unwrap().id, a.id);
        assert_eq!(reg.list_windows().last().unwrap().id, a.id);
    }

    #[test]
    fn test_z_index_never_reused() {
        let reg = registry();
        let a = reg.open_window("a", "A", None);
        reg.move_window(&a.id, 50.0, 50.0).unwrap();
        reg.close_window(&a.id).unwrap();
        let b = reg.open_window("b", "B", None);
        assert!(b.z_index > a.z_index);
    }

    #[test]
    fn test_move_and_resize_clamp() {
        let reg = registry();
        let w = reg.open_window("a", "A", None);

        reg.move_window(&w.id, -100.0, 10_000.0).unwrap();
        let moved = reg.get_window(&w.id).unwrap();
        assert_eq!(moved.x, 8.0);
        assert_eq!(moved.y + moved.height, 744.0);

        reg.resize_window(&w.id, 1.0, 1.0).unwrap();
        let resized = reg.get_window(&w.id).unwrap();
        assert_eq!((resized.width, resized.height), (320.0, 240.0));
    }

    #[test]
    fn test_maximize_toggles_and_restores() {
        let reg = registry();
        let w = reg.open_window("a", "A", None);
        let original = w.bounds();

        reg.maximize_window(&w.id).unwrap();
        let max = reg.get_window(&w.id).unwrap();
        assert!(max.is_maximized);
        assert_eq!(max.bounds(), WindowLayout::default().usable_area());

        reg.maximize_window(&w.id).unwrap();
        let restored = reg.get_window(&w.id).unwrap();
        assert!(!restored.is_maximized);
        assert_eq!(restored.bounds(), original);
    }

    #[test]
    fn test_toggle_minimize_refocuses() {
        let reg = registry();
        let a = reg.open_window("a", "A", None);
        reg.open_window("b", "B", None);

        reg.toggle_minimize(&a.id).unwrap();
        assert!(reg.get_window(&a.id).unwrap().is_minimized);
        assert_ne!(reg.focused_window().unwrap().id, a.id);

        reg.toggle_minimize(&a.id).unwrap();
        let a_now = reg.get_window(&a.id).unwrap();
        assert!(!a_now.is_minimized);
        assert_eq!(reg.focused_window().unwrap().id, a.id);
    }

    #[test]
    fn test_minimize_all() {
        let reg = registry();
        reg.open_window("a", "A", None);
        reg.open_window("b", "B", None);
        reg.minimize_all();
        assert!(reg.list_windows().iter().all(|w| w.is_minimized));
        assert!(reg.focused_window().is_none());
    }

    #[test]
    fn test_unknown_id() {
        let reg = registry();
        for result in [
            reg.close_window("ghost"),
            reg.focus_window("ghost"),
            reg.move_window("ghost", 0.0, 0.0),
            reg.maximize_window("ghost"),
            reg.toggle_minimize("ghost"),
        ] {
            assert_eq!(result, Err(WindowError::NotFound("ghost".into())));
        }
    }

    #[test]
    fn test_non_finite_geometry_rejected() {
        let reg = registry();
        let w = reg.open_window("a", "A", None);
        let err = reg.move_window(&w.id, f64::NAN, 0.0).unwrap_err();
        assert_eq!(err.kind(), aussie_core::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_set_viewport_reclamps() {
        let reg = registry();
        let w = reg.open_window("a", "A", None);
        reg.move_window(&w.id, 500.0, 200.0).unwrap();

        reg.set_viewport(800.0, 600.0).unwrap();
        let area = WindowLayout {
            viewport_width: 800.0,
            viewport_height: 600.0,
            ..WindowLayout::default()
        }
        .usable_area();
        assert!(area.contains(&reg.get_window(&w.id).unwrap().bounds()));
        assert!(reg.set_viewport(0.0, 600.0).is_err());
    }

    #[test]
    fn test_subscribe_delivers_immediately_and_on_change() {
        let reg = registry();
        reg.open_window("a", "A", None);

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let sub = reg.subscribe(move |windows| sink.lock().unwrap().push(windows.len()));
        assert_eq!(*calls.lock().unwrap(), vec![1]);

        let b = reg.open_window("b", "B", None);
        reg.close_window(&b.id).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![1, 2, 1]);

        assert!(sub.unsubscribe());
        reg.open_window("c", "C", None);
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_listener_may_reenter_registry() {
        let reg = registry();
        let seen = Arc::new(AtomicUsize::new(0));
        let inner = reg.clone();
        let counter = Arc::clone(&seen);
        let _sub = reg.subscribe(move |_| {
            counter.store(inner.list_windows().len(), Ordering::SeqCst);
        });
        reg.open_window("a", "A", None);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lifecycle_events() {
        let bus = EventBus::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let _sub = bus.subscribe(move |event| {
            sink.lock().unwrap().push(event.event_type.clone());
            Ok(())
        });

        let reg = WindowRegistry::new(WindowLayout::default(), bus);
        let w = reg.open_window("a", "A", None);
        reg.open_window("a", "A", None);
        reg.close_window(&w.id).unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec![topics::WINDOW_OPENED, topics::WINDOW_CLOSED]
        );
    }
}
