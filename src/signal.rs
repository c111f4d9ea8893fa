//! Single-threaded observer registry
//!
//! A [`Signal`] owns its listener list; [`Signal::subscribe`] hands back a
//! [`Subscription`] that removes the listener when dropped. Holders keep the
//! subscription alive for exactly as long as they want to observe, so
//! teardown order is the order in which the owners are dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Slots<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// Multicast notification source
pub struct Signal<T> {
    slots: Rc<RefCell<Slots<T>>>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Slots {
                next_id: 1,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener. It stays registered until the returned handle is
    /// dropped or [`Subscription::unsubscribe`] is called.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&T) + 'static,
        T: 'static,
    {
        let mut slots = self.slots.borrow_mut();
        let id = slots.next_id;
        slots.next_id += 1;
        let listener: Listener<T> = Rc::new(RefCell::new(listener));
        slots.listeners.push((id, listener));

        let weak: Weak<RefCell<Slots<T>>> = Rc::downgrade(&self.slots);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(slots) = weak.upgrade() {
                    slots.borrow_mut().listeners.retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    /// Notify listeners in subscription order.
    ///
    /// Listeners removed while the emission is running are skipped.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Listener<T>)> = self
            .slots
            .borrow()
            .listeners
            .iter()
            .map(|(id, l)| (*id, Rc::clone(l)))
            .collect();

        for (id, listener) in snapshot {
            let still_registered = self
                .slots
                .borrow()
                .listeners
                .iter()
                .any(|(lid, _)| *lid == id);
            if !still_registered {
                continue;
            }
            // A listener re-entering its own signal is skipped rather than
            // double-borrowed.
            if let Ok(mut f) = listener.try_borrow_mut() {
                (&mut *f)(value);
            } else {
                log::warn!("signal listener {} re-entered during emit; skipped", id);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.slots.borrow().listeners.len()
    }

    pub fn has_listeners(&self) -> bool {
        self.listener_count() > 0
    }
}

/// Lifetime-scoped listener registration
///
/// Dropping the handle removes the listener. Outliving the signal is fine:
/// the handle only holds a weak reference.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Explicitly remove the listener (same as dropping the handle)
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_listeners_in_order() {
        let signal = Signal::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let l1 = Rc::clone(&seen);
        let _a = signal.subscribe(move |v| l1.borrow_mut().push(("a", *v)));
        let l2 = Rc::clone(&seen);
        let _b = signal.subscribe(move |v| l2.borrow_mut().push(("b", *v)));

        signal.emit(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let signal = Signal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let sub = signal.subscribe(move |_| h.set(h.get() + 1));

        signal.emit(&());
        drop(sub);
        signal.emit(&());

        assert_eq!(hits.get(), 1);
        assert!(!signal.has_listeners());
    }

    #[test]
    fn test_subscription_outlives_signal() {
        let signal = Signal::<u8>::new();
        let sub = signal.subscribe(|_| {});
        drop(signal);
        sub.unsubscribe();
    }

    #[test]
    fn test_listener_removed_mid_emit_is_skipped() {
        let signal = Signal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let v = Rc::clone(&victim);
        let _killer = signal.subscribe(move |_| {
            v.borrow_mut().take();
        });
        let h = Rc::clone(&hits);
        *victim.borrow_mut() = Some(signal.subscribe(move |_| h.set(h.get() + 1)));

        signal.emit(&());
        assert_eq!(hits.get(), 0);
        assert_eq!(signal.listener_count(), 1);
    }
}
