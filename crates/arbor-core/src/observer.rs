//! Change notification graph.
//!
//! Market data, curves and models form a dependency graph. Each node that
//! can change owns an [`Observable`]; each node that depends on others
//! implements [`Observer`] and registers with its inputs.
//!
//! Notification is synchronous and depth-first. An observer that is itself
//! observable forwards the change by calling its own
//! [`Observable::notify_observers`] from [`Observer::update`]; nothing
//! computes transitive closure on its behalf.
//!
//! Observables hold observers weakly. Dropping an observer is enough to
//! detach it; dead entries are pruned on the next notification.
//!
//! A state change (a quote taking a new value, a handle relinking, the
//! evaluation date moving) starts a logical event with
//! [`Observable::notify_change`]. Within one event, forwarded through
//! [`Observable::notify_observers`], each observer is updated at most once.
//! This makes diamond-shaped dependencies fire once and stops cyclic
//! registrations from looping. A state change made from inside `update` is
//! a new event of its own, so observers already visited by the enclosing
//! event still see it.
//!
//! ```rust
//! use std::rc::Rc;
//! use arbor_core::observer::{register_with, Flag, Notifier};
//! use arbor_core::quote::SimpleQuote;
//!
//! let quote = SimpleQuote::new(0.01);
//! let flag = Rc::new(Flag::new());
//! register_with(&flag, &quote).unwrap();
//!
//! quote.set_value(0.02);
//! assert!(flag.is_up());
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

use log::trace;

use crate::error::{ArborError, ArborResult};

/// A node that reacts to changes in the observables it registered with.
pub trait Observer {
    /// Called synchronously when an observed node changes.
    fn update(&self);
}

/// A node that owns an [`Observable`] and so can be observed.
pub trait Notifier {
    /// Returns the observer list of this node.
    fn observable(&self) -> &Observable;

    /// Notifies every registered observer.
    fn notify_observers(&self) {
        self.observable().notify_observers();
    }
}

thread_local! {
    static EVENTS: RefCell<Vec<HashSet<*const ()>>> = const { RefCell::new(Vec::new()) };
}

/// One logical event on this thread: the observers it has visited so far.
///
/// Events nest. The innermost one is on top of the stack and is popped on
/// drop, including when an observer panics.
struct EventScope {
    opened: bool,
}

impl EventScope {
    /// Starts a new event, nested inside any event already running.
    fn open() -> Self {
        EVENTS.with(|events| events.borrow_mut().push(HashSet::new()));
        EventScope { opened: true }
    }

    /// Joins the running event, or starts one if none is running.
    fn join() -> Self {
        let opened = EVENTS.with(|events| {
            let mut events = events.borrow_mut();
            if events.is_empty() {
                events.push(HashSet::new());
                true
            } else {
                false
            }
        });
        EventScope { opened }
    }

    /// Marks an observer as notified; returns false if it already was.
    fn first_visit(key: *const ()) -> bool {
        EVENTS.with(|events| {
            events
                .borrow_mut()
                .last_mut()
                .map_or(true, |visited| visited.insert(key))
        })
    }
}

impl Drop for EventScope {
    fn drop(&mut self) {
        if self.opened {
            EVENTS.with(|events| events.borrow_mut().pop());
        }
    }
}

/// The set of observers registered with a node.
///
/// Observers are kept in registration order and held by [`Weak`] reference.
#[derive(Default)]
pub struct Observable {
    observers: RefCell<Vec<Weak<dyn Observer>>>,
}

impl Observable {
    /// Creates an observable with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer. Registering the same observer twice is a no-op.
    pub fn register(&self, observer: Weak<dyn Observer>) {
        let mut observers = self.observers.borrow_mut();
        if !observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    /// Removes an observer. Returns true if it was registered.
    pub fn unregister(&self, observer: &Weak<dyn Observer>) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|o| !Weak::ptr_eq(o, observer));
        observers.len() != before
    }

    /// Returns the number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    /// Notifies every live observer, in registration order, as part of the
    /// event already running.
    ///
    /// Use this to forward a change from inside [`Observer::update`]. The
    /// observer list is snapshotted first, so observers may register or
    /// unregister from inside `update`.
    pub fn notify_observers(&self) {
        self.notify(EventScope::join);
    }

    /// Notifies every live observer of a change to this node's own state.
    ///
    /// Always starts a new event, even when called from inside another
    /// observer's `update`.
    pub fn notify_change(&self) {
        self.notify(EventScope::open);
    }

    fn notify(&self, scope: fn() -> EventScope) {
        let snapshot: Vec<Rc<dyn Observer>> = {
            let mut observers = self.observers.borrow_mut();
            observers.retain(|o| o.strong_count() > 0);
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        if snapshot.is_empty() {
            return;
        }

        let _scope = scope();
        for observer in snapshot {
            let key = Rc::as_ptr(&observer).cast::<()>();
            if EventScope::first_visit(key) {
                observer.update();
            } else {
                trace!("observer {key:p} already notified in this event, skipping");
            }
        }
    }
}

impl std::fmt::Debug for Observable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl Notifier for Observable {
    fn observable(&self) -> &Observable {
        self
    }
}

/// Registers `observer` with `notifier`.
///
/// # Errors
///
/// Returns `ArborError::SelfRegistration` if the notifier's observable is
/// part of the observer itself. Observables reached through a field of the
/// observer that lives in its own allocation, such as a [`Handle`], are
/// accepted.
///
/// [`Handle`]: crate::handle::Handle
pub fn register_with<O, N>(observer: &Rc<O>, notifier: &N) -> ArborResult<()>
where
    O: Observer + 'static,
    N: Notifier + ?Sized,
{
    if owns_observable(observer, notifier.observable()) {
        return Err(ArborError::SelfRegistration);
    }

    let weak: Weak<O> = Rc::downgrade(observer);
    let weak: Weak<dyn Observer> = weak;
    notifier.observable().register(weak);
    Ok(())
}

/// Returns true if `observable` lies inside the allocation of `observer`.
fn owns_observable<O>(observer: &Rc<O>, observable: &Observable) -> bool {
    let start = Rc::as_ptr(observer).cast::<u8>();
    let end = start.wrapping_add(std::mem::size_of_val(&**observer));
    let target = (observable as *const Observable).cast::<u8>();
    start <= target && target < end
}

/// Unregisters `observer` from `notifier`. Returns true if it was registered.
pub fn unregister_with<O, N>(observer: &Rc<O>, notifier: &N) -> bool
where
    O: Observer + 'static,
    N: Notifier + ?Sized,
{
    let weak: Weak<O> = Rc::downgrade(observer);
    let weak: Weak<dyn Observer> = weak;
    notifier.observable().unregister(&weak)
}

/// An observer that records that something changed.
///
/// Raised by every notification; lowered only explicitly. Also counts how
/// many notifications it received.
#[derive(Debug, Default)]
pub struct Flag {
    up: Cell<bool>,
    raised: Cell<usize>,
}

impl Flag {
    /// Creates a lowered flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn raise(&self) {
        self.up.set(true);
        self.raised.set(self.raised.get() + 1);
    }

    /// Lowers the flag.
    pub fn lower(&self) {
        self.up.set(false);
    }

    /// Returns true if the flag is raised.
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.up.get()
    }

    /// Returns the number of notifications received so far.
    #[must_use]
    pub fn times_raised(&self) -> usize {
        self.raised.get()
    }
}

impl Observer for Flag {
    fn update(&self) {
        self.raise();
    }
}
