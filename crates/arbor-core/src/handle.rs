//! Shared, relinkable references to observable objects.
//!
//! A [`Handle`] points at a shared cell that can hold a target or nothing.
//! Every copy of the handle sees the same cell, so relinking it through a
//! [`RelinkableHandle`] retargets every consumer at once.
//!
//! The cell observes its current target and forwards the target's
//! notifications. Consumers register with the handle and never need to
//! re-register after a relink. Relinking, including relinking to nothing, is
//! itself a change notification.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use log::debug;

use crate::error::{ArborError, ArborResult};
use crate::observer::{Notifier, Observable, Observer};

/// The shared indirection cell behind a handle.
struct Link<T: ?Sized> {
    target: RefCell<Option<Rc<T>>>,
    observable: Observable,
    this: Weak<Link<T>>,
}

impl<T: ?Sized + Notifier + 'static> Link<T> {
    fn new(target: Option<Rc<T>>) -> Rc<Self> {
        let link = Rc::new_cyclic(|this| Link {
            target: RefCell::new(None),
            observable: Observable::new(),
            this: this.clone(),
        });
        link.attach(target);
        link
    }

    fn as_observer(&self) -> Weak<dyn Observer> {
        self.this.clone()
    }

    /// Swaps the target without notifying. Returns false if unchanged.
    fn attach(&self, target: Option<Rc<T>>) -> bool {
        let unchanged = match (&*self.target.borrow(), &target) {
            (Some(current), Some(new)) => Rc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return false;
        }

        let previous = self.target.replace(target);
        if let Some(previous) = previous {
            previous.observable().unregister(&self.as_observer());
        }
        if let Some(current) = &*self.target.borrow() {
            current.observable().register(self.as_observer());
        }
        true
    }

    fn link_to(&self, target: Option<Rc<T>>) {
        if self.attach(target) {
            debug!("handle relinked (empty: {})", self.target.borrow().is_none());
            self.observable.notify_change();
        }
    }
}

impl<T: ?Sized> Observer for Link<T> {
    fn update(&self) {
        self.observable.notify_observers();
    }
}

/// A shared reference to a possibly absent observable object.
///
/// Cloning a handle shares the underlying cell.
pub struct Handle<T: ?Sized> {
    link: Rc<Link<T>>,
}

impl<T: ?Sized + Notifier + 'static> Handle<T> {
    /// Creates a handle pointing at `target`.
    #[must_use]
    pub fn new(target: Rc<T>) -> Self {
        Self {
            link: Link::new(Some(target)),
        }
    }

    /// Creates a handle pointing at nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            link: Link::new(None),
        }
    }

    /// Returns the current target, if any.
    #[must_use]
    pub fn current(&self) -> Option<Rc<T>> {
        self.link.target.borrow().clone()
    }

    /// Returns the current target.
    ///
    /// # Errors
    ///
    /// Returns `ArborError::EmptyHandle` if the handle is empty.
    pub fn get(&self) -> ArborResult<Rc<T>> {
        self.current().ok_or(ArborError::empty_handle("object"))
    }

    /// Returns true if the handle points at nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.link.target.borrow().is_none()
    }

    /// Returns true if both handles share the same cell.
    #[must_use]
    pub fn same_link(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.link, &other.link)
    }
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            link: Rc::clone(&self.link),
        }
    }
}

impl<T: ?Sized> Notifier for Handle<T> {
    fn observable(&self) -> &Observable {
        &self.link.observable
    }
}

impl<T: ?Sized + Notifier + 'static> Default for Handle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("linked", &self.link.target.borrow().is_some())
            .finish()
    }
}

/// A handle whose target can be replaced.
///
/// Hand out [`RelinkableHandle::handle`] to consumers and keep the
/// relinkable side to retarget them all.
pub struct RelinkableHandle<T: ?Sized> {
    handle: Handle<T>,
}

impl<T: ?Sized + Notifier + 'static> RelinkableHandle<T> {
    /// Creates a relinkable handle pointing at `target`.
    #[must_use]
    pub fn new(target: Rc<T>) -> Self {
        Self {
            handle: Handle::new(target),
        }
    }

    /// Creates a relinkable handle pointing at nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handle: Handle::empty(),
        }
    }

    /// Points every copy of this handle at `target` and notifies observers.
    ///
    /// Relinking to the current target does nothing.
    pub fn link_to(&self, target: Option<Rc<T>>) {
        self.handle.link.link_to(target);
    }

    /// Returns a read-only handle sharing this cell.
    #[must_use]
    pub fn handle(&self) -> Handle<T> {
        self.handle.clone()
    }
}

impl<T: ?Sized + Notifier + 'static> Default for RelinkableHandle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> Deref for RelinkableHandle<T> {
    type Target = Handle<T>;

    fn deref(&self) -> &Handle<T> {
        &self.handle
    }
}

impl<T: ?Sized> Notifier for RelinkableHandle<T> {
    fn observable(&self) -> &Observable {
        self.handle.observable()
    }
}

impl<T: ?Sized> fmt::Debug for RelinkableHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RelinkableHandle").field(&self.handle).finish()
    }
}
