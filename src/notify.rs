//! Listener plumbing between the carving core and whoever displays
//! the result.
//!
//! A plain listener list: registration and removal are by reference
//! identity, listeners are notified in registration order, and an
//! event carries no payload beyond "query the session now".  Events
//! fire only after an operation has succeeded.

use std::rc::Rc;

/// Raised by a `CarveSession` when its images change.
pub trait SessionObserver {
    /// A new image finished loading.
    fn on_image_change(&self) {}

    /// The active image finished carving.
    fn on_image_seamed(&self) {}
}

/// A list of shared listeners, dispatched to through a closure so one
/// list type serves any listener trait.
pub struct Observable<T: ?Sized> {
    observers: Vec<Rc<T>>,
}

impl<T: ?Sized> Observable<T> {
    pub fn new() -> Self {
        Observable {
            observers: Vec::new(),
        }
    }

    pub fn register(&mut self, observer: Rc<T>) {
        self.observers.push(observer);
    }

    /// Remove a listener by identity.  Unknown listeners are ignored.
    /// Removal preserves the relative order of everyone else.
    pub fn unregister(&mut self, observer: &Rc<T>) {
        if let Some(pos) = self.observers.iter().position(|o| Rc::ptr_eq(o, observer)) {
            self.observers.remove(pos);
        }
    }

    pub fn notify<F: Fn(&T)>(&self, dispatch: F) {
        for observer in &self.observers {
            dispatch(observer);
        }
    }
}

impl<T: ?Sized> Default for Observable<T> {
    fn default() -> Self {
        Observable::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Tagged {
        tag: u8,
        seen: Rc<RefCell<Vec<u8>>>,
    }

    #[test]
    fn notifies_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut list: Observable<Tagged> = Observable::new();
        for tag in [3u8, 1, 2].iter() {
            list.register(Rc::new(Tagged {
                tag: *tag,
                seen: seen.clone(),
            }));
        }
        list.notify(|t| t.seen.borrow_mut().push(t.tag));
        assert_eq!(*seen.borrow(), vec![3, 1, 2]);
    }

    #[test]
    fn unregister_is_by_identity_and_keeps_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut list: Observable<Tagged> = Observable::new();
        let first = Rc::new(Tagged {
            tag: 1,
            seen: seen.clone(),
        });
        let second = Rc::new(Tagged {
            tag: 2,
            seen: seen.clone(),
        });
        let third = Rc::new(Tagged {
            tag: 3,
            seen: seen.clone(),
        });
        list.register(first.clone());
        list.register(second.clone());
        list.register(third.clone());

        list.unregister(&second);
        list.notify(|t| t.seen.borrow_mut().push(t.tag));
        assert_eq!(*seen.borrow(), vec![1, 3]);

        // Removing it again changes nothing.
        list.unregister(&second);
        seen.borrow_mut().clear();
        list.notify(|t| t.seen.borrow_mut().push(t.tag));
        assert_eq!(*seen.borrow(), vec![1, 3]);
    }
}
