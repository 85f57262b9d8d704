//! Notifications raised toward external collaborators (conflict reporting,
//! statistics, UI). The engine never depends on them being observed.

use std::cell::RefCell;
use std::rc::Rc;

use crate::wrapper::types::{PackageInfo, WrapperType};

#[derive(Clone, Debug, PartialEq)]
pub enum WrapperEvent {
    /// The engine accepts registrations from now on.
    Ready { version: String },
    Registered {
        package: String,
        target: String,
        kind: WrapperType,
    },
    Unregistered { package: String, target: String },
    UnregisteredAll { package: String },
    /// An OVERRIDE was replaced by one with strictly higher priority.
    OverrideLost {
        existing: PackageInfo,
        replacement: PackageInfo,
        wrapper: String,
        target: String,
    },
    /// A chain entry did not forward and other packages' entries were skipped.
    ConflictDetected {
        package: PackageInfo,
        other: PackageInfo,
        wrapper: String,
        target: String,
        is_error: bool,
    },
    /// A WRAPPER registration that did not forward was removed.
    AutoRemoved {
        package: PackageInfo,
        wrapper: String,
        target: String,
    },
}

pub trait EventListener {
    fn on_event(&self, event: &WrapperEvent);
}

impl<F> EventListener for F
where
    F: Fn(&WrapperEvent),
{
    fn on_event(&self, event: &WrapperEvent) {
        self(event)
    }
}

/// Fan-out of events to every listener, in subscription order.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Rc<RefCell<Vec<Rc<dyn EventListener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn subscribe(&self, listener: Rc<dyn EventListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    pub fn emit(&self, event: WrapperEvent) {
        // Listeners may subscribe while being notified.
        let listeners: Vec<Rc<dyn EventListener>> = self.listeners.borrow().clone();
        for listener in listeners {
            listener.on_event(&event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_all_listeners() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..2 {
            let seen = seen.clone();
            bus.subscribe(Rc::new(move |e: &WrapperEvent| seen.borrow_mut().push(e.clone())));
        }
        bus.emit(WrapperEvent::UnregisteredAll {
            package: "foo".to_string(),
        });
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(bus.len(), 2);
    }
}
