//! Change notifications
//!
//! [`crate::TreeStatus`] publishes a [`StatusEvent`] whenever the effective
//! checked or copy-or-link state of a position changes.

use crate::link_status::CopyOrLink;
use dcp_model::RefId;
use std::fmt;

/// What changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Checked state changed
    Checked {
        /// Value before the change
        old: bool,
        /// Value after the change
        new: bool,
    },

    /// Copy-or-link value changed
    CopyOrLink {
        /// Value before the change
        old: CopyOrLink,
        /// Value after the change
        new: CopyOrLink,
    },
}

/// Notification about one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEvent {
    /// Affected position
    pub reference: RefId,
    /// The change
    pub change: StatusChange,
}

/// Handle returned by [`crate::TreeStatus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Listener callback
pub type Listener = Box<dyn FnMut(&StatusEvent) + Send>;

/// Ordered set of listeners
#[derive(Default)]
pub(crate) struct EventBus {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn publish(&mut self, event: &StatusEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcp_model::{DomainModel, ObjectKind, PackagePath, ProductStructure};
    use std::sync::{Arc, Mutex};

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let seen = Arc::new(Mutex::new(0));
        let mut bus = EventBus::default();

        let counter = Arc::clone(&seen);
        let id = bus.subscribe(Box::new(move |_| *counter.lock().unwrap() += 1));

        let mut model = DomainModel::new();
        let root = model
            .add_object(ObjectKind::ProductCmpt, PackagePath::default_package(), "Root", "src")
            .unwrap();
        let structure = ProductStructure::expand(Arc::new(model), root).unwrap();

        let event = StatusEvent {
            reference: structure.root(),
            change: StatusChange::Checked { old: true, new: false },
        };
        bus.publish(&event);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&event);

        assert_eq!(*seen.lock().unwrap(), 1);
        assert!(bus.is_empty());
    }
}
