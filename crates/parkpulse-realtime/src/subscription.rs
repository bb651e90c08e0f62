//! Subscriber registry — ordered fan-out of inbound messages.

use std::sync::RwLock;

use parkpulse_core::types::id::SubscriptionId;

use crate::message::types::RealtimeMessage;

/// Callback invoked for every forwarded inbound message.
pub type MessageCallback = Box<dyn Fn(&RealtimeMessage) + Send + Sync>;

/// Registry of message subscribers.
///
/// Insertion order is delivery order. The dispatcher only ever iterates the
/// set; entries are added and removed by UI code through the client facade.
#[derive(Default)]
pub struct SubscriberRegistry {
    entries: RwLock<Vec<(SubscriptionId, MessageCallback)>>,
}

impl SubscriberRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Registers a callback, returning its subscription id.
    pub fn add(&self, callback: MessageCallback) -> SubscriptionId {
        let id = SubscriptionId::new();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.push((id, callback));
        id
    }

    /// Removes a subscription. Returns whether it was present.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() < before
    }

    /// Removes every subscription. Called on teardown; once this returns,
    /// no callback fires again.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.clear();
    }

    /// Delivers a message to all current subscribers in registration order,
    /// synchronously within the caller's dispatch tick.
    pub fn dispatch(&self, message: &RealtimeMessage) {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        for (_, callback) in entries.iter() {
            callback(message);
        }
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::types::MessageKind;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn sample() -> RealtimeMessage {
        RealtimeMessage {
            kind: MessageKind::Status,
            payload: json!({"type": "status"}),
        }
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let registry = SubscriberRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            registry.add(Box::new(move |_| seen.lock().unwrap().push(tag)));
        }

        registry.dispatch(&sample());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_removed_subscriber_never_fires_again() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(Mutex::new(0u32));

        let counter = Arc::clone(&count);
        let id = registry.add(Box::new(move |_| *counter.lock().unwrap() += 1));

        registry.dispatch(&sample());
        assert!(registry.remove(id));
        registry.dispatch(&sample());

        assert_eq!(*count.lock().unwrap(), 1);
        assert!(!registry.remove(id), "double remove should be a no-op");
    }

    #[test]
    fn test_clear_silences_everyone() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(Mutex::new(0u32));
        for _ in 0..3 {
            let counter = Arc::clone(&count);
            registry.add(Box::new(move |_| *counter.lock().unwrap() += 1));
        }

        registry.clear();
        registry.dispatch(&sample());
        assert_eq!(*count.lock().unwrap(), 0);
        assert!(registry.is_empty());
    }
}
