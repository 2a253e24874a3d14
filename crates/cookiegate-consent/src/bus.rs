//! Consent change notification bus
//!
//! In-process publish/subscribe. Delivery is synchronous; listeners run
//! outside the subscriber lock so they may subscribe or unsubscribe while
//! being called. A panicking listener is logged and skipped.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use uuid::Uuid;

use cookiegate_taxonomy::{ConsentDecision, ConsentMap};

/// Name of the host-level event carrying a [`ConsentChange`]
pub const CONSENT_CHANGE_EVENT: &str = "cookieConsentChange";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentChange {
    pub consents: ConsentMap,
    pub decision: ConsentDecision,
}

impl ConsentChange {
    pub fn new(consents: ConsentMap, decision: ConsentDecision) -> Self {
        Self { consents, decision }
    }

    /// `{ "type": "cookieConsentChange", "detail": { consents, decision } }`
    pub fn to_event(&self) -> serde_json::Value {
        serde_json::json!({
            "type": CONSENT_CHANGE_EVENT,
            "detail": self,
        })
    }
}

type Listener = Arc<dyn Fn(&ConsentChange) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    listeners: RwLock<Vec<(Uuid, Listener)>>,
}

impl BusInner {
    fn remove(&self, id: Uuid) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }
}

#[derive(Clone, Default)]
pub struct ConsentBus {
    inner: Arc<BusInner>,
}

/// Handle returned by [`ConsentBus::subscribe`]. Dropping it keeps the
/// listener registered; call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: Uuid,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns false if the listener was already gone
    pub fn unsubscribe(self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => inner.remove(self.id),
            None => false,
        }
    }
}

impl ConsentBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ConsentChange) + Send + Sync + 'static,
    {
        let id = Uuid::new_v4();
        self.inner.listeners.write().push((id, Arc::new(listener)));

        tracing::debug!(subscription_id = %id, "Consent listener subscribed");

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `change` to every listener. Returns how many completed.
    pub fn publish(&self, change: &ConsentChange) -> usize {
        let listeners: Vec<(Uuid, Listener)> = self.inner.listeners.read().clone();
        let mut delivered = 0;

        for (id, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(change))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    tracing::error!(
                        subscription_id = %id,
                        panic = %message,
                        "Consent listener panicked"
                    );
                }
            }
        }

        tracing::debug!(
            decision = %change.decision,
            delivered,
            "Published consent change"
        );

        delivered
    }

    pub fn len(&self) -> usize {
        self.inner.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.listeners.read().is_empty()
    }

    /// Drop every listener
    pub fn clear(&self) {
        self.inner.listeners.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn change(decision: ConsentDecision) -> ConsentChange {
        ConsentChange::new(ConsentMap::all(decision == ConsentDecision::AcceptedAll), decision)
    }

    #[test]
    fn test_publish_reaches_all_listeners() {
        let bus = ConsentBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..3 {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |change| seen.lock().push(change.decision));
        }

        assert_eq!(bus.publish(&change(ConsentDecision::AcceptedAll)), 3);
        assert_eq!(seen.lock().len(), 3);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = ConsentBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let subscription = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish(&change(ConsentDecision::Custom));
        assert!(subscription.unsubscribe());
        bus.publish(&change(ConsentDecision::Custom));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = ConsentBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        bus.subscribe(|_| panic!("listener bug"));
        let counter = Arc::clone(&calls);
        bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(bus.publish(&change(ConsentDecision::RejectedAll)), 1);
        assert_eq!(bus.publish(&change(ConsentDecision::RejectedAll)), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn test_listener_can_unsubscribe_during_publish() {
        let bus = ConsentBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let inner_slot = Arc::clone(&slot);
        let subscription = bus.subscribe(move |_| {
            if let Some(own) = inner_slot.lock().take() {
                own.unsubscribe();
            }
        });
        *slot.lock() = Some(subscription);

        assert_eq!(bus.publish(&change(ConsentDecision::Custom)), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = ConsentBus::new();
        let subscription = bus.subscribe(|_| {});
        drop(bus);
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_event_shape() {
        let event = change(ConsentDecision::RejectedAll).to_event();
        assert_eq!(event["type"], CONSENT_CHANGE_EVENT);
        assert_eq!(event["detail"]["decision"], "rejected-all");
        assert_eq!(event["detail"]["consents"]["essential"], true);
        assert_eq!(event["detail"]["consents"]["marketing"], false);
    }
}
