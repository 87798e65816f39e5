//! Event hub implementation.
//!
//! Provides [`EventHub`], a synchronous in-process hub with per-event
//! listener lists, `once` listeners, optional history and a broadcast tap
//! for async observers.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use tokio::sync::broadcast;

use super::{Emission, Hub, HubConfig, Listener, Scope, SubscriptionId};
use crate::error::HubError;

/// A listener attached to one event name
#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    listener: Listener,
    scope: Scope,
    once: bool,
}

/// Emission with timestamp for history
#[derive(Debug, Clone)]
struct TimestampedEmission {
    emission: Emission,
    timestamp: Instant,
}

/// In-process event hub
///
/// Listeners run on the emitting thread, in the order they were added.
/// The listener list is snapshotted before dispatch, so listeners may
/// subscribe, unsubscribe or emit while being invoked. Listeners whose weak
/// scope has been dropped are skipped and pruned.
pub struct EventHub {
    /// Listeners keyed by event name
    listeners: RwLock<HashMap<String, Vec<Subscriber>>>,
    /// Broadcast channel sender for async observers
    sender: broadcast::Sender<Emission>,
    /// Emission history (optional)
    history: RwLock<VecDeque<TimestampedEmission>>,
    /// Configuration
    config: HubConfig,
}

impl EventHub {
    /// Create a new hub with default configuration
    pub fn new() -> Self {
        Self::with_config(HubConfig::default())
    }

    /// Create a new hub with custom configuration
    pub fn with_config(config: HubConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            listeners: RwLock::new(HashMap::new()),
            sender,
            history: RwLock::new(VecDeque::new()),
            config,
        }
    }

    /// Subscribe a closure directly on the hub, with a detached scope
    pub fn on<F>(&self, event: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&Scope, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add(event, Listener::new(listener), Scope::detached(), false)
    }

    /// Subscribe a closure that is removed after its first invocation
    pub fn once<F>(&self, event: &str, listener: F) -> SubscriptionId
    where
        F: Fn(&Scope, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.add(event, Listener::new(listener), Scope::detached(), true)
    }

    /// Unsubscribe a single listener
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let mut emptied = None;
        let mut removed = false;

        for (event, subscribers) in listeners.iter_mut() {
            if let Some(pos) = subscribers.iter().position(|s| s.id == id) {
                subscribers.remove(pos);
                removed = true;
                if subscribers.is_empty() {
                    emptied = Some(event.clone());
                }
                break;
            }
        }

        if let Some(event) = emptied {
            listeners.remove(&event);
        }
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    /// Remove every listener of `event`
    ///
    /// Returns the number of listeners removed.
    pub fn off(&self, event: &str) -> usize {
        let removed = self
            .listeners
            .write()
            .remove(event)
            .map_or(0, |subscribers| subscribers.len());
        if removed > 0 {
            tracing::debug!(event, removed, "Listeners removed");
        }
        removed
    }

    /// Remove all listeners of all events
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// Number of listeners attached to `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Total number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().values().map(Vec::len).sum()
    }

    /// Names of events that currently have listeners, sorted
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.listeners.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Get a receiver for observing emissions asynchronously
    ///
    /// Observers see every emission but take no part in dispatch.
    pub fn receiver(&self) -> broadcast::Receiver<Emission> {
        self.sender.subscribe()
    }

    /// Get recent emission history (if enabled)
    ///
    /// Returns emissions since the given instant, or all history if None.
    pub fn history(&self, since: Option<Instant>) -> Vec<Emission> {
        if !self.config.enable_history {
            return Vec::new();
        }

        let history = self.history.read();
        match since {
            Some(since) => history
                .iter()
                .filter(|e| e.timestamp >= since)
                .map(|e| e.emission.clone())
                .collect(),
            None => history.iter().map(|e| e.emission.clone()).collect(),
        }
    }

    /// Clear emission history
    pub fn clear_history(&self) {
        self.history.write().clear();
    }

    /// Get the current configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    fn add(&self, event: &str, listener: Listener, scope: Scope, once: bool) -> SubscriptionId {
        let id = SubscriptionId::new();
        let mut listeners = self.listeners.write();
        let subscribers = listeners.entry(event.to_string()).or_default();
        subscribers.push(Subscriber {
            id,
            listener,
            scope,
            once,
        });

        let max = self.config.max_listeners;
        if max > 0 && subscribers.len() > max {
            tracing::warn!(
                event,
                count = subscribers.len(),
                max,
                "Possible listener leak: listener count exceeds max_listeners"
            );
        }
        tracing::debug!(event, once, "Subscription {} added", id);
        id
    }

    /// Take the listeners to invoke for one emission, pruning dead scopes
    fn snapshot(&self, event: &str) -> Vec<Subscriber> {
        let mut listeners = self.listeners.write();
        let Some(subscribers) = listeners.get_mut(event) else {
            return Vec::new();
        };

        let before = subscribers.len();
        subscribers.retain(|s| s.scope.is_live());
        let pruned = before - subscribers.len();
        if pruned > 0 {
            tracing::debug!(event, pruned, "Pruned listeners of dropped scopes");
        }

        let snapshot = subscribers.clone();
        if subscribers.is_empty() {
            listeners.remove(event);
        }
        snapshot
    }

    /// Remove a `once` subscription as it is about to run
    ///
    /// Returns false if it was already consumed or unsubscribed.
    fn consume(&self, event: &str, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(subscribers) = listeners.get_mut(event) else {
            return false;
        };
        let Some(pos) = subscribers.iter().position(|s| s.id == id) else {
            return false;
        };

        subscribers.remove(pos);
        if subscribers.is_empty() {
            listeners.remove(event);
        }
        true
    }

    /// Add an emission to history, maintaining size and age limits
    fn add_to_history(&self, emission: Emission) {
        let mut history = self.history.write();
        let now = Instant::now();

        history.push_back(TimestampedEmission {
            emission,
            timestamp: now,
        });

        let retention = self.config.history_retention();
        while history
            .front()
            .is_some_and(|e| now.duration_since(e.timestamp) > retention)
        {
            history.pop_front();
        }

        while history.len() > self.config.max_history_size {
            history.pop_front();
        }
    }
}

impl Hub for EventHub {
    fn subscribe(
        &self,
        event: &str,
        listener: Listener,
        scope: Scope,
        once: bool,
    ) -> Result<SubscriptionId, HubError> {
        Ok(self.add(event, listener, scope, once))
    }

    fn emit(&self, event: &str, args: &[Value]) -> Result<usize, HubError> {
        if self.config.enable_history || self.sender.receiver_count() > 0 {
            let emission = Emission {
                event: event.to_string(),
                args: args.to_vec(),
            };
            if self.config.enable_history {
                self.add_to_history(emission.clone());
            }
            // No receivers is not an error for the tap
            let _ = self.sender.send(emission);
        }

        let snapshot = self.snapshot(event);
        tracing::trace!(event, listeners = snapshot.len(), "Dispatching");

        let mut invoked = 0;
        for subscriber in &snapshot {
            let Some(scope) = subscriber.scope.upgrade() else {
                continue;
            };
            if subscriber.once && !self.consume(event, subscriber.id) {
                continue;
            }

            subscriber
                .listener
                .call(&scope, args)
                .map_err(|source| HubError::Listener {
                    event: event.to_string(),
                    source,
                })?;
            invoked += 1;
        }

        Ok(invoked)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.subscriber_count())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_hub_creation() {
        let hub = EventHub::new();
        assert_eq!(hub.subscriber_count(), 0);
        assert!(hub.event_names().is_empty());
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let hub = EventHub::new();

        let id = hub.on("tick", |_, _| Ok(()));
        assert_eq!(hub.listener_count("tick"), 1);

        assert!(hub.unsubscribe(id));
        assert_eq!(hub.listener_count("tick"), 0);
        assert!(hub.event_names().is_empty());

        // Double unsubscribe should return false
        assert!(!hub.unsubscribe(id));
    }

    #[test]
    fn test_delivery_in_subscription_order() {
        let hub = EventHub::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = order.clone();
            hub.on("tick", move |_, _| {
                order.lock().unwrap().push(n);
                Ok(())
            });
        }

        assert_eq!(hub.emit("tick", &[]).unwrap(), 3);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_args_delivered_unchanged() {
        let hub = EventHub::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        hub.on("move", move |_, args| {
            s.lock().unwrap().extend_from_slice(args);
            Ok(())
        });

        hub.emit("move", &[json!(1), json!({"x": 2})]).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!({"x": 2})]);
    }

    #[test]
    fn test_events_are_matched_by_name() {
        let hub = EventHub::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        hub.on("a", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(hub.emit("b", &[]).unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_once_listener_fires_once() {
        let hub = EventHub::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        hub.once("ready", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(hub.emit("ready", &[]).unwrap(), 1);
        assert_eq!(hub.emit("ready", &[]).unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count("ready"), 0);
    }

    #[test]
    fn test_once_survives_earlier_listener_error() {
        let hub = EventHub::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let failing = hub.on("ready", |_, _| Err(anyhow::anyhow!("not yet")));
        let c = counter.clone();
        hub.once("ready", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(hub.emit("ready", &[]).is_err());
        assert_eq!(hub.listener_count("ready"), 2);

        hub.unsubscribe(failing);
        assert_eq!(hub.emit("ready", &[]).unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count("ready"), 0);
    }

    #[test]
    fn test_reentrant_emit_does_not_repeat_once() {
        let hub = Arc::new(EventHub::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        let h = Arc::downgrade(&hub);
        hub.once("boot", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            let hub = h.upgrade().expect("hub alive");
            hub.emit("boot", &[])?;
            Ok(())
        });

        assert_eq!(hub.emit("boot", &[]).unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_weak_scope_is_skipped_and_pruned() {
        let hub = EventHub::new();
        let owner = Arc::new(String::from("owner"));
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        hub.subscribe(
            "tick",
            Listener::new(move |scope, _| {
                assert!(scope.downcast_ref::<String>().is_some());
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            Scope::weak(&owner),
            false,
        )
        .unwrap();

        assert_eq!(hub.emit("tick", &[]).unwrap(), 1);

        drop(owner);
        assert_eq!(hub.emit("tick", &[]).unwrap(), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count("tick"), 0);
    }

    #[test]
    fn test_off_removes_all_for_event() {
        let hub = EventHub::new();
        hub.on("a", |_, _| Ok(()));
        hub.on("a", |_, _| Ok(()));
        hub.on("b", |_, _| Ok(()));

        assert_eq!(hub.off("a"), 2);
        assert_eq!(hub.event_names(), vec!["b".to_string()]);

        hub.clear();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_listener_error_stops_dispatch() {
        let hub = EventHub::new();
        let counter = Arc::new(AtomicUsize::new(0));

        hub.on("fail", |_, _| Err(anyhow::anyhow!("listener broke")));
        let c = counter.clone();
        hub.on("fail", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = hub.emit("fail", &[]).unwrap_err();
        assert!(matches!(err, HubError::Listener { ref event, .. } if event == "fail"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reentrant_emit_and_subscribe() {
        let hub = Arc::new(EventHub::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let c = counter.clone();
        hub.on("inner", move |_, _| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let h = Arc::downgrade(&hub);
        hub.on("outer", move |_, _| {
            let hub = h.upgrade().expect("hub alive");
            hub.on("late", |_, _| Ok(()));
            hub.emit("inner", &[])?;
            Ok(())
        });

        hub.emit("outer", &[]).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(hub.listener_count("late"), 1);
    }

    #[test]
    fn test_max_listeners_only_warns() {
        let hub = EventHub::with_config(HubConfig {
            max_listeners: 1,
            ..Default::default()
        });
        hub.on("busy", |_, _| Ok(()));
        hub.on("busy", |_, _| Ok(()));
        assert_eq!(hub.listener_count("busy"), 2);
    }

    #[test]
    fn test_history() {
        let hub = EventHub::with_config(HubConfig {
            enable_history: true,
            max_history_size: 10,
            ..Default::default()
        });

        for i in 0..5 {
            hub.emit("tick", &[json!(i)]).unwrap();
        }

        let history = hub.history(None);
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].args, vec![json!(0)]);

        hub.clear_history();
        assert!(hub.history(None).is_empty());
    }

    #[test]
    fn test_history_max_size() {
        let hub = EventHub::with_config(HubConfig {
            enable_history: true,
            max_history_size: 5,
            ..Default::default()
        });

        for i in 0..10 {
            hub.emit("tick", &[json!(i)]).unwrap();
        }

        let history = hub.history(None);
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].args, vec![json!(5)]);
    }

    #[test]
    fn test_history_disabled_by_default() {
        let hub = EventHub::new();
        hub.emit("tick", &[]).unwrap();
        assert!(hub.history(None).is_empty());
    }

    #[tokio::test]
    async fn test_async_receiver() {
        let hub = EventHub::new();
        let mut receiver = hub.receiver();

        hub.emit("tick", &[json!("now")]).unwrap();

        let received = receiver.try_recv().expect("emission observed");
        assert_eq!(received.event, "tick");
        assert_eq!(received.args, vec![json!("now")]);
    }
}
