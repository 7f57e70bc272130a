//! Typed subscription hub replacing the source's string-topic emitter.
//!
//! Lifecycle transitions go out on one broadcast channel per device;
//! characteristic notifications fan out over three tiers: exact
//! `(aid, iid)`, accessory-wide, and global. Delivery is non-blocking: a
//! subscriber that stops draining its channel lags and loses the oldest
//! events instead of wedging the connection reader.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

/// Device lifecycle transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// Announced via mDNS
    Discovered,
    /// Disappeared from mDNS
    Lost,
    /// Pair-setup completed
    Paired,
    /// Pairing removed (locally or by the accessory)
    Unpaired,
    /// Encrypted session established
    Verified,
    /// Connection torn down
    Closed,
    /// Background failure surfaced outside a call
    Error(String),
}

/// One accessory notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicEvent {
    pub aid: u64,
    pub iid: u64,
    pub value: Value,
}

/// Per-device event hub
pub struct EventHub {
    lifecycle: broadcast::Sender<DeviceEvent>,
    exact: Mutex<HashMap<(u64, u64), broadcast::Sender<CharacteristicEvent>>>,
    accessory: Mutex<HashMap<u64, broadcast::Sender<CharacteristicEvent>>>,
    global: broadcast::Sender<CharacteristicEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    /// Create an empty hub
    #[must_use]
    pub fn new() -> Self {
        let (lifecycle, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (global, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            lifecycle,
            exact: Mutex::new(HashMap::new()),
            accessory: Mutex::new(HashMap::new()),
            global,
        }
    }

    /// Subscribe to lifecycle transitions
    #[must_use]
    pub fn subscribe_lifecycle(&self) -> broadcast::Receiver<DeviceEvent> {
        self.lifecycle.subscribe()
    }

    /// Emit a lifecycle transition; subscribers may not exist, which is fine
    pub fn emit(&self, event: DeviceEvent) {
        tracing::trace!(?event, "lifecycle event");
        let _ = self.lifecycle.send(event);
    }

    /// Subscribe to one characteristic
    #[must_use]
    pub fn subscribe_characteristic(
        &self,
        aid: u64,
        iid: u64,
    ) -> broadcast::Receiver<CharacteristicEvent> {
        self.exact
            .lock()
            .expect("hub lock")
            .entry((aid, iid))
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Subscribe to every characteristic of one accessory
    #[must_use]
    pub fn subscribe_accessory(&self, aid: u64) -> broadcast::Receiver<CharacteristicEvent> {
        self.accessory
            .lock()
            .expect("hub lock")
            .entry(aid)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Subscribe to every characteristic of every accessory
    #[must_use]
    pub fn subscribe_all(&self) -> broadcast::Receiver<CharacteristicEvent> {
        self.global.subscribe()
    }

    /// Fan a notification out to all matching tiers
    pub fn publish(&self, event: &CharacteristicEvent) {
        if let Some(sender) = self.exact.lock().expect("hub lock").get(&(event.aid, event.iid)) {
            let _ = sender.send(event.clone());
        }
        if let Some(sender) = self.accessory.lock().expect("hub lock").get(&event.aid) {
            let _ = sender.send(event.clone());
        }
        let _ = self.global.send(event.clone());
    }

    /// Live subscriber count for one characteristic
    #[must_use]
    pub fn exact_listeners(&self, aid: u64, iid: u64) -> usize {
        self.exact
            .lock()
            .expect("hub lock")
            .get(&(aid, iid))
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Whether a wildcard subscription already covers `aid`: an
    /// accessory-wide listener for it, or a global listener.
    #[must_use]
    pub fn has_wildcard(&self, aid: u64) -> bool {
        if self.global.receiver_count() > 0 {
            return true;
        }
        self.accessory
            .lock()
            .expect("hub lock")
            .get(&aid)
            .is_some_and(|s| s.receiver_count() > 0)
    }

    /// Live accessory-wide subscriber count
    #[must_use]
    pub fn accessory_listeners(&self, aid: u64) -> usize {
        self.accessory
            .lock()
            .expect("hub lock")
            .get(&aid)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Live global subscriber count
    #[must_use]
    pub fn global_listeners(&self) -> usize {
        self.global.receiver_count()
    }

    /// Drop every characteristic topic; used when a device leaves the
    /// registry
    pub fn clear_characteristic_topics(&self) {
        self.exact.lock().expect("hub lock").clear();
        self.accessory.lock().expect("hub lock").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(aid: u64, iid: u64, value: Value) -> CharacteristicEvent {
        CharacteristicEvent { aid, iid, value }
    }

    #[test]
    fn exact_subscription_receives_matching_event() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe_characteristic(1, 11);

        hub.publish(&event(1, 11, json!(42.5)));
        hub.publish(&event(1, 12, json!(1)));

        let got = rx.try_recv().unwrap();
        assert_eq!((got.aid, got.iid, got.value), (1, 11, json!(42.5)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn wildcard_tiers_all_fire() {
        let hub = EventHub::new();
        let mut exact = hub.subscribe_characteristic(1, 11);
        let mut accessory = hub.subscribe_accessory(1);
        let mut global = hub.subscribe_all();

        hub.publish(&event(1, 11, json!(true)));

        assert!(exact.try_recv().is_ok());
        assert!(accessory.try_recv().is_ok());
        assert!(global.try_recv().is_ok());
    }

    #[test]
    fn wildcard_detection_tracks_live_receivers() {
        let hub = EventHub::new();
        assert!(!hub.has_wildcard(1));

        let rx = hub.subscribe_accessory(1);
        assert!(hub.has_wildcard(1));
        assert!(!hub.has_wildcard(2));

        drop(rx);
        assert!(!hub.has_wildcard(1));

        let rx = hub.subscribe_all();
        assert!(hub.has_wildcard(1));
        assert!(hub.has_wildcard(2));
        drop(rx);
    }

    #[test]
    fn listener_counts_follow_receiver_drops() {
        let hub = EventHub::new();
        assert_eq!(hub.exact_listeners(1, 11), 0);

        let rx1 = hub.subscribe_characteristic(1, 11);
        let rx2 = hub.subscribe_characteristic(1, 11);
        assert_eq!(hub.exact_listeners(1, 11), 2);

        drop(rx1);
        assert_eq!(hub.exact_listeners(1, 11), 1);
        drop(rx2);
        assert_eq!(hub.exact_listeners(1, 11), 0);
    }

    #[test]
    fn lifecycle_events_reach_subscribers() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe_lifecycle();

        hub.emit(DeviceEvent::Paired);
        hub.emit(DeviceEvent::Verified);

        assert_eq!(rx.try_recv().unwrap(), DeviceEvent::Paired);
        assert_eq!(rx.try_recv().unwrap(), DeviceEvent::Verified);
    }

    #[test]
    fn slow_subscriber_lags_instead_of_blocking() {
        let hub = EventHub::new();
        let mut rx = hub.subscribe_characteristic(1, 1);

        for i in 0..100 {
            hub.publish(&event(1, 1, json!(i)));
        }

        // oldest events were shed; the channel never blocked the publisher
        match rx.try_recv() {
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(n)) => assert!(n > 0),
            other => panic!("expected lag, got {other:?}"),
        }
    }
}
