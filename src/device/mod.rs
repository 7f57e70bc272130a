//! Device lifecycle: pairing, verification, accessory access, events.
//!
//! A [`Device`] exists from the moment it is discovered or loaded from the
//! pairing store until it is both unpaired and gone from mDNS. It owns at
//! most one connection and, when paired, a supervisor task that keeps an
//! encrypted session alive across drops and rediscoveries.

mod supervisor;

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{HapError, Result};
use crate::events::{CharacteristicEvent, DeviceEvent, EventHub};
use crate::net::{Connection, ConnectionSignal, SessionKeys, SignalHandler};
use crate::protocol::hap::{
    Accessory, Characteristic, CharacteristicWrite, CharacteristicsPayload, sort_tree,
};
use crate::protocol::http::{Request, Response, StatusCode, content_types};
use crate::protocol::pairing::{self, PairSetup, PairVerify};
use crate::storage::{Pairing, TypedStore, permissions};
use crate::types::{DnssdEntry, HapConfig};

struct DeviceState {
    entry: Option<DnssdEntry>,
    pairing: Option<Pairing>,
    discovered: bool,
    paired: bool,
    verified: bool,
    accessories: Option<Vec<Accessory>>,
    // characteristics an "ev": true PUT has been issued for
    subscriptions: HashSet<(u64, u64)>,
}

// Internals the connection reader reaches without going through the Device
struct Shared {
    name: String,
    state: StdMutex<DeviceState>,
    hub: EventHub,
    conn: StdMutex<Option<Arc<Connection>>>,
}

impl Shared {
    // Bookkeeping shared by Device::close and the reader's Closed signal.
    // Whoever takes the connection slot emits the event; exactly once per
    // open connection.
    fn on_connection_closed(&self) -> Option<Arc<Connection>> {
        let conn = self.conn.lock().expect("conn lock").take();
        {
            let mut state = self.state.lock().expect("state lock");
            state.verified = false;
            state.accessories = None;
            state.subscriptions.clear();
        }
        if conn.is_some() {
            self.hub.emit(DeviceEvent::Closed);
        }
        conn
    }
}

/// A HAP accessory as seen from the controller
pub struct Device {
    name: String,
    controller_id: String,
    controller_ltsk: [u8; 32],
    config: HapConfig,
    store: Arc<TypedStore>,
    shared: Arc<Shared>,
    // serializes dialling and pair-verify against concurrent callers
    connect_lock: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
    supervisor: StdMutex<Option<JoinHandle<()>>>,
}

impl Device {
    pub(crate) fn new(
        name: &str,
        controller_id: &str,
        controller_ltsk: [u8; 32],
        store: Arc<TypedStore>,
        config: HapConfig,
    ) -> Self {
        Self {
            name: name.to_string(),
            controller_id: controller_id.to_string(),
            controller_ltsk,
            config,
            store,
            shared: Arc::new(Shared {
                name: name.to_string(),
                state: StdMutex::new(DeviceState {
                    entry: None,
                    pairing: None,
                    discovered: false,
                    paired: false,
                    verified: false,
                    accessories: None,
                    subscriptions: HashSet::new(),
                }),
                hub: EventHub::new(),
                conn: StdMutex::new(None),
            }),
            connect_lock: tokio::sync::Mutex::new(()),
            cancel: CancellationToken::new(),
            supervisor: StdMutex::new(None),
        }
    }

    /// mDNS instance name, the device identity
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the device is currently advertised via mDNS
    #[must_use]
    pub fn is_discovered(&self) -> bool {
        self.state(|s| s.discovered)
    }

    /// Whether this controller has completed `/pair-setup`
    #[must_use]
    pub fn is_paired(&self) -> bool {
        self.state(|s| s.paired)
    }

    /// Whether an encrypted session is currently established
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.state(|s| s.verified)
    }

    /// Current pairing record, if paired
    #[must_use]
    pub fn pairing(&self) -> Option<Pairing> {
        self.state(|s| s.pairing.clone())
    }

    /// Current mDNS record, if discovered
    #[must_use]
    pub fn dnssd_entry(&self) -> Option<DnssdEntry> {
        self.state(|s| s.entry.clone())
    }

    /// Cached accessory tree from the last successful [`Device::get_accessories`]
    #[must_use]
    pub fn accessories(&self) -> Option<Vec<Accessory>> {
        self.state(|s| s.accessories.clone())
    }

    /// Subscribe to lifecycle transitions (discover, lost, paired,
    /// unpaired, verified, close, error)
    #[must_use]
    pub fn lifecycle_events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.shared.hub.subscribe_lifecycle()
    }

    fn state<T>(&self, f: impl FnOnce(&DeviceState) -> T) -> T {
        f(&self.shared.state.lock().expect("state lock"))
    }

    fn state_mut<T>(&self, f: impl FnOnce(&mut DeviceState) -> T) -> T {
        f(&mut self.shared.state.lock().expect("state lock"))
    }

    pub(crate) fn hub(&self) -> &EventHub {
        &self.shared.hub
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn retry_timeout(&self) -> Duration {
        self.config.retry_timeout
    }

    pub(crate) fn clear_topics(&self) {
        self.shared.hub.clear_characteristic_topics();
    }

    /// Stop the supervisor and close the connection for good
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.close().await;
    }

    // ---- discovery bookkeeping (driven by the controller) ----

    pub(crate) fn mark_discovered(self: &Arc<Self>, entry: &DnssdEntry) {
        self.state_mut(|s| {
            match &mut s.entry {
                Some(existing) => existing.merge(entry),
                None => s.entry = Some(entry.clone()),
            }
            s.discovered = true;
        });
        self.shared.hub.emit(DeviceEvent::Discovered);
        if self.is_paired() {
            self.ensure_supervisor();
        }
    }

    pub(crate) async fn mark_lost(&self) {
        self.state_mut(|s| {
            s.discovered = false;
            s.entry = None;
        });
        self.shared.hub.emit(DeviceEvent::Lost);
        self.close().await;
    }

    pub(crate) fn load_pairing(&self, pairing: Pairing) {
        self.state_mut(|s| {
            s.pairing = Some(pairing);
            s.paired = true;
        });
    }

    /// Start (or restart) the persistent-verify supervisor
    pub(crate) fn ensure_supervisor(self: &Arc<Self>) {
        let mut guard = self.supervisor.lock().expect("supervisor lock");
        if guard.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        *guard = Some(supervisor::spawn(Arc::clone(self)));
    }

    // ---- connection ----

    async fn ensure_connection(&self) -> Result<Arc<Connection>> {
        let _guard = self.connect_lock.lock().await;
        self.ensure_connection_locked().await
    }

    // caller holds connect_lock
    async fn ensure_connection_locked(&self) -> Result<Arc<Connection>> {
        if let Some(conn) = self.current_connection() {
            if !conn.is_closed() {
                return Ok(conn);
            }
        }

        let candidates = self
            .state(|s| s.entry.as_ref().map(DnssdEntry::socket_addrs))
            .ok_or(HapError::NotDiscovered)?;
        if candidates.is_empty() {
            return Err(HapError::NotReachable(self.name.clone()));
        }

        let conn = Arc::new(
            Connection::dial(
                &self.name,
                &candidates,
                self.config.dial_timeout,
                self.config.request_timeout,
            )
            .await?,
        );
        *self.shared.conn.lock().expect("conn lock") = Some(Arc::clone(&conn));
        Ok(conn)
    }

    fn current_connection(&self) -> Option<Arc<Connection>> {
        self.shared.conn.lock().expect("conn lock").clone()
    }

    /// Tear down the connection and clear session state. Idempotent; emits
    /// `Closed` once per open connection.
    pub async fn close(&self) {
        if let Some(conn) = self.shared.on_connection_closed() {
            conn.close().await;
        }
    }

    // ---- pairing ----

    /// Run the SRP pair-setup handshake with the user-entered setup pin.
    /// On success the accessory's long-term key is persisted and the device
    /// is paired (but not yet verified). Pairing an already-paired device
    /// is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a step-tagged error if any handshake message fails
    pub async fn pair_setup(&self, pin: &str) -> Result<()> {
        {
            let state = self.shared.state.lock().expect("state lock");
            if state.paired {
                return Ok(());
            }
            if !state.discovered || state.entry.is_none() {
                return Err(HapError::NotDiscovered);
            }
        }

        // dial failures are transport errors, not handshake failures
        let conn = self.ensure_connection().await?;

        let mut setup = PairSetup::new(&self.controller_id, &self.controller_ltsk, pin)?;

        let m1 = setup.m1()?;
        let m2 = self.post_pairing(&conn, "/pair-setup", m1, "M1", |s, e| HapError::pair_setup(s, e)).await?;
        let m3 = setup
            .process_m2(&m2)
            .map_err(|e| HapError::pair_setup("M2", e))?;
        let m4 = self.post_pairing(&conn, "/pair-setup", m3, "M3", |s, e| HapError::pair_setup(s, e)).await?;
        let m5 = setup
            .process_m4(&m4)
            .map_err(|e| HapError::pair_setup("M4", e))?;
        let m6 = self.post_pairing(&conn, "/pair-setup", m5, "M5", |s, e| HapError::pair_setup(s, e)).await?;
        let result = setup
            .process_m6(&m6)
            .map_err(|e| HapError::pair_setup("M6", e))?;

        tracing::info!(device = %self.name, accessory_id = %result.accessory_id, "paired");

        let pairing = Pairing {
            id: self.name.clone(),
            public_key: result.accessory_ltpk,
            permission: permissions::ADMIN,
        };
        self.store.save_pairing(&pairing)?;
        self.state_mut(|s| {
            s.pairing = Some(pairing);
            s.paired = true;
        });
        self.shared.hub.emit(DeviceEvent::Paired);
        Ok(())
    }

    /// Run the X25519 pair-verify handshake and install the encrypted
    /// session on the connection. Requires a stored pairing; never re-runs
    /// pair-setup.
    ///
    /// # Errors
    ///
    /// Returns a step-tagged error if any handshake message fails
    pub async fn pair_verify(&self) -> Result<()> {
        // one verify at a time; also excludes a concurrent dial
        let _guard = self.connect_lock.lock().await;

        let pairing = self.pairing().ok_or(HapError::NotPaired)?;
        if self.is_verified() {
            return Ok(());
        }

        let conn = self.ensure_connection_locked().await?;

        let mut verify =
            PairVerify::new(&self.controller_id, &self.controller_ltsk, &pairing.public_key)?;

        let m1 = verify.m1()?;
        let m2 = self.post_pairing(&conn, "/pair-verify", m1, "M1", |s, e| HapError::pair_verify(s, e)).await?;
        let m3 = verify
            .process_m2(&m2)
            .map_err(|e| HapError::pair_verify("M2", e))?;
        let m4 = self.post_pairing(&conn, "/pair-verify", m3, "M3", |s, e| HapError::pair_verify(s, e)).await?;
        let shared_secret = verify
            .process_m4(&m4)
            .map_err(|e| HapError::pair_verify("M4", e))?;

        let keys = SessionKeys::from_shared_secret(&shared_secret)?;
        conn.upgrade(&keys, self.signal_handler()).await?;

        self.state_mut(|s| s.verified = true);
        self.shared.hub.emit(DeviceEvent::Verified);
        tracing::info!(device = %self.name, "verified");
        Ok(())
    }

    /// Pair-setup followed by pair-verify, retrying transient failures
    /// every `retry_timeout` until cancelled. Handshake-level failures
    /// (wrong pin, key mismatch) are returned immediately.
    ///
    /// # Errors
    ///
    /// Returns the first handshake failure, or the last transient error
    /// when cancelled
    pub async fn pair_setup_and_verify(&self, pin: &str, retry_timeout: Duration) -> Result<()> {
        loop {
            let attempt = async {
                self.pair_setup(pin).await?;
                self.pair_verify().await
            };
            match attempt.await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_handshake_failure() => return Err(e),
                Err(e) => {
                    tracing::debug!(device = %self.name, error = %e, "setup attempt failed; retrying");
                    self.close().await;
                    tokio::select! {
                        () = self.cancel.cancelled() => return Err(e),
                        () = tokio::time::sleep(retry_timeout) => {}
                    }
                }
            }
        }
    }

    /// Remove this controller's pairing from the accessory and purge the
    /// local record. The connection is torn down; `close` and `unpaired`
    /// are emitted.
    ///
    /// # Errors
    ///
    /// Returns error if the accessory rejects the removal
    pub async fn unpair(&self) -> Result<()> {
        if !self.is_paired() {
            return Err(HapError::NotPaired);
        }

        let body = pairing::remove_pairing_request(&self.controller_id);
        let response = self
            .request(Request::post("/pairings", content_types::PAIRING_TLV8, body))
            .await?;
        if !response.status.is_success() {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }
        pairing::parse_admin_reply(&response.body)?;

        self.store.delete_pairing(&self.name)?;
        self.state_mut(|s| {
            s.paired = false;
            s.pairing = None;
        });
        self.close().await;
        self.shared.hub.emit(DeviceEvent::Unpaired);
        tracing::info!(device = %self.name, "unpaired");
        Ok(())
    }

    /// Register another controller on the accessory
    ///
    /// # Errors
    ///
    /// Returns error if the accessory rejects the addition
    pub async fn pair_add(&self, pairing: &Pairing) -> Result<()> {
        let body = pairing::add_pairing_request(pairing);
        let response = self
            .request(Request::post("/pairings", content_types::PAIRING_TLV8, body))
            .await?;
        if !response.status.is_success() {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }
        pairing::parse_admin_reply(&response.body)
    }

    /// Remove a controller pairing by identifier. Removing our own
    /// identifier is [`Device::unpair`].
    ///
    /// # Errors
    ///
    /// Returns error if the accessory rejects the removal
    pub async fn pair_remove(&self, controller_id: &str) -> Result<()> {
        if controller_id == self.controller_id {
            return self.unpair().await;
        }
        let body = pairing::remove_pairing_request(controller_id);
        let response = self
            .request(Request::post("/pairings", content_types::PAIRING_TLV8, body))
            .await?;
        if !response.status.is_success() {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }
        pairing::parse_admin_reply(&response.body)
    }

    /// List all controllers paired with the accessory
    ///
    /// # Errors
    ///
    /// Returns error if the reply cannot be parsed
    pub async fn list_pairings(&self) -> Result<Vec<Pairing>> {
        let body = pairing::list_pairings_request();
        let response = self
            .request(Request::post("/pairings", content_types::PAIRING_TLV8, body))
            .await?;
        if !response.status.is_success() {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }
        pairing::parse_pairing_list(&response.body)
    }

    // ---- accessory access ----

    /// Fetch the accessory tree, canonicalise type identifiers to short
    /// form, sort it, and replace the cache.
    ///
    /// # Errors
    ///
    /// Returns error if the device is not verified or the fetch fails
    pub async fn get_accessories(&self) -> Result<Vec<Accessory>> {
        let response = self.request(Request::get("/accessories")).await?;
        if !response.status.is_success() {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }

        let payload: crate::protocol::hap::AccessoryList = serde_json::from_slice(&response.body)?;
        let mut accessories = payload.accessories;
        for accessory in &mut accessories {
            for service in &mut accessory.services {
                service.service_type = service.service_type.to_short();
                for characteristic in &mut service.characteristics {
                    characteristic.characteristic_type =
                        characteristic.characteristic_type.to_short();
                    characteristic.aid = accessory.aid;
                }
            }
        }
        sort_tree(&mut accessories);

        self.state_mut(|s| s.accessories = Some(accessories.clone()));
        Ok(accessories)
    }

    /// Read one characteristic value
    ///
    /// # Errors
    ///
    /// Returns error if no record matches both ids
    pub async fn get_characteristic(&self, aid: u64, iid: u64) -> Result<Characteristic> {
        let response = self
            .request(Request::get(format!("/characteristics?id={aid}.{iid}")))
            .await?;
        if !response.status.is_success() {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }

        let payload: CharacteristicsPayload<Characteristic> =
            serde_json::from_slice(&response.body)?;
        payload
            .characteristics
            .into_iter()
            .find(|c| c.aid == aid && c.iid == iid)
            .ok_or_else(|| {
                HapError::Protocol(format!("no characteristic {aid}.{iid} in reply"))
            })
    }

    /// Read several characteristics in one round trip
    ///
    /// # Errors
    ///
    /// Returns error if the device is not verified or the fetch fails
    pub async fn get_characteristics(&self, ids: &[(u64, u64)]) -> Result<Vec<Characteristic>> {
        let query = ids
            .iter()
            .map(|(aid, iid)| format!("{aid}.{iid}"))
            .collect::<Vec<_>>()
            .join(",");
        let response = self
            .request(Request::get(format!("/characteristics?id={query}")))
            .await?;
        if !response.status.is_success() {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }

        let payload: CharacteristicsPayload<Characteristic> =
            serde_json::from_slice(&response.body)?;
        Ok(payload.characteristics)
    }

    /// Write one characteristic value. `204 No Content` is full success; a
    /// reply body with non-zero per-characteristic statuses is surfaced as
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns error on partial failure or transport problems
    pub async fn put_characteristic(&self, aid: u64, iid: u64, value: Value) -> Result<()> {
        let body = serde_json::to_vec(&CharacteristicsPayload::new(vec![
            CharacteristicWrite::value(aid, iid, value),
        ]))?;
        let response = self
            .request(Request::put("/characteristics", content_types::HAP_JSON, body))
            .await?;

        if response.status == StatusCode::NO_CONTENT {
            return Ok(());
        }
        if !response.status.is_success() {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }

        // 207-style reply: inspect per-characteristic statuses
        let payload: CharacteristicsPayload<CharacteristicWrite> =
            serde_json::from_slice(&response.body)?;
        let failed: Vec<String> = payload
            .characteristics
            .iter()
            .filter(|c| c.status.is_some_and(|s| s != 0))
            .map(|c| format!("{}.{} -> {}", c.aid, c.iid, c.status.unwrap_or(0)))
            .collect();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(HapError::Protocol(format!(
                "characteristic write failed: {}",
                failed.join(", ")
            )))
        }
    }

    // ---- event subscriptions ----

    /// Subscribe to one characteristic's notifications. Issues the
    /// `"ev": true` write only for the first subscriber, and not at all
    /// when a wildcard subscription already covers the accessory.
    ///
    /// # Errors
    ///
    /// Returns error if the subscribe write is rejected
    pub async fn subscribe_to_events(
        &self,
        aid: u64,
        iid: u64,
    ) -> Result<broadcast::Receiver<CharacteristicEvent>> {
        let need_put = {
            let state = self.shared.state.lock().expect("state lock");
            if !state.verified {
                return Err(HapError::NotVerified);
            }
            !self.shared.hub.has_wildcard(aid) && !state.subscriptions.contains(&(aid, iid))
        };

        if need_put {
            self.put_event_flag(aid, iid, true).await?;
            self.state_mut(|s| s.subscriptions.insert((aid, iid)));
        }
        Ok(self.shared.hub.subscribe_characteristic(aid, iid))
    }

    /// Drop a characteristic subscription. The `"ev": false` write goes
    /// out only once the last listener is gone.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::NotSubscribed`] if no subscribe was issued
    pub async fn unsubscribe_from_events(&self, aid: u64, iid: u64) -> Result<()> {
        if !self.state(|s| s.subscriptions.contains(&(aid, iid))) {
            return Err(HapError::NotSubscribed);
        }

        if self.shared.hub.exact_listeners(aid, iid) == 0 && !self.shared.hub.has_wildcard(aid) {
            self.put_event_flag(aid, iid, false).await?;
            self.state_mut(|s| s.subscriptions.remove(&(aid, iid)));
        }
        Ok(())
    }

    /// Subscribe to every event-capable characteristic of one accessory
    ///
    /// # Errors
    ///
    /// Returns error if the accessory tree cannot be fetched or a
    /// subscribe write fails
    pub async fn subscribe_to_accessory_events(
        &self,
        aid: u64,
    ) -> Result<broadcast::Receiver<CharacteristicEvent>> {
        if self.shared.hub.global_listeners() == 0 {
            for (aid, iid) in self.event_capable(Some(aid)).await? {
                if !self.state(|s| s.subscriptions.contains(&(aid, iid))) {
                    self.put_event_flag(aid, iid, true).await?;
                    self.state_mut(|s| s.subscriptions.insert((aid, iid)));
                }
            }
        }
        Ok(self.shared.hub.subscribe_accessory(aid))
    }

    /// Subscribe to every event-capable characteristic of every accessory
    ///
    /// # Errors
    ///
    /// Returns error if the accessory tree cannot be fetched or a
    /// subscribe write fails
    pub async fn subscribe_to_all_events(
        &self,
    ) -> Result<broadcast::Receiver<CharacteristicEvent>> {
        for (aid, iid) in self.event_capable(None).await? {
            if !self.state(|s| s.subscriptions.contains(&(aid, iid))) {
                self.put_event_flag(aid, iid, true).await?;
                self.state_mut(|s| s.subscriptions.insert((aid, iid)));
            }
        }
        Ok(self.shared.hub.subscribe_all())
    }

    /// Tear down one accessory's wire subscriptions once its last
    /// accessory-wide listener is gone
    ///
    /// # Errors
    ///
    /// Returns error if an unsubscribe write fails
    pub async fn unsubscribe_from_accessory_events(&self, aid: u64) -> Result<()> {
        if self.shared.hub.accessory_listeners(aid) > 0
            || self.shared.hub.global_listeners() > 0
        {
            return Ok(());
        }
        let stale: Vec<(u64, u64)> = self.state(|s| {
            s.subscriptions
                .iter()
                .filter(|(a, i)| *a == aid && self.shared.hub.exact_listeners(*a, *i) == 0)
                .copied()
                .collect()
        });
        for (aid, iid) in stale {
            self.put_event_flag(aid, iid, false).await?;
            self.state_mut(|s| s.subscriptions.remove(&(aid, iid)));
        }
        Ok(())
    }

    /// Tear down every wire subscription with no remaining listener
    ///
    /// # Errors
    ///
    /// Returns error if an unsubscribe write fails
    pub async fn unsubscribe_from_all_events(&self) -> Result<()> {
        if self.shared.hub.global_listeners() > 0 {
            return Ok(());
        }
        let stale: Vec<(u64, u64)> = self.state(|s| {
            s.subscriptions
                .iter()
                .filter(|(a, i)| {
                    self.shared.hub.exact_listeners(*a, *i) == 0
                        && self.shared.hub.accessory_listeners(*a) == 0
                })
                .copied()
                .collect()
        });
        for (aid, iid) in stale {
            self.put_event_flag(aid, iid, false).await?;
            self.state_mut(|s| s.subscriptions.remove(&(aid, iid)));
        }
        Ok(())
    }

    // ---- internals ----

    async fn put_event_flag(&self, aid: u64, iid: u64, enabled: bool) -> Result<()> {
        let body = serde_json::to_vec(&CharacteristicsPayload::new(vec![
            CharacteristicWrite::events(aid, iid, enabled),
        ]))?;
        let response = self
            .request(Request::put("/characteristics", content_types::HAP_JSON, body))
            .await?;
        if response.status != StatusCode::NO_CONTENT {
            return Err(HapError::UnexpectedStatus(response.status.0));
        }
        Ok(())
    }

    // (aid, iid) of all ev-capable characteristics, for one accessory or all
    async fn event_capable(&self, only_aid: Option<u64>) -> Result<Vec<(u64, u64)>> {
        if !self.is_verified() {
            return Err(HapError::NotVerified);
        }
        let accessories = match self.accessories() {
            Some(cached) => cached,
            None => self.get_accessories().await?,
        };
        let mut result = Vec::new();
        for accessory in &accessories {
            if only_aid.is_some_and(|aid| aid != accessory.aid) {
                continue;
            }
            for service in &accessory.services {
                for characteristic in &service.characteristics {
                    if characteristic.supports_events() {
                        result.push((accessory.aid, characteristic.iid));
                    }
                }
            }
        }
        Ok(result)
    }

    async fn request(&self, request: Request) -> Result<Response> {
        if !self.is_verified() {
            return Err(HapError::NotVerified);
        }
        let conn = self.current_connection().ok_or(HapError::NotConnected)?;
        conn.round_trip(&request).await
    }

    async fn post_pairing(
        &self,
        conn: &Arc<Connection>,
        path: &str,
        body: Vec<u8>,
        step: &'static str,
        wrap: fn(&'static str, HapError) -> HapError,
    ) -> Result<Vec<u8>> {
        let request = Request::post(path, content_types::PAIRING_TLV8, body);
        let response = conn
            .round_trip(&request)
            .await
            .map_err(|e| wrap(step, e))?;
        if !response.status.is_success() {
            return Err(wrap(step, HapError::UnexpectedStatus(response.status.0)));
        }
        Ok(response.body)
    }

    // Runs on the reader task; must stay non-blocking. Event payloads are
    // fanned straight into the hub's broadcast channels.
    fn signal_handler(&self) -> SignalHandler {
        let shared = Arc::clone(&self.shared);
        Box::new(move |signal| match signal {
            ConnectionSignal::Event(response) => {
                handle_event_message(&shared, &response.body);
            }
            // late replies to timed-out requests are filtered out by the
            // connection; only a response matching no issued request at all
            // lands here
            ConnectionSignal::OrphanResponse(response) => {
                tracing::warn!(
                    device = %shared.name,
                    status = response.status.0,
                    "response matching no issued request"
                );
                shared
                    .hub
                    .emit(DeviceEvent::Error("unsolicited response on stream".to_string()));
            }
            ConnectionSignal::Closed => {
                shared.on_connection_closed();
            }
        })
    }
}

fn handle_event_message(shared: &Shared, body: &[u8]) {
    let payload: CharacteristicsPayload<Characteristic> = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(device = %shared.name, error = %e, "undecodable event payload");
            return;
        }
    };
    for characteristic in payload.characteristics {
        tracing::trace!(
            device = %shared.name,
            aid = characteristic.aid,
            iid = characteristic.iid,
            "event"
        );
        shared.hub.publish(&CharacteristicEvent {
            aid: characteristic.aid,
            iid: characteristic.iid,
            value: characteristic.value,
        });
    }
}
