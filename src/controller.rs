//! Controller: the registry of devices keyed by mDNS instance name.
//!
//! The controller owns the long-term keypair, drives the discovery
//! collaborator, and loads/saves pairing records. Devices stay in the
//! registry while they are paired or discovered and are dropped once they
//! are neither.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::device::Device;
use crate::discovery::{DiscoveryEvent, HapBrowser};
use crate::error::{HapError, Result};
use crate::events::DeviceEvent;
use crate::protocol::crypto::LongTermKeyPair;
use crate::storage::{KeyPair, Store, TypedStore};
use crate::types::{DnssdEntry, HapConfig};

struct DiscoveryHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Registry of HAP devices for one controller identity
pub struct Controller {
    name: String,
    config: HapConfig,
    store: Arc<TypedStore>,
    controller_ltsk: [u8; 32],
    controller_ltpk: [u8; 32],
    devices: StdMutex<HashMap<String, Arc<Device>>>,
    discovery: StdMutex<Option<DiscoveryHandle>>,
}

impl Controller {
    /// Create a controller, loading the long-term keypair from the store
    /// or generating and persisting a fresh one.
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or holds a malformed keypair
    pub fn new(store: Box<dyn Store>, name: &str) -> Result<Arc<Self>> {
        Self::with_config(store, name, HapConfig::default())
    }

    /// Like [`Controller::new`] with explicit timeouts
    ///
    /// # Errors
    ///
    /// Returns error if the store fails or holds a malformed keypair
    pub fn with_config(store: Box<dyn Store>, name: &str, config: HapConfig) -> Result<Arc<Self>> {
        let store = Arc::new(TypedStore::new(store));

        let keypair = match store.keypair()? {
            Some(keypair) => keypair,
            None => {
                let generated = LongTermKeyPair::generate();
                let keypair = KeyPair {
                    public: generated.public_bytes().to_vec(),
                    private: generated.secret_bytes().to_vec(),
                };
                store.save_keypair(&keypair)?;
                tracing::info!(controller = name, "generated long-term keypair");
                keypair
            }
        };

        let controller_ltsk: [u8; 32] = keypair.private.as_slice().try_into().map_err(|_| {
            HapError::Protocol("stored private key is not 32 bytes".to_string())
        })?;
        let controller_ltpk: [u8; 32] = keypair.public.as_slice().try_into().map_err(|_| {
            HapError::Protocol("stored public key is not 32 bytes".to_string())
        })?;

        Ok(Arc::new(Self {
            name: name.to_string(),
            config,
            store,
            controller_ltsk,
            controller_ltpk,
            devices: StdMutex::new(HashMap::new()),
            discovery: StdMutex::new(None),
        }))
    }

    /// Controller identity used in pairing handshakes
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Controller long-term public key
    #[must_use]
    pub fn public_key(&self) -> [u8; 32] {
        self.controller_ltpk
    }

    /// Instantiate a paired device for every stored pairing record. The
    /// devices carry no mDNS record and become connectable once discovery
    /// sees them.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read
    pub fn load_pairings(self: &Arc<Self>) -> Result<()> {
        for pairing in self.store.pairings()? {
            let device = self.device_or_create(&pairing.id);
            device.load_pairing(pairing);
            tracing::debug!(device = %device.name(), "loaded pairing");
        }
        Ok(())
    }

    /// Start the mDNS browser. Returns the discover and lost channels;
    /// both close when discovery stops.
    ///
    /// # Errors
    ///
    /// Returns error if the mDNS daemon cannot start
    pub fn start_discovery(
        self: &Arc<Self>,
    ) -> Result<(
        mpsc::UnboundedReceiver<Arc<Device>>,
        mpsc::UnboundedReceiver<Arc<Device>>,
    )> {
        let stream = HapBrowser::browse()?;
        let cancel = CancellationToken::new();
        let (discover_tx, discover_rx) = mpsc::unbounded_channel();
        let (lost_tx, lost_rx) = mpsc::unbounded_channel();

        let controller = Arc::clone(self);
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            futures::pin_mut!(stream);
            loop {
                tokio::select! {
                    () = task_cancel.cancelled() => return,
                    event = stream.next() => match event {
                        None => return,
                        Some(DiscoveryEvent::Added(entry) | DiscoveryEvent::Updated(entry)) => {
                            let device = controller.add_entry(entry);
                            let _ = discover_tx.send(device);
                        }
                        Some(DiscoveryEvent::Removed(name)) => {
                            if let Some(device) = controller.remove_entry(&name).await {
                                let _ = lost_tx.send(device);
                            }
                        }
                    }
                }
            }
        });

        *self.discovery.lock().expect("discovery lock") = Some(DiscoveryHandle { cancel, task });
        Ok((discover_rx, lost_rx))
    }

    /// Stop the mDNS browser; the discover/lost channels close
    pub fn stop_discovery(&self) {
        if let Some(handle) = self.discovery.lock().expect("discovery lock").take() {
            handle.cancel.cancel();
            handle.task.abort();
        }
    }

    /// Feed one discovery record into the registry: merge into the known
    /// device or create one, and mark it discovered. Exposed so discovery
    /// can be driven by an external collaborator instead of the built-in
    /// browser.
    pub fn add_entry(self: &Arc<Self>, entry: DnssdEntry) -> Arc<Device> {
        let name = entry.device_id().to_string();
        let device = self.device_or_create(&name);
        device.mark_discovered(&entry);
        device
    }

    /// Handle a discovery disappearance: mark undiscovered, clear the mDNS
    /// record, close, and drop the device from the registry iff unpaired.
    pub async fn remove_entry(&self, name: &str) -> Option<Arc<Device>> {
        let device = self.get_device(name)?;
        device.mark_lost().await;
        self.drop_if_gone(&device);
        Some(device)
    }

    /// Look up a device by instance name
    #[must_use]
    pub fn get_device(&self, name: &str) -> Option<Arc<Device>> {
        self.devices.lock().expect("devices lock").get(name).cloned()
    }

    /// All devices, loaded or discovered
    #[must_use]
    pub fn get_all_devices(&self) -> Vec<Arc<Device>> {
        self.devices
            .lock()
            .expect("devices lock")
            .values()
            .cloned()
            .collect()
    }

    /// Devices that completed pair-setup, connected or not
    #[must_use]
    pub fn get_paired_devices(&self) -> Vec<Arc<Device>> {
        self.get_all_devices()
            .into_iter()
            .filter(|d| d.is_paired())
            .collect()
    }

    /// Devices with an established encrypted session
    #[must_use]
    pub fn get_verified_devices(&self) -> Vec<Arc<Device>> {
        self.get_all_devices()
            .into_iter()
            .filter(|d| d.is_verified())
            .collect()
    }

    /// Shut everything down: discovery, supervisors, connections
    pub async fn shutdown(&self) {
        self.stop_discovery();
        for device in self.get_all_devices() {
            device.shutdown().await;
        }
    }

    fn device_or_create(self: &Arc<Self>, name: &str) -> Arc<Device> {
        let mut devices = self.devices.lock().expect("devices lock");
        if let Some(device) = devices.get(name) {
            return Arc::clone(device);
        }

        let device = Arc::new(Device::new(
            name,
            &self.name,
            self.controller_ltsk,
            Arc::clone(&self.store),
            self.config.clone(),
        ));
        devices.insert(name.to_string(), Arc::clone(&device));
        drop(devices);

        self.watch_device(&device);
        device
    }

    // Per-device housekeeping: start the supervisor when it pairs, drop it
    // from the registry once it is neither paired nor discovered.
    fn watch_device(self: &Arc<Self>, device: &Arc<Device>) {
        let controller = Arc::downgrade(self);
        let device = Arc::clone(device);
        tokio::spawn(async move {
            let mut events = device.lifecycle_events();
            loop {
                match events.recv().await {
                    Ok(DeviceEvent::Paired) => device.ensure_supervisor(),
                    Ok(DeviceEvent::Unpaired | DeviceEvent::Lost) => {
                        let Some(controller) = controller.upgrade() else {
                            return;
                        };
                        if controller.drop_if_gone(&device) {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => return,
                }
            }
        });
    }

    // true if the device was removed from the registry
    fn drop_if_gone(&self, device: &Arc<Device>) -> bool {
        if device.is_paired() || device.is_discovered() {
            return false;
        }
        let removed = self
            .devices
            .lock()
            .expect("devices lock")
            .remove(device.name())
            .is_some();
        if removed {
            device.clear_topics();
            tracing::debug!(device = %device.name(), "dropped from registry");
        }
        removed
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop_discovery();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemStore, Pairing};
    use std::net::{IpAddr, Ipv4Addr};

    fn entry(name: &str) -> DnssdEntry {
        DnssdEntry {
            name: name.to_string(),
            port: 5001,
            addresses: vec![IpAddr::V4(Ipv4Addr::LOCALHOST)],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn keypair_is_created_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();

        let first = Controller::new(
            Box::new(crate::storage::FsStore::new(dir.path()).unwrap()),
            "hkontrol",
        )
        .unwrap()
        .public_key();

        let second = Controller::new(
            Box::new(crate::storage::FsStore::new(dir.path()).unwrap()),
            "hkontrol",
        )
        .unwrap()
        .public_key();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn registry_drops_unpaired_undiscovered_devices() {
        let controller = Controller::new(Box::new(MemStore::new()), "hkontrol").unwrap();

        let device = controller.add_entry(entry("Lamp"));
        assert!(device.is_discovered());
        assert!(controller.get_device("Lamp").is_some());

        controller.remove_entry("Lamp").await;
        assert!(controller.get_device("Lamp").is_none());

        for device in controller.get_all_devices() {
            assert!(device.is_paired() || device.is_discovered());
        }
    }

    #[tokio::test]
    async fn paired_device_survives_mdns_loss() {
        let controller = Controller::new(Box::new(MemStore::new()), "hkontrol").unwrap();
        let device = controller.add_entry(entry("Lamp"));
        device.load_pairing(Pairing {
            id: "Lamp".to_string(),
            public_key: vec![1u8; 32],
            permission: 1,
        });

        controller.remove_entry("Lamp").await;
        // paired: still present, just undiscovered
        let device = controller.get_device("Lamp").expect("device kept");
        assert!(!device.is_discovered());
        assert!(device.is_paired());
    }

    #[tokio::test]
    async fn load_pairings_restores_paired_devices() {
        let controller = Controller::new(Box::new(MemStore::new()), "hkontrol").unwrap();
        controller
            .store
            .save_pairing(&Pairing {
                id: "Thermostat".to_string(),
                public_key: vec![9u8; 32],
                permission: 1,
            })
            .unwrap();

        controller.load_pairings().unwrap();
        let device = controller.get_device("Thermostat").expect("loaded");
        assert!(device.is_paired());
        assert!(!device.is_discovered());
        assert!(!device.is_verified());
    }
}
