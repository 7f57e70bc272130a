//! # hapctl
//!
//! A pure Rust controller for `HomeKit` accessories over IP (HAP client).
//!
//! ## Features
//!
//! - Accessory discovery via mDNS (`_hap._tcp`)
//! - Pair-setup (SRP-6a) and pair-verify (X25519/Ed25519) handshakes
//! - ChaCha20-Poly1305 framed session transport
//! - Characteristic reads, writes, and push event subscriptions
//! - Persistent pairings with automatic reconnection
//!
//! ## Example
//!
//! ```rust,no_run
//! use hapctl::{Controller, storage::FsStore};
//!
//! # async fn example() -> hapctl::Result<()> {
//! let store = FsStore::new("./hapctl-state")?;
//! let controller = Controller::new(Box::new(store), "hkontrol")?;
//! controller.load_pairings()?;
//!
//! let (mut discovered, _lost) = controller.start_discovery()?;
//! if let Some(device) = discovered.recv().await {
//!     device.pair_setup("031-45-154").await?;
//!     device.pair_verify().await?;
//!
//!     for accessory in device.get_accessories().await? {
//!         println!("accessory {}", accessory.aid);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod device;
pub mod discovery;
pub mod error;
pub mod events;
pub mod net;
pub mod protocol;
pub mod storage;
pub mod testing;
pub mod types;

pub use controller::Controller;
pub use device::Device;
pub use error::{HapError, Result, TlvStatus};
pub use events::{CharacteristicEvent, DeviceEvent};
pub use protocol::hap::{Accessory, Characteristic, HapType, Service};
pub use storage::{KeyPair, Pairing};
pub use types::{DnssdEntry, HapConfig};
