//! Transport layer: the framed AEAD session and the per-device connection

mod connection;
pub mod secure;

pub use connection::{Connection, ConnectionSignal, SignalHandler};
pub use secure::{DecryptHalf, EncryptHalf, PACKET_LENGTH_MAX, SessionKeys, TAG_LENGTH};
