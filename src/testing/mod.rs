//! Test doubles: an in-process HAP accessory and its pairing responder.
//!
//! Used by the crate's own integration tests and handy for downstream
//! crates that want to test against a stub accessory instead of hardware.

mod mock_accessory;
mod pairing_responder;

pub use mock_accessory::{MockAccessory, MockAccessoryConfig, ReceivedWrite};
pub use pairing_responder::PairingResponder;
