//! HAP pairing handshakes: pair-setup (SRP-6a), pair-verify (X25519), and
//! the pairing admin methods on `/pairings`.
//!
//! The state machines here are sans-IO: they consume and produce TLV8
//! payloads, and the device layer drives them over HTTP POSTs.

pub mod admin;
pub mod setup;
pub mod verify;

#[cfg(test)]
mod tests;

pub use admin::{
    add_pairing_request, list_pairings_request, parse_admin_reply, parse_pairing_list,
    remove_pairing_request,
};
pub use setup::{PairSetup, PairSetupResult};
pub use verify::PairVerify;

/// SRP username fixed by the HAP spec
pub const PAIR_SETUP_USERNAME: &[u8] = b"Pair-Setup";

pub(crate) mod labels {
    pub const SETUP_ENCRYPT_SALT: &[u8] = b"Pair-Setup-Encrypt-Salt";
    pub const SETUP_ENCRYPT_INFO: &[u8] = b"Pair-Setup-Encrypt-Info";
    pub const SETUP_CONTROLLER_SIGN_SALT: &[u8] = b"Pair-Setup-Controller-Sign-Salt";
    pub const SETUP_CONTROLLER_SIGN_INFO: &[u8] = b"Pair-Setup-Controller-Sign-Info";
    pub const SETUP_ACCESSORY_SIGN_SALT: &[u8] = b"Pair-Setup-Accessory-Sign-Salt";
    pub const SETUP_ACCESSORY_SIGN_INFO: &[u8] = b"Pair-Setup-Accessory-Sign-Info";
    pub const VERIFY_ENCRYPT_SALT: &[u8] = b"Pair-Verify-Encrypt-Salt";
    pub const VERIFY_ENCRYPT_INFO: &[u8] = b"Pair-Verify-Encrypt-Info";

    pub const MSG_PS05: &[u8; 8] = b"PS-Msg05";
    pub const MSG_PS06: &[u8; 8] = b"PS-Msg06";
    pub const MSG_PV02: &[u8; 8] = b"PV-Msg02";
    pub const MSG_PV03: &[u8; 8] = b"PV-Msg03";
}
