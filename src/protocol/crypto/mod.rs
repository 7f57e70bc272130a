//! Cryptographic primitives for HAP pairing and session encryption

mod chacha;
mod ed25519;
mod error;
mod hkdf;
mod srp;
mod x25519;

#[cfg(test)]
mod tests;

pub use self::chacha::{ChaChaCipher, Nonce, open_with_label, seal_with_label};
pub use self::ed25519::{LongTermKeyPair, validate_signature};
pub use self::error::CryptoError;
pub use self::hkdf::sha512 as hkdf_sha512;
pub use self::srp::{SessionKey, SrpClient, SrpServer, SrpVerifier};
pub use self::x25519::{EphemeralKeyPair, SharedSecret};

/// Length of various cryptographic values
pub mod lengths {
    /// Ed25519 public key length
    pub const ED25519_PUBLIC_KEY: usize = 32;
    /// Ed25519 signature length
    pub const ED25519_SIGNATURE: usize = 64;
    /// X25519 public key length
    pub const X25519_PUBLIC_KEY: usize = 32;
    /// ChaCha20-Poly1305 key length
    pub const CHACHA_KEY: usize = 32;
    /// ChaCha20-Poly1305 nonce length
    pub const CHACHA_NONCE: usize = 12;
    /// ChaCha20-Poly1305 tag length
    pub const CHACHA_TAG: usize = 16;
}
