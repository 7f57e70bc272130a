use super::{CryptoError, lengths};
use ed25519_dalek::{Signer, Verifier};

/// Ed25519 long-term key pair (controller LTPK/LTSK)
pub struct LongTermKeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl LongTermKeyPair {
    /// Generate a new random key pair
    #[must_use]
    pub fn generate() -> Self {
        use rand::rngs::OsRng;
        let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Restore a key pair from the 32-byte secret key
    ///
    /// # Errors
    ///
    /// Returns error if `bytes` is not 32 bytes long
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        })
    }

    /// Public key bytes (for storage and handshake payloads)
    #[must_use]
    pub fn public_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Secret key bytes (for storage)
    #[must_use]
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message, returning the 64-byte signature
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

/// Verify `signature` over `message` against a raw 32-byte public key.
///
/// # Errors
///
/// Returns error if the key or signature bytes are malformed, or if the
/// signature does not verify.
pub fn validate_signature(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let key_bytes: [u8; 32] =
        public_key
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: lengths::ED25519_PUBLIC_KEY,
                actual: public_key.len(),
            })?;
    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&key_bytes)
        .map_err(|_| CryptoError::InvalidPublicKey)?;

    let signature =
        ed25519_dalek::Signature::from_slice(signature).map_err(|_| CryptoError::InvalidSignature)?;

    verifying_key
        .verify(message, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}
