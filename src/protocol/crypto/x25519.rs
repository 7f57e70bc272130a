use super::{CryptoError, lengths};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

/// Ephemeral X25519 key pair generated per pair-verify session
pub struct EphemeralKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a new random key pair
    #[must_use]
    pub fn generate() -> Self {
        use rand::rngs::OsRng;
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Public key bytes
    #[must_use]
    pub fn public_bytes(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    /// Compute the shared secret against the remote public key
    ///
    /// # Errors
    ///
    /// Returns error if the remote key is not 32 bytes
    pub fn shared_secret(&self, remote_public: &[u8]) -> Result<SharedSecret, CryptoError> {
        let bytes: [u8; 32] = remote_public
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength {
                expected: lengths::X25519_PUBLIC_KEY,
                actual: remote_public.len(),
            })?;
        let shared = self.secret.diffie_hellman(&PublicKey::from(bytes));
        Ok(SharedSecret {
            bytes: shared.to_bytes(),
        })
    }
}

/// X25519 shared secret, zeroised on drop
pub struct SharedSecret {
    bytes: [u8; 32],
}

impl SharedSecret {
    /// Shared secret bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}
