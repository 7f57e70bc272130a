use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305 as ChaChaImpl, Nonce as ChaChaNonce};

use super::{CryptoError, lengths};

/// 12-byte nonce for ChaCha20-Poly1305.
///
/// HAP always builds nonces as 4 zero bytes followed by an 8-byte payload:
/// either a little-endian frame counter or an ASCII message label such as
/// `PS-Msg05`.
#[derive(Clone, Copy)]
pub struct Nonce([u8; 12]);

impl Nonce {
    /// Nonce from a frame counter (little-endian, zero-prefixed)
    #[must_use]
    pub fn from_counter(counter: u64) -> Self {
        let mut arr = [0u8; 12];
        arr[4..12].copy_from_slice(&counter.to_le_bytes());
        Self(arr)
    }

    /// Nonce from an 8-byte handshake message label (zero-prefixed)
    #[must_use]
    pub fn from_label(label: &[u8; 8]) -> Self {
        let mut arr = [0u8; 12];
        arr[4..12].copy_from_slice(label);
        Self(arr)
    }

    /// Get as bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }
}

/// ChaCha20-Poly1305 AEAD cipher keyed once, sealed per nonce.
///
/// All outputs and inputs carry the 16-byte Poly1305 tag appended to the
/// ciphertext, which is exactly the layout HAP uses both inside TLV
/// `encryptedData` items and in the framed session records.
pub struct ChaChaCipher {
    cipher: ChaChaImpl,
}

impl ChaChaCipher {
    /// Create cipher with a 32-byte key
    ///
    /// # Errors
    ///
    /// Returns error if the key is not 32 bytes
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher = ChaChaImpl::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
            expected: lengths::CHACHA_KEY,
            actual: key.len(),
        })?;
        Ok(Self { cipher })
    }

    /// Encrypt and authenticate; returns `ciphertext ‖ tag`
    ///
    /// # Errors
    ///
    /// Returns error if encryption fails
    pub fn seal(
        &self,
        nonce: &Nonce,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.cipher
            .encrypt(
                ChaChaNonce::from_slice(&nonce.0),
                Payload {
                    msg: plaintext,
                    aad,
                },
            )
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))
    }

    /// Verify and decrypt `ciphertext ‖ tag`
    ///
    /// # Errors
    ///
    /// Returns error if the tag does not verify
    pub fn open(
        &self,
        nonce: &Nonce,
        aad: &[u8],
        sealed: &[u8],
    ) -> Result<Vec<u8>, CryptoError> {
        self.cipher
            .decrypt(
                ChaChaNonce::from_slice(&nonce.0),
                Payload { msg: sealed, aad },
            )
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
    }
}

/// One-shot seal with a message-label nonce and no AAD, as the pairing
/// handshakes use for their `encryptedData` items.
///
/// # Errors
///
/// Returns error if the key is invalid or encryption fails
pub fn seal_with_label(
    key: &[u8],
    label: &[u8; 8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    ChaChaCipher::new(key)?.seal(&Nonce::from_label(label), &[], plaintext)
}

/// One-shot open counterpart of [`seal_with_label`]
///
/// # Errors
///
/// Returns error if the key is invalid or the tag does not verify
pub fn open_with_label(
    key: &[u8],
    label: &[u8; 8],
    sealed: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    ChaChaCipher::new(key)?.open(&Nonce::from_label(label), &[], sealed)
}
