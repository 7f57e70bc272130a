//! Pair-verify: the four-message X25519 flow run on every connection to a
//! paired accessory, producing the per-session shared secret.

use super::labels;
use crate::error::{HapError, Result, TlvStatus};
use crate::protocol::crypto::{
    EphemeralKeyPair, LongTermKeyPair, hkdf_sha512, open_with_label, seal_with_label,
    validate_signature,
};
use crate::protocol::tlv8::{Decoder, Encoder, Tag, states};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerifyState {
    Initial,
    AwaitingM2,
    AwaitingM4,
    Complete,
    Failed,
}

/// Pair-verify client state machine.
///
/// Re-verification after reconnect uses the stored accessory LTPK; it never
/// re-runs pair-setup.
pub struct PairVerify {
    state: VerifyState,
    controller_id: String,
    keypair: LongTermKeyPair,
    accessory_ltpk: Vec<u8>,
    ephemeral: EphemeralKeyPair,
    shared_secret: Option<[u8; 32]>,
}

impl PairVerify {
    /// Create a session from the controller identity and the stored
    /// accessory public key
    ///
    /// # Errors
    ///
    /// Returns error if the controller secret key is malformed
    pub fn new(
        controller_id: &str,
        controller_ltsk: &[u8],
        accessory_ltpk: &[u8],
    ) -> Result<Self> {
        Ok(Self {
            state: VerifyState::Initial,
            controller_id: controller_id.to_string(),
            keypair: LongTermKeyPair::from_secret_bytes(controller_ltsk)?,
            accessory_ltpk: accessory_ltpk.to_vec(),
            ephemeral: EphemeralKeyPair::generate(),
            shared_secret: None,
        })
    }

    /// Build M1: `{state=1, publicKey=ephemeral}`
    ///
    /// # Errors
    ///
    /// Returns error on out-of-order use
    pub fn m1(&mut self) -> Result<Vec<u8>> {
        if self.state != VerifyState::Initial {
            return Err(HapError::Protocol(format!(
                "pair-verify out of order: at {:?}",
                self.state
            )));
        }
        self.state = VerifyState::AwaitingM2;
        // method stays 0 here; accessories reject method=2 on /pair-verify
        Ok(Encoder::new()
            .add_state(states::M1)
            .add_method(0)
            .add(Tag::PublicKey, &self.ephemeral.public_bytes())
            .build())
    }

    /// Consume M2 (accessory ephemeral + sealed signature), produce M3
    ///
    /// # Errors
    ///
    /// Returns error if the accessory signature does not verify
    pub fn process_m2(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if self.state != VerifyState::AwaitingM2 {
            return Err(HapError::Protocol(format!(
                "pair-verify out of order: at {:?}",
                self.state
            )));
        }

        let tlv = Decoder::decode(data)?;
        if tlv.error_code() != 0 {
            self.state = VerifyState::Failed;
            return Err(HapError::Accessory(TlvStatus::from_code(tlv.error_code())));
        }
        let state = tlv.state()?;
        if state != states::M2 {
            self.state = VerifyState::Failed;
            return Err(HapError::Protocol(format!("expected state M2, got M{state}")));
        }

        let remote_ephemeral = tlv.get_required(Tag::PublicKey)?.to_vec();
        let sealed = tlv.get_required(Tag::EncryptedData)?;

        let shared = self.ephemeral.shared_secret(&remote_ephemeral)?;
        let session_key = hkdf_sha512(
            shared.as_bytes(),
            labels::VERIFY_ENCRYPT_SALT,
            labels::VERIFY_ENCRYPT_INFO,
        )?;

        let decrypted = match open_with_label(&session_key, labels::MSG_PV02, sealed) {
            Ok(plain) => plain,
            Err(e) => {
                self.state = VerifyState::Failed;
                return Err(e.into());
            }
        };

        let inner = Decoder::decode(&decrypted)?;
        let accessory_id = inner.get_required(Tag::Identifier)?;
        let signature = inner.get_required(Tag::Signature)?;

        // accessory signs: accessoryEphemeral ‖ accessoryId ‖ ourEphemeral
        let mut material =
            Vec::with_capacity(32 + accessory_id.len() + 32);
        material.extend_from_slice(&remote_ephemeral);
        material.extend_from_slice(accessory_id);
        material.extend_from_slice(&self.ephemeral.public_bytes());

        if let Err(e) = validate_signature(&self.accessory_ltpk, &material, signature) {
            self.state = VerifyState::Failed;
            return Err(e.into());
        }

        // we sign: ourEphemeral ‖ controllerId ‖ accessoryEphemeral
        let mut material =
            Vec::with_capacity(32 + self.controller_id.len() + 32);
        material.extend_from_slice(&self.ephemeral.public_bytes());
        material.extend_from_slice(self.controller_id.as_bytes());
        material.extend_from_slice(&remote_ephemeral);
        let signature = self.keypair.sign(&material);

        let inner = Encoder::new()
            .add(Tag::Identifier, self.controller_id.as_bytes())
            .add(Tag::Signature, &signature)
            .build();
        let sealed = seal_with_label(&session_key, labels::MSG_PV03, &inner)?;

        let m3 = Encoder::new()
            .add_state(states::M3)
            .add(Tag::EncryptedData, &sealed)
            .build();

        self.shared_secret = Some(*shared.as_bytes());
        self.state = VerifyState::AwaitingM4;
        Ok(m3)
    }

    /// Consume M4, completing verification. Returns the X25519 shared
    /// secret the session keys derive from.
    ///
    /// # Errors
    ///
    /// Returns error if M4 carries an error code
    pub fn process_m4(&mut self, data: &[u8]) -> Result<[u8; 32]> {
        if self.state != VerifyState::AwaitingM4 {
            return Err(HapError::Protocol(format!(
                "pair-verify out of order: at {:?}",
                self.state
            )));
        }

        let tlv = Decoder::decode(data)?;
        if tlv.error_code() != 0 {
            self.state = VerifyState::Failed;
            return Err(HapError::Accessory(TlvStatus::from_code(tlv.error_code())));
        }
        let state = tlv.state()?;
        if state != states::M4 {
            self.state = VerifyState::Failed;
            return Err(HapError::Protocol(format!("expected state M4, got M{state}")));
        }

        let shared = self
            .shared_secret
            .ok_or_else(|| HapError::Protocol("shared secret missing".to_string()))?;
        self.state = VerifyState::Complete;
        Ok(shared)
    }
}
