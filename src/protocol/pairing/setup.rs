//! Pair-setup: the six-message SRP-based enrolment flow that establishes
//! the accessory's long-term public key on the controller.

use super::{PAIR_SETUP_USERNAME, labels};
use crate::error::{HapError, Result, TlvStatus};
use crate::protocol::crypto::{
    LongTermKeyPair, SrpClient, SrpVerifier, hkdf_sha512, open_with_label, seal_with_label,
    validate_signature,
};
use crate::protocol::tlv8::{Decoder, Encoder, Tag, methods, states};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupState {
    Initial,
    AwaitingM2,
    AwaitingM4,
    AwaitingM6,
    Complete,
    Failed,
}

/// Outcome of a completed pair-setup
#[derive(Debug, Clone)]
pub struct PairSetupResult {
    /// Accessory identifier from the M6 payload
    pub accessory_id: String,
    /// Accessory long-term Ed25519 public key
    pub accessory_ltpk: Vec<u8>,
}

/// Pair-setup client state machine
pub struct PairSetup {
    state: SetupState,
    controller_id: String,
    keypair: LongTermKeyPair,
    pin: String,
    verifier: Option<SrpVerifier>,
    // SRP session key K, input to every later derivation
    session_key: Option<Vec<u8>>,
}

impl PairSetup {
    /// Create a session for the given controller identity and setup pin
    ///
    /// # Errors
    ///
    /// Returns error if the controller secret key is malformed
    pub fn new(controller_id: &str, controller_ltsk: &[u8], pin: &str) -> Result<Self> {
        Ok(Self {
            state: SetupState::Initial,
            controller_id: controller_id.to_string(),
            keypair: LongTermKeyPair::from_secret_bytes(controller_ltsk)?,
            pin: pin.to_string(),
            verifier: None,
            session_key: None,
        })
    }

    /// Build M1: `{state=1, method=0}`
    ///
    /// # Errors
    ///
    /// Returns error on out-of-order use
    pub fn m1(&mut self) -> Result<Vec<u8>> {
        self.expect_state(SetupState::Initial)?;
        self.state = SetupState::AwaitingM2;
        Ok(Encoder::new()
            .add_state(states::M1)
            .add_method(methods::PAIR_SETUP)
            .build())
    }

    /// Consume M2 (salt + SRP `B`), produce M3 (`A` + client proof)
    ///
    /// # Errors
    ///
    /// Returns error if M2 carries an error code or is malformed
    pub fn process_m2(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.expect_state(SetupState::AwaitingM2)?;
        let tlv = self.checked_decode(data, states::M2)?;

        let salt = tlv.get_required(Tag::Salt)?;
        let server_public = tlv.get_required(Tag::PublicKey)?;

        let srp = SrpClient::new()?;
        tracing::debug!(salt_len = salt.len(), b_len = server_public.len(), "pair-setup M2");

        let verifier = srp.process_challenge(
            PAIR_SETUP_USERNAME,
            self.pin.as_bytes(),
            salt,
            server_public,
        )?;

        let m3 = Encoder::new()
            .add_state(states::M3)
            .add(Tag::PublicKey, srp.public_key())
            .add(Tag::Proof, verifier.client_proof())
            .build();

        self.verifier = Some(verifier);
        self.state = SetupState::AwaitingM4;
        Ok(m3)
    }

    /// Consume M4 (server proof), produce M5 (sealed controller identity)
    ///
    /// # Errors
    ///
    /// Returns error if the server proof does not verify
    pub fn process_m4(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.expect_state(SetupState::AwaitingM4)?;
        let tlv = self.checked_decode(data, states::M4)?;

        let server_proof = tlv.get_required(Tag::Proof)?;
        let verifier = self
            .verifier
            .take()
            .ok_or_else(|| HapError::Protocol("SRP verifier missing".to_string()))?;

        let session_key = match verifier.verify_server(server_proof) {
            Ok(key) => key.as_bytes().to_vec(),
            Err(e) => {
                self.state = SetupState::Failed;
                return Err(e.into());
            }
        };

        // sign: HKDF(K) ‖ controllerId ‖ LTPK
        let sign_prefix = hkdf_sha512(
            &session_key,
            labels::SETUP_CONTROLLER_SIGN_SALT,
            labels::SETUP_CONTROLLER_SIGN_INFO,
        )?;
        let mut material = Vec::with_capacity(32 + self.controller_id.len() + 32);
        material.extend_from_slice(&sign_prefix);
        material.extend_from_slice(self.controller_id.as_bytes());
        material.extend_from_slice(&self.keypair.public_bytes());
        let signature = self.keypair.sign(&material);

        let inner = Encoder::new()
            .add(Tag::Identifier, self.controller_id.as_bytes())
            .add(Tag::PublicKey, &self.keypair.public_bytes())
            .add(Tag::Signature, &signature)
            .build();

        let encrypt_key = hkdf_sha512(
            &session_key,
            labels::SETUP_ENCRYPT_SALT,
            labels::SETUP_ENCRYPT_INFO,
        )?;
        let sealed = seal_with_label(&encrypt_key, labels::MSG_PS05, &inner)?;

        let m5 = Encoder::new()
            .add_state(states::M5)
            .add_method(methods::PAIR_SETUP)
            .add(Tag::EncryptedData, &sealed)
            .build();

        self.session_key = Some(session_key);
        self.state = SetupState::AwaitingM6;
        Ok(m5)
    }

    /// Consume M6 (sealed accessory identity), completing the setup.
    ///
    /// The inner payload's state byte is not checked: some accessories send
    /// it as 0. A present public key and a zero error code are required
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns error if decryption or the accessory signature fails
    pub fn process_m6(&mut self, data: &[u8]) -> Result<PairSetupResult> {
        self.expect_state(SetupState::AwaitingM6)?;
        let tlv = self.checked_decode(data, states::M6)?;

        let sealed = tlv.get_required(Tag::EncryptedData)?;
        let session_key = self
            .session_key
            .clone()
            .ok_or_else(|| HapError::Protocol("SRP session key missing".to_string()))?;

        let decrypt_key = hkdf_sha512(
            &session_key,
            labels::SETUP_ENCRYPT_SALT,
            labels::SETUP_ENCRYPT_INFO,
        )?;
        let decrypted = match open_with_label(&decrypt_key, labels::MSG_PS06, sealed) {
            Ok(plain) => plain,
            Err(e) => {
                self.state = SetupState::Failed;
                return Err(e.into());
            }
        };

        let inner = Decoder::decode(&decrypted)?;
        if inner.error_code() != 0 {
            self.state = SetupState::Failed;
            return Err(HapError::Accessory(TlvStatus::from_code(inner.error_code())));
        }
        let accessory_ltpk = inner.get_required(Tag::PublicKey)?.to_vec();
        let accessory_id_bytes = inner.get_required(Tag::Identifier)?;
        let accessory_signature = inner.get_required(Tag::Signature)?;

        let sign_prefix = hkdf_sha512(
            &session_key,
            labels::SETUP_ACCESSORY_SIGN_SALT,
            labels::SETUP_ACCESSORY_SIGN_INFO,
        )?;
        let mut material =
            Vec::with_capacity(32 + accessory_id_bytes.len() + accessory_ltpk.len());
        material.extend_from_slice(&sign_prefix);
        material.extend_from_slice(accessory_id_bytes);
        material.extend_from_slice(&accessory_ltpk);

        if let Err(e) = validate_signature(&accessory_ltpk, &material, accessory_signature) {
            self.state = SetupState::Failed;
            return Err(e.into());
        }

        let accessory_id = String::from_utf8_lossy(accessory_id_bytes).to_string();
        tracing::debug!(accessory_id = %accessory_id, "pair-setup complete");

        self.state = SetupState::Complete;
        Ok(PairSetupResult {
            accessory_id,
            accessory_ltpk,
        })
    }

    fn expect_state(&self, expected: SetupState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(HapError::Protocol(format!(
                "pair-setup out of order: expected {expected:?}, at {:?}",
                self.state
            )))
        }
    }

    // Decode a reply, surface its error code, check the state byte.
    fn checked_decode(&mut self, data: &[u8], expected_state: u8) -> Result<Decoder> {
        let tlv = Decoder::decode(data)?;
        if tlv.error_code() != 0 {
            self.state = SetupState::Failed;
            return Err(HapError::Accessory(TlvStatus::from_code(tlv.error_code())));
        }
        let state = tlv.state()?;
        if state != expected_state {
            self.state = SetupState::Failed;
            return Err(HapError::Protocol(format!(
                "expected state M{expected_state}, got M{state}"
            )));
        }
        Ok(tlv)
    }
}
