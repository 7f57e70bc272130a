//! Accessory-side pairing handshakes for the in-process test accessory.

use crate::error::{HapError, Result};
use crate::protocol::crypto::{
    EphemeralKeyPair, LongTermKeyPair, SrpServer, hkdf_sha512, open_with_label, seal_with_label,
    validate_signature,
};
use crate::protocol::pairing::PAIR_SETUP_USERNAME;
use crate::protocol::tlv8::{Decoder, Encoder, Tag, states};

const SALT: [u8; 16] = [
    0x10, 0x32, 0x54, 0x76, 0x98, 0xBA, 0xDC, 0xFE, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD,
    0xEF,
];

struct VerifySession {
    accessory_ephemeral: [u8; 32],
    controller_ephemeral: Vec<u8>,
    session_key: [u8; 32],
    shared: [u8; 32],
}

/// Accessory half of pair-setup and pair-verify
pub struct PairingResponder {
    accessory_id: String,
    pin: String,
    keypair: LongTermKeyPair,
    srp: Option<SrpServer>,
    srp_session_key: Option<Vec<u8>>,
    controller_id: Option<Vec<u8>>,
    controller_ltpk: Option<Vec<u8>>,
    verify: Option<VerifySession>,
}

impl PairingResponder {
    /// Create a responder with a fresh accessory long-term keypair
    #[must_use]
    pub fn new(accessory_id: &str, pin: &str) -> Self {
        Self {
            accessory_id: accessory_id.to_string(),
            pin: pin.to_string(),
            keypair: LongTermKeyPair::generate(),
            srp: None,
            srp_session_key: None,
            controller_id: None,
            controller_ltpk: None,
            verify: None,
        }
    }

    /// Accessory long-term public key
    #[must_use]
    pub fn accessory_ltpk(&self) -> [u8; 32] {
        self.keypair.public_bytes()
    }

    /// Controller identity learned during pair-setup M5
    #[must_use]
    pub fn controller_id(&self) -> Option<String> {
        self.controller_id
            .as_ref()
            .map(|id| String::from_utf8_lossy(id).to_string())
    }

    /// Controller long-term public key learned during pair-setup M5
    #[must_use]
    pub fn controller_ltpk(&self) -> Option<Vec<u8>> {
        self.controller_ltpk.clone()
    }

    /// Preload controller credentials so pair-verify works without a
    /// preceding pair-setup on this instance
    pub fn set_controller(&mut self, controller_id: &str, controller_ltpk: &[u8]) {
        self.controller_id = Some(controller_id.as_bytes().to_vec());
        self.controller_ltpk = Some(controller_ltpk.to_vec());
    }

    /// Handle one `/pair-setup` message, producing the reply body
    ///
    /// # Errors
    ///
    /// Returns error on malformed input or failed proofs
    pub fn handle_pair_setup(&mut self, body: &[u8]) -> Result<Vec<u8>> {
        let tlv = Decoder::decode(body)?;
        match tlv.state()? {
            states::M1 => self.setup_m2(),
            states::M3 => self.setup_m4(&tlv),
            states::M5 => self.setup_m6(&tlv),
            other => Err(HapError::Protocol(format!("unexpected setup state {other}"))),
        }
    }

    fn setup_m2(&mut self) -> Result<Vec<u8>> {
        let srp = SrpServer::new(PAIR_SETUP_USERNAME, self.pin.as_bytes(), &SALT)?;
        let reply = Encoder::new()
            .add_state(states::M2)
            .add(Tag::Salt, &SALT)
            .add(Tag::PublicKey, &srp.public_key())
            .build();
        self.srp = Some(srp);
        Ok(reply)
    }

    fn setup_m4(&mut self, tlv: &Decoder) -> Result<Vec<u8>> {
        let client_public = tlv.get_required(Tag::PublicKey)?;
        let client_proof = tlv.get_required(Tag::Proof)?;

        let srp = self
            .srp
            .as_ref()
            .ok_or_else(|| HapError::Protocol("M3 before M1".to_string()))?;

        match srp.verify_client(client_public, client_proof) {
            Ok((m2, key)) => {
                self.srp_session_key = Some(key.as_bytes().to_vec());
                Ok(Encoder::new()
                    .add_state(states::M4)
                    .add(Tag::Proof, &m2)
                    .build())
            }
            Err(_) => Ok(Encoder::new()
                .add_state(states::M4)
                .add_byte(Tag::Error, 0x02)
                .build()),
        }
    }

    fn setup_m6(&mut self, tlv: &Decoder) -> Result<Vec<u8>> {
        let sealed = tlv.get_required(Tag::EncryptedData)?;
        let session_key = self
            .srp_session_key
            .clone()
            .ok_or_else(|| HapError::Protocol("M5 before M3".to_string()))?;

        let setup_key = hkdf_sha512(
            &session_key,
            b"Pair-Setup-Encrypt-Salt",
            b"Pair-Setup-Encrypt-Info",
        )?;
        let decrypted = open_with_label(&setup_key, b"PS-Msg05", sealed)?;
        let inner = Decoder::decode(&decrypted)?;

        let controller_id = inner.get_required(Tag::Identifier)?.to_vec();
        let controller_ltpk = inner.get_required(Tag::PublicKey)?.to_vec();
        let signature = inner.get_required(Tag::Signature)?;

        let prefix = hkdf_sha512(
            &session_key,
            b"Pair-Setup-Controller-Sign-Salt",
            b"Pair-Setup-Controller-Sign-Info",
        )?;
        let mut material = Vec::new();
        material.extend_from_slice(&prefix);
        material.extend_from_slice(&controller_id);
        material.extend_from_slice(&controller_ltpk);
        validate_signature(&controller_ltpk, &material, signature)?;

        self.controller_id = Some(controller_id);
        self.controller_ltpk = Some(controller_ltpk);

        // our identity back, sealed with the same setup key
        let prefix = hkdf_sha512(
            &session_key,
            b"Pair-Setup-Accessory-Sign-Salt",
            b"Pair-Setup-Accessory-Sign-Info",
        )?;
        let mut material = Vec::new();
        material.extend_from_slice(&prefix);
        material.extend_from_slice(self.accessory_id.as_bytes());
        material.extend_from_slice(&self.keypair.public_bytes());
        let signature = self.keypair.sign(&material);

        let inner = Encoder::new()
            .add(Tag::Identifier, self.accessory_id.as_bytes())
            .add(Tag::PublicKey, &self.keypair.public_bytes())
            .add(Tag::Signature, &signature)
            .build();
        let sealed = seal_with_label(&setup_key, b"PS-Msg06", &inner)?;

        Ok(Encoder::new()
            .add_state(states::M6)
            .add(Tag::EncryptedData, &sealed)
            .build())
    }

    /// Handle one `/pair-verify` message. The second element is the
    /// X25519 shared secret once the M4 reply has been produced; the
    /// caller installs the session after writing that reply.
    ///
    /// # Errors
    ///
    /// Returns error on malformed input or failed signatures
    pub fn handle_pair_verify(&mut self, body: &[u8]) -> Result<(Vec<u8>, Option<[u8; 32]>)> {
        let tlv = Decoder::decode(body)?;
        match tlv.state()? {
            states::M1 => Ok((self.verify_m2(&tlv)?, None)),
            states::M3 => self.verify_m4(&tlv),
            other => Err(HapError::Protocol(format!(
                "unexpected verify state {other}"
            ))),
        }
    }

    fn verify_m2(&mut self, tlv: &Decoder) -> Result<Vec<u8>> {
        let controller_ephemeral = tlv.get_required(Tag::PublicKey)?.to_vec();

        let ephemeral = EphemeralKeyPair::generate();
        let accessory_ephemeral = ephemeral.public_bytes();
        let shared = ephemeral.shared_secret(&controller_ephemeral)?;
        let session_key = hkdf_sha512(
            shared.as_bytes(),
            b"Pair-Verify-Encrypt-Salt",
            b"Pair-Verify-Encrypt-Info",
        )?;

        let mut material = Vec::new();
        material.extend_from_slice(&accessory_ephemeral);
        material.extend_from_slice(self.accessory_id.as_bytes());
        material.extend_from_slice(&controller_ephemeral);
        let signature = self.keypair.sign(&material);

        let inner = Encoder::new()
            .add(Tag::Identifier, self.accessory_id.as_bytes())
            .add(Tag::Signature, &signature)
            .build();
        let sealed = seal_with_label(&session_key, b"PV-Msg02", &inner)?;

        self.verify = Some(VerifySession {
            accessory_ephemeral,
            controller_ephemeral,
            session_key,
            shared: *shared.as_bytes(),
        });

        Ok(Encoder::new()
            .add_state(states::M2)
            .add(Tag::PublicKey, &accessory_ephemeral)
            .add(Tag::EncryptedData, &sealed)
            .build())
    }

    fn verify_m4(&mut self, tlv: &Decoder) -> Result<(Vec<u8>, Option<[u8; 32]>)> {
        let sealed = tlv.get_required(Tag::EncryptedData)?;
        let session = self
            .verify
            .take()
            .ok_or_else(|| HapError::Protocol("verify M3 before M1".to_string()))?;

        let controller_ltpk = self
            .controller_ltpk
            .clone()
            .ok_or_else(|| HapError::Protocol("no paired controller".to_string()))?;

        let decrypted = open_with_label(&session.session_key, b"PV-Msg03", sealed)?;
        let inner = Decoder::decode(&decrypted)?;
        let controller_id = inner.get_required(Tag::Identifier)?;
        let signature = inner.get_required(Tag::Signature)?;

        let mut material = Vec::new();
        material.extend_from_slice(&session.controller_ephemeral);
        material.extend_from_slice(controller_id);
        material.extend_from_slice(&session.accessory_ephemeral);

        if validate_signature(&controller_ltpk, &material, signature).is_err() {
            let reply = Encoder::new()
                .add_state(states::M4)
                .add_byte(Tag::Error, 0x02)
                .build();
            return Ok((reply, None));
        }

        let reply = Encoder::new().add_state(states::M4).build();
        Ok((reply, Some(session.shared)))
    }
}
