//! HAP secure session: the framed ChaCha20-Poly1305 record layer installed
//! after pair-verify.
//!
//! Each record is `[ length: u16 LE ][ ciphertext ][ tag: 16 bytes ]` with at
//! most 1024 bytes of plaintext per record. The 2-byte length is the AEAD
//! additional authenticated data; nonces are the per-direction record
//! counters. A record shorter than 1024 bytes terminates the logical
//! plaintext batch being assembled; it is not end-of-stream.

use byteorder::{ByteOrder, LittleEndian};

use crate::protocol::crypto::{ChaChaCipher, CryptoError, Nonce, hkdf_sha512};

/// Max plaintext bytes per record
pub const PACKET_LENGTH_MAX: usize = 0x400;

/// Poly1305 tag length
pub const TAG_LENGTH: usize = 16;

const CONTROL_SALT: &[u8] = b"Control-Salt";
const CONTROL_WRITE_INFO: &[u8] = b"Control-Write-Encryption-Key";
const CONTROL_READ_INFO: &[u8] = b"Control-Read-Encryption-Key";

/// Direction keys derived from the pair-verify shared secret
#[derive(Clone)]
pub struct SessionKeys {
    /// controller → accessory
    pub encrypt_key: [u8; 32],
    /// accessory → controller
    pub decrypt_key: [u8; 32],
}

impl SessionKeys {
    /// Derive both direction keys from the X25519 shared secret
    ///
    /// # Errors
    ///
    /// Returns error if key derivation fails
    pub fn from_shared_secret(shared: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            encrypt_key: hkdf_sha512(shared, CONTROL_SALT, CONTROL_WRITE_INFO)?,
            decrypt_key: hkdf_sha512(shared, CONTROL_SALT, CONTROL_READ_INFO)?,
        })
    }

    /// Split into per-direction halves so the writer and reader tasks each
    /// own their counter exclusively.
    ///
    /// # Errors
    ///
    /// Returns error if either key is rejected by the cipher
    pub fn split(&self) -> Result<(EncryptHalf, DecryptHalf), CryptoError> {
        Ok((
            EncryptHalf {
                cipher: ChaChaCipher::new(&self.encrypt_key)?,
                count: 0,
            },
            DecryptHalf {
                cipher: ChaChaCipher::new(&self.decrypt_key)?,
                count: 0,
            },
        ))
    }
}

/// Outbound record sealing; owned by writer code paths only
pub struct EncryptHalf {
    cipher: ChaChaCipher,
    count: u64,
}

impl EncryptHalf {
    /// Seal `data` into one or more records, advancing the counter per record
    ///
    /// # Errors
    ///
    /// Returns error if encryption fails
    pub fn encrypt(&mut self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut output =
            Vec::with_capacity(data.len() + (data.len() / PACKET_LENGTH_MAX + 1) * (2 + TAG_LENGTH));

        for chunk in data.chunks(PACKET_LENGTH_MAX) {
            let mut len_bytes = [0u8; 2];
            #[allow(clippy::cast_possible_truncation)]
            LittleEndian::write_u16(&mut len_bytes, chunk.len() as u16);

            let sealed = self
                .cipher
                .seal(&Nonce::from_counter(self.count), &len_bytes, chunk)?;
            self.count += 1;

            output.extend_from_slice(&len_bytes);
            output.extend_from_slice(&sealed);
        }

        Ok(output)
    }

    /// Records sealed so far
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Inbound record opening; owned by the reader task only
pub struct DecryptHalf {
    cipher: ChaChaCipher,
    count: u64,
}

impl DecryptHalf {
    /// Open one complete record (`length ‖ ciphertext ‖ tag`), advancing the
    /// counter. Returns the plaintext and whether the record terminates the
    /// current plaintext batch (`length < 1024`).
    ///
    /// # Errors
    ///
    /// Returns error if the record is malformed or the tag fails to verify;
    /// both are fatal to the session
    pub fn decrypt_record(&mut self, record: &[u8]) -> Result<(Vec<u8>, bool), CryptoError> {
        if record.len() < 2 + TAG_LENGTH {
            return Err(CryptoError::DecryptionFailed(
                "record too short".to_string(),
            ));
        }

        let length = LittleEndian::read_u16(&record[0..2]) as usize;
        if record.len() != 2 + length + TAG_LENGTH {
            return Err(CryptoError::DecryptionFailed(format!(
                "record length mismatch: header says {length}, got {}",
                record.len() - 2 - TAG_LENGTH
            )));
        }

        let plaintext =
            self.cipher
                .open(&Nonce::from_counter(self.count), &record[0..2], &record[2..])?;
        self.count += 1;

        Ok((plaintext, length < PACKET_LENGTH_MAX))
    }

    /// Assemble one logical plaintext batch from a buffer of complete
    /// records: records are opened in order until one with `length < 1024`
    /// closes the batch. Returns the plaintext and the bytes consumed, or
    /// `None` when the buffer does not yet hold a full batch (no counter is
    /// advanced in that case).
    ///
    /// # Errors
    ///
    /// Returns error if a record fails to verify
    pub fn decrypt_batch(
        &mut self,
        buffer: &[u8],
    ) -> Result<Option<(Vec<u8>, usize)>, CryptoError> {
        // first pass: find the batch end without touching the counter
        let mut pos = 0;
        loop {
            if buffer.len() < pos + 2 {
                return Ok(None);
            }
            let length = LittleEndian::read_u16(&buffer[pos..pos + 2]) as usize;
            let record_end = pos + 2 + length + TAG_LENGTH;
            if buffer.len() < record_end {
                return Ok(None);
            }
            pos = record_end;
            if length < PACKET_LENGTH_MAX {
                break;
            }
        }

        let mut plaintext = Vec::new();
        let mut cursor = 0;
        while cursor < pos {
            let length = LittleEndian::read_u16(&buffer[cursor..cursor + 2]) as usize;
            let record_end = cursor + 2 + length + TAG_LENGTH;
            let (chunk, _) = self.decrypt_record(&buffer[cursor..record_end])?;
            plaintext.extend_from_slice(&chunk);
            cursor = record_end;
        }

        Ok(Some((plaintext, pos)))
    }

    /// Records opened so far
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paired_halves() -> (EncryptHalf, DecryptHalf) {
        // same key both ways so encrypt output feeds straight into decrypt
        let keys = SessionKeys {
            encrypt_key: [0x11; 32],
            decrypt_key: [0x11; 32],
        };
        let (enc, _) = keys.split().unwrap();
        let (_, dec) = keys.split().unwrap();
        (enc, dec)
    }

    #[test]
    fn round_trip_small() {
        let (mut enc, mut dec) = paired_halves();

        let framed = enc.encrypt(b"GET /accessories HTTP/1.1\r\n\r\n").unwrap();
        let (plain, consumed) = dec.decrypt_batch(&framed).unwrap().unwrap();

        assert_eq!(plain, b"GET /accessories HTTP/1.1\r\n\r\n");
        assert_eq!(consumed, framed.len());
        assert_eq!(enc.count(), 1);
        assert_eq!(dec.count(), 1);
    }

    #[test]
    fn exact_1024_is_one_full_record() {
        let (mut enc, _) = paired_halves();

        let framed = enc.encrypt(&[0xAB; 1024]).unwrap();
        assert_eq!(enc.count(), 1);
        assert_eq!(framed.len(), 2 + 1024 + TAG_LENGTH);
        assert_eq!(LittleEndian::read_u16(&framed[0..2]), 1024);
    }

    #[test]
    fn boundary_1025_splits_into_1024_and_1() {
        let (mut enc, mut dec) = paired_halves();

        let data = vec![0xCD; 1025];
        let framed = enc.encrypt(&data).unwrap();
        assert_eq!(enc.count(), 2);
        assert_eq!(framed.len(), (2 + 1024 + TAG_LENGTH) + (2 + 1 + TAG_LENGTH));
        assert_eq!(LittleEndian::read_u16(&framed[0..2]), 1024);

        let second = &framed[2 + 1024 + TAG_LENGTH..];
        assert_eq!(LittleEndian::read_u16(&second[0..2]), 1);

        let (plain, consumed) = dec.decrypt_batch(&framed).unwrap().unwrap();
        assert_eq!(plain, data);
        assert_eq!(consumed, framed.len());
        assert_eq!(dec.count(), 2);
    }

    #[test]
    fn full_record_alone_is_not_a_complete_batch() {
        let (mut enc, mut dec) = paired_halves();

        let framed = enc.encrypt(&[0x01; 1024]).unwrap();
        // 1024-byte record leaves the batch open; counter must not move
        assert!(dec.decrypt_batch(&framed).unwrap().is_none());
        assert_eq!(dec.count(), 0);

        let tail = enc.encrypt(b"x").unwrap();
        let mut buffer = framed;
        buffer.extend_from_slice(&tail);

        let (plain, consumed) = dec.decrypt_batch(&buffer).unwrap().unwrap();
        assert_eq!(plain.len(), 1025);
        assert_eq!(consumed, buffer.len());
        assert_eq!(dec.count(), 2);
    }

    #[test]
    fn counters_run_zero_to_n() {
        let (mut enc, mut dec) = paired_halves();

        for i in 0..5u8 {
            let framed = enc.encrypt(&[i; 10]).unwrap();
            let (plain, _) = dec.decrypt_batch(&framed).unwrap().unwrap();
            assert_eq!(plain, vec![i; 10]);
        }
        assert_eq!(enc.count(), 5);
        assert_eq!(dec.count(), 5);
    }

    #[test]
    fn replayed_record_fails_to_verify() {
        let (mut enc, mut dec) = paired_halves();

        let first = enc.encrypt(b"one").unwrap();
        let (_, _) = dec.decrypt_batch(&first).unwrap().unwrap();

        // same bytes again: nonce 1 against a frame sealed with nonce 0
        assert!(dec.decrypt_batch(&first).is_err());
    }

    #[test]
    fn record_decrypt_reports_terminal_flag() {
        let (mut enc, mut dec) = paired_halves();

        let framed = enc.encrypt(&[0xEE; 1030]).unwrap();
        let first_len = 2 + 1024 + TAG_LENGTH;

        let (chunk, terminal) = dec.decrypt_record(&framed[..first_len]).unwrap();
        assert_eq!(chunk.len(), 1024);
        assert!(!terminal);

        let (chunk, terminal) = dec.decrypt_record(&framed[first_len..]).unwrap();
        assert_eq!(chunk.len(), 6);
        assert!(terminal);
    }

    #[test]
    fn directions_are_independent() {
        let keys = SessionKeys::from_shared_secret(&[0x42; 32]).unwrap();
        assert_ne!(keys.encrypt_key, keys.decrypt_key);

        let (mut enc, mut dec) = keys.split().unwrap();
        let framed = enc.encrypt(b"hello").unwrap();
        // sealed with the write key; the read key must reject it
        assert!(dec.decrypt_batch(&framed).is_err());
    }

    #[test]
    fn empty_payload_emits_no_records() {
        let (mut enc, _) = paired_halves();
        assert!(enc.encrypt(&[]).unwrap().is_empty());
        assert_eq!(enc.count(), 0);
    }
}
