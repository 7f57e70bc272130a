//! TLV8 encoding for the HAP pairing protocol
//!
//! Each record is `tag(1) ‖ len(1) ‖ value(len)`. Values longer than 255
//! bytes are split into consecutive records with the same tag and
//! concatenated again on decode.

use std::collections::HashMap;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// TLV tag numbers used by HAP pairing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Pairing method
    Method = 0x00,
    /// Pairing identifier
    Identifier = 0x01,
    /// Salt for SRP
    Salt = 0x02,
    /// Public key (SRP `A`/`B`, Curve25519, or Ed25519 LTPK)
    PublicKey = 0x03,
    /// SRP proof
    Proof = 0x04,
    /// ChaCha20-Poly1305 sealed sub-TLV
    EncryptedData = 0x05,
    /// Pairing state (M1..M6)
    State = 0x06,
    /// Error code
    Error = 0x07,
    /// Seconds to wait before retrying
    RetryDelay = 0x08,
    /// Certificate
    Certificate = 0x09,
    /// Ed25519 signature
    Signature = 0x0A,
    /// Pairing permissions
    Permissions = 0x0B,
    /// Fragment data
    FragmentData = 0x0C,
    /// Fragment last
    FragmentLast = 0x0D,
    /// Zero-length separator between list items
    Separator = 0xFF,
}

/// TLV encoding errors
#[derive(Debug, Error)]
pub enum TlvError {
    #[error("truncated TLV record")]
    Truncated,

    #[error("missing required field: {0:?}")]
    MissingField(Tag),

    #[error("invalid value for {0:?}")]
    InvalidValue(Tag),
}

/// TLV encoder with builder-style item appending
pub struct Encoder {
    buffer: Vec<u8>,
}

impl Encoder {
    /// Create a new encoder
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Append a record, fragmenting values longer than 255 bytes
    #[must_use]
    pub fn add(mut self, tag: Tag, value: &[u8]) -> Self {
        if value.is_empty() {
            self.buffer.push(tag as u8);
            self.buffer.push(0);
            return self;
        }

        for chunk in value.chunks(255) {
            self.buffer.push(tag as u8);
            #[allow(clippy::cast_possible_truncation)]
            self.buffer.push(chunk.len() as u8);
            self.buffer.extend_from_slice(chunk);
        }

        self
    }

    /// Append a single-byte record
    #[must_use]
    pub fn add_byte(self, tag: Tag, value: u8) -> Self {
        self.add(tag, &[value])
    }

    /// Append the pairing state record
    #[must_use]
    pub fn add_state(self, state: u8) -> Self {
        self.add_byte(Tag::State, state)
    }

    /// Append the pairing method record
    #[must_use]
    pub fn add_method(self, method: u8) -> Self {
        self.add_byte(Tag::Method, method)
    }

    /// Append a zero-length separator record
    #[must_use]
    pub fn add_separator(self) -> Self {
        self.add(Tag::Separator, &[])
    }

    /// Finish, returning the encoded bytes
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.buffer
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

/// TLV decoder: concatenates fragmented values per tag
pub struct Decoder {
    items: HashMap<u8, Vec<u8>>,
}

impl Decoder {
    /// Decode a complete TLV buffer
    ///
    /// # Errors
    ///
    /// Returns error if a record header or value runs past the buffer end
    pub fn decode(data: &[u8]) -> Result<Self, TlvError> {
        let mut items: HashMap<u8, Vec<u8>> = HashMap::new();
        let mut pos = 0;

        while pos < data.len() {
            if pos + 2 > data.len() {
                return Err(TlvError::Truncated);
            }

            let tag = data[pos];
            let length = data[pos + 1] as usize;
            pos += 2;

            if pos + length > data.len() {
                return Err(TlvError::Truncated);
            }

            items
                .entry(tag)
                .or_default()
                .extend_from_slice(&data[pos..pos + length]);
            pos += length;
        }

        Ok(Self { items })
    }

    /// Get a value by tag
    #[must_use]
    pub fn get(&self, tag: Tag) -> Option<&[u8]> {
        self.items.get(&(tag as u8)).map(Vec::as_slice)
    }

    /// Get a single-byte value
    #[must_use]
    pub fn get_byte(&self, tag: Tag) -> Option<u8> {
        self.get(tag).and_then(|v| v.first().copied())
    }

    /// Get a required value
    ///
    /// # Errors
    ///
    /// Returns error if the field is missing
    pub fn get_required(&self, tag: Tag) -> Result<&[u8], TlvError> {
        self.get(tag).ok_or(TlvError::MissingField(tag))
    }

    /// Get the state record
    ///
    /// # Errors
    ///
    /// Returns error if the state is missing or not a single byte
    pub fn state(&self) -> Result<u8, TlvError> {
        let value = self.get_required(Tag::State)?;
        if value.len() != 1 {
            return Err(TlvError::InvalidValue(Tag::State));
        }
        Ok(value[0])
    }

    /// Error code, `0x00` meaning success
    #[must_use]
    pub fn error_code(&self) -> u8 {
        self.get_byte(Tag::Error).unwrap_or(0)
    }
}

/// Split a TLV stream into segments delimited by zero-length `0xFF`
/// separator records, for multi-item replies such as pairing lists.
///
/// Without any separator the whole buffer comes back as one segment.
///
/// # Errors
///
/// Returns error if a record runs past the buffer end
pub fn split_by_separator(data: &[u8]) -> Result<Vec<&[u8]>, TlvError> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < data.len() {
        if pos + 2 > data.len() {
            return Err(TlvError::Truncated);
        }
        let tag = data[pos];
        let length = data[pos + 1] as usize;
        if pos + 2 + length > data.len() {
            return Err(TlvError::Truncated);
        }

        if tag == Tag::Separator as u8 && length == 0 {
            segments.push(&data[start..pos]);
            start = pos + 2;
        }
        pos += 2 + length;
    }

    if start < data.len() || segments.is_empty() {
        segments.push(&data[start..]);
    }

    Ok(segments)
}

/// Pairing method codes (tag 0)
pub mod methods {
    /// Pair-Setup
    pub const PAIR_SETUP: u8 = 0;
    /// Pair-Setup with MFi auth
    pub const PAIR_SETUP_AUTH: u8 = 1;
    /// Pair-Verify
    pub const PAIR_VERIFY: u8 = 2;
    /// Add pairing
    pub const ADD_PAIRING: u8 = 3;
    /// Remove pairing
    pub const DELETE_PAIRING: u8 = 4;
    /// List pairings
    pub const LIST_PAIRINGS: u8 = 5;
}

/// Pairing state numbers (tag 6)
pub mod states {
    pub const M1: u8 = 1;
    pub const M2: u8 = 2;
    pub const M3: u8 = 3;
    pub const M4: u8 = 4;
    pub const M5: u8 = 5;
    pub const M6: u8 = 6;
}
