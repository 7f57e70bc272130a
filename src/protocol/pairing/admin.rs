//! Pairing admin methods on `/pairings`: add, remove and list additional
//! controllers of a paired accessory. All run over the encrypted session.

use crate::error::{HapError, Result, TlvStatus};
use crate::protocol::tlv8::{Decoder, Encoder, Tag, methods, split_by_separator, states};
use crate::storage::Pairing;

/// Build `{state=1, method=3, identifier, publicKey, permissions}`
#[must_use]
pub fn add_pairing_request(pairing: &Pairing) -> Vec<u8> {
    Encoder::new()
        .add_state(states::M1)
        .add_method(methods::ADD_PAIRING)
        .add(Tag::Identifier, pairing.id.as_bytes())
        .add(Tag::PublicKey, &pairing.public_key)
        .add_byte(Tag::Permissions, pairing.permission)
        .build()
}

/// Build `{state=1, method=4, identifier}`
#[must_use]
pub fn remove_pairing_request(controller_id: &str) -> Vec<u8> {
    Encoder::new()
        .add_state(states::M1)
        .add_method(methods::DELETE_PAIRING)
        .add(Tag::Identifier, controller_id.as_bytes())
        .build()
}

/// Build `{state=1, method=5}`
#[must_use]
pub fn list_pairings_request() -> Vec<u8> {
    Encoder::new()
        .add_state(states::M1)
        .add_method(methods::LIST_PAIRINGS)
        .build()
}

/// Parse an add/remove reply: `{state=2, error?}`
///
/// # Errors
///
/// Returns error if the reply carries a non-zero error code
pub fn parse_admin_reply(data: &[u8]) -> Result<()> {
    let tlv = Decoder::decode(data)?;
    if tlv.error_code() != 0 {
        return Err(HapError::Accessory(TlvStatus::from_code(tlv.error_code())));
    }
    Ok(())
}

/// Parse a list-pairings reply.
///
/// Pairings are expected to be delimited by zero-length `0xFF` separator
/// records; a reply without separators parses as a single pairing, which is
/// what single-controller accessories actually send.
///
/// # Errors
///
/// Returns error on a non-zero error code or if no pairing can be decoded
pub fn parse_pairing_list(data: &[u8]) -> Result<Vec<Pairing>> {
    let outer = Decoder::decode(data)?;
    if outer.error_code() != 0 {
        return Err(HapError::Accessory(TlvStatus::from_code(outer.error_code())));
    }

    let mut pairings = Vec::new();
    for segment in split_by_separator(data)? {
        let tlv = Decoder::decode(segment)?;
        let (Some(identifier), Some(public_key)) =
            (tlv.get(Tag::Identifier), tlv.get(Tag::PublicKey))
        else {
            continue;
        };
        pairings.push(Pairing {
            id: String::from_utf8_lossy(identifier).to_string(),
            public_key: public_key.to_vec(),
            permission: tlv.get_byte(Tag::Permissions).unwrap_or(0),
        });
    }

    if pairings.is_empty() {
        return Err(HapError::Protocol(
            "list-pairings reply carried no pairings".to_string(),
        ));
    }
    Ok(pairings)
}
