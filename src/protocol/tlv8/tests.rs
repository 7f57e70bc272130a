use super::*;

#[test]
fn encode_state_and_method() {
    let encoded = Encoder::new().add_state(1).add_method(0).build();

    assert_eq!(
        encoded,
        vec![
            0x06, 0x01, 0x01, // State = 1
            0x00, 0x01, 0x00, // Method = 0
        ]
    );
}

#[test]
fn decode_round_trip() {
    let encoded = Encoder::new()
        .add_state(2)
        .add(Tag::Salt, &[0xAA; 16])
        .add(Tag::PublicKey, &[0xBB; 32])
        .build();

    let decoded = Decoder::decode(&encoded).unwrap();
    assert_eq!(decoded.state().unwrap(), 2);
    assert_eq!(decoded.get(Tag::Salt).unwrap(), &[0xAA; 16]);
    assert_eq!(decoded.get(Tag::PublicKey).unwrap(), &[0xBB; 32]);
    assert_eq!(decoded.error_code(), 0);
}

#[test]
fn long_value_fragments_and_reassembles() {
    // 384-byte SRP public key needs two fragments
    let value: Vec<u8> = (0..384u16).map(|i| (i % 251) as u8).collect();
    let encoded = Encoder::new().add(Tag::PublicKey, &value).build();

    // tag+len per 255-byte fragment: 255 + 129 bytes of value
    assert_eq!(encoded.len(), 2 + 255 + 2 + 129);
    assert_eq!(encoded[0], Tag::PublicKey as u8);
    assert_eq!(encoded[1], 255);
    assert_eq!(encoded[2 + 255], Tag::PublicKey as u8);
    assert_eq!(encoded[2 + 255 + 1], 129);

    let decoded = Decoder::decode(&encoded).unwrap();
    assert_eq!(decoded.get(Tag::PublicKey).unwrap(), value.as_slice());
}

#[test]
fn boundary_255_single_fragment() {
    let value = vec![0x11u8; 255];
    let encoded = Encoder::new().add(Tag::EncryptedData, &value).build();
    assert_eq!(encoded.len(), 2 + 255);

    let decoded = Decoder::decode(&encoded).unwrap();
    assert_eq!(decoded.get(Tag::EncryptedData).unwrap().len(), 255);
}

#[test]
fn empty_value_encodes_zero_length_record() {
    let encoded = Encoder::new().add(Tag::Identifier, &[]).build();
    assert_eq!(encoded, vec![0x01, 0x00]);

    let decoded = Decoder::decode(&encoded).unwrap();
    assert_eq!(decoded.get(Tag::Identifier).unwrap(), &[] as &[u8]);
}

#[test]
fn truncated_buffer_is_rejected() {
    assert!(Decoder::decode(&[0x06]).is_err());
    assert!(Decoder::decode(&[0x06, 0x02, 0x01]).is_err());
}

#[test]
fn missing_required_field() {
    let decoded = Decoder::decode(&[0x06, 0x01, 0x02]).unwrap();
    assert!(matches!(
        decoded.get_required(Tag::PublicKey),
        Err(TlvError::MissingField(Tag::PublicKey))
    ));
}

#[test]
fn separator_splits_list_reply() {
    let encoded = Encoder::new()
        .add(Tag::Identifier, b"controller-a")
        .add(Tag::PublicKey, &[0x01; 32])
        .add_byte(Tag::Permissions, 1)
        .add_separator()
        .add(Tag::Identifier, b"controller-b")
        .add(Tag::PublicKey, &[0x02; 32])
        .add_byte(Tag::Permissions, 0)
        .build();

    let segments = split_by_separator(&encoded).unwrap();
    assert_eq!(segments.len(), 2);

    let first = Decoder::decode(segments[0]).unwrap();
    assert_eq!(first.get(Tag::Identifier).unwrap(), b"controller-a");
    let second = Decoder::decode(segments[1]).unwrap();
    assert_eq!(second.get(Tag::Identifier).unwrap(), b"controller-b");
    assert_eq!(second.get_byte(Tag::Permissions), Some(0));
}

#[test]
fn no_separator_yields_single_segment() {
    let encoded = Encoder::new()
        .add(Tag::Identifier, b"only-one")
        .add(Tag::PublicKey, &[0x03; 32])
        .build();

    let segments = split_by_separator(&encoded).unwrap();
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0], encoded.as_slice());
}
