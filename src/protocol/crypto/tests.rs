use super::*;

#[test]
fn chacha_seal_open_round_trip() {
    let key = [7u8; 32];
    let cipher = ChaChaCipher::new(&key).unwrap();

    let nonce = Nonce::from_counter(0);
    let sealed = cipher.seal(&nonce, b"\x05\x00", b"hello").unwrap();
    assert_eq!(sealed.len(), 5 + lengths::CHACHA_TAG);

    let opened = cipher.open(&nonce, b"\x05\x00", &sealed).unwrap();
    assert_eq!(opened, b"hello");
}

#[test]
fn chacha_open_rejects_wrong_aad() {
    let key = [7u8; 32];
    let cipher = ChaChaCipher::new(&key).unwrap();

    let nonce = Nonce::from_counter(3);
    let sealed = cipher.seal(&nonce, b"\x05\x00", b"hello").unwrap();
    assert!(cipher.open(&nonce, b"\x06\x00", &sealed).is_err());
}

#[test]
fn chacha_open_rejects_wrong_counter() {
    let key = [9u8; 32];
    let cipher = ChaChaCipher::new(&key).unwrap();

    let sealed = cipher.seal(&Nonce::from_counter(1), &[], b"payload").unwrap();
    assert!(cipher.open(&Nonce::from_counter(2), &[], &sealed).is_err());
}

#[test]
fn counter_nonce_is_little_endian_zero_prefixed() {
    let nonce = Nonce::from_counter(0x0102_0304);
    assert_eq!(
        nonce.as_bytes(),
        &[0, 0, 0, 0, 0x04, 0x03, 0x02, 0x01, 0, 0, 0, 0]
    );
}

#[test]
fn label_nonce_round_trip() {
    let key = [1u8; 32];
    let sealed = seal_with_label(&key, b"PS-Msg05", b"inner tlv").unwrap();
    let opened = open_with_label(&key, b"PS-Msg05", &sealed).unwrap();
    assert_eq!(opened, b"inner tlv");

    assert!(open_with_label(&key, b"PS-Msg06", &sealed).is_err());
}

#[test]
fn ed25519_sign_and_validate() {
    let keypair = LongTermKeyPair::generate();
    let signature = keypair.sign(b"device info material");

    validate_signature(&keypair.public_bytes(), b"device info material", &signature).unwrap();
    assert!(validate_signature(&keypair.public_bytes(), b"tampered", &signature).is_err());
}

#[test]
fn ed25519_restores_from_secret() {
    let keypair = LongTermKeyPair::generate();
    let restored = LongTermKeyPair::from_secret_bytes(&keypair.secret_bytes()).unwrap();
    assert_eq!(keypair.public_bytes(), restored.public_bytes());
}

#[test]
fn x25519_agreement() {
    let alice = EphemeralKeyPair::generate();
    let bob = EphemeralKeyPair::generate();

    let s1 = alice.shared_secret(&bob.public_bytes()).unwrap();
    let s2 = bob.shared_secret(&alice.public_bytes()).unwrap();
    assert_eq!(s1.as_bytes(), s2.as_bytes());
}

#[test]
fn hkdf_is_deterministic_and_domain_separated() {
    let shared = [0xABu8; 32];
    let write = hkdf_sha512(&shared, b"Control-Salt", b"Control-Write-Encryption-Key").unwrap();
    let read = hkdf_sha512(&shared, b"Control-Salt", b"Control-Read-Encryption-Key").unwrap();
    let again = hkdf_sha512(&shared, b"Control-Salt", b"Control-Write-Encryption-Key").unwrap();

    assert_eq!(write, again);
    assert_ne!(write, read);
}

#[test]
fn srp_full_exchange() {
    let salt = [0x42u8; 16];
    let server = SrpServer::new(b"Pair-Setup", b"031-45-154", &salt).unwrap();

    let client = SrpClient::new().unwrap();
    let verifier = client
        .process_challenge(b"Pair-Setup", b"031-45-154", &salt, &server.public_key())
        .unwrap();

    let (m2, server_key) = server
        .verify_client(client.public_key(), verifier.client_proof())
        .unwrap();
    let client_key = verifier.verify_server(&m2).unwrap();

    assert_eq!(client_key.as_bytes(), server_key.as_bytes());
    assert_eq!(client_key.as_bytes().len(), 64);
}

#[test]
fn srp_rejects_wrong_pin() {
    let salt = [0x42u8; 16];
    let server = SrpServer::new(b"Pair-Setup", b"031-45-154", &salt).unwrap();

    let client = SrpClient::new().unwrap();
    let verifier = client
        .process_challenge(b"Pair-Setup", b"111-11-111", &salt, &server.public_key())
        .unwrap();

    assert!(
        server
            .verify_client(client.public_key(), verifier.client_proof())
            .is_err()
    );
}

#[test]
fn srp_rejects_zero_server_key() {
    let client = SrpClient::new().unwrap();
    let zero = vec![0u8; 384];
    assert!(
        client
            .process_challenge(b"Pair-Setup", b"031-45-154", &[1u8; 16], &zero)
            .is_err()
    );
}
