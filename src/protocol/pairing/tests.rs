use super::*;
use crate::error::{HapError, TlvStatus};
use crate::protocol::crypto::LongTermKeyPair;
use crate::protocol::tlv8::{Decoder, Encoder, Tag, states};
use crate::storage::Pairing;
use crate::testing::PairingResponder;

const PIN: &str = "031-45-154";
const CONTROLLER_ID: &str = "hkontrol";

fn controller_keys() -> LongTermKeyPair {
    LongTermKeyPair::generate()
}

#[test]
fn pair_setup_full_exchange() {
    let keys = controller_keys();
    let mut accessory = PairingResponder::new("Acme Light 1A2B", PIN);
    let mut setup = PairSetup::new(CONTROLLER_ID, &keys.secret_bytes(), PIN).unwrap();

    let m1 = setup.m1().unwrap();
    let m2 = accessory.handle_pair_setup(&m1).unwrap();
    let m3 = setup.process_m2(&m2).unwrap();
    let m4 = accessory.handle_pair_setup(&m3).unwrap();
    let m5 = setup.process_m4(&m4).unwrap();
    let m6 = accessory.handle_pair_setup(&m5).unwrap();
    let result = setup.process_m6(&m6).unwrap();

    assert_eq!(result.accessory_id, "Acme Light 1A2B");
    assert_eq!(result.accessory_ltpk, accessory.accessory_ltpk().to_vec());

    // the accessory learned our identity in M5
    assert_eq!(accessory.controller_id().as_deref(), Some(CONTROLLER_ID));
    assert_eq!(
        accessory.controller_ltpk().unwrap(),
        keys.public_bytes().to_vec()
    );
}

#[test]
fn pair_setup_wrong_pin_is_authentication_error() {
    let keys = controller_keys();
    let mut accessory = PairingResponder::new("Acme Light 1A2B", PIN);
    let mut setup = PairSetup::new(CONTROLLER_ID, &keys.secret_bytes(), "999-99-999").unwrap();

    let m1 = setup.m1().unwrap();
    let m2 = accessory.handle_pair_setup(&m1).unwrap();
    let m3 = setup.process_m2(&m2).unwrap();
    let m4 = accessory.handle_pair_setup(&m3).unwrap();

    match setup.process_m4(&m4) {
        Err(HapError::Accessory(TlvStatus::Authentication)) => {}
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[test]
fn pair_setup_rejects_out_of_order_messages() {
    let keys = controller_keys();
    let mut setup = PairSetup::new(CONTROLLER_ID, &keys.secret_bytes(), PIN).unwrap();

    let reply = Encoder::new().add_state(states::M4).build();
    assert!(matches!(
        setup.process_m4(&reply),
        Err(HapError::Protocol(_))
    ));
}

#[test]
fn pair_setup_surfaces_m2_error_code() {
    let keys = controller_keys();
    let mut setup = PairSetup::new(CONTROLLER_ID, &keys.secret_bytes(), PIN).unwrap();
    let _ = setup.m1().unwrap();

    // busy accessory: {state=2, error=7}
    let m2 = Encoder::new()
        .add_state(states::M2)
        .add_byte(Tag::Error, 0x07)
        .build();
    match setup.process_m2(&m2) {
        Err(HapError::Accessory(TlvStatus::Busy)) => {}
        other => panic!("expected busy, got {other:?}"),
    }
}

#[test]
fn pair_verify_full_exchange() {
    let keys = controller_keys();
    let mut accessory = PairingResponder::new("Acme Light 1A2B", PIN);
    accessory.set_controller(CONTROLLER_ID, &keys.public_bytes());

    let mut verify = PairVerify::new(
        CONTROLLER_ID,
        &keys.secret_bytes(),
        &accessory.accessory_ltpk(),
    )
    .unwrap();

    let m1 = verify.m1().unwrap();
    let (m2, shared) = accessory.handle_pair_verify(&m1).unwrap();
    assert!(shared.is_none());

    let m3 = verify.process_m2(&m2).unwrap();
    let (m4, accessory_shared) = accessory.handle_pair_verify(&m3).unwrap();
    let controller_shared = verify.process_m4(&m4).unwrap();

    // both ends arrive at the same session secret
    assert_eq!(accessory_shared.unwrap(), controller_shared);
}

#[test]
fn pair_verify_rejects_wrong_accessory_key() {
    let keys = controller_keys();
    let mut accessory = PairingResponder::new("Acme Light 1A2B", PIN);
    accessory.set_controller(CONTROLLER_ID, &keys.public_bytes());

    // pairing record from some other accessory
    let impostor = LongTermKeyPair::generate();
    let mut verify =
        PairVerify::new(CONTROLLER_ID, &keys.secret_bytes(), &impostor.public_bytes()).unwrap();

    let m1 = verify.m1().unwrap();
    let (m2, _) = accessory.handle_pair_verify(&m1).unwrap();
    assert!(verify.process_m2(&m2).is_err());
}

#[test]
fn pair_verify_unknown_controller_gets_auth_error() {
    let keys = controller_keys();
    let mut accessory = PairingResponder::new("Acme Light 1A2B", PIN);
    // accessory knows a different controller
    let other = LongTermKeyPair::generate();
    accessory.set_controller("someone-else", &other.public_bytes());

    let mut verify = PairVerify::new(
        CONTROLLER_ID,
        &keys.secret_bytes(),
        &accessory.accessory_ltpk(),
    )
    .unwrap();

    let m1 = verify.m1().unwrap();
    let (m2, _) = accessory.handle_pair_verify(&m1).unwrap();
    let m3 = verify.process_m2(&m2).unwrap();
    let (m4, shared) = accessory.handle_pair_verify(&m3).unwrap();
    assert!(shared.is_none());

    match verify.process_m4(&m4) {
        Err(HapError::Accessory(TlvStatus::Authentication)) => {}
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[test]
fn admin_request_shapes() {
    let add = add_pairing_request(&Pairing {
        id: "second-controller".to_string(),
        public_key: vec![0x44; 32],
        permission: 1,
    });
    let tlv = Decoder::decode(&add).unwrap();
    assert_eq!(tlv.state().unwrap(), states::M1);
    assert_eq!(tlv.get_byte(Tag::Method), Some(3));
    assert_eq!(tlv.get(Tag::Identifier).unwrap(), b"second-controller");
    assert_eq!(tlv.get_byte(Tag::Permissions), Some(1));

    let remove = remove_pairing_request("hkontrol");
    let tlv = Decoder::decode(&remove).unwrap();
    assert_eq!(tlv.get_byte(Tag::Method), Some(4));
    assert_eq!(tlv.get(Tag::Identifier).unwrap(), b"hkontrol");

    let list = list_pairings_request();
    let tlv = Decoder::decode(&list).unwrap();
    assert_eq!(tlv.get_byte(Tag::Method), Some(5));
}

#[test]
fn admin_reply_error_maps_to_status() {
    let reply = Encoder::new()
        .add_state(states::M2)
        .add_byte(Tag::Error, 0x04)
        .build();
    match parse_admin_reply(&reply) {
        Err(HapError::Accessory(TlvStatus::MaxPeers)) => {}
        other => panic!("expected max-peers, got {other:?}"),
    }
}

#[test]
fn pairing_list_parses_separated_records() {
    let reply = Encoder::new()
        .add_state(states::M2)
        .add(Tag::Identifier, b"controller-a")
        .add(Tag::PublicKey, &[0x01; 32])
        .add_byte(Tag::Permissions, 1)
        .add_separator()
        .add(Tag::Identifier, b"controller-b")
        .add(Tag::PublicKey, &[0x02; 32])
        .add_byte(Tag::Permissions, 0)
        .build();

    let pairings = parse_pairing_list(&reply).unwrap();
    assert_eq!(pairings.len(), 2);
    assert_eq!(pairings[0].id, "controller-a");
    assert_eq!(pairings[0].permission, 1);
    assert_eq!(pairings[1].id, "controller-b");
    assert_eq!(pairings[1].public_key, vec![0x02; 32]);
}

#[test]
fn pairing_list_falls_back_to_single_record() {
    let reply = Encoder::new()
        .add_state(states::M2)
        .add(Tag::Identifier, b"only-controller")
        .add(Tag::PublicKey, &[0x09; 32])
        .add_byte(Tag::Permissions, 1)
        .build();

    let pairings = parse_pairing_list(&reply).unwrap();
    assert_eq!(pairings.len(), 1);
    assert_eq!(pairings[0].id, "only-controller");
}
