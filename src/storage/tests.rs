use super::*;

#[test]
fn keypair_round_trip() {
    let store = TypedStore::new(Box::new(MemStore::new()));
    assert!(store.keypair().unwrap().is_none());

    let keypair = KeyPair {
        public: vec![1u8; 32],
        private: vec![2u8; 32],
    };
    store.save_keypair(&keypair).unwrap();
    assert_eq!(store.keypair().unwrap().unwrap(), keypair);
}

#[test]
fn pairing_round_trip_and_delete() {
    let store = TypedStore::new(Box::new(MemStore::new()));

    let pairing = Pairing {
        id: "Acme Bridge 1A:2B:3C".to_string(),
        public_key: vec![7u8; 32],
        permission: permissions::ADMIN,
    };
    store.save_pairing(&pairing).unwrap();

    assert_eq!(store.pairing(&pairing.id).unwrap().unwrap(), pairing);
    assert_eq!(store.pairings().unwrap(), vec![pairing.clone()]);

    store.delete_pairing(&pairing.id).unwrap();
    assert!(store.pairing(&pairing.id).unwrap().is_none());
    assert!(store.pairings().unwrap().is_empty());
}

#[test]
fn pairing_keys_are_hex_encoded() {
    let raw = MemStore::new();
    let expected_key = format!("{}.pairing", hex::encode("a:b".as_bytes()));

    {
        let store = TypedStore::new(Box::new(raw));
        store
            .save_pairing(&Pairing {
                id: "a:b".to_string(),
                public_key: vec![],
                permission: 0,
            })
            .unwrap();

        // round-trips through the wrapper
        assert!(store.pairing("a:b").unwrap().is_some());

        // and the raw key carries no colon
        assert!(!expected_key.contains(':'));
    }
}

#[test]
fn fs_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    let pairing = Pairing {
        id: "Kitchen Light._hap._tcp.local.".to_string(),
        public_key: vec![0xAB; 32],
        permission: permissions::REGULAR,
    };

    {
        let store = TypedStore::new(Box::new(FsStore::new(dir.path()).unwrap()));
        store.save_pairing(&pairing).unwrap();
        store
            .save_keypair(&KeyPair {
                public: vec![1; 32],
                private: vec![2; 32],
            })
            .unwrap();
    }

    let store = TypedStore::new(Box::new(FsStore::new(dir.path()).unwrap()));
    assert_eq!(store.pairing(&pairing.id).unwrap().unwrap(), pairing);
    assert!(store.keypair().unwrap().is_some());
}

#[test]
fn fs_store_lists_only_matching_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path()).unwrap();

    store.set("aa.pairing", b"{}").unwrap();
    store.set("bb.pairing", b"{}").unwrap();
    store.set("keypair", b"{}").unwrap();

    let mut keys = store.keys_with_suffix(".pairing").unwrap();
    keys.sort();
    assert_eq!(keys, vec!["aa.pairing", "bb.pairing"]);
}

#[test]
fn fs_delete_missing_key_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path()).unwrap();
    store.delete("nonexistent").unwrap();
}
