use super::*;
use serde_json::json;

#[test]
fn to_short_strips_suffix_and_leading_zeros() {
    assert_eq!(
        HapType::from("0000003E-0000-1000-8000-0026BB765291").to_short().0,
        "3E"
    );
    assert_eq!(
        HapType::from("00000023-0000-1000-8000-0026BB765291").to_short().0,
        "23"
    );
    // already short: stable
    assert_eq!(HapType::from("3E").to_short().0, "3E");
    assert_eq!(HapType::from("121").to_short().0, "121");
    // no suffix, just padded
    assert_eq!(HapType::from("00000043").to_short().0, "43");
    // all zeros: unchanged
    assert_eq!(HapType::from("0000").to_short().0, "0000");
}

#[test]
fn matches_compares_canonical_forms() {
    let long = HapType::from("0000003E-0000-1000-8000-0026BB765291");
    assert!(long.matches("3E"));
    assert!(long.matches("0000003E"));
    assert!(!long.matches("3F"));
}

#[test]
fn display_uses_known_names() {
    assert_eq!(
        HapType::from("0000003E-0000-1000-8000-0026BB765291").to_string(),
        "AccessoryInfo"
    );
    assert_eq!(HapType::from("23").to_string(), "Name");
    assert_eq!(HapType::from("DEAD").to_string(), "DEAD");
}

#[test]
fn accessory_tree_parses_from_json() {
    let body = json!({
        "accessories": [{
            "aid": 1,
            "services": [{
                "iid": 1,
                "type": "3E",
                "characteristics": [{
                    "iid": 2,
                    "type": "23",
                    "value": "Bedroom Lamp",
                    "perms": ["pr"],
                    "format": "string"
                }, {
                    "iid": 5,
                    "type": "7C",
                    "value": 50,
                    "perms": ["pr", "pw", "ev"],
                    "format": "uint8",
                    "unit": "percentage",
                    "maxValue": 100,
                    "minValue": 0,
                    "minStep": 1
                }]
            }]
        }]
    })
    .to_string();

    let list: AccessoryList = serde_json::from_str(&body).unwrap();
    assert_eq!(list.accessories.len(), 1);

    let accessory = &list.accessories[0];
    let info = accessory.accessory_info_service().expect("info service");
    let name = info
        .characteristic(characteristic_types::NAME)
        .expect("name characteristic");
    assert_eq!(name.value, json!("Bedroom Lamp"));
    assert!(!name.supports_events());

    let position = info.characteristic("7C").unwrap();
    assert!(position.supports_events());
    assert_eq!(position.max_value, Some(json!(100)));
    assert_eq!(position.unit.as_deref(), Some("percentage"));
}

#[test]
fn characteristics_without_aid_default_to_zero() {
    let body = json!({
        "characteristics": [{ "iid": 10, "type": "25", "value": true, "perms": ["pr"] }]
    })
    .to_string();
    let payload: CharacteristicsPayload<Characteristic> = serde_json::from_str(&body).unwrap();
    assert_eq!(payload.characteristics[0].aid, 0);
    assert_eq!(payload.characteristics[0].iid, 10);
}

#[test]
fn value_write_serializes_to_wire_shape() {
    let payload =
        CharacteristicsPayload::new(vec![CharacteristicWrite::value(1, 10, json!(true))]);
    assert_eq!(
        serde_json::to_string(&payload).unwrap(),
        r#"{"characteristics":[{"aid":1,"iid":10,"value":true}]}"#
    );
}

#[test]
fn event_toggle_serializes_to_wire_shape() {
    let payload =
        CharacteristicsPayload::new(vec![CharacteristicWrite::events(1, 11, true)]);
    assert_eq!(
        serde_json::to_string(&payload).unwrap(),
        r#"{"characteristics":[{"aid":1,"iid":11,"ev":true}]}"#
    );
}

#[test]
fn sort_tree_orders_by_aid_and_type() {
    let mut accessories = vec![
        Accessory {
            aid: 2,
            services: vec![],
        },
        Accessory {
            aid: 1,
            services: vec![
                Service {
                    iid: 9,
                    service_type: HapType::from("43"),
                    characteristics: vec![],
                    hidden: None,
                    primary: None,
                    linked: None,
                },
                Service {
                    iid: 1,
                    service_type: HapType::from("3E"),
                    characteristics: vec![],
                    hidden: None,
                    primary: None,
                    linked: None,
                },
            ],
        },
    ];

    sort_tree(&mut accessories);
    assert_eq!(accessories[0].aid, 1);
    assert_eq!(accessories[0].services[0].service_type.0, "3E");
    assert_eq!(accessories[0].services[1].service_type.0, "43");
}

#[test]
fn known_type_tables_resolve_names() {
    assert_eq!(service_name(service_types::LIGHT_BULB), Some("LightBulb"));
    assert_eq!(
        characteristic_name(characteristic_types::BRIGHTNESS),
        Some("Brightness")
    );
    assert_eq!(service_name("ZZZ"), None);
    assert_eq!(characteristic_name("ZZZ"), None);
}
