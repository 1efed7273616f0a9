use gd_core::types::*;

#[test]
fn device_id_requires_exactly_28_chars() {
    assert!(DeviceId::parse("2XsXatJ4DgdltTMcIcrC146aUNZ2").is_ok());
    assert_eq!(
        DeviceId::parse("short"),
        Err(CoreError::InvalidDeviceId(5))
    );
    assert!(DeviceId::parse(&"x".repeat(29)).is_err());
    assert!(DeviceId::parse("").is_err());
}

#[test]
fn device_id_counts_characters_not_bytes() {
    let id = "é".repeat(28);
    assert!(DeviceId::parse(&id).is_ok());
}

#[test]
fn door_state_range() {
    assert_eq!(DoorState::new(0).unwrap().code(), 0);
    assert_eq!(DoorState::new(100).unwrap().code(), 100);
    assert!(DoorState::new(101).is_err());
}

#[test]
fn door_state_from_number() {
    assert_eq!(DoorState::from_number(42.0).unwrap().code(), 42);
    assert!(DoorState::from_number(-1.0).is_err());
    assert!(DoorState::from_number(101.0).is_err());
    assert!(DoorState::from_number(4.5).is_err());
    assert!(DoorState::from_number(f64::NAN).is_err());
    assert!(DoorState::from_number(f64::INFINITY).is_err());
}

#[test]
fn door_state_position_mapping() {
    assert_eq!(DoorState::new(0).unwrap().position(), Some(DoorPosition::Open));
    assert_eq!(DoorState::new(1).unwrap().position(), Some(DoorPosition::Closed));
    assert_eq!(DoorState::new(42).unwrap().position(), None);
}

#[test]
fn command_paths_carry_leading_slash() {
    assert_eq!(DoorCommand::ActuateDoor.path(), "/ActuateDoor");
    assert_eq!(DoorCommand::HealthCheck.path(), "/HealthCheck");
    assert_eq!(DoorCommand::ForceHealthCheck.path(), "/ForceHealthCheck");
    assert_eq!(DoorCommand::ForceDoorStatusCheck.path(), "/ForceDoorStatusCheck");
}

#[test]
fn command_parses_from_names_and_paths() {
    assert_eq!("actuate-door".parse::<DoorCommand>().unwrap(), DoorCommand::ActuateDoor);
    assert_eq!("HealthCheck".parse::<DoorCommand>().unwrap(), DoorCommand::HealthCheck);
    assert_eq!(
        "/ForceDoorStatusCheck".parse::<DoorCommand>().unwrap(),
        DoorCommand::ForceDoorStatusCheck
    );
    assert!("open-sesame".parse::<DoorCommand>().is_err());
}

#[test]
fn command_serde_is_kebab_case() {
    let json = serde_json::to_string(&DoorCommand::ForceHealthCheck).unwrap();
    assert_eq!(json, "\"force-health-check\"");
}

#[test]
fn device_record_uses_wire_field_names() {
    let record = DeviceRecord {
        id: DeviceId::parse(&"A".repeat(28)).unwrap(),
        door_state: Some(DoorState::new(1).unwrap()),
        remote_ip_address: Some("203.0.113.7".into()),
        last_ip_update: Some(1_700_000_000_000),
    };
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["doorState"], 1);
    assert_eq!(value["remoteIPAddress"], "203.0.113.7");
    assert_eq!(value["lastIPUpdate"], 1_700_000_000_000i64);

    let back: DeviceRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
}

#[test]
fn device_record_rejects_bad_id_on_deserialize() {
    let value = serde_json::json!({
        "id": "too-short",
        "doorState": null,
        "remoteIPAddress": null,
        "lastIPUpdate": null
    });
    assert!(serde_json::from_value::<DeviceRecord>(value).is_err());
}
