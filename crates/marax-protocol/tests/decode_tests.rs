//! ---
//! marax_section: "01-protocol"
//! marax_subsection: "tests"
//! marax_type: "source"
//! marax_scope: "code"
//! marax_description: "Decoder behaviour against known device records."
//! marax_version: "v0.1.0"
//! marax_owner: "tbd"
//! ---
use marax_protocol::{decode, DecodeError, MachineMode, MachineStatus, StatusField};

fn status(
    mode: MachineMode,
    version: &str,
    temps: [u16; 4],
    heating: bool,
) -> MachineStatus {
    MachineStatus {
        version: version.to_owned(),
        mode,
        steam_temp: temps[0],
        steam_target_temp: temps[1],
        hx_temp: temps[2],
        ready_countdown: temps[3],
        heating,
    }
}

#[test]
fn coffee_record_decodes() {
    let decoded = decode(b"C1.23,068,120,054,0820,1").expect("valid record");
    assert_eq!(
        decoded,
        status(MachineMode::Coffee, "1.23", [68, 120, 54, 820], true)
    );
}

#[test]
fn steam_record_decodes() {
    let decoded = decode(b"V2.0,100,140,060,0000,0").expect("valid record");
    assert_eq!(
        decoded,
        status(MachineMode::Steam, "2.0", [100, 140, 60, 0], false)
    );
}

#[test]
fn decoding_is_deterministic() {
    let line = b"C1.23,068,120,054,0820,1\r\n";
    assert_eq!(decode(line).unwrap(), decode(line).unwrap());
}

#[test]
fn unknown_mode_tag_falls_back_to_coffee() {
    for line in ["X1.0,068,120,054,0820,1", "c1.0,068,120,054,0820,1", "71.0,068,120,054,0820,1"] {
        let decoded = decode(line.as_bytes()).expect("unknown tags are not errors");
        assert_eq!(decoded.mode, MachineMode::Coffee, "{line}");
        assert_eq!(decoded.version, "1.0");
    }
}

#[test]
fn crlf_and_lf_terminators_are_equivalent() {
    let bare = decode(b"C1.23,068,120,054,0820,1").unwrap();
    assert_eq!(decode(b"C1.23,068,120,054,0820,1\r\n").unwrap(), bare);
    assert_eq!(decode(b"C1.23,068,120,054,0820,1\n").unwrap(), bare);
}

#[test]
fn wrong_field_count_is_structural() {
    let err = decode(b"1,2,3,4,5").unwrap_err();
    assert!(err.is_structural());
    assert!(matches!(err, DecodeError::FieldCount { found: 5, .. }));
    assert!(err.to_string().contains("1,2,3,4,5"), "{err}");

    let err = decode(b"C1.23,068,120,054,0820,1,extra").unwrap_err();
    assert!(matches!(err, DecodeError::FieldCount { found: 7, .. }));

    let err = decode(b"").unwrap_err();
    assert!(matches!(err, DecodeError::FieldCount { found: 1, .. }));
}

#[test]
fn short_mode_token_is_structural() {
    let err = decode(b"C,068,120,054,0820,1").unwrap_err();
    assert!(err.is_structural());
    assert!(matches!(err, DecodeError::ModeVersion { .. }));
    assert!(err.to_string().contains("C,068,120,054,0820,1"), "{err}");

    let err = decode(b",068,120,054,0820,1").unwrap_err();
    assert!(matches!(err, DecodeError::ModeVersion { .. }));
}

#[test]
fn bad_integer_names_its_field() {
    let err = decode(b"C1.23,abc,120,054,0820,1").unwrap_err();
    assert!(!err.is_structural());
    assert_eq!(err.field(), Some(StatusField::SteamTemp));
    assert!(err.to_string().contains("steam_temp"), "{err}");

    let err = decode(b"C1.23,068,120,054,08x0,1").unwrap_err();
    assert_eq!(err.field(), Some(StatusField::ReadyCountdown));
}

#[test]
fn out_of_range_integers_are_rejected() {
    let err = decode(b"C1.23,70000,120,054,0820,1").unwrap_err();
    assert_eq!(err.field(), Some(StatusField::SteamTemp));

    let err = decode(b"C1.23,068,120,-54,0820,1").unwrap_err();
    assert_eq!(err.field(), Some(StatusField::HxTemp));

    let decoded = decode(b"C1.23,068,120,054,65535,1").unwrap();
    assert_eq!(decoded.ready_countdown, u16::MAX);
}

#[test]
fn bad_heating_flag_fails_the_whole_record() {
    let err = decode(b"C1.23,068,120,054,0820,yes").unwrap_err();
    assert_eq!(err.field(), Some(StatusField::Heating));
    assert!(matches!(err, DecodeError::InvalidFlag { .. }));
}

#[test]
fn textual_flags_are_accepted() {
    assert!(decode(b"C1.23,068,120,054,0820,TRUE").unwrap().heating);
    assert!(!decode(b"C1.23,068,120,054,0820,false").unwrap().heating);
}

#[test]
fn invalid_utf8_does_not_panic() {
    let err = decode(b"C1.23,0\xff8,120,054,0820,1").unwrap_err();
    assert_eq!(err.field(), Some(StatusField::SteamTemp));
}
