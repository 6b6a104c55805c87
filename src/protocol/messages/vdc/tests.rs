//! VDC request layout and identifier-indexed decoding.
use super::*;

#[test]
/// Both identifiers decoded: direct scale for pressure, negated for steering.
fn test_decode_both_identifiers() {
    // 0x10 0x10 → 12.3 bar ; 0x10 0x29 → 0xFF9C = -100 raw → +10.0°
    let payload = [0x62, 0x10, 0x10, 0x00, 0x7B, 0x10, 0x29, 0xFF, 0x9C];
    let readings = VdcProfile.decode(&payload).unwrap();

    assert!((readings.brake_pressure_bar.unwrap() - 12.3).abs() < 1e-4);
    assert!((readings.steering_angle_deg.unwrap() - 10.0).abs() < 1e-4);
}

#[test]
/// Unknown identifiers and a trailing partial group are skipped.
fn test_decode_skips_unknown_and_partial() {
    let payload = [0x62, 0x20, 0x00, 0x12, 0x34, 0x10, 0x29, 0x00, 0x64, 0x10, 0x10, 0x00];
    let readings = VdcProfile.decode(&payload).unwrap();

    assert_eq!(readings.brake_pressure_bar, None);
    assert!((readings.steering_angle_deg.unwrap() + 10.0).abs() < 1e-4);
}

#[test]
/// Service mismatch, short payloads and unknown-only responses are errors.
fn test_decode_errors() {
    assert_eq!(
        VdcProfile.decode(&[0x7F, 0x22, 0x31]),
        Err(DecodeError::UnexpectedService {
            expected: 0x62,
            found: 0x7F
        })
    );
    assert_eq!(
        VdcProfile.decode(&[0x62, 0x10, 0x10]),
        Err(DecodeError::TooShort {
            needed: 5,
            found: 3
        })
    );
    assert_eq!(
        VdcProfile.decode(&[0x62, 0xAB, 0xCD, 0x00, 0x01]),
        Err(DecodeError::NoKnownIdentifier)
    );
}

#[test]
/// Request is the read-by-identifier service and the two identifiers.
fn test_build_request() {
    let mut out = [0u8; 8];
    assert_eq!(VdcProfile.build_request(&mut out), Ok(5));
    assert_eq!(&out[..5], &[0x22, 0x10, 0x10, 0x10, 0x29]);
}

#[test]
/// A buffer of exactly the request length is enough, one byte less is not.
fn test_build_request_buffer_bounds() {
    let mut exact = [0u8; 5];
    assert_eq!(VdcProfile.build_request(&mut exact), Ok(5));
    assert_eq!(exact, VDC_POLL_REQUEST);

    let mut short = [0xEEu8; 4];
    assert_eq!(
        VdcProfile.build_request(&mut short),
        Err(DecodeError::BufferTooSmall {
            needed: 5,
            available: 4
        })
    );
    assert_eq!(short, [0xEE; 4]);
}

#[test]
/// Only identifiers present in the response overwrite telemetry.
fn test_apply_partial() {
    let mut state = TelemetryState {
        brake_pressure_bar: 4.0,
        ..TelemetryState::ZERO
    };
    let readings = VdcReadings {
        brake_pressure_bar: None,
        steering_angle_deg: Some(-45.0),
    };
    VdcProfile.apply(&readings, &mut state);

    assert_eq!(state.brake_pressure_bar, 4.0);
    assert_eq!(state.steering_angle_deg, -45.0);
}
