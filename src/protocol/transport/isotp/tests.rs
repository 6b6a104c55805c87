//! PCI classification, Flow Control status, STmin decoding and round-trip tests.
use super::assembler::unwrap;
use super::builder::wrap;
use super::*;
use embassy_time::Duration;

#[test]
/// The upper nibble of the PCI selects the frame type.
fn test_frame_kind_from_pci() {
    assert_eq!(FrameKind::from_pci(0x05), FrameKind::Single);
    assert_eq!(FrameKind::from_pci(0x10), FrameKind::First);
    assert_eq!(FrameKind::from_pci(0x2F), FrameKind::Consecutive);
    assert_eq!(FrameKind::from_pci(0x30), FrameKind::FlowControl);
    assert_eq!(FrameKind::from_pci(0x7E), FrameKind::Unknown(0x7E));
    assert_eq!(FrameKind::of(&[]), None);
}

#[test]
/// Vendor status numbering: 0 continue, 1 reserved, 2 wait, 3 abort.
fn test_flow_status_vendor_numbering() {
    assert_eq!(FlowStatus::from_nibble(0x30), FlowStatus::ContinueToSend);
    assert_eq!(FlowStatus::from_nibble(0x31), FlowStatus::Reserved);
    assert_eq!(FlowStatus::from_nibble(0x32), FlowStatus::Wait);
    assert_eq!(FlowStatus::from_nibble(0x33), FlowStatus::Abort);
    assert_eq!(FlowStatus::from_nibble(0x3A), FlowStatus::Invalid(0x0A));
    assert_eq!(FlowStatus::Abort.to_nibble(), 0x3);
}

#[test]
/// STmin ranges: milliseconds, hundreds of microseconds, reserved values.
fn test_stmin_decoding() {
    assert_eq!(StMin::from_raw(0x00), StMin::None);
    assert_eq!(StMin::from_raw(0x0A), StMin::Millis(10));
    assert_eq!(StMin::from_raw(0x7F), StMin::Millis(127));
    assert_eq!(StMin::from_raw(0x80), StMin::None);
    assert_eq!(StMin::from_raw(0xF0), StMin::None);
    assert_eq!(StMin::from_raw(0xF1), StMin::Micros(100));
    assert_eq!(StMin::from_raw(0xF9), StMin::Micros(900));
    assert_eq!(StMin::from_raw(0xFA), StMin::None);

    assert_eq!(StMin::from_raw(0x05).as_duration(), Duration::from_millis(5));
    assert_eq!(StMin::from_raw(0xF3).as_duration(), Duration::from_micros(300));
    assert_eq!(StMin::None.as_duration(), Duration::from_ticks(0));
}

#[test]
/// Consecutive frame count derived from the declared length.
fn test_expected_consecutive_frames() {
    assert_eq!(expected_consecutive_frames(8), 1);
    assert_eq!(expected_consecutive_frames(13), 1);
    assert_eq!(expected_consecutive_frames(14), 2);
    assert_eq!(expected_consecutive_frames(35), 5);
    assert_eq!(expected_consecutive_frames(128), 18);
    assert_eq!(MAX_ISOTP_FRAMES, 19);
}

#[test]
/// The 12-bit length spans the low nibble of byte 0 and byte 1.
fn test_first_frame_length() {
    assert_eq!(first_frame_length(&[0x10, 0x0D, 0, 0, 0, 0, 0, 0]), Some(13));
    assert_eq!(first_frame_length(&[0x1F, 0xFF]), Some(4095));
    assert_eq!(first_frame_length(&[0x10]), None);
    assert_eq!(first_frame_length(&[0x05, 1, 2, 3, 4, 5]), None);
}

#[test]
/// Every payload length from 0 to 128 bytes survives wrap then unwrap.
fn test_round_trip_all_lengths() {
    let source: [u8; MAX_ISOTP_PAYLOAD] = core::array::from_fn(|i| (i as u8).wrapping_mul(31) ^ 0x5A);

    for len in 0..=MAX_ISOTP_PAYLOAD {
        let payload = &source[..len];
        let frames = wrap(payload, MAX_ISOTP_FRAMES).unwrap();
        let rebuilt = unwrap(frames.as_slice(), MAX_ISOTP_PAYLOAD).unwrap();
        assert_eq!(rebuilt.as_slice(), payload, "length {len}");
    }
}
