//! Unit tests for the `CanFrame` helpers.
use super::*;

#[test]
/// Short driver frames keep their DLC and expose only the valid bytes.
fn test_new_short_frame() {
    let frame = CanFrame::new(StandardId::new(0x7E8).unwrap(), &[0x30, 0x02, 0x05]).unwrap();
    assert_eq!(frame.dlc(), 3);
    assert_eq!(frame.payload(), &[0x30, 0x02, 0x05]);
    assert_eq!(frame.pci(), Some(0x30));
    assert_eq!(frame.raw_id(), 0x7E8);
    assert!(!frame.is_extended());
}

#[test]
/// More than eight bytes cannot form a classic frame.
fn test_new_rejects_oversized_data() {
    assert!(CanFrame::new(StandardId::ZERO, &[0u8; 9]).is_none());
    assert!(CanFrame::new_remote(StandardId::ZERO, 8).is_none());
}

#[test]
/// An empty frame has no PCI byte.
fn test_empty_frame_has_no_pci() {
    let frame = CanFrame::new(StandardId::ZERO, &[]).unwrap();
    assert_eq!(frame.pci(), None);
}

#[test]
/// Driver `(raw, ide)` pairs map to the right identifier width.
fn test_id_from_raw() {
    assert_eq!(
        id_from_raw(0x7B8, false),
        Some(Id::Standard(StandardId::new(0x7B8).unwrap()))
    );
    assert_eq!(
        id_from_raw(0x18DA_F110, true),
        Some(Id::Extended(ExtendedId::new(0x18DA_F110).unwrap()))
    );
    assert_eq!(id_from_raw(0x800, false), None);
    assert_eq!(raw_id(Id::Extended(ExtendedId::MAX)), 0x1FFF_FFFF);
}
