//! ISO-TP (ISO 15765-2 subset) support: segments diagnostic payloads larger
//! than one classic CAN frame and rebuilds them on reception.
//!
//! ## PCI layout (byte 0, upper nibble)
//!
//! ```text
//! 0x0_  Single Frame       low nibble = payload length (0-7)
//! 0x1_  First Frame        low nibble + byte 1 = 12-bit total length
//! 0x2_  Consecutive Frame  low nibble = sequence number (1..15, 0, 1, ...)
//! 0x3_  Flow Control       low nibble = status, byte 1 = block size, byte 2 = STmin
//! ```
//!
//! Flow Control status numbering follows the polled ECU (0 = continue,
//! 2 = wait, 3 = abort), which differs from the ISO table.
pub mod assembler;
pub mod builder;
pub mod flow_control;

pub use crate::core::MAX_ISOTP_PAYLOAD;

/// Largest length a First Frame can declare (12 bits).
pub const MAX_DECLARED_LENGTH: usize = 0x0FFF;
/// Payload bytes carried by a Single Frame.
pub const SINGLE_FRAME_CAPACITY: usize = 7;
/// Payload bytes carried by a First Frame.
pub const FIRST_FRAME_CAPACITY: usize = 6;
/// Payload bytes carried by a Consecutive Frame.
pub const CONSECUTIVE_FRAME_CAPACITY: usize = 7;
/// Frames needed to carry [`MAX_ISOTP_PAYLOAD`] bytes.
pub const MAX_ISOTP_FRAMES: usize = frames_needed(MAX_ISOTP_PAYLOAD);

pub const PCI_SINGLE_FRAME: u8 = 0x00;
pub const PCI_FIRST_FRAME: u8 = 0x10;
pub const PCI_CONSECUTIVE_FRAME: u8 = 0x20;
pub const PCI_FLOW_CONTROL: u8 = 0x30;

//==================================================================================FRAME_KIND
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Frame type decoded from the PCI upper nibble.
pub enum FrameKind {
    Single,
    First,
    Consecutive,
    FlowControl,
    /// Upper nibble outside 0..=3 (raw PCI byte kept for diagnostics).
    Unknown(u8),
}

impl FrameKind {
    /// Classify a PCI byte.
    pub const fn from_pci(pci: u8) -> Self {
        match pci & 0xF0 {
            PCI_SINGLE_FRAME => FrameKind::Single,
            PCI_FIRST_FRAME => FrameKind::First,
            PCI_CONSECUTIVE_FRAME => FrameKind::Consecutive,
            PCI_FLOW_CONTROL => FrameKind::FlowControl,
            _ => FrameKind::Unknown(pci),
        }
    }

    /// Classify a frame's data bytes; empty frames are `None`.
    pub fn of(data: &[u8]) -> Option<Self> {
        data.first().map(|pci| Self::from_pci(*pci))
    }
}

//==================================================================================FLOW_STATUS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Flow Control status nibble.
pub enum FlowStatus {
    /// Sender may transmit the granted block (0).
    ContinueToSend,
    /// Reserved by the ECU, never acted upon (1).
    Reserved,
    /// Sender must keep listening for another Flow Control frame (2).
    Wait,
    /// Sender must cancel the transfer (3).
    Abort,
    /// Any other nibble.
    Invalid(u8),
}

impl FlowStatus {
    pub const fn from_nibble(status: u8) -> Self {
        match status & 0x0F {
            0x0 => FlowStatus::ContinueToSend,
            0x1 => FlowStatus::Reserved,
            0x2 => FlowStatus::Wait,
            0x3 => FlowStatus::Abort,
            other => FlowStatus::Invalid(other),
        }
    }

    pub const fn to_nibble(self) -> u8 {
        match self {
            FlowStatus::ContinueToSend => 0x0,
            FlowStatus::Reserved => 0x1,
            FlowStatus::Wait => 0x2,
            FlowStatus::Abort => 0x3,
            FlowStatus::Invalid(other) => other & 0x0F,
        }
    }
}

//==================================================================================STMIN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Minimum separation time between Consecutive Frames, as granted by the receiver.
pub enum StMin {
    /// No delay (0x00 and every value outside the encoded ranges).
    None,
    /// 0x01..=0x7F: whole milliseconds.
    Millis(u8),
    /// 0xF1..=0xF9: 100..=900 microseconds.
    Micros(u16),
}

impl StMin {
    /// Decode the raw Flow Control byte.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => StMin::None,
            0x01..=0x7F => StMin::Millis(raw),
            0xF1..=0xF9 => StMin::Micros((raw - 0xF0) as u16 * 100),
            _ => StMin::None,
        }
    }

    /// Interval to wait between two Consecutive Frames.
    pub fn as_duration(self) -> embassy_time::Duration {
        match self {
            StMin::None => embassy_time::Duration::from_ticks(0),
            StMin::Millis(ms) => embassy_time::Duration::from_millis(ms as u64),
            StMin::Micros(us) => embassy_time::Duration::from_micros(us as u64),
        }
    }
}

//==================================================================================HELPERS
/// Number of CAN frames needed to carry `payload_len` bytes.
pub const fn frames_needed(payload_len: usize) -> usize {
    if payload_len <= SINGLE_FRAME_CAPACITY {
        1
    } else {
        1 + expected_consecutive_frames(payload_len)
    }
}

/// Consecutive Frames following a First Frame that declares `total_len` bytes.
pub const fn expected_consecutive_frames(total_len: usize) -> usize {
    let remaining = total_len.saturating_sub(FIRST_FRAME_CAPACITY);
    remaining.div_ceil(CONSECUTIVE_FRAME_CAPACITY)
}

/// Total length declared by a First Frame (`None` when the frame is not one).
pub fn first_frame_length(data: &[u8]) -> Option<usize> {
    match (FrameKind::of(data)?, data.get(1)) {
        (FrameKind::First, Some(low)) => Some((((data[0] & 0x0F) as usize) << 8) | *low as usize),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
