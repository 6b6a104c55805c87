//! In-memory representation of a classic CAN frame as exchanged with the driver.
use embedded_can::{ExtendedId, Frame, Id, StandardId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Raw CAN frame: identifier (11 or 29 bits), up to eight data bytes.
pub struct CanFrame {
    /// Standard or extended identifier.
    pub id: Id,
    /// Payload buffer. Bytes past `len` are unused.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl Default for CanFrame {
    fn default() -> Self {
        Self {
            id: Id::Standard(StandardId::ZERO),
            data: [0; 8],
            len: 0,
        }
    }
}

impl CanFrame {
    /// Full eight-byte frame, the shape used for every ISO-TP data frame we transmit.
    pub fn padded(id: impl Into<Id>, data: [u8; 8]) -> Self {
        Self {
            id: id.into(),
            data,
            len: 8,
        }
    }

    /// Numeric identifier irrespective of its width.
    pub fn raw_id(&self) -> u32 {
        raw_id(self.id)
    }

    /// First data byte (ISO-TP PCI), if any.
    pub fn pci(&self) -> Option<u8> {
        self.payload().first().copied()
    }

    /// Valid data bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len.min(8)]
    }
}

impl AsRef<[u8]> for CanFrame {
    fn as_ref(&self) -> &[u8] {
        self.payload()
    }
}

impl Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut buffer = [0u8; 8];
        buffer[..data.len()].copy_from_slice(data);
        Some(Self {
            id: id.into(),
            data: buffer,
            len: data.len(),
        })
    }

    // Remote frames carry no ISO-TP content and are never produced here.
    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

/// Numeric value of an identifier (11-bit values are zero-extended).
pub fn raw_id(id: Id) -> u32 {
    match id {
        Id::Standard(id) => id.as_raw() as u32,
        Id::Extended(id) => id.as_raw(),
    }
}

/// Rebuild an identifier from the driver's `(raw, extended)` pair.
pub fn id_from_raw(raw: u32, extended: bool) -> Option<Id> {
    if extended {
        ExtendedId::new(raw).map(Id::Extended)
    } else {
        u16::try_from(raw)
            .ok()
            .and_then(StandardId::new)
            .map(Id::Standard)
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
