//! Bounded buffers used between the ISO-TP codec and the response decoders.
//!
//! Reassembled payloads live in fixed-size arrays with an explicit length so the
//! whole exchange stays on the stack; any attempt to grow past capacity is
//! reported as an error instead of being truncated.
use crate::error::IsoTpError;

/// Largest diagnostic payload handled once reassembled.
pub const MAX_ISOTP_PAYLOAD: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadBytes {
    len: usize,
    data: [u8; MAX_ISOTP_PAYLOAD],
}

impl Default for PayloadBytes {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBytes {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            len: 0,
            data: [0; MAX_ISOTP_PAYLOAD],
        }
    }

    /// Build a buffer holding a copy of `slice`.
    pub fn from_slice(slice: &[u8]) -> Result<Self, IsoTpError> {
        let mut bytes = Self::new();
        bytes.extend_from_slice(slice)?;
        Ok(bytes)
    }

    /// Number of valid bytes stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks whether the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reset the buffer.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append bytes, failing without modification when capacity would be exceeded.
    pub fn extend_from_slice(&mut self, slice: &[u8]) -> Result<(), IsoTpError> {
        let end = self.len + slice.len();
        if end > MAX_ISOTP_PAYLOAD {
            return Err(IsoTpError::LengthExceedsCapacity {
                declared: end,
                capacity: MAX_ISOTP_PAYLOAD,
            });
        }
        self.data[self.len..end].copy_from_slice(slice);
        self.len = end;
        Ok(())
    }

    /// Immutable view over the populated bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

impl AsRef<[u8]> for PayloadBytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
