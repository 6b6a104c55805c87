//! ISO-TP segmentation: turns an application payload into the Single Frame or
//! First Frame + Consecutive Frames sequence, held in a fixed-size frame set.
use crate::error::IsoTpError;
use crate::protocol::transport::isotp::{
    frames_needed, CONSECUTIVE_FRAME_CAPACITY, FIRST_FRAME_CAPACITY, MAX_DECLARED_LENGTH,
    MAX_ISOTP_FRAMES, PCI_CONSECUTIVE_FRAME, PCI_FIRST_FRAME, PCI_SINGLE_FRAME,
};

/// Segmented payload: eight-byte data fields ready to transmit, zero padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoTpFrames {
    frames: [[u8; 8]; MAX_ISOTP_FRAMES],
    count: usize,
}

impl IsoTpFrames {
    /// Number of frames produced.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` when the payload needed a First Frame.
    #[inline]
    pub fn is_segmented(&self) -> bool {
        self.count > 1
    }

    /// Single Frame or First Frame.
    #[inline]
    pub fn first(&self) -> &[u8; 8] {
        &self.frames[0]
    }

    /// Consecutive Frames, in transmission order.
    #[inline]
    pub fn consecutive(&self) -> &[[u8; 8]] {
        &self.frames[1..self.count]
    }

    /// Every frame, in transmission order.
    #[inline]
    pub fn as_slice(&self) -> &[[u8; 8]] {
        &self.frames[..self.count]
    }

    pub fn iter(&self) -> core::slice::Iter<'_, [u8; 8]> {
        self.as_slice().iter()
    }
}

/// Segment `payload` into at most `max_frames` frames.
///
/// Payloads of up to seven bytes become one Single Frame. Longer payloads get a
/// First Frame (12-bit length, six bytes) followed by Consecutive Frames of up
/// to seven bytes whose sequence number starts at 1 and wraps 15 → 0.
pub fn wrap(payload: &[u8], max_frames: usize) -> Result<IsoTpFrames, IsoTpError> {
    let payload_len = payload.len();
    if payload_len > MAX_DECLARED_LENGTH {
        return Err(IsoTpError::PayloadTooLarge { len: payload_len });
    }

    let needed = frames_needed(payload_len);
    let max = max_frames.min(MAX_ISOTP_FRAMES);
    if needed > max {
        return Err(IsoTpError::TooManyFrames { needed, max });
    }

    let mut out = IsoTpFrames {
        frames: [[0u8; 8]; MAX_ISOTP_FRAMES],
        count: needed,
    };

    // Payload ≤ 7 bytes: a single frame is enough.
    if needed == 1 {
        out.frames[0][0] = PCI_SINGLE_FRAME | payload_len as u8;
        out.frames[0][1..1 + payload_len].copy_from_slice(payload);
        return Ok(out);
    }

    // First frame: PCI + length low byte + six data bytes.
    out.frames[0][0] = PCI_FIRST_FRAME | ((payload_len >> 8) & 0x0F) as u8;
    out.frames[0][1] = (payload_len & 0xFF) as u8;
    out.frames[0][2..].copy_from_slice(&payload[..FIRST_FRAME_CAPACITY]);

    let mut sequence: u8 = 1;
    for (frame, chunk) in out.frames[1..needed]
        .iter_mut()
        .zip(payload[FIRST_FRAME_CAPACITY..].chunks(CONSECUTIVE_FRAME_CAPACITY))
    {
        frame[0] = PCI_CONSECUTIVE_FRAME | sequence;
        frame[1..1 + chunk.len()].copy_from_slice(chunk);
        sequence = (sequence + 1) & 0x0F;
    }

    Ok(out)
}
