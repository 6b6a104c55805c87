//! ISO-TP reassembly: rebuilds a diagnostic payload from the Single Frame or
//! First Frame + Consecutive Frames of one transfer.
//!
//! Two entry points are provided. [`unwrap`] is the single-shot path used by
//! the poll cycle: it receives every frame of the only transfer in flight at
//! once. [`IsoTpAssembler`] keeps a fixed pool of sessions keyed by source
//! identifier and consumes frames one by one, for setups where several peers
//! answer with multi-frame responses at the same time.
use crate::core::PayloadBytes;
use crate::error::IsoTpError;
use crate::protocol::transport::isotp::{
    first_frame_length, FrameKind, CONSECUTIVE_FRAME_CAPACITY, FIRST_FRAME_CAPACITY,
    MAX_ISOTP_PAYLOAD, SINGLE_FRAME_CAPACITY,
};

//==================================================================================Constants

/// Maximum number of reassembly sessions handled in parallel (distinct sources).
pub const MAX_CONCURRENT_SESSIONS: usize = 4;

//==================================================================================Single-shot reassembly
/// Rebuild the payload carried by `frames`, in reception order.
///
/// The first frame must be a Single Frame or a First Frame. After a First
/// Frame, every frame must be a Consecutive Frame whose sequence number is the
/// expected next value (1, 2, …, 15, 0, 1, …) and the assembled length must
/// match the declared length exactly. The declared length may not exceed
/// `max_payload` nor the [`PayloadBytes`] capacity.
pub fn unwrap<F: AsRef<[u8]>>(frames: &[F], max_payload: usize) -> Result<PayloadBytes, IsoTpError> {
    let capacity = max_payload.min(MAX_ISOTP_PAYLOAD);
    let (head, tail) = frames.split_first().ok_or(IsoTpError::NoFrames)?;
    let head = head.as_ref();
    let pci = *head.first().ok_or(IsoTpError::FrameTooShort { index: 0 })?;

    match FrameKind::from_pci(pci) {
        FrameKind::Single => {
            let len = (pci & 0x0F) as usize;
            if len > SINGLE_FRAME_CAPACITY {
                return Err(IsoTpError::InvalidSingleFrameLength { len: pci & 0x0F });
            }
            if len > capacity {
                return Err(IsoTpError::LengthExceedsCapacity {
                    declared: len,
                    capacity,
                });
            }
            let data = head
                .get(1..1 + len)
                .ok_or(IsoTpError::FrameTooShort { index: 0 })?;
            PayloadBytes::from_slice(data)
        }
        FrameKind::First => {
            let declared = first_frame_length(head).ok_or(IsoTpError::FrameTooShort { index: 0 })?;
            if declared > capacity {
                return Err(IsoTpError::LengthExceedsCapacity { declared, capacity });
            }

            let mut payload = PayloadBytes::new();
            let first_len = declared.min(FIRST_FRAME_CAPACITY);
            let first_data = head
                .get(2..2 + first_len)
                .ok_or(IsoTpError::FrameTooShort { index: 0 })?;
            payload.extend_from_slice(first_data)?;

            let mut expected_sequence: u8 = 1;
            for (offset, frame) in tail.iter().enumerate() {
                let index = offset + 1;
                let data = frame.as_ref();
                let pci = *data.first().ok_or(IsoTpError::FrameTooShort { index })?;
                if FrameKind::from_pci(pci) != FrameKind::Consecutive {
                    return Err(IsoTpError::UnexpectedFrameType { pci });
                }
                let found = pci & 0x0F;
                if found != expected_sequence {
                    return Err(IsoTpError::SequenceMismatch {
                        expected: expected_sequence,
                        found,
                    });
                }

                let remaining = declared - payload.len();
                if remaining == 0 {
                    // Frame past the declared end.
                    return Err(IsoTpError::IncompletePayload {
                        assembled: payload.len() + data.len().saturating_sub(1),
                        declared,
                    });
                }
                let take = remaining.min(CONSECUTIVE_FRAME_CAPACITY);
                let chunk = data.get(1..1 + take).ok_or(IsoTpError::FrameTooShort { index })?;
                payload.extend_from_slice(chunk)?;

                expected_sequence = (expected_sequence + 1) & 0x0F;
            }

            if payload.len() != declared {
                return Err(IsoTpError::IncompletePayload {
                    assembled: payload.len(),
                    declared,
                });
            }
            Ok(payload)
        }
        FrameKind::Consecutive | FrameKind::FlowControl | FrameKind::Unknown(_) => {
            Err(IsoTpError::UnexpectedFrameType { pci })
        }
    }
}

//==================================================================================Enums and Structs
#[derive(Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Frame not part of a transfer or discarded (invalid sequence, Flow
    /// Control frame, etc.).
    Ignored,
    /// Frame integrated but additional Consecutive Frames are still missing.
    FragmentConsumed,
    /// Transfer complete; the payload is returned by value.
    MessageComplete(PayloadBytes),
}

/// Possible states for a reassembly session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SessionState {
    Inactive,
    InProgress,
}

/// State of one transfer being rebuilt.
#[derive(Debug, Clone, Copy)]
struct IsoTpSession {
    state: SessionState,
    source: u32,
    expected_size: usize,
    next_sequence: u8,
    /// Order in which the session was opened; the smallest is evicted first.
    opened: u32,
    buffer: PayloadBytes,
}

impl IsoTpSession {
    const fn new() -> Self {
        Self {
            state: SessionState::Inactive,
            source: 0,
            expected_size: 0,
            next_sequence: 0,
            opened: 0,
            buffer: PayloadBytes::new(),
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::Inactive;
        self.expected_size = 0;
        self.next_sequence = 0;
        self.buffer.clear();
    }

    /// Hand the payload out once the declared length is reached.
    fn complete_if_done(&mut self) -> ProcessResult {
        if self.buffer.len() >= self.expected_size {
            let payload = self.buffer;
            self.reset();
            ProcessResult::MessageComplete(payload)
        } else {
            ProcessResult::FragmentConsumed
        }
    }
}

/// Multi-peer assembler: owns a fixed pool of reusable sessions.
///
/// A peer that stops mid-transfer keeps its slot until it sends a new frame
/// of its own or until the pool is full: a First Frame from a new source then
/// evicts the session opened the longest time ago.
#[derive(Debug, Copy, Clone)]
pub struct IsoTpAssembler {
    sessions: [IsoTpSession; MAX_CONCURRENT_SESSIONS],
    next_stamp: u32,
}

impl Default for IsoTpAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl IsoTpAssembler {
    /// Instantiate the assembler with an inactive session pool.
    pub const fn new() -> Self {
        Self {
            sessions: [IsoTpSession::new(); MAX_CONCURRENT_SESSIONS],
            next_stamp: 0,
        }
    }

    /// Number of transfers currently being rebuilt.
    pub fn active_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.state == SessionState::InProgress)
            .count()
    }

    //==================================================================================Process Functions
    /// Process one frame received from `source` (raw CAN identifier).
    ///
    /// Single Frames complete immediately. A First Frame opens (or restarts)
    /// the session of its source. Consecutive Frames must follow the session's
    /// sequence; a mismatch drops the session. Flow Control frames are not
    /// payload and are ignored.
    pub fn process_frame(&mut self, source: u32, data: &[u8]) -> ProcessResult {
        let Some(kind) = FrameKind::of(data) else {
            return ProcessResult::Ignored;
        };

        match kind {
            FrameKind::Single => {
                // A new transfer from this source supersedes any unfinished one.
                self.release(source);
                match unwrap(&[data], MAX_ISOTP_PAYLOAD) {
                    Ok(payload) => ProcessResult::MessageComplete(payload),
                    Err(_) => ProcessResult::Ignored,
                }
            }
            FrameKind::First => self.open_session(source, data),
            FrameKind::Consecutive => self.continue_session(source, data),
            FrameKind::FlowControl | FrameKind::Unknown(_) => ProcessResult::Ignored,
        }
    }

    fn open_session(&mut self, source: u32, data: &[u8]) -> ProcessResult {
        let Some(expected_size) = first_frame_length(data) else {
            return ProcessResult::Ignored;
        };
        if !(1..=MAX_ISOTP_PAYLOAD).contains(&expected_size) {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "First frame from {:#X} declares {} bytes, dropped",
                source,
                expected_size
            );
            self.release(source);
            return ProcessResult::Ignored;
        }

        let first_len = expected_size.min(FIRST_FRAME_CAPACITY);
        let Some(chunk) = data.get(2..2 + first_len) else {
            self.release(source);
            return ProcessResult::Ignored;
        };

        let index = self.slot_for(source);
        let opened = self.next_stamp;
        self.next_stamp = self.next_stamp.wrapping_add(1);

        let session = &mut self.sessions[index];
        session.reset();
        session.opened = opened;
        if session.buffer.extend_from_slice(chunk).is_err() {
            return ProcessResult::Ignored;
        }

        session.state = SessionState::InProgress;
        session.source = source;
        session.expected_size = expected_size;
        session.next_sequence = 1;

        session.complete_if_done()
    }

    fn continue_session(&mut self, source: u32, data: &[u8]) -> ProcessResult {
        let Some(session) = self
            .sessions
            .iter_mut()
            .find(|s| s.state == SessionState::InProgress && s.source == source)
        else {
            return ProcessResult::Ignored;
        };

        let sequence = data[0] & 0x0F;
        if sequence != session.next_sequence {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "Sequence mismatch from {:#X}: expected {}, found {}",
                source,
                session.next_sequence,
                sequence
            );
            session.reset();
            return ProcessResult::Ignored;
        }

        let remaining = session.expected_size - session.buffer.len();
        let take = remaining.min(CONSECUTIVE_FRAME_CAPACITY);
        let Some(chunk) = data.get(1..1 + take) else {
            session.reset();
            return ProcessResult::Ignored;
        };
        if session.buffer.extend_from_slice(chunk).is_err() {
            session.reset();
            return ProcessResult::Ignored;
        }
        session.next_sequence = (session.next_sequence + 1) & 0x0F;

        session.complete_if_done()
    }

    /// Slot of `source`'s session, else a free slot, else the oldest session.
    fn slot_for(&self, source: u32) -> usize {
        let newest = self.next_stamp;
        self.sessions
            .iter()
            .position(|s| s.state == SessionState::InProgress && s.source == source)
            .or_else(|| {
                self.sessions
                    .iter()
                    .position(|s| s.state == SessionState::Inactive)
            })
            .unwrap_or_else(|| {
                let (index, _stale) = self
                    .sessions
                    .iter()
                    .enumerate()
                    .max_by_key(|(_, s)| newest.wrapping_sub(s.opened))
                    .map(|(index, s)| (index, s.source))
                    .unwrap_or((0, 0));
                #[cfg(feature = "defmt")]
                defmt::warn!("Session pool full, evicting transfer from {:#X}", _stale);
                index
            })
    }

    fn release(&mut self, source: u32) {
        self.sessions
            .iter_mut()
            .filter(|s| s.state == SessionState::InProgress && s.source == source)
            .for_each(IsoTpSession::reset);
    }
}
