//! Error definitions shared across library modules.
//! Each type models one failure family of a diagnostic exchange: ISO-TP
//! segmentation/reassembly, flow control, response decoding, and the poll
//! cycle that ties them together.
use thiserror_no_std::Error;

//==================================================================================ISOTP_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Segmentation and reassembly failures.
pub enum IsoTpError {
    /// Payload cannot be described by the 12-bit First Frame length.
    #[error("Payload of {len} bytes exceeds the ISO-TP length field")]
    PayloadTooLarge { len: usize },
    /// Payload needs more frames than the caller allows.
    #[error("Payload needs {needed} frames, only {max} allowed")]
    TooManyFrames { needed: usize, max: usize },
    /// Nothing to reassemble.
    #[error("No frames to reassemble")]
    NoFrames,
    /// A frame carries fewer bytes than its PCI announces.
    #[error("Frame {index} is too short for its PCI")]
    FrameTooShort { index: usize },
    /// Single Frame length nibble outside 0..=7.
    #[error("Invalid single frame length {len}")]
    InvalidSingleFrameLength { len: u8 },
    /// Declared or accumulated length does not fit the output buffer.
    #[error("Declared length {declared} exceeds capacity {capacity}")]
    LengthExceedsCapacity { declared: usize, capacity: usize },
    /// Frame type does not fit the current position in the transfer.
    #[error("Unexpected frame type, PCI 0x{pci:02X}")]
    UnexpectedFrameType { pci: u8 },
    /// Consecutive Frame out of order (skipped or repeated).
    #[error("Sequence mismatch: expected {expected}, found {found}")]
    SequenceMismatch { expected: u8, found: u8 },
    /// Frames ran out before the declared length was reached (or overshot it).
    #[error("Reassembled {assembled} of {declared} declared bytes")]
    IncompletePayload { assembled: usize, declared: usize },
}

//==================================================================================FLOW_CONTROL_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Failures while waiting for the peer to grant a transfer.
pub enum FlowControlError {
    /// No usable Flow Control frame arrived within the timeout.
    #[error("Timed out waiting for flow control")]
    Timeout,
    /// Peer cancelled the transfer.
    #[error("Peer aborted the transfer")]
    Aborted,
}

//==================================================================================DECODE_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Failures while building requests or interpreting responses.
pub enum DecodeError {
    /// Leading service identifier does not answer the request that was sent.
    #[error("Unexpected service 0x{found:02X}, expected 0x{expected:02X}")]
    UnexpectedService { expected: u8, found: u8 },
    /// Payload shorter than the fixed layout requires.
    #[error("Response too short: needed {needed} bytes, got {found}")]
    TooShort { needed: usize, found: usize },
    /// Identifier-indexed response carried none of the requested identifiers.
    #[error("Response carries no known identifier")]
    NoKnownIdentifier,
    /// Request does not fit the provided buffer.
    #[error("Buffer too small: needed {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },
}

//==================================================================================POLL_ERROR
#[derive(Error, Debug)]
/// Reasons a poll cycle was abandoned. Generic over the CAN driver error.
pub enum PollError<E: core::fmt::Debug> {
    /// Request payload could not be produced.
    #[error("Request build failed: {0}")]
    Request(DecodeError),
    /// Segmentation or reassembly failed.
    #[error(transparent)]
    IsoTp(#[from] IsoTpError),
    /// Flow control wait failed while sending the request.
    #[error(transparent)]
    FlowControl(#[from] FlowControlError),
    /// Response frames did not arrive in time.
    #[error("Response timed out after {received} of {expected} frames")]
    ResponseTimeout { received: usize, expected: usize },
    /// Response started with a frame that cannot open a transfer.
    #[error("Unexpected response frame, PCI 0x{pci:02X}")]
    UnexpectedResponseFrame { pci: u8 },
    /// Response payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// CAN driver refused a frame.
    #[error("CAN bus send error: {0:?}")]
    Bus(E),
}
