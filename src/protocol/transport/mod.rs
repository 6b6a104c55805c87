//! Diagnostic transport layer: CAN frame representation, per-source frame
//! queues, ISO-TP segmentation/reassembly, and bus/timer abstraction traits.
//!
//! ## Identifiers
//!
//! The polled modules answer on fixed 11-bit identifiers. Values are those used
//! by the vehicle and must be kept bit-for-bit.
//!
//! ## Timing Constants
//!
//! These constants define the delays and timeouts the poll cycle uses by
//! default. Runtime overrides live in
//! [`PollConfig`](crate::protocol::poll::PollConfig).
use embedded_can::StandardId;

pub mod can_frame;
pub mod isotp;
pub mod queue;
pub mod traits;

const fn standard_id(raw: u16) -> StandardId {
    match StandardId::new(raw) {
        Some(id) => id,
        None => panic!("identifier does not fit in 11 bits"),
    }
}

/// Engine control unit, request side.
pub const ECU_REQUEST_ID: StandardId = standard_id(0x7E0);
/// Engine control unit, response side.
pub const ECU_RESPONSE_ID: StandardId = standard_id(0x7E8);
/// ABS / vehicle dynamics control module, request side.
pub const VDC_REQUEST_ID: StandardId = standard_id(0x7B0);
/// ABS / vehicle dynamics control module, response side.
pub const VDC_RESPONSE_ID: StandardId = standard_id(0x7B8);

/// Timeout for sending a single CAN frame (ms).
///
/// [`CanBus`](traits::can_bus::CanBus) implementations **SHOULD** enforce it on
/// `send()` so a faulty or saturated bus cannot stall the poll task.
///
/// ```rust,ignore
/// use embassy_time::{with_timeout, Duration};
/// use datahub_diag::protocol::transport::CAN_SEND_TIMEOUT_MS;
///
/// async fn send(&mut self, frame: &CanFrame) -> Result<(), Error> {
///     with_timeout(
///         Duration::from_millis(CAN_SEND_TIMEOUT_MS as u64),
///         self.can.transmit_async(&twai_frame)
///     )
///     .await
///     .map_err(|_| Error::Timeout)?
/// }
/// ```
pub const CAN_SEND_TIMEOUT_MS: u32 = 100;

/// How long the sender waits for each Flow Control frame (ms).
pub const FLOW_CONTROL_TIMEOUT_MS: u32 = 1000;

/// How long the poll task waits for each response frame (ms).
pub const RESPONSE_TIMEOUT_MS: u32 = 200;

/// Bounded enqueue used by the task-level dispatcher when a per-source queue is full (ms).
pub const ROUTER_ENQUEUE_TIMEOUT_MS: u32 = 10;

/// Default delay between two poll cycles (ms).
pub const POLL_PERIOD_MS: u32 = 100;

/// Depth of each per-source queue and of the intake queue.
pub const FRAME_QUEUE_DEPTH: usize = 16;
