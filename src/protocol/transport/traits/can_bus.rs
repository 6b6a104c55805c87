//! Minimal abstraction for the transmit side of an asynchronous CAN driver.
//! Reception does not go through this trait: the driver's receive callback
//! feeds the [`FrameRouter`](crate::protocol::router::FrameRouter) instead.
use crate::protocol::transport::can_frame::CanFrame;
use futures_util::Future;

/// Contract to send CAN frames asynchronously.
pub trait CanBus {
    type Error: core::fmt::Debug;
    /// Emit a frame on the bus. Asynchronous to accommodate non-blocking drivers.
    /// Implementations should give up after
    /// [`CAN_SEND_TIMEOUT_MS`](crate::protocol::transport::CAN_SEND_TIMEOUT_MS).
    fn send<'a>(
        &'a mut self,
        frame: &'a CanFrame,
    ) -> impl Future<Output = Result<(), Self::Error>> + 'a;
}
