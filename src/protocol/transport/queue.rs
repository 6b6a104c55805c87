//! Bounded frame queues shared between the router (producer) and the poll task
//! (consumer), plus the bounded receive the poll cycle is built on.
//!
//! Queues are [`embassy_sync::channel::Channel`]s guarded by a critical-section
//! mutex so the producer side can run from the CAN receive interrupt.
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::Duration;
use futures_util::{
    future::{select, Either},
    pin_mut,
};

use crate::protocol::transport::{can_frame::CanFrame, traits::hub_timer::HubTimer};

/// FIFO of CAN frames with a fixed depth.
pub type FrameQueue<const CAP: usize> = Channel<CriticalSectionRawMutex, CanFrame, CAP>;

/// Wait for the next frame, giving up after `timeout`.
///
/// A frame already waiting in the queue is returned even with a zero timeout.
pub async fn receive_with_timeout<T: HubTimer, const CAP: usize>(
    queue: &FrameQueue<CAP>,
    timer: &mut T,
    timeout: Duration,
) -> Option<CanFrame> {
    if let Ok(frame) = queue.try_receive() {
        return Some(frame);
    }

    let receive = queue.receive();
    let deadline = timer.delay(timeout);
    pin_mut!(receive);
    pin_mut!(deadline);

    match select(receive, deadline).await {
        Either::Left((frame, _)) => Some(frame),
        Either::Right(_) => None,
    }
}

/// Discard everything currently queued without waiting. Returns the number of frames dropped.
pub fn drain<const CAP: usize>(queue: &FrameQueue<CAP>) -> usize {
    let mut drained = 0;
    while let Ok(_stale) = queue.try_receive() {
        #[cfg(feature = "defmt")]
        defmt::warn!("Drained stale frame ID {:#X}", _stale.raw_id());
        drained += 1;
    }
    drained
}
