//! Flow Control handling on both sides of a transfer: the frame we emit when
//! receiving a segmented response, and the wait for the peer's grant when we
//! send a segmented request.
use embassy_time::Duration;
use embedded_can::Id;

use crate::error::FlowControlError;
use crate::protocol::transport::{
    can_frame::CanFrame,
    isotp::{FlowStatus, FrameKind, StMin, PCI_FLOW_CONTROL},
    queue::{receive_with_timeout, FrameQueue},
    traits::hub_timer::HubTimer,
};

/// Permission granted by the peer to send the next block of Consecutive Frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlowControlGrant {
    /// Frames allowed before the next Flow Control (0 = no limit).
    pub block_size: u8,
    /// Minimum gap between two Consecutive Frames.
    pub st_min: StMin,
}

/// Flow Control "continue to send, no block limit, no separation time", three bytes long.
pub fn build_flow_control(target: impl Into<Id>) -> CanFrame {
    let mut data = [0u8; 8];
    data[0] = PCI_FLOW_CONTROL | FlowStatus::ContinueToSend.to_nibble();
    CanFrame {
        id: target.into(),
        data,
        len: 3,
    }
}

/// Read `queue` until a Flow Control frame grants the transfer.
///
/// Each read is bounded by `timeout`. Frames that are not Flow Control are
/// dropped with a warning. `Wait`, reserved and invalid statuses keep the loop
/// listening; `Abort` fails immediately.
pub async fn wait_for_flow_control<T: HubTimer, const CAP: usize>(
    queue: &FrameQueue<CAP>,
    timer: &mut T,
    timeout: Duration,
) -> Result<FlowControlGrant, FlowControlError> {
    loop {
        let frame = match receive_with_timeout(queue, timer, timeout).await {
            Some(frame) => frame,
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("No flow control within {} ms", timeout.as_millis());
                return Err(FlowControlError::Timeout);
            }
        };

        let Some(pci) = frame.pci() else {
            continue;
        };
        if FrameKind::from_pci(pci) != FrameKind::FlowControl {
            #[cfg(feature = "defmt")]
            defmt::warn!("Expected flow control, got PCI {:#04X}, dropped", pci);
            continue;
        }

        match FlowStatus::from_nibble(pci) {
            FlowStatus::ContinueToSend => {
                let payload = frame.payload();
                let block_size = payload.get(1).copied().unwrap_or(0);
                let st_min = StMin::from_raw(payload.get(2).copied().unwrap_or(0));
                return Ok(FlowControlGrant { block_size, st_min });
            }
            FlowStatus::Abort => {
                #[cfg(feature = "defmt")]
                defmt::error!("Peer aborted the transfer");
                return Err(FlowControlError::Aborted);
            }
            FlowStatus::Wait => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Flow control: wait");
            }
            FlowStatus::Reserved | FlowStatus::Invalid(_) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Flow control status {:#X} ignored", pci & 0x0F);
            }
        }
    }
}

/// Wait the separation time encoded by `st_min`; no delay for `StMin::None`.
pub async fn stmin_delay<T: HubTimer>(timer: &mut T, st_min: StMin) {
    if st_min != StMin::None {
        timer.delay(st_min.as_duration()).await;
    }
}
