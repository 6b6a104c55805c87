//! Poll state machine: one call to [`Poller::poll_once`] is one complete
//! diagnostic exchange with one module.
//!
//! ## Cycle
//!
//! 1. Drop frames left in the response queue by an abandoned exchange.
//! 2. Build the request and segment it.
//! 3. Send the Single Frame, or the First Frame then the Consecutive Frames
//!    paced by the peer's Flow Control (block size, STmin).
//! 4. Wait for the first response frame; answer a First Frame with our own
//!    Flow Control and collect the announced Consecutive Frames.
//! 5. Reassemble, decode, and publish into the shared telemetry if the lock is free.
//!
//! Any failure ends the cycle without touching the telemetry; nothing is
//! retried before the next period. Only one exchange is in flight per poller,
//! so every buffer lives on the stack for the duration of the cycle.
use embassy_time::Duration;

use crate::{
    core::PayloadBytes,
    error::{IsoTpError, PollError},
    infra::telemetry::SharedTelemetry,
    protocol::{
        messages::DiagnosticProfile,
        transport::{
            can_frame::CanFrame,
            isotp::{
                assembler::unwrap,
                builder::wrap,
                expected_consecutive_frames, first_frame_length,
                flow_control::{build_flow_control, stmin_delay, wait_for_flow_control},
                FrameKind, MAX_ISOTP_FRAMES, MAX_ISOTP_PAYLOAD,
            },
            queue::{drain, receive_with_timeout, FrameQueue},
            traits::{can_bus::CanBus, hub_timer::HubTimer},
            FLOW_CONTROL_TIMEOUT_MS, POLL_PERIOD_MS, RESPONSE_TIMEOUT_MS,
        },
    },
};

//==================================================================================Config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Runtime knobs of a poller.
pub struct PollConfig {
    /// Delay between two cycles.
    pub poll_period: Duration,
    /// Bound on each wait for a Flow Control frame while sending.
    pub flow_control_timeout: Duration,
    /// Bound on each wait for a response frame.
    pub response_timeout: Duration,
    /// Per-frame wait while draining stale frames; zero drains without waiting.
    pub drain_timeout: Duration,
    /// Extra pause after each Consecutive Frame sent, for slow peers (µs, 0 = none).
    pub consecutive_frame_gap_us: u32,
    /// Largest number of frames a request may be segmented into.
    pub max_request_frames: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_millis(POLL_PERIOD_MS as u64),
            flow_control_timeout: Duration::from_millis(FLOW_CONTROL_TIMEOUT_MS as u64),
            response_timeout: Duration::from_millis(RESPONSE_TIMEOUT_MS as u64),
            drain_timeout: Duration::from_ticks(0),
            consecutive_frame_gap_us: 0,
            max_request_frames: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Result of a successful cycle.
pub enum CycleReport {
    /// Decoded values copied into the shared telemetry.
    Published,
    /// Response decoded but the telemetry lock was busy; values dropped.
    Skipped,
}

//==================================================================================Poller
/// Drives the exchanges with one module described by `P`.
pub struct Poller<'a, C, T, P, const CAP: usize>
where
    C: CanBus,
    T: HubTimer,
    P: DiagnosticProfile,
{
    bus: C,
    timer: T,
    profile: P,
    responses: &'a FrameQueue<CAP>,
    telemetry: &'a SharedTelemetry,
    config: PollConfig,
}

impl<'a, C, T, P, const CAP: usize> Poller<'a, C, T, P, CAP>
where
    C: CanBus,
    T: HubTimer,
    P: DiagnosticProfile,
{
    /// `responses` must be the queue the router fills with `profile.response_id()` frames.
    pub fn new(
        bus: C,
        timer: T,
        profile: P,
        responses: &'a FrameQueue<CAP>,
        telemetry: &'a SharedTelemetry,
    ) -> Self {
        Self {
            bus,
            timer,
            profile,
            responses,
            telemetry,
            config: PollConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PollConfig) -> Self {
        self.config = config;
        self
    }

    /// Poll forever, one cycle per period. Failed cycles are logged and skipped.
    pub async fn run(&mut self) {
        loop {
            self.timer.delay(self.config.poll_period).await;
            match self.poll_once().await {
                Ok(_report) => {
                    #[cfg(feature = "defmt")]
                    defmt::trace!("Poll cycle done: {}", _report);
                }
                Err(_err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("Poll cycle aborted: {}", defmt::Debug2Format(&_err));
                }
            }
        }
    }

    /// Run one complete exchange.
    pub async fn poll_once(&mut self) -> Result<CycleReport, PollError<C::Error>> {
        self.drain_stale().await;
        self.send_request().await?;
        let payload = self.receive_response().await?;

        let response = self.profile.decode(payload.as_slice())?;
        let profile = &self.profile;
        let published = self
            .telemetry
            .try_update(|state| profile.apply(&response, state));

        Ok(if published {
            CycleReport::Published
        } else {
            CycleReport::Skipped
        })
    }

    //==================================================================================Steps
    async fn drain_stale(&mut self) -> usize {
        if self.config.drain_timeout.as_ticks() == 0 {
            return drain(self.responses);
        }

        let mut drained = 0;
        while let Some(_stale) =
            receive_with_timeout(self.responses, &mut self.timer, self.config.drain_timeout).await
        {
            #[cfg(feature = "defmt")]
            defmt::warn!("Drained stale frame ID {:#X}", _stale.raw_id());
            drained += 1;
        }
        drained
    }

    async fn send_request(&mut self) -> Result<(), PollError<C::Error>> {
        let mut request = [0u8; MAX_ISOTP_PAYLOAD];
        let len = self
            .profile
            .build_request(&mut request)
            .map_err(PollError::Request)?;
        let frames = wrap(&request[..len], self.config.max_request_frames)?;

        self.send(*frames.first()).await?;
        if !frames.is_segmented() {
            return Ok(());
        }

        let consecutive = frames.consecutive();
        let mut grant =
            wait_for_flow_control(self.responses, &mut self.timer, self.config.flow_control_timeout)
                .await?;
        let mut sent_in_block: u8 = 0;

        for (index, data) in consecutive.iter().enumerate() {
            if grant.block_size != 0 && sent_in_block == grant.block_size {
                grant = wait_for_flow_control(
                    self.responses,
                    &mut self.timer,
                    self.config.flow_control_timeout,
                )
                .await?;
                sent_in_block = 0;
            }

            self.send(*data).await?;
            sent_in_block = sent_in_block.wrapping_add(1);

            if self.config.consecutive_frame_gap_us > 0 {
                self.timer
                    .delay_us(self.config.consecutive_frame_gap_us)
                    .await;
            }
            if index + 1 < consecutive.len() {
                stmin_delay(&mut self.timer, grant.st_min).await;
            }
        }

        Ok(())
    }

    async fn receive_response(&mut self) -> Result<PayloadBytes, PollError<C::Error>> {
        let first = self
            .next_response_frame()
            .await
            .ok_or(PollError::ResponseTimeout {
                received: 0,
                expected: 1,
            })?;
        // `next_response_frame` never yields an empty frame.
        let pci = first.pci().unwrap_or_default();

        match FrameKind::from_pci(pci) {
            FrameKind::Single => Ok(unwrap(&[first], MAX_ISOTP_PAYLOAD)?),
            FrameKind::First => {
                let declared = first_frame_length(first.payload())
                    .ok_or(IsoTpError::FrameTooShort { index: 0 })?;
                if declared > MAX_ISOTP_PAYLOAD {
                    return Err(IsoTpError::LengthExceedsCapacity {
                        declared,
                        capacity: MAX_ISOTP_PAYLOAD,
                    }
                    .into());
                }

                let flow_control = build_flow_control(self.profile.request_id());
                self.bus
                    .send(&flow_control)
                    .await
                    .map_err(PollError::Bus)?;

                let expected = expected_consecutive_frames(declared);
                let mut frames = [CanFrame::default(); MAX_ISOTP_FRAMES];
                frames[0] = first;
                for received in 0..expected {
                    frames[1 + received] = self.next_response_frame().await.ok_or(
                        PollError::ResponseTimeout { received, expected },
                    )?;
                }

                Ok(unwrap(&frames[..1 + expected], MAX_ISOTP_PAYLOAD)?)
            }
            FrameKind::Consecutive | FrameKind::FlowControl | FrameKind::Unknown(_) => {
                Err(PollError::UnexpectedResponseFrame { pci })
            }
        }
    }

    /// Next response frame, skipping stray Flow Control and empty frames.
    async fn next_response_frame(&mut self) -> Option<CanFrame> {
        loop {
            let frame =
                receive_with_timeout(self.responses, &mut self.timer, self.config.response_timeout)
                    .await?;
            match frame.pci().map(FrameKind::from_pci) {
                Some(FrameKind::FlowControl) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Stray flow control skipped");
                }
                None => {}
                Some(_) => return Some(frame),
            }
        }
    }

    async fn send(&mut self, data: [u8; 8]) -> Result<(), PollError<C::Error>> {
        let frame = CanFrame::padded(self.profile.request_id(), data);
        self.bus.send(&frame).await.map_err(PollError::Bus)
    }
}
