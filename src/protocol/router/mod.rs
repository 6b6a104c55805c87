//! Frame Router: delivers each received CAN frame to the queue of the module
//! that sent it.
//!
//! Two halves cooperate:
//! - [`IsrIntake`] runs in the CAN receive interrupt. It rejects frames whose
//!   identifier is not routed and pushes the rest into a single intake queue
//!   without ever blocking.
//! - [`FrameDispatcher`] is a low-priority task. It waits on the intake queue
//!   and forwards frames to the per-source queues in batches, draining the
//!   backlog before yielding.
//!
//! [`FrameRouter::route_from_isr`] is also usable directly from the interrupt
//! when no intermediate queue is wanted.
use embassy_time::Duration;
use embedded_can::Id;
use futures_util::{
    future::{select, Either},
    pin_mut,
};

use crate::protocol::transport::{
    can_frame::CanFrame, queue::FrameQueue, traits::hub_timer::HubTimer, ROUTER_ENQUEUE_TIMEOUT_MS,
};

//==================================================================================Routes
/// Association between a source identifier and the queue receiving its frames.
pub struct Route<'a, const CAP: usize> {
    pub source: Id,
    pub queue: &'a FrameQueue<CAP>,
}

impl<'a, const CAP: usize> Route<'a, CAP> {
    pub fn new(source: impl Into<Id>, queue: &'a FrameQueue<CAP>) -> Self {
        Self {
            source: source.into(),
            queue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// What happened to a routed frame.
pub enum RouteOutcome {
    /// Frame copied into its source queue.
    Queued,
    /// Source queue full; frame dropped.
    QueueFull,
    /// Identifier not in the route table; frame dropped.
    Unrecognized,
}

/// Fixed route table. The first route matching a frame's identifier wins, so a
/// frame is never delivered to more than one queue.
#[derive(Clone, Copy)]
pub struct FrameRouter<'a, const CAP: usize> {
    routes: &'a [Route<'a, CAP>],
}

impl<'a, const CAP: usize> FrameRouter<'a, CAP> {
    pub const fn new(routes: &'a [Route<'a, CAP>]) -> Self {
        Self { routes }
    }

    /// Queue dedicated to `source`, if routed.
    pub fn queue_for(&self, source: Id) -> Option<&'a FrameQueue<CAP>> {
        self.routes
            .iter()
            .find(|route| route.source == source)
            .map(|route| route.queue)
    }

    /// `true` when the frame's identifier is routed.
    pub fn accepts(&self, frame: &CanFrame) -> bool {
        self.queue_for(frame.id).is_some()
    }

    /// Non-blocking enqueue; safe to call from interrupt context.
    pub fn route_from_isr(&self, frame: &CanFrame) -> RouteOutcome {
        let Some(queue) = self.queue_for(frame.id) else {
            return RouteOutcome::Unrecognized;
        };
        match queue.try_send(*frame) {
            Ok(()) => RouteOutcome::Queued,
            Err(_) => RouteOutcome::QueueFull,
        }
    }

    /// Enqueue from task context, waiting at most `timeout` for room in a full queue.
    pub async fn route<T: HubTimer>(
        &self,
        frame: &CanFrame,
        timer: &mut T,
        timeout: Duration,
    ) -> RouteOutcome {
        let Some(queue) = self.queue_for(frame.id) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Unrecognized CAN ID {:#X}, frame dropped", frame.raw_id());
            return RouteOutcome::Unrecognized;
        };
        if queue.try_send(*frame).is_ok() {
            return RouteOutcome::Queued;
        }

        let send = queue.send(*frame);
        let deadline = timer.delay(timeout);
        pin_mut!(send);
        pin_mut!(deadline);

        match select(send, deadline).await {
            Either::Left(_) => RouteOutcome::Queued,
            Either::Right(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Queue for ID {:#X} full, frame dropped", frame.raw_id());
                RouteOutcome::QueueFull
            }
        }
    }
}

//==================================================================================ISR intake
/// Interrupt-side entry point feeding the intake queue.
#[derive(Clone, Copy)]
pub struct IsrIntake<'a, const CAP: usize> {
    router: FrameRouter<'a, CAP>,
    intake: &'a FrameQueue<CAP>,
}

impl<'a, const CAP: usize> IsrIntake<'a, CAP> {
    pub const fn new(router: FrameRouter<'a, CAP>, intake: &'a FrameQueue<CAP>) -> Self {
        Self { router, intake }
    }

    /// Receive callback. Returns `true` if the frame was accepted into the intake queue.
    pub fn on_frame_received(&self, frame: &CanFrame) -> bool {
        if !self.router.accepts(frame) {
            return false;
        }
        self.intake.try_send(*frame).is_ok()
    }
}

//==================================================================================Dispatcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Outcome of one dispatch batch.
pub struct DispatchStats {
    /// Frames delivered to their source queue.
    pub forwarded: usize,
    /// Frames dropped (full queue or unrouted identifier).
    pub dropped: usize,
}

impl DispatchStats {
    fn record(&mut self, outcome: RouteOutcome) {
        match outcome {
            RouteOutcome::Queued => self.forwarded += 1,
            RouteOutcome::QueueFull | RouteOutcome::Unrecognized => self.dropped += 1,
        }
    }
}

/// Task-side half of the router: moves frames from the intake queue to the
/// per-source queues.
pub struct FrameDispatcher<'a, T: HubTimer, const CAP: usize> {
    router: FrameRouter<'a, CAP>,
    intake: &'a FrameQueue<CAP>,
    timer: T,
    enqueue_timeout: Duration,
}

impl<'a, T: HubTimer, const CAP: usize> FrameDispatcher<'a, T, CAP> {
    /// Dispatcher using the default [`ROUTER_ENQUEUE_TIMEOUT_MS`] per forward.
    pub fn new(router: FrameRouter<'a, CAP>, intake: &'a FrameQueue<CAP>, timer: T) -> Self {
        Self {
            router,
            intake,
            timer,
            enqueue_timeout: Duration::from_millis(ROUTER_ENQUEUE_TIMEOUT_MS as u64),
        }
    }

    pub fn with_enqueue_timeout(mut self, timeout: Duration) -> Self {
        self.enqueue_timeout = timeout;
        self
    }

    /// Wait for one frame, forward it, then forward everything already queued.
    pub async fn dispatch_pending(&mut self) -> DispatchStats {
        let mut stats = DispatchStats::default();

        let first = self.intake.receive().await;
        let outcome = self
            .router
            .route(&first, &mut self.timer, self.enqueue_timeout)
            .await;
        stats.record(outcome);

        while let Ok(frame) = self.intake.try_receive() {
            let outcome = self
                .router
                .route(&frame, &mut self.timer, self.enqueue_timeout)
                .await;
            stats.record(outcome);
        }

        stats
    }

    /// Dispatch forever.
    pub async fn run(&mut self) {
        loop {
            let _stats = self.dispatch_pending().await;
            if _stats.dropped > 0 {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Dispatcher dropped {} frame(s), forwarded {}",
                    _stats.dropped,
                    _stats.forwarded
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
