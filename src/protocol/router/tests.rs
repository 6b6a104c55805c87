//! Routing tests: ISR path, intake filtering, dispatcher batches.
use super::*;
use crate::protocol::transport::{ECU_RESPONSE_ID, VDC_RESPONSE_ID};
use embedded_can::{Frame, StandardId};
use futures_util::FutureExt;

struct InstantTimer;

impl HubTimer for InstantTimer {
    async fn delay_ms(&mut self, _millis: u32) {}

    async fn delay_us(&mut self, _micros: u32) {}
}

fn frame(id: StandardId, first: u8) -> CanFrame {
    CanFrame::new(id, &[first, 0xAA]).unwrap()
}

#[test]
/// Each routed identifier lands in its own queue, others are rejected.
fn test_route_from_isr_by_source() {
    let ecu = FrameQueue::<4>::new();
    let vdc = FrameQueue::<4>::new();
    let routes = [Route::new(ECU_RESPONSE_ID, &ecu), Route::new(VDC_RESPONSE_ID, &vdc)];
    let router = FrameRouter::new(&routes);

    assert_eq!(router.route_from_isr(&frame(ECU_RESPONSE_ID, 1)), RouteOutcome::Queued);
    assert_eq!(router.route_from_isr(&frame(VDC_RESPONSE_ID, 2)), RouteOutcome::Queued);
    assert_eq!(
        router.route_from_isr(&frame(StandardId::new(0x123).unwrap(), 3)),
        RouteOutcome::Unrecognized
    );

    assert_eq!(ecu.len(), 1);
    assert_eq!(vdc.len(), 1);
    assert_eq!(ecu.try_receive().unwrap().pci(), Some(1));
    assert_eq!(vdc.try_receive().unwrap().pci(), Some(2));
}

#[test]
/// A full queue drops the frame without blocking.
fn test_route_from_isr_queue_full() {
    let ecu = FrameQueue::<2>::new();
    let routes = [Route::new(ECU_RESPONSE_ID, &ecu)];
    let router = FrameRouter::new(&routes);

    for n in 0..2 {
        assert_eq!(router.route_from_isr(&frame(ECU_RESPONSE_ID, n)), RouteOutcome::Queued);
    }
    assert_eq!(router.route_from_isr(&frame(ECU_RESPONSE_ID, 9)), RouteOutcome::QueueFull);
    // Arrival order kept.
    assert_eq!(ecu.try_receive().unwrap().pci(), Some(0));
    assert_eq!(ecu.try_receive().unwrap().pci(), Some(1));
}

#[test]
/// Duplicate routes for one identifier: only the first queue receives.
fn test_first_route_wins() {
    let first = FrameQueue::<2>::new();
    let second = FrameQueue::<2>::new();
    let routes = [Route::new(ECU_RESPONSE_ID, &first), Route::new(ECU_RESPONSE_ID, &second)];
    let router = FrameRouter::new(&routes);

    router.route_from_isr(&frame(ECU_RESPONSE_ID, 1));
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
/// Extended identifiers never match standard routes with the same value.
fn test_extended_id_not_routed() {
    let ecu = FrameQueue::<2>::new();
    let routes = [Route::new(ECU_RESPONSE_ID, &ecu)];
    let router = FrameRouter::new(&routes);

    let extended = CanFrame::new(embedded_can::ExtendedId::new(0x7E8).unwrap(), &[0x01]).unwrap();
    assert!(!router.accepts(&extended));
    assert_eq!(router.route_from_isr(&extended), RouteOutcome::Unrecognized);
}

#[test]
/// The interrupt intake filters unrouted identifiers and fails fast when full.
fn test_isr_intake() {
    let ecu = FrameQueue::<4>::new();
    let intake = FrameQueue::<4>::new();
    let routes = [Route::new(ECU_RESPONSE_ID, &ecu)];
    let isr = IsrIntake::new(FrameRouter::new(&routes), &intake);

    assert!(!isr.on_frame_received(&frame(VDC_RESPONSE_ID, 0)));
    for n in 0..4 {
        assert!(isr.on_frame_received(&frame(ECU_RESPONSE_ID, n)));
    }
    assert!(!isr.on_frame_received(&frame(ECU_RESPONSE_ID, 4)));
    assert_eq!(intake.len(), 4);
    assert!(ecu.is_empty());
}

#[test]
/// One dispatch batch forwards the whole backlog and counts the drops.
fn test_dispatch_pending_drains_backlog() {
    let ecu = FrameQueue::<4>::new();
    let vdc = FrameQueue::<4>::new();
    let intake = FrameQueue::<4>::new();
    let routes = [Route::new(ECU_RESPONSE_ID, &ecu), Route::new(VDC_RESPONSE_ID, &vdc)];
    let router = FrameRouter::new(&routes);

    intake.try_send(frame(ECU_RESPONSE_ID, 1)).unwrap();
    intake.try_send(frame(VDC_RESPONSE_ID, 2)).unwrap();
    intake.try_send(frame(StandardId::new(0x100).unwrap(), 3)).unwrap();
    intake.try_send(frame(ECU_RESPONSE_ID, 4)).unwrap();

    let mut dispatcher = FrameDispatcher::new(router, &intake, InstantTimer);
    let stats = dispatcher.dispatch_pending().now_or_never().unwrap();

    assert_eq!(
        stats,
        DispatchStats {
            forwarded: 3,
            dropped: 1
        }
    );
    assert!(intake.is_empty());
    assert_eq!(ecu.len(), 2);
    assert_eq!(vdc.len(), 1);
}

#[test]
/// Task-side routing into a full queue gives up once the timeout elapses.
fn test_route_times_out_on_full_queue() {
    let ecu = FrameQueue::<1>::new();
    let routes = [Route::new(ECU_RESPONSE_ID, &ecu)];
    let router = FrameRouter::new(&routes);
    let mut timer = InstantTimer;

    let timeout = Duration::from_millis(10);
    let fits = frame(ECU_RESPONSE_ID, 1);
    let overflows = frame(ECU_RESPONSE_ID, 2);
    let first = router.route(&fits, &mut timer, timeout);
    assert_eq!(first.now_or_never(), Some(RouteOutcome::Queued));
    let second = router.route(&overflows, &mut timer, timeout);
    assert_eq!(second.now_or_never(), Some(RouteOutcome::QueueFull));
    assert_eq!(ecu.try_receive().unwrap().data[0], 1);
}
