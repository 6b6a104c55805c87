/// Test doubles simulating the CAN bus, the timer and the polled module.
use datahub_diag::protocol::{
    poll::PollConfig,
    transport::{
        can_frame::CanFrame,
        queue::FrameQueue,
        traits::{can_bus::CanBus, hub_timer::HubTimer},
    },
};
use embedded_can::{Frame, Id};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Duration};

#[derive(Clone)]
#[allow(dead_code)]
/// Transmit side of the simulated bus: every frame the device sends is handed
/// to the test, which plays the remote module.
pub struct MockCanBus {
    tx: mpsc::UnboundedSender<CanFrame>,
}

#[allow(dead_code)]
impl MockCanBus {
    /// Bus plus the receiver the simulated module reads the device's frames from.
    pub fn create() -> (Self, mpsc::UnboundedReceiver<CanFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl CanBus for MockCanBus {
    type Error = ();

    async fn send<'a>(&'a mut self, frame: &'a CanFrame) -> Result<(), Self::Error> {
        self.tx.send(*frame).map_err(|_| ())?;
        Ok(())
    }
}

#[allow(dead_code)]
/// Timer based on `tokio::time::sleep` to drive delays in tests.
pub struct MockTimer;

impl HubTimer for MockTimer {
    async fn delay_ms(&mut self, millis: u32) {
        sleep(Duration::from_millis(millis as u64)).await;
    }

    async fn delay_us(&mut self, micros: u32) {
        sleep(Duration::from_micros(micros as u64)).await;
    }
}

#[allow(dead_code)]
/// Short timeouts so failing scenarios end quickly.
pub fn fast_config() -> PollConfig {
    PollConfig {
        flow_control_timeout: embassy_time::Duration::from_millis(100),
        response_timeout: embassy_time::Duration::from_millis(100),
        ..PollConfig::default()
    }
}

#[allow(dead_code)]
/// Next frame sent by the device; panics if nothing comes within a second.
pub async fn expect_frame(rx: &mut mpsc::UnboundedReceiver<CanFrame>) -> CanFrame {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("Device should have sent a frame")
        .expect("Bus closed")
}

#[allow(dead_code)]
/// `true` when the device stays silent for `millis`.
pub async fn stays_silent(rx: &mut mpsc::UnboundedReceiver<CanFrame>, millis: u64) -> bool {
    timeout(Duration::from_millis(millis), rx.recv()).await.is_err()
}

#[allow(dead_code)]
/// Deliver a frame from the simulated module, as the router would.
pub fn respond<const CAP: usize>(queue: &FrameQueue<CAP>, source: impl Into<Id>, data: &[u8]) {
    let frame = CanFrame::new(source, data).expect("Frame holds at most eight bytes");
    queue
        .try_send(frame)
        .expect("Response queue should have room");
}
