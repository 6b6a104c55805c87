//! Asynchronous timer abstraction providing the timing primitives required
//! by flow-control pacing, bounded queue waits, and the poll period.
use embassy_time::Duration;

/// Timer trait abstraction; must remain thread-safe when applicable.
pub trait HubTimer {
    /// Asynchronously wait for `millis` milliseconds.
    fn delay_ms<'a>(&'a mut self, millis: u32) -> impl core::future::Future<Output = ()> + 'a;

    /// Asynchronously wait for `micros` microseconds (sub-millisecond STmin).
    fn delay_us<'a>(&'a mut self, micros: u32) -> impl core::future::Future<Output = ()> + 'a;

    /// Wait for `duration`, picking the millisecond path whenever it is exact.
    fn delay<'a>(&'a mut self, duration: Duration) -> impl core::future::Future<Output = ()> + 'a {
        let micros = duration.as_micros();
        async move {
            if micros % 1000 == 0 {
                let millis = u32::try_from(micros / 1000).unwrap_or(u32::MAX);
                self.delay_ms(millis).await;
            } else {
                let micros = u32::try_from(micros).unwrap_or(u32::MAX);
                self.delay_us(micros).await;
            }
        }
    }
}

/// [`HubTimer`] backed by the embassy-time driver linked into the firmware.
#[cfg(feature = "embassy-timer")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyTimer;

#[cfg(feature = "embassy-timer")]
impl HubTimer for EmbassyTimer {
    async fn delay_ms(&mut self, millis: u32) {
        embassy_time::Timer::after_millis(millis as u64).await;
    }

    async fn delay_us(&mut self, micros: u32) {
        embassy_time::Timer::after_micros(micros as u64).await;
    }
}
