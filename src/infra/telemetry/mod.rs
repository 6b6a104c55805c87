//! Telemetry record shared between the poll task (producer) and the exporter
//! task (consumer).
//!
//! Both sides only ever *try* to take the lock: a busy mutex means "skip this
//! update/read", never an error. Fields keep their last decoded value when a
//! poll cycle fails.
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};

//==================================================================================TelemetryState
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Latest decoded vehicle values, in the units of the exported telemetry packet.
pub struct TelemetryState {
    /// Export counter, advanced by the exporter after each snapshot.
    pub sequence: u32,
    /// Time of the snapshot, set by the exporter (ms since boot).
    pub timestamp_ms: u32,
    /// Coolant temperature (°F).
    pub water_temp: f32,
    pub oil_temp: f32,
    pub oil_pressure: f32,
    /// Dynamic advance multiplier (0..1).
    pub dam: f32,
    /// A/F learning #1 (%).
    pub af_learned: f32,
    /// Air/fuel ratio.
    pub af_ratio: f32,
    /// Intake air temperature (°F).
    pub int_temp: f32,
    /// Feedback knock correction (degrees).
    pub fb_knock: f32,
    /// A/F correction #1 (%).
    pub af_correct: f32,
    pub inj_duty: f32,
    pub eth_conc: f32,
    pub engine_rpm: f32,
    /// Brake line pressure (bar).
    pub brake_pressure_bar: f32,
    /// Steering wheel angle (degrees, positive to the right).
    pub steering_angle_deg: f32,
}

impl TelemetryState {
    /// Every field at zero.
    pub const ZERO: Self = Self {
        sequence: 0,
        timestamp_ms: 0,
        water_temp: 0.0,
        oil_temp: 0.0,
        oil_pressure: 0.0,
        dam: 0.0,
        af_learned: 0.0,
        af_ratio: 0.0,
        int_temp: 0.0,
        fb_knock: 0.0,
        af_correct: 0.0,
        inj_duty: 0.0,
        eth_conc: 0.0,
        engine_rpm: 0.0,
        brake_pressure_bar: 0.0,
        steering_angle_deg: 0.0,
    };
}

//==================================================================================SharedTelemetry
/// [`TelemetryState`] behind a mutex with non-blocking accessors only.
pub struct SharedTelemetry {
    state: Mutex<CriticalSectionRawMutex, TelemetryState>,
}

impl Default for SharedTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedTelemetry {
    /// Zeroed record; usable in a `static`.
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(TelemetryState::ZERO),
        }
    }

    /// Apply `update` if the lock is free. Returns `false`, leaving the record
    /// untouched, when another task holds it.
    pub fn try_update<F>(&self, update: F) -> bool
    where
        F: FnOnce(&mut TelemetryState),
    {
        match self.state.try_lock() {
            Ok(mut guard) => {
                update(&mut *guard);
                true
            }
            Err(_) => false,
        }
    }

    /// Copy of the record, or `None` on contention.
    pub fn try_snapshot(&self) -> Option<TelemetryState> {
        self.state.try_lock().ok().map(|guard| *guard)
    }

    /// Exporter read: copy the record stamped with `now_ms`, then advance the
    /// stored sequence counter. `None` on contention.
    pub fn try_snapshot_and_advance(&self, now_ms: u32) -> Option<TelemetryState> {
        let mut guard = self.state.try_lock().ok()?;
        let mut snapshot = *guard;
        snapshot.timestamp_ms = now_ms;
        guard.sequence = guard.sequence.wrapping_add(1);
        Some(snapshot)
    }

    /// Underlying mutex, for consumers that need to hold the lock across an await.
    pub fn mutex(&self) -> &Mutex<CriticalSectionRawMutex, TelemetryState> {
        &self.state
    }
}
