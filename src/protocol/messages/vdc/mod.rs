//! ABS / vehicle dynamics control module, polled with a read-by-identifier
//! request. The response repeats `(identifier, value)` pairs of two big-endian
//! 16-bit words after the service byte.
use embedded_can::Id;

use crate::{
    error::DecodeError,
    infra::telemetry::TelemetryState,
    protocol::{
        messages::{copy_request, DiagnosticProfile},
        transport::{VDC_REQUEST_ID, VDC_RESPONSE_ID},
    },
};

pub const READ_DATA_BY_IDENTIFIER: u8 = 0x22;
pub const READ_DATA_BY_IDENTIFIER_RESPONSE: u8 = 0x62;

/// Brake line pressure, 0.1 bar per bit.
pub const BRAKE_PRESSURE_ID: u16 = 0x1010;
/// Steering wheel angle, 0.1° per bit, sign opposite to the vehicle convention.
pub const STEERING_ANGLE_ID: u16 = 0x1029;

pub const VDC_POLL_REQUEST: [u8; 5] = [
    READ_DATA_BY_IDENTIFIER,
    (BRAKE_PRESSURE_ID >> 8) as u8,
    BRAKE_PRESSURE_ID as u8,
    (STEERING_ANGLE_ID >> 8) as u8,
    STEERING_ANGLE_ID as u8,
];

/// Service byte plus one complete group.
const MIN_RESPONSE_LEN: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Values found in one VDC response; identifiers missing from it stay `None`.
pub struct VdcReadings {
    pub brake_pressure_bar: Option<f32>,
    pub steering_angle_deg: Option<f32>,
}

pub fn brake_pressure_bar(raw: u16) -> f32 {
    raw as f32 * 0.1
}

pub fn steering_angle_deg(raw: u16) -> f32 {
    -(raw as i16 as f32) * 0.1
}

/// VDC on `0x7B0`/`0x7B8`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VdcProfile;

impl DiagnosticProfile for VdcProfile {
    type Response = VdcReadings;

    fn request_id(&self) -> Id {
        VDC_REQUEST_ID.into()
    }

    fn response_id(&self) -> Id {
        VDC_RESPONSE_ID.into()
    }

    fn build_request(&self, out: &mut [u8]) -> Result<usize, DecodeError> {
        copy_request(&VDC_POLL_REQUEST, out)
    }

    fn decode(&self, payload: &[u8]) -> Result<VdcReadings, DecodeError> {
        let Some(&service) = payload.first() else {
            return Err(DecodeError::TooShort {
                needed: MIN_RESPONSE_LEN,
                found: 0,
            });
        };
        if service != READ_DATA_BY_IDENTIFIER_RESPONSE {
            return Err(DecodeError::UnexpectedService {
                expected: READ_DATA_BY_IDENTIFIER_RESPONSE,
                found: service,
            });
        }
        if payload.len() < MIN_RESPONSE_LEN {
            return Err(DecodeError::TooShort {
                needed: MIN_RESPONSE_LEN,
                found: payload.len(),
            });
        }

        let mut readings = VdcReadings::default();
        // A trailing partial group is ignored.
        for group in payload[1..].chunks_exact(4) {
            let id = u16::from_be_bytes([group[0], group[1]]);
            let value = u16::from_be_bytes([group[2], group[3]]);
            match id {
                BRAKE_PRESSURE_ID => readings.brake_pressure_bar = Some(brake_pressure_bar(value)),
                STEERING_ANGLE_ID => readings.steering_angle_deg = Some(steering_angle_deg(value)),
                _ => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("VDC identifier {:#06X} skipped", id);
                }
            }
        }

        if readings.brake_pressure_bar.is_none() && readings.steering_angle_deg.is_none() {
            return Err(DecodeError::NoKnownIdentifier);
        }
        Ok(readings)
    }

    fn apply(&self, readings: &VdcReadings, state: &mut TelemetryState) {
        if let Some(pressure) = readings.brake_pressure_bar {
            state.brake_pressure_bar = pressure;
        }
        if let Some(angle) = readings.steering_angle_deg {
            state.steering_angle_deg = angle;
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
