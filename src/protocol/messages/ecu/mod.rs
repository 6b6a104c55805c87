//! Engine control unit, polled with the memory-address-indexed "SSM" service.
//!
//! The request lists 24-bit RAM addresses; the response echoes one byte per
//! address, in request order, after the service identifier.
//!
//! ```text
//! request   A8 00 | 000008 000009 00000A 00000E 00000F 000012 000046 FF6B49 FF8810..FF8813
//! response  E8    | cool  afc   afl   rpm_hi rpm_lo iat  afr   dam   knock[0..4]
//! ```
use embedded_can::Id;

use crate::{
    error::DecodeError,
    infra::telemetry::TelemetryState,
    protocol::{
        messages::{copy_request, DiagnosticProfile},
        transport::{ECU_REQUEST_ID, ECU_RESPONSE_ID},
    },
};

/// Read-memory-by-address-list service and its positive response.
pub const SSM_READ_ADDRESSES: u8 = 0xA8;
pub const SSM_READ_ADDRESSES_RESPONSE: u8 = 0xE8;

/// Service, then single-response padding mode 0, then one address per value.
#[rustfmt::skip]
pub const ECU_POLL_REQUEST: [u8; 38] = [
    SSM_READ_ADDRESSES, 0x00,
    0x00, 0x00, 0x08, // coolant
    0x00, 0x00, 0x09, // A/F correction #1
    0x00, 0x00, 0x0A, // A/F learning #1
    0x00, 0x00, 0x0E, // engine rpm (high)
    0x00, 0x00, 0x0F, // engine rpm (low)
    0x00, 0x00, 0x12, // intake air temperature
    0x00, 0x00, 0x46, // AFR
    0xFF, 0x6B, 0x49, // DAM
    0xFF, 0x88, 0x10, // feedback knock correction
    0xFF, 0x88, 0x11,
    0xFF, 0x88, 0x12,
    0xFF, 0x88, 0x13,
];

/// Service byte plus the twelve requested values.
pub const ECU_RESPONSE_LEN: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Values decoded from one ECU response.
pub struct EcuReadings {
    pub coolant_temp_f: f32,
    pub af_correction_pct: f32,
    pub af_learning_pct: f32,
    pub engine_rpm: f32,
    pub intake_air_temp_f: f32,
    pub af_ratio: f32,
    pub dam: f32,
    pub feedback_knock_deg: f32,
}

//==================================================================================Conversions
/// Temperature byte (°C + 40) to °F.
pub fn temperature_f(raw: u8) -> f32 {
    32.0 + 9.0 * (raw as f32 - 40.0) / 5.0
}

/// A/F correction or learning byte to percent (128 = 0 %).
pub fn af_trim_percent(raw: u8) -> f32 {
    (raw as f32 - 128.0) * 100.0 / 128.0
}

/// Engine speed in quarter-rpm steps.
pub fn engine_rpm(raw: u16) -> f32 {
    raw as f32 / 4.0
}

/// Air/fuel ratio byte (stoichiometric 14.7 at 128).
pub fn af_ratio(raw: u8) -> f32 {
    raw as f32 * 14.7 / 128.0
}

/// Dynamic advance multiplier, 1/16 steps.
pub fn dynamic_advance_multiplier(raw: u8) -> f32 {
    raw as f32 * 0.0625
}

/// Feedback knock correction is sent as the IEEE-754 bit pattern of an `f32`,
/// big-endian.
pub fn feedback_knock(bits: u32) -> f32 {
    f32::from_bits(bits)
}

//==================================================================================Profile
/// ECU on `0x7E0`/`0x7E8`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcuProfile;

impl DiagnosticProfile for EcuProfile {
    type Response = EcuReadings;

    fn request_id(&self) -> Id {
        ECU_REQUEST_ID.into()
    }

    fn response_id(&self) -> Id {
        ECU_RESPONSE_ID.into()
    }

    fn build_request(&self, out: &mut [u8]) -> Result<usize, DecodeError> {
        copy_request(&ECU_POLL_REQUEST, out)
    }

    fn decode(&self, payload: &[u8]) -> Result<EcuReadings, DecodeError> {
        let Some(&service) = payload.first() else {
            return Err(DecodeError::TooShort {
                needed: ECU_RESPONSE_LEN,
                found: 0,
            });
        };
        if service != SSM_READ_ADDRESSES_RESPONSE {
            return Err(DecodeError::UnexpectedService {
                expected: SSM_READ_ADDRESSES_RESPONSE,
                found: service,
            });
        }
        if payload.len() < ECU_RESPONSE_LEN {
            return Err(DecodeError::TooShort {
                needed: ECU_RESPONSE_LEN,
                found: payload.len(),
            });
        }

        let data = &payload[1..ECU_RESPONSE_LEN];
        Ok(EcuReadings {
            coolant_temp_f: temperature_f(data[0]),
            af_correction_pct: af_trim_percent(data[1]),
            af_learning_pct: af_trim_percent(data[2]),
            engine_rpm: engine_rpm(u16::from_be_bytes([data[3], data[4]])),
            intake_air_temp_f: temperature_f(data[5]),
            af_ratio: af_ratio(data[6]),
            dam: dynamic_advance_multiplier(data[7]),
            feedback_knock_deg: feedback_knock(u32::from_be_bytes([
                data[8], data[9], data[10], data[11],
            ])),
        })
    }

    fn apply(&self, readings: &EcuReadings, state: &mut TelemetryState) {
        state.water_temp = readings.coolant_temp_f;
        state.af_correct = readings.af_correction_pct;
        state.af_learned = readings.af_learning_pct;
        state.engine_rpm = readings.engine_rpm;
        state.int_temp = readings.intake_air_temp_f;
        state.af_ratio = readings.af_ratio;
        state.dam = readings.dam;
        state.fb_knock = readings.feedback_knock_deg;
    }
}
