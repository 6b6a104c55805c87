//! Diagnostic request/response layouts of the polled modules.
//!
//! Each module is described by a [`DiagnosticProfile`]: which identifiers it
//! talks on, the fixed request it is polled with, how its response payload is
//! decoded, and which telemetry fields the decoded values feed.
use embedded_can::Id;

use crate::{error::DecodeError, infra::telemetry::TelemetryState};

pub mod ecu;
pub mod vdc;

pub use ecu::{EcuProfile, EcuReadings};
pub use vdc::{VdcProfile, VdcReadings};

/// One polled module.
pub trait DiagnosticProfile {
    /// Decoded response.
    type Response;

    /// Identifier requests (and receiver-side Flow Control) are sent to.
    fn request_id(&self) -> Id;

    /// Identifier the module answers on.
    fn response_id(&self) -> Id;

    /// Write the request payload into `out`, returning its length.
    fn build_request(&self, out: &mut [u8]) -> Result<usize, DecodeError>;

    /// Interpret a reassembled response payload.
    fn decode(&self, payload: &[u8]) -> Result<Self::Response, DecodeError>;

    /// Copy the decoded values into the shared record.
    fn apply(&self, response: &Self::Response, state: &mut TelemetryState);
}

/// Copy a fixed request into `out`.
pub(crate) fn copy_request(request: &[u8], out: &mut [u8]) -> Result<usize, DecodeError> {
    let available = out.len();
    let target = out
        .get_mut(..request.len())
        .ok_or(DecodeError::BufferTooSmall {
            needed: request.len(),
            available,
        })?;
    target.copy_from_slice(request);
    Ok(request.len())
}
