//! `datahub-diag` library: the diagnostic request/response engine of a
//! CAN-connected telemetry hub, usable in a `no_std` environment. The crate
//! exposes the CAN frame router, the ISO-TP codec, the poll state machine that
//! drives one diagnostic exchange per period, the response decoders, and the
//! shared telemetry record consumed by the exporter task.
#![no_std]
//==================================================================================
/// Fixed-capacity buffers shared by the codec and the decoders.
pub mod core;
/// Transport, codec, decoding, and polling errors.
pub mod error;
/// State shared with tasks outside the protocol engine (telemetry record).
pub mod infra;
/// Diagnostic protocol implementation: CAN transport, ISO-TP, routing,
/// response decoders, and the poll state machine.
pub mod protocol;
//==================================================================================
