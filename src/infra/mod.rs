//! Resources shared with tasks outside the diagnostic engine.
pub mod telemetry;
