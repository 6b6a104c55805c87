//! Diagnostic engine: CAN/ISO-TP transport, frame routing, the request and
//! response layouts of the polled modules, and the poll state machine.
pub mod messages;
pub mod poll;
pub mod router;
pub mod transport;
