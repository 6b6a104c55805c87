//! Abstraction traits used by the transport layer (CAN bus transmit side and timer).
pub mod can_bus;
pub mod hub_timer;
