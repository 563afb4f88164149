//! Application core — pure domain logic, zero I/O.
//!
//! Hysteresis control, command routing, authorization and the supervisor
//! cycle.  All interaction with hardware and the network happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod cursor;
pub mod events;
pub mod model;
pub mod ports;
pub mod recipients;
pub mod router;
pub mod supervisor;
