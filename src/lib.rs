//! Thermobot firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod pins;

// Hardware-facing modules; real implementations are selected by cfg
// attributes inside, host builds get simulation backends.
pub mod adapters;
pub mod drivers;
pub mod sensors;
