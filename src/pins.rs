//! GPIO assignments for the Thermobot board (ESP32 DevKit + relay module).
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

/// DHT22 single-wire data line (10 kΩ pull-up to 3V3).
pub const DHT22_GPIO: i32 = 4;

/// Relay module input.  Polarity is a configuration flag, see
/// [`SystemConfig::relay_active_low`](crate::config::SystemConfig::relay_active_low).
pub const RELAY_GPIO: i32 = 2;
