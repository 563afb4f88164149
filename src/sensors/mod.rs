//! Sensor drivers.
//!
//! The DHT22 is the only sensor on the board; the hardware adapter wraps it
//! behind [`SensorPort`](crate::app::ports::SensorPort).

pub mod dht22;
