//! Closed-loop control logic (pure, no I/O).

pub mod hysteresis;
