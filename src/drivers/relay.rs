//! Relay output driver.
//!
//! Resolves the board's polarity once so the rest of the firmware deals in
//! logical on/off only.  The driver tracks the last level it successfully
//! wrote; a failed write leaves the tracked state untouched.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `RelayDriver` wraps an output `PinDriver`;
//! [`force_off_raw`] writes the pin register directly and is the only path
//! usable from the panic hook.
//! On host/test: `RelayDriver` takes any `embedded-hal` output pin and
//! `force_off_raw` is a no-op.

use embedded_hal::digital::OutputPin;
use log::info;

use crate::error::RelayError;

/// Electrical level that realises the logical state `on`.
pub fn level_for(on: bool, active_low: bool) -> bool {
    on != active_low
}

pub struct RelayDriver<P> {
    pin: P,
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Takes the pin and drives it to OFF immediately.
    pub fn new(pin: P, active_low: bool) -> Result<Self, RelayError> {
        let mut relay = Self {
            pin,
            active_low,
            on: false,
        };
        relay.write(false)?;
        info!(
            "Relay: ready (active-{})",
            if active_low { "low" } else { "high" }
        );
        Ok(relay)
    }

    /// Drive the relay.  Re-writing the current state is harmless and keeps
    /// the pin in sync if anything else touched it.
    pub fn set(&mut self, on: bool) -> Result<(), RelayError> {
        self.write(on)?;
        if self.on != on {
            info!("Relay: {}", if on { "ON" } else { "OFF" });
        }
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    fn write(&mut self, on: bool) -> Result<(), RelayError> {
        let result = if level_for(on, self.active_low) {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|_| RelayError::GpioWriteFailed)
    }
}

/// Drive `gpio` to the OFF level without going through the driver.
///
/// For the panic hook: no allocation, no locking, no ownership needed.
#[cfg(target_os = "espidf")]
pub fn force_off_raw(gpio: i32, active_low: bool) {
    // SAFETY: gpio_set_level only writes the output register of a pin the
    // relay driver has already configured as an output.
    unsafe {
        esp_idf_svc::sys::gpio_set_level(gpio, u32::from(level_for(false, active_low)));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn force_off_raw(_gpio: i32, _active_low: bool) {}
