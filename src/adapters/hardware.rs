//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the DHT22 driver and the relay driver, exposing them through
//! [`SensorPort`] and [`RelayPort`].  This is the only module in the
//! system that touches actual hardware.  Both drivers are generic over
//! `embedded-hal` traits, so host builds plug in mock pins.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::adapters::time::Esp32TimeAdapter;
use crate::app::model::Reading;
use crate::app::ports::{ClockPort, RelayPort, SensorPort};
use crate::drivers::relay::RelayDriver;
use crate::error::{RelayError, SensorError};
use crate::sensors::dht22::Dht22;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P, D, R> {
    dht: Dht22<P, D>,
    relay: RelayDriver<R>,
    clock: Esp32TimeAdapter,
}

impl<P, D, R> HardwareAdapter<P, D, R>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    R: OutputPin,
{
    pub fn new(dht: Dht22<P, D>, relay: RelayDriver<R>) -> Self {
        Self {
            dht,
            relay,
            clock: Esp32TimeAdapter::new(),
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P, D, R> SensorPort for HardwareAdapter<P, D, R>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    R: OutputPin,
{
    fn read(&mut self) -> Result<Reading, SensorError> {
        let now_ms = self.clock.uptime_ms();

        // Bit timing is only a few µs wide; keep interrupts out of it.
        #[cfg(target_os = "espidf")]
        let measurement = {
            let dht = &mut self.dht;
            esp_idf_svc::hal::interrupt::free(|| dht.read(now_ms))?
        };
        #[cfg(not(target_os = "espidf"))]
        let measurement = self.dht.read(now_ms)?;

        Ok(Reading {
            temperature_c: measurement.temperature_c,
            humidity_pct: measurement.humidity_pct,
            taken_at_ms: now_ms,
        })
    }
}

// ── RelayPort implementation ──────────────────────────────────

impl<P, D, R> RelayPort for HardwareAdapter<P, D, R>
where
    P: InputPin + OutputPin,
    D: DelayNs,
    R: OutputPin,
{
    fn set(&mut self, on: bool) -> Result<(), RelayError> {
        self.relay.set(on)
    }

    fn is_on(&self) -> bool {
        self.relay.is_on()
    }
}
