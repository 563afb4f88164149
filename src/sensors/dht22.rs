//! DHT22 (AM2302) temperature/humidity sensor on a single-wire bus.
//!
//! The host pulls the open-drain line low for ≥1 ms, releases it, and the
//! sensor answers with an 80 µs low / 80 µs high preamble followed by 40
//! data bits.  Every bit starts with a ~50 µs low; the following high lasts
//! ~26 µs for a `0` and ~70 µs for a `1`.
//!
//! Bits are classified by comparing the high phase with the low phase of
//! the same bit, both measured in poll iterations.  That keeps the decode
//! independent of how long one poll actually takes on the target.
//!
//! Frame layout (big-endian):
//!
//! | Bytes | Meaning                                        |
//! |-------|------------------------------------------------|
//! | 0–1   | relative humidity × 10                         |
//! | 2–3   | temperature × 10, bit 15 = sign                |
//! | 4     | low byte of the sum of bytes 0–3               |
//!
//! ## Dual-target design
//!
//! The driver is generic over `embedded-hal` 1.0 pin and delay traits.  On
//! ESP-IDF it runs on an open-drain `PinDriver` with `Ets` delays; on the
//! host tests drive it with a scripted line.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorError;

/// The sensor needs this long between conversions.
pub const MIN_INTERVAL_MS: u64 = 2_000;

const START_LOW_MS: u32 = 2;
const RELEASE_US: u32 = 30;
/// Upper bound, in polls, for any single line phase.
const PHASE_TIMEOUT_POLLS: u32 = 200;

const HUMIDITY_MAX: f32 = 100.0;
const TEMP_MIN_C: f32 = -40.0;
const TEMP_MAX_C: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Decode and validate one raw 5-byte frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<Measurement, SensorError> {
    let sum = frame[..4]
        .iter()
        .fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::Checksum);
    }

    let humidity_pct = f32::from(u16::from_be_bytes([frame[0], frame[1]])) / 10.0;

    let raw_t = u16::from_be_bytes([frame[2], frame[3]]);
    let magnitude = f32::from(raw_t & 0x7FFF) / 10.0;
    let temperature_c = if raw_t & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    };

    if humidity_pct > HUMIDITY_MAX || !(TEMP_MIN_C..=TEMP_MAX_C).contains(&temperature_c) {
        return Err(SensorError::OutOfRange);
    }

    Ok(Measurement {
        temperature_c,
        humidity_pct,
    })
}

pub struct Dht22<P, D> {
    pin: P,
    delay: D,
    last_attempt_ms: Option<u64>,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    /// `pin` must be open-drain with a pull-up; it idles released (high).
    pub fn new(mut pin: P, delay: D) -> Self {
        let _ = pin.set_high();
        Self {
            pin,
            delay,
            last_attempt_ms: None,
        }
    }

    /// Run one conversion.  `now_ms` is the caller's monotonic uptime and
    /// is used only for the minimum-interval guard.
    pub fn read(&mut self, now_ms: u64) -> Result<Measurement, SensorError> {
        if let Some(last) = self.last_attempt_ms {
            if now_ms.saturating_sub(last) < MIN_INTERVAL_MS {
                return Err(SensorError::NotReady);
            }
        }
        self.last_attempt_ms = Some(now_ms);

        let frame = self.read_frame();
        // Leave the bus released whatever happened.
        let _ = self.pin.set_high();
        decode_frame(frame?)
    }

    fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::Timeout)?;
        self.delay.delay_ms(START_LOW_MS);
        self.pin.set_high().map_err(|_| SensorError::Timeout)?;
        self.delay.delay_us(RELEASE_US);

        // Sensor acknowledges: pulls low, then high, then starts bit 0.
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for byte in &mut frame {
            for _ in 0..8 {
                let low = self.wait_while(false)?;
                let high = self.wait_while(true)?;
                *byte = (*byte << 1) | u8::from(high > low);
            }
        }
        Ok(frame)
    }

    /// Poll until the line leaves `level`; returns the number of polls.
    fn wait_while(&mut self, level: bool) -> Result<u32, SensorError> {
        let mut polls = 0;
        while self.pin.is_high().map_err(|_| SensorError::Timeout)? == level {
            polls += 1;
            if polls > PHASE_TIMEOUT_POLLS {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_us(1);
        }
        Ok(polls)
    }
}
