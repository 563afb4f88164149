//! Unified error types for the Thermobot firmware.
//!
//! A single `Error` enum that every boundary converts into, so the
//! supervisor's fault containment handles one type.  Leaf variants are
//! `Copy` and carry no heap data; they are cheap to log and to stash in
//! [`AppEvent`](crate::app::events::AppEvent)s.
//!
//! | Error          | Recovery                                          |
//! |----------------|---------------------------------------------------|
//! | `SensorError`  | skip the control decision for this cycle          |
//! | `LinkError`    | reconnect attempt, otherwise tolerated            |
//! | `ChannelError` | logged, retried next cycle                        |
//! | `RelayError`   | escapes to the loop boundary (fault backoff)      |

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The temperature/humidity sensor could not be read.
    Sensor(SensorError),
    /// Driving the relay output failed.
    Relay(RelayError),
    /// Network link could not be (re-)established.
    Link(LinkError),
    /// The chat transport failed to fetch or deliver.
    Channel(ChannelError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Relay(e) => write!(f, "relay: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Channel(e) => write!(f, "channel: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The sensor did not answer or a bit edge never arrived.
    Timeout,
    /// The 40-bit frame checksum did not match.
    Checksum,
    /// Decoded values are outside the physically plausible range.
    OutOfRange,
    /// Read attempted inside the sensor's minimum sampling period.
    NotReady,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "sensor timed out"),
            Self::Checksum => write!(f, "frame checksum mismatch"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::NotReady => write!(f, "sensor not ready"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Relay errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayError {
    /// Setting the output level failed.
    GpioWriteFailed,
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<RelayError> for Error {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
    /// Association did not complete within the allowed time.
    Timeout,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
            Self::Timeout => write!(f, "WiFi connection timed out"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Channel errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// The HTTP request could not be built or sent.
    Transport,
    /// The server answered with a non-success status code.
    HttpStatus(u16),
    /// The response body was not valid bot-API JSON.
    Decode,
    /// The bot API answered `ok: false`.
    Rejected,
    /// The response body exceeded the receive buffer.
    TooLarge,
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "HTTP transport failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Decode => write!(f, "malformed API response"),
            Self::Rejected => write!(f, "API rejected request"),
            Self::TooLarge => write!(f, "response too large"),
        }
    }
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration and setup
// ---------------------------------------------------------------------------

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        match e {
            ConfigError::ValidationFailed(msg) => Self::Config(msg),
            ConfigError::Corrupted => Self::Config("stored config corrupted"),
            ConfigError::IoError => Self::Config("config storage I/O failed"),
        }
    }
}

/// Tags a platform setup failure with the stage it happened in.
///
/// The platform error is logged here; only the stage name travels on as
/// [`Error::Init`].
pub trait InitContext<T> {
    fn init_context(self, stage: &'static str) -> Result<T>;
}

impl<T, E: fmt::Display> InitContext<T> for core::result::Result<T, E> {
    fn init_context(self, stage: &'static str) -> Result<T> {
        self.map_err(|e| {
            log::error!("Init: {} failed: {}", stage, e);
            Error::Init(stage)
        })
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
