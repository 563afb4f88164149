//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor (domain)
//! ```
//!
//! Driven adapters (sensor, relay, WiFi link, bot channel, clock, event
//! sinks, config storage) implement these traits.  The
//! [`Supervisor`](super::supervisor::Supervisor) consumes them via
//! generics, so the domain core never touches hardware or sockets directly.
//!
//! Every fallible port returns a typed `Result`; the supervisor maps each
//! error to one documented recovery action.

use crate::config::SystemConfig;
use crate::error::{ChannelError, RelayError, SensorError};

use super::model::{Reading, Update};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one temperature/humidity sample per call.
pub trait SensorPort {
    /// Must not block longer than the device-level timeout.
    fn read(&mut self) -> Result<Reading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Relay port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Binary output with logical (polarity-resolved) semantics.
pub trait RelayPort {
    /// Idempotent: setting the current state again is a no-op on the wire.
    fn set(&mut self, on: bool) -> Result<(), RelayError>;

    fn is_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain ↔ network)
// ───────────────────────────────────────────────────────────────

pub trait LinkPort {
    fn is_connected(&self) -> bool;

    /// Reconnect if needed, blocking for at most `timeout_secs`.
    /// Returns whether the link is up afterwards.
    fn ensure_connected(&mut self, timeout_secs: u32) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Channel port (driven adapter: domain ↔ chat bot API)
// ───────────────────────────────────────────────────────────────

pub trait ChannelPort {
    /// Long-poll for updates with id ≥ `offset`, waiting up to `wait_secs`.
    fn fetch_updates(
        &mut self,
        offset: Option<u64>,
        wait_secs: u32,
    ) -> Result<Vec<Update>, ChannelError>;

    fn send(&mut self, chat_id: i64, text: &str) -> Result<(), ChannelError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

pub trait ClockPort {
    /// Monotonic milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    fn sleep_ms(&mut self, ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting; invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], never clamped.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
