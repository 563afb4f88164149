//! System configuration parameters
//!
//! All tunable parameters for the Thermobot agent.  Credentials can be
//! baked in at build time (`THERMOBOT_WIFI_SSID`, `THERMOBOT_WIFI_PASSWORD`,
//! `THERMOBOT_BOT_TOKEN`) and the whole struct can be overridden by a blob
//! stored in NVS.  Loaded once at startup.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Network ---
    pub wifi_ssid: heapless::String<32>,
    pub wifi_password: heapless::String<64>,
    /// Bot API token (`<bot id>:<secret>`).
    pub bot_token: heapless::String<64>,

    // --- Control ---
    /// Temperature (Celsius) at or above which an alert is raised
    pub temp_threshold_c: f32,
    /// Relay module energises on a LOW output level
    pub relay_active_low: bool,
    /// Ignore non-command chatter in group chats and address requesters by name
    pub group_mode: bool,

    // --- Timing ---
    /// Long-poll wait for inbound messages (seconds)
    pub poll_timeout_secs: u32,
    /// Fixed supervisor cycle period (milliseconds)
    pub cycle_interval_ms: u32,
    /// Upper bound on a blocking WiFi (re)connect (seconds)
    pub link_timeout_secs: u32,
    /// Delay after a fault reaches the loop boundary (milliseconds)
    pub fault_backoff_ms: u32,
    /// Long-poll wait used to drain the backlog at startup (seconds)
    pub startup_drain_wait_secs: u32,
    /// Emit a heartbeat log line every N cycles
    pub heartbeat_every_cycles: u32,
}

fn baked(value: Option<&'static str>) -> &'static str {
    value.unwrap_or("")
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Network
            wifi_ssid: heapless::String::try_from(baked(option_env!("THERMOBOT_WIFI_SSID")))
                .unwrap_or_default(),
            wifi_password: heapless::String::try_from(baked(option_env!(
                "THERMOBOT_WIFI_PASSWORD"
            )))
            .unwrap_or_default(),
            bot_token: heapless::String::try_from(baked(option_env!("THERMOBOT_BOT_TOKEN")))
                .unwrap_or_default(),

            // Control
            temp_threshold_c: 30.0,
            relay_active_low: false,
            group_mode: true,

            // Timing
            poll_timeout_secs: 5,
            cycle_interval_ms: 5000,
            link_timeout_secs: 20,
            fault_backoff_ms: 5000,
            startup_drain_wait_secs: 1,
            heartbeat_every_cycles: 60, // ~5 min at the default interval
        }
    }
}

impl SystemConfig {
    /// Range-check tunables and the shape of the credentials.
    ///
    /// Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-40.0..=80.0).contains(&self.temp_threshold_c) {
            return Err(ConfigError::ValidationFailed(
                "temp_threshold_c must be -40.0–80.0",
            ));
        }
        if !(1000..=60_000).contains(&self.cycle_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "cycle_interval_ms must be 1000–60000",
            ));
        }
        if self.poll_timeout_secs * 1000 > self.cycle_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "poll_timeout_secs must not exceed the cycle interval",
            ));
        }
        if !(1..=120).contains(&self.link_timeout_secs) {
            return Err(ConfigError::ValidationFailed(
                "link_timeout_secs must be 1–120",
            ));
        }
        if !(100..=60_000).contains(&self.fault_backoff_ms) {
            return Err(ConfigError::ValidationFailed(
                "fault_backoff_ms must be 100–60000",
            ));
        }
        if self.startup_drain_wait_secs > self.poll_timeout_secs.max(1) {
            return Err(ConfigError::ValidationFailed(
                "startup_drain_wait_secs must not exceed poll_timeout_secs",
            ));
        }
        if self.heartbeat_every_cycles == 0 {
            return Err(ConfigError::ValidationFailed(
                "heartbeat_every_cycles must be non-zero",
            ));
        }
        if self.wifi_ssid.is_empty() {
            return Err(ConfigError::ValidationFailed("wifi_ssid is empty"));
        }
        if !self.wifi_password.is_empty() && self.wifi_password.len() < 8 {
            return Err(ConfigError::ValidationFailed(
                "wifi_password must be empty or 8–64 bytes",
            ));
        }
        if !is_bot_token(&self.bot_token) {
            return Err(ConfigError::ValidationFailed(
                "bot_token must look like <digits>:<secret>",
            ));
        }
        Ok(())
    }
}

fn is_bot_token(token: &str) -> bool {
    match token.split_once(':') {
        Some((id, secret)) => {
            !id.is_empty()
                && id.bytes().all(|b| b.is_ascii_digit())
                && !secret.is_empty()
                && secret
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        }
        None => false,
    }
}
