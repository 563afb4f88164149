//! WiFi station-mode adapter.
//!
//! Implements [`LinkPort`] — the hexagonal boundary for network
//! connectivity.  Reconnection is bounded: `ensure_connected` starts an
//! association and polls once per second until the link is up or the
//! caller's timeout runs out.  It never blocks longer than that.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via `esp_idf_svc::wifi::EspWifi`.
//! - **all other targets**: simulation with an injectable access point for host-side tests.

use log::{error, info, warn};

use crate::app::ports::LinkPort;
use crate::error::LinkError;

use super::utils::is_printable_ascii;

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connecting,
    Connected,
}

#[cfg(target_os = "espidf")]
const POLL_INTERVAL_MS: u32 = 1_000;
#[cfg(not(target_os = "espidf"))]
const POLL_INTERVAL_MS: u32 = 10;

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn validate_ssid(ssid: &str) -> Result<(), LinkError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(LinkError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), LinkError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    state: WifiState,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    /// Simulation: whether the access point answers association requests.
    #[cfg(not(target_os = "espidf"))]
    sim_ap_available: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_associated: bool,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            wifi,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            state: WifiState::Disconnected,
            ssid: heapless::String::new(),
            password: heapless::String::new(),
            sim_ap_available: true,
            sim_associated: false,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    /// Validate and store station credentials.  An empty password selects
    /// an open network.
    pub fn set_credentials(&mut self, ssid: &str, password: &str) -> Result<(), LinkError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.ssid.clear();
        self.ssid.push_str(ssid).map_err(|_| LinkError::InvalidSsid)?;
        self.password.clear();
        self.password
            .push_str(password)
            .map_err(|_| LinkError::InvalidPassword)?;
        self.platform_configure()?;
        info!("WiFi: credentials updated (SSID='{}')", self.ssid);
        Ok(())
    }

    /// Start an association and wait up to `timeout_secs` for it.
    pub fn connect(&mut self, timeout_secs: u32) -> Result<(), LinkError> {
        if self.ssid.is_empty() {
            return Err(LinkError::NoCredentials);
        }

        info!("WiFi: connecting to '{}'", self.ssid);
        self.state = WifiState::Connecting;

        if let Err(e) = self.platform_begin_connect() {
            error!("WiFi: connection failed: {}", e);
            self.state = WifiState::Disconnected;
            return Err(e);
        }

        let polls = timeout_secs.saturating_mul(1_000) / POLL_INTERVAL_MS;
        for _ in 0..=polls {
            if self.platform_is_connected() {
                self.state = WifiState::Connected;
                self.log_address();
                return Ok(());
            }
            Self::pause();
        }

        self.state = WifiState::Disconnected;
        Err(LinkError::Timeout)
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_configure(&mut self) -> Result<(), LinkError> {
        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let client = ClientConfiguration {
            ssid: self
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| LinkError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        };
        self.wifi
            .set_configuration(&Configuration::Client(client))
            .map_err(|e| {
                error!("WiFi: set_configuration failed: {}", e);
                LinkError::ConnectionFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_configure(&mut self) -> Result<(), LinkError> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_begin_connect(&mut self) -> Result<(), LinkError> {
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|e| {
                error!("WiFi: start failed: {}", e);
                LinkError::ConnectionFailed
            })?;
        }
        // Drop any half-open association before trying again.
        let _ = self.wifi.disconnect();
        self.wifi.connect().map_err(|e| {
            error!("WiFi: connect request failed: {}", e);
            LinkError::ConnectionFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_begin_connect(&mut self) -> Result<(), LinkError> {
        self.sim_associated = self.sim_ap_available;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_associated
    }

    #[cfg(target_os = "espidf")]
    fn log_address(&self) {
        match self.wifi.sta_netif().get_ip_info() {
            Ok(ip) => info!("WiFi: connected, IP {}", ip.ip),
            Err(_) => info!("WiFi: connected"),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn log_address(&self) {
        info!("WiFi(sim): connected to '{}'", self.ssid);
    }

    #[cfg(target_os = "espidf")]
    fn pause() {
        esp_idf_svc::hal::delay::FreeRtos::delay_ms(POLL_INTERVAL_MS);
    }

    #[cfg(not(target_os = "espidf"))]
    fn pause() {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(POLL_INTERVAL_MS)));
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Make the simulated access point reachable or not.  Taking it away
    /// also drops an existing association.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_ap_available(&mut self, available: bool) {
        self.sim_ap_available = available;
        if !available {
            self.sim_associated = false;
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// LinkPort
// ───────────────────────────────────────────────────────────────

impl LinkPort for WifiAdapter {
    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn ensure_connected(&mut self, timeout_secs: u32) -> bool {
        if self.platform_is_connected() {
            self.state = WifiState::Connected;
            return true;
        }
        match self.connect(timeout_secs) {
            Ok(()) => true,
            Err(e) => {
                warn!("WiFi: still offline after {}s: {}", timeout_secs, e);
                false
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
