//! Thermobot Firmware — Main Entry Point
//!
//! Hexagonal architecture around a single sequential supervisor loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   WifiAdapter    TelegramChannel  Esp32Time   │
//! │  (Sensor+Relay)    (Link)         (Channel)        (Clock)     │
//! │  LogEventSink      NvsAdapter                                  │
//! │  (EventSink)       (Config)                                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Supervisor (pure logic)                   │    │
//! │  │  Hysteresis · CommandRouter · Allow-list · Cursor      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Watchdog · panic hook (relay OFF)                             │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::{PinDriver, Pull};
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::EspWifi;

use thermobot::adapters::hardware::HardwareAdapter;
use thermobot::adapters::log_sink::LogEventSink;
use thermobot::adapters::nvs::NvsAdapter;
use thermobot::adapters::telegram::{EspHttpTransport, TelegramChannel};
use thermobot::adapters::time::Esp32TimeAdapter;
use thermobot::adapters::wifi::WifiAdapter;
use thermobot::app::ports::ConfigPort;
use thermobot::app::supervisor::Supervisor;
use thermobot::config::SystemConfig;
use thermobot::diagnostics;
use thermobot::drivers::relay::{self, RelayDriver};
use thermobot::drivers::watchdog::Watchdog;
use thermobot::error::{Error, InitContext};
use thermobot::pins;
use thermobot::sensors::dht22::Dht22;

// ── Fatal path ────────────────────────────────────────────────

/// Relay OFF, wait out the backoff, restart the chip.
fn restart_after_fatal(reason: &dyn core::fmt::Display, config: &SystemConfig) -> ! {
    error!("FATAL: {} (relay OFF, restarting)", reason);
    relay::force_off_raw(pins::RELAY_GPIO, config.relay_active_low);
    FreeRtos::delay_ms(config.fault_backoff_ms);
    // SAFETY: esp_restart never returns; nothing is held across it.
    unsafe { esp_idf_svc::sys::esp_restart() }
}

/// Unwrap a setup step or take the fatal path.
fn or_fatal<T>(result: Result<T, Error>, config: &SystemConfig) -> T {
    result.unwrap_or_else(|e| restart_after_fatal(&e, config))
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Thermobot v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or build-time defaults) ──────
    let nvs = NvsAdapter::new();
    let config = match nvs.as_ref().map(|n| n.load()) {
        Ok(Ok(cfg)) => cfg,
        Ok(Err(e)) => {
            warn!("Config load failed ({}), using build-time defaults", e);
            SystemConfig::default()
        }
        Err(e) => {
            warn!("NVS init failed ({}), using build-time defaults", e);
            SystemConfig::default()
        }
    };
    diagnostics::install_panic_handler(pins::RELAY_GPIO, config.relay_active_low);

    // ── 3. Relay first: OFF before anything else can fail ─────
    let peripherals = or_fatal(Peripherals::take().init_context("peripherals"), &config);
    let relay_pin = or_fatal(
        PinDriver::output(peripherals.pins.gpio2).init_context("relay pin"),
        &config,
    );
    let relay = or_fatal(
        RelayDriver::new(relay_pin, config.relay_active_low).map_err(Error::from),
        &config,
    );

    or_fatal(config.validate().map_err(Error::from), &config);
    info!(
        "Config: threshold={:.1}°C cycle={}ms poll={}s group_mode={}",
        config.temp_threshold_c,
        config.cycle_interval_ms,
        config.poll_timeout_secs,
        config.group_mode
    );

    // ── 4. Sensor ─────────────────────────────────────────────
    let mut dht_pin = or_fatal(
        PinDriver::input_output_od(peripherals.pins.gpio4).init_context("sensor pin"),
        &config,
    );
    or_fatal(dht_pin.set_pull(Pull::Up).init_context("sensor pull-up"), &config);
    let mut hw = HardwareAdapter::new(Dht22::new(dht_pin, Ets), relay);

    // ── 5. Network ────────────────────────────────────────────
    let sysloop = or_fatal(EspSystemEventLoop::take().init_context("event loop"), &config);
    let nvs_partition = or_fatal(
        EspDefaultNvsPartition::take().init_context("NVS partition"),
        &config,
    );
    let esp_wifi = or_fatal(
        EspWifi::new(peripherals.modem, sysloop, Some(nvs_partition)).init_context("wifi driver"),
        &config,
    );
    let mut link = WifiAdapter::new(esp_wifi);
    or_fatal(
        link.set_credentials(&config.wifi_ssid, &config.wifi_password)
            .map_err(Error::from),
        &config,
    );
    let mut channel = TelegramChannel::new(&config.bot_token, EspHttpTransport);

    // ── 6. Supervisor ─────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut clock = Esp32TimeAdapter::new();
    let watchdog = Watchdog::new(&config);

    let mut supervisor = Supervisor::new(config.clone());
    if let Err(e) = supervisor.start(&mut hw, &mut link, &mut channel, &mut sink) {
        supervisor.shutdown(&mut hw, &mut sink);
        restart_after_fatal(&e, &config);
    }

    info!("System ready. Entering supervisor loop.");
    supervisor.run(
        &mut hw,
        &mut link,
        &mut channel,
        &mut clock,
        &mut sink,
        || watchdog.feed(),
    )
}
