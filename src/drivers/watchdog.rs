//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the supervisor loop
//! stalls.  The timeout has to cover the worst-case healthy cycle: a
//! bounded WiFi reconnect, the long-poll, a round of replies and the cycle
//! sleep.  [`timeout_for`] derives it from the configuration and never
//! goes below [`MIN_TIMEOUT_MS`].
//!
//! The supervisor calls `feed()` once per cycle.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::config::SystemConfig;

pub const MIN_TIMEOUT_MS: u32 = 60_000;

/// Allowance for HTTP round-trips (replies, notifications) on top of the
/// configured waits.
const REQUEST_ALLOWANCE_MS: u32 = 20_000;

/// Watchdog timeout for `cfg`.
pub fn timeout_for(cfg: &SystemConfig) -> u32 {
    let worst_cycle = cfg
        .link_timeout_secs
        .saturating_add(cfg.poll_timeout_secs)
        .saturating_mul(1_000)
        .saturating_add(cfg.cycle_interval_ms.max(cfg.fault_backoff_ms))
        .saturating_add(REQUEST_ALLOWANCE_MS);
    worst_cycle.max(MIN_TIMEOUT_MS)
}

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Initialise and subscribe the current task to the TWDT.
    pub fn new(cfg: &SystemConfig) -> Self {
        let timeout_ms = timeout_for(cfg);

        #[cfg(target_os = "espidf")]
        {
            unsafe {
                let wdt_cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&wdt_cfg);
                if ret != ESP_OK {
                    log::warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!(
                        "Watchdog: subscribed ({}s timeout, panic on trigger)",
                        timeout_ms / 1_000
                    );
                } else {
                    log::warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self {
                    timeout_ms,
                    subscribed,
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): no-op ({}s timeout)", timeout_ms / 1_000);
            Self { timeout_ms }
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Feed the watchdog. Must be called at least every `timeout_ms`.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}
