//! Fail-safe panic handling and runtime diagnostics.
//!
//! The panic hook de-energises the relay before anything else: a panic
//! must never leave the load switched on while the chip resets.  Runtime
//! metrics (heap, uptime) accompany the periodic heartbeat log line.

use core::any::Any;

use crate::drivers::relay;

/// Runtime diagnostics snapshot collected on-demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeMetrics {
    pub heap_free: u32,
    pub heap_min_free: u32,
}

impl RuntimeMetrics {
    #[cfg(target_os = "espidf")]
    pub fn collect() -> Self {
        use esp_idf_svc::sys::*;
        // SAFETY: both calls only read allocator counters.
        let heap_free = unsafe { esp_get_free_heap_size() };
        let heap_min_free = unsafe { esp_get_minimum_free_heap_size() };
        Self {
            heap_free,
            heap_min_free,
        }
    }

    /// Simulation: fixed values so host logs look like the device's.
    #[cfg(not(target_os = "espidf"))]
    pub fn collect() -> Self {
        Self {
            heap_free: 200_000,
            heap_min_free: 180_000,
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

// ───────────────────────────────────────────────────────────────
// Custom panic handler — relay off before reset
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that forces the relay OFF.
///
/// Must be called once during init, before the relay is first driven.
/// The hook writes the pin register directly so it works no matter
/// which owner holds the relay driver at the time.
pub fn install_panic_handler(relay_gpio: i32, relay_active_low: bool) {
    std::panic::set_hook(Box::new(move |info| {
        relay::force_off_raw(relay_gpio, relay_active_low);

        let reason = panic_reason(info.payload());
        match info.location() {
            Some(loc) => log::error!(
                "PANIC: {} at {}:{} (relay forced OFF)",
                reason,
                loc.file(),
                loc.line()
            ),
            None => log::error!("PANIC: {} (relay forced OFF)", reason),
        }
    }));
}
