//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).  Each
//! line starts with a fixed tag so the serial console can be grepped:
//!
//! | Tag     | Events                                          |
//! |---------|-------------------------------------------------|
//! | `START` | startup finished                                |
//! | `READ`  | sensor samples and read failures                |
//! | `CTRL`  | control decisions, relay changes, fan-out       |
//! | `AUTH`  | allow-list learning and refusals                |
//! | `CMD`   | handled commands, failed replies                |
//! | `NET`   | link and update-fetch state                     |
//! | `FAULT` | faults contained at the loop boundary           |
//! | `BEAT`  | periodic heartbeat                              |

use log::{error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::diagnostics::RuntimeMetrics;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { cursor } => {
                info!("START | cursor={:?}", cursor);
            }
            AppEvent::Reading(r) => {
                info!(
                    "READ  | T={:.2}\u{00b0}C | RH={:.2}% | t={}ms",
                    r.temperature_c, r.humidity_pct, r.taken_at_ms
                );
            }
            AppEvent::SensorFailed(e) => {
                warn!("READ  | failed: {}", e);
            }
            AppEvent::Decision {
                decision,
                temperature_c,
            } => {
                info!("CTRL  | {:?} at {:.2}\u{00b0}C", decision, temperature_c);
            }
            AppEvent::RelayChanged { on, cause } => {
                info!(
                    "CTRL  | relay {} ({:?})",
                    if *on { "ON" } else { "OFF" },
                    cause
                );
            }
            AppEvent::Notified { delivered, failed } => {
                if *failed == 0 {
                    info!("CTRL  | notified {} recipient(s)", delivered);
                } else {
                    warn!(
                        "CTRL  | notified {} recipient(s), {} failed",
                        delivered, failed
                    );
                }
            }
            AppEvent::RecipientAuthorized { chat_id } => {
                info!("AUTH  | learned chat {}", chat_id);
            }
            AppEvent::Unauthorized { chat_id } => {
                warn!("AUTH  | refused chat {}", chat_id);
            }
            AppEvent::CommandHandled { chat_id, command } => {
                info!("CMD   | {:?} from {}", command, chat_id);
            }
            AppEvent::ReplyFailed { chat_id, error } => {
                warn!("CMD   | reply to {} failed: {}", chat_id, error);
            }
            AppEvent::FetchFailed(e) => {
                warn!("NET   | fetch failed: {}", e);
            }
            AppEvent::LinkLost => {
                warn!("NET   | link lost");
            }
            AppEvent::LinkRestored => {
                info!("NET   | link up");
            }
            AppEvent::LinkDown => {
                warn!("NET   | link down, continuing offline");
            }
            AppEvent::CycleFault(e) => {
                error!("FAULT | {}", e);
            }
            AppEvent::Heartbeat { cycles } => {
                let m = RuntimeMetrics::collect();
                info!(
                    "BEAT  | cycles={} | heap={}B (min {}B)",
                    cycles, m.heap_free, m.heap_min_free
                );
            }
        }
    }
}
