//! Supervisor — the hexagonal core and the single control cycle.
//!
//! [`Supervisor`] owns every piece of mutable agent state (allow-list,
//! cursor, last reading, controller) and sequences one cycle:
//!
//! ```text
//!  LinkPort ──▶ SensorPort ──▶ Hysteresis ──▶ RelayPort + fan-out ──▶ ChannelPort
//!                                                                     │
//!                           RelayPort / replies ◀── CommandRouter ◀───┘
//! ```
//!
//! Each port error maps to exactly one recovery action:
//!
//! | Failure              | Action                                         |
//! |----------------------|------------------------------------------------|
//! | link down            | bounded reconnect, then carry on offline       |
//! | sensor read          | skip control this cycle, state untouched       |
//! | notification send    | count it, keep going with other recipients    |
//! | update fetch         | skip polling this cycle                        |
//! | reply send           | log it; authorization/relay stay as they are   |
//! | relay write          | escapes to the loop boundary → fault backoff   |
//!
//! Execution is strictly sequential.  The only blocking points are the
//! bounded reconnect, the sensor read, the long-poll and the end-of-cycle
//! sleep.

use log::{debug, error, info, warn};

use crate::config::SystemConfig;
use crate::control::hysteresis::{AlertState, Decision, HysteresisController};
use crate::error::{Error, RelayError};

use super::cursor::Cursor;
use super::events::{AppEvent, RelayCause};
use super::model::{Reading, Update};
use super::ports::{ChannelPort, ClockPort, EventSink, LinkPort, RelayPort, SensorPort};
use super::recipients::AuthorizedRecipients;
use super::router::{CommandRouter, alert_text, auto_off_text};

/// Bound on startup backlog polls; whatever is left is handled as live traffic.
const MAX_DRAIN_ROUNDS: usize = 64;

pub struct Supervisor {
    config: SystemConfig,
    controller: HysteresisController,
    router: CommandRouter,
    recipients: AuthorizedRecipients,
    cursor: Cursor,
    last_reading: Option<Reading>,
    link_up: bool,
    cycles: u64,
}

impl Supervisor {
    /// Build the supervisor.  Does **not** touch any port — call
    /// [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            controller: HysteresisController::new(config.temp_threshold_c),
            router: CommandRouter::new(config.group_mode),
            recipients: AuthorizedRecipients::new(),
            cursor: Cursor::new(),
            last_reading: None,
            link_up: false,
            cycles: 0,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Bring the agent to its initial state: relay off, link attempted,
    /// inbound backlog drained so old commands are never replayed.
    pub fn start(
        &mut self,
        relay: &mut impl RelayPort,
        link: &mut impl LinkPort,
        channel: &mut impl ChannelPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        relay.set(false)?;
        sink.emit(&AppEvent::RelayChanged {
            on: false,
            cause: RelayCause::Startup,
        });

        self.link_up = link.ensure_connected(self.config.link_timeout_secs);
        if self.link_up {
            info!("Supervisor: link up");
        } else {
            warn!("Supervisor: link unavailable at startup, will retry every cycle");
            sink.emit(&AppEvent::LinkDown);
        }

        self.drain_backlog(channel);

        sink.emit(&AppEvent::Started {
            cursor: self.cursor.last(),
        });
        info!("Supervisor started (threshold {:.1}°C)", self.controller.threshold_c());
        Ok(())
    }

    /// Fail-safe: de-energise the relay before the process stops.
    pub fn shutdown(&mut self, relay: &mut impl RelayPort, sink: &mut impl EventSink) {
        let was_on = relay.is_on();
        match relay.set(false) {
            Ok(()) if was_on => sink.emit(&AppEvent::RelayChanged {
                on: false,
                cause: RelayCause::Shutdown,
            }),
            Ok(()) => {}
            Err(e) => error!("Supervisor: relay off failed during shutdown: {}", e),
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one cycle and return how long to sleep before the next one.
    ///
    /// Any error escaping [`run_cycle`](Self::run_cycle) is contained here:
    /// logged, reported, and answered with the fixed fault backoff.
    pub fn supervise_cycle(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        link: &mut impl LinkPort,
        channel: &mut impl ChannelPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> u64 {
        let started_ms = clock.uptime_ms();
        match self.run_cycle(hw, link, channel, sink) {
            Ok(()) => {
                let elapsed = clock.uptime_ms().saturating_sub(started_ms);
                u64::from(self.config.cycle_interval_ms).saturating_sub(elapsed)
            }
            Err(e) => {
                error!("Main loop error: {}", e);
                sink.emit(&AppEvent::CycleFault(e));
                u64::from(self.config.fault_backoff_ms)
            }
        }
    }

    /// Supervise cycles forever.  `on_cycle` runs after every cycle
    /// (watchdog feed).
    pub fn run(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        link: &mut impl LinkPort,
        channel: &mut impl ChannelPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
        mut on_cycle: impl FnMut(),
    ) -> ! {
        loop {
            let delay_ms = self.supervise_cycle(hw, link, channel, &*clock, sink);
            on_cycle();
            clock.sleep_ms(delay_ms);
        }
    }

    /// One cycle: link → sense → control → command poll.
    pub fn run_cycle(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        link: &mut impl LinkPort,
        channel: &mut impl ChannelPort,
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        self.cycles += 1;

        self.maintain_link(link, sink);

        // No decision is ever made on a failed read.
        if let Some(reading) = self.sense(hw, sink) {
            self.control(&reading, hw, channel, sink)?;
        }

        self.poll_commands(hw, channel, sink)?;

        if self.cycles % u64::from(self.config.heartbeat_every_cycles.max(1)) == 0 {
            sink.emit(&AppEvent::Heartbeat {
                cycles: self.cycles,
            });
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn recipients(&self) -> &AuthorizedRecipients {
        &self.recipients
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn last_reading(&self) -> Option<&Reading> {
        self.last_reading.as_ref()
    }

    pub fn alert_state(&self) -> AlertState {
        self.controller.alert_state()
    }

    /// Cycles started since boot.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Consume every pending update without acting on it.  Polls come back
    /// in bounded batches, so keep going until one is empty.
    fn drain_backlog(&mut self, channel: &mut impl ChannelPort) {
        let mut skipped = 0;
        for _ in 0..MAX_DRAIN_ROUNDS {
            let backlog = match channel
                .fetch_updates(self.cursor.next_offset(), self.config.startup_drain_wait_secs)
            {
                Ok(backlog) => backlog,
                Err(e) => {
                    warn!(
                        "Supervisor: backlog drain failed ({}), continuing from {:?}",
                        e,
                        self.cursor.last()
                    );
                    break;
                }
            };
            if backlog.is_empty() {
                break;
            }
            for update in &backlog {
                if self.cursor.advance(update.id()) {
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            info!("Supervisor: skipped {} stale update(s)", skipped);
        }
    }

    fn maintain_link(&mut self, link: &mut impl LinkPort, sink: &mut impl EventSink) {
        if link.is_connected() {
            if !self.link_up {
                self.link_up = true;
                sink.emit(&AppEvent::LinkRestored);
            }
            return;
        }

        if self.link_up {
            warn!("WiFi disconnected, reconnecting...");
            sink.emit(&AppEvent::LinkLost);
        }
        self.link_up = link.ensure_connected(self.config.link_timeout_secs);
        if self.link_up {
            sink.emit(&AppEvent::LinkRestored);
        } else {
            // Sensing and control do not need the network.
            sink.emit(&AppEvent::LinkDown);
        }
    }

    fn sense(&mut self, sensor: &mut impl SensorPort, sink: &mut impl EventSink) -> Option<Reading> {
        match sensor.read() {
            Ok(reading) => {
                self.last_reading = Some(reading);
                sink.emit(&AppEvent::Reading(reading));
                Some(reading)
            }
            Err(e) => {
                warn!("Failed to read sensor: {}", e);
                sink.emit(&AppEvent::SensorFailed(e));
                None
            }
        }
    }

    fn control(
        &mut self,
        reading: &Reading,
        relay: &mut impl RelayPort,
        channel: &mut impl ChannelPort,
        sink: &mut impl EventSink,
    ) -> Result<(), RelayError> {
        let decision = self.controller.evaluate(reading, relay.is_on());

        if let Some(target) = decision.relay_target() {
            relay.set(target)?;
            sink.emit(&AppEvent::RelayChanged {
                on: target,
                cause: RelayCause::AutoOff,
            });
        }

        if !decision.notifies() {
            return Ok(());
        }
        let text = if decision == Decision::Alert {
            alert_text(reading.temperature_c, self.controller.threshold_c())
        } else {
            auto_off_text(reading.temperature_c)
        };
        sink.emit(&AppEvent::Decision {
            decision,
            temperature_c: reading.temperature_c,
        });
        self.fan_out(&text, channel, sink);
        Ok(())
    }

    /// Best-effort delivery to every authorized recipient.
    fn fan_out(&self, text: &str, channel: &mut impl ChannelPort, sink: &mut impl EventSink) {
        if self.recipients.is_empty() {
            debug!("Fan-out: no recipients learned yet");
            return;
        }
        let mut delivered = 0;
        let mut failed = 0;
        for chat_id in self.recipients.iter() {
            match channel.send(chat_id, text) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Fan-out to {} failed: {}", chat_id, e);
                    failed += 1;
                }
            }
        }
        sink.emit(&AppEvent::Notified { delivered, failed });
    }

    fn poll_commands(
        &mut self,
        relay: &mut impl RelayPort,
        channel: &mut impl ChannelPort,
        sink: &mut impl EventSink,
    ) -> Result<(), RelayError> {
        let mut updates =
            match channel.fetch_updates(self.cursor.next_offset(), self.config.poll_timeout_secs) {
                Ok(updates) => updates,
                Err(e) => {
                    warn!("get_updates error: {}", e);
                    sink.emit(&AppEvent::FetchFailed(e));
                    return Ok(());
                }
            };
        updates.sort_by_key(Update::id);

        for update in updates {
            // Advance before routing: a filtered or refused event is still consumed.
            if !self.cursor.advance(update.id()) {
                debug!("Skipping already consumed update {}", update.id());
                continue;
            }
            let Update::Message(event) = update else {
                continue;
            };
            info!(
                "From {} ({:?}) User: {} Message: {}",
                event.chat_id, event.chat_type, event.sender_name, event.text
            );

            let routed = self.router.route(
                &event,
                &mut self.recipients,
                relay,
                &mut self.controller,
                self.last_reading.as_ref(),
                sink,
            );

            for reply in routed.replies {
                if let Err(error) = channel.send(reply.chat_id, &reply.text) {
                    warn!("send_message error to {}: {}", reply.chat_id, error);
                    sink.emit(&AppEvent::ReplyFailed {
                        chat_id: reply.chat_id,
                        error,
                    });
                }
            }
            // Replies already produced (e.g. an authorization notice) go out
            // before a relay fault escapes.
            if let Some(fault) = routed.fault {
                return Err(fault);
            }
        }
        Ok(())
    }
}
